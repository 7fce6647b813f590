/// Generates unique state names for one compilation unit.
///
/// Names take the form `<kind>_<origin>_<n>` where `n` counts up from 1 in
/// allocation order, so the same input compiled in the same order always
/// yields the same names.
#[derive(Debug, Default)]
pub struct NameAllocator {
  counter: usize,
}

impl NameAllocator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn allocate(&mut self, kind: &str, origin: &str) -> String {
    self.counter += 1;
    format!("{}_{}_{}", kind, origin, self.counter)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  fn sequence(n: usize) -> Vec<String> {
    let mut names = NameAllocator::new();
    (0..n)
      .map(|i| {
        let kind = if i % 2 == 0 { "wait" } else { "pass" };
        names.allocate(kind, "validate")
      })
      .collect()
  }

  #[test]
  fn test_names_are_deterministic() {
    assert_eq!(sequence(25), sequence(25));
    assert_eq!(sequence(3), vec!["wait_validate_1", "pass_validate_2", "wait_validate_3"]);
  }

  #[test]
  fn test_names_are_unique() {
    for n in 1..50 {
      let names = sequence(n);
      let unique: HashSet<&String> = names.iter().collect();
      assert_eq!(unique.len(), n);
    }
  }
}
