//! Collision-free output names within one run

use std::collections::HashSet;

/// Hands out unique file stems, suffixing `-2`, `-3`, ... on collision
///
/// Comparison ignores ASCII case so the result is also safe on
/// case-insensitive file systems.
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `stem`, or the first free suffixed variant of it
    pub fn claim(&mut self, stem: &str) -> String {
        if self.taken.insert(stem.to_ascii_lowercase()) {
            return stem.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", stem, n);
            if self.taken.insert(candidate.to_ascii_lowercase()) {
                tracing::warn!(stem, renamed = %candidate, "output name already used in this run");
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_suffixes_duplicates() {
        let mut names = UniqueNames::new();
        assert_eq!(names.claim("Doe_John_12345"), "Doe_John_12345");
        assert_eq!(names.claim("Doe_John_12345"), "Doe_John_12345-2");
        assert_eq!(names.claim("doe_john_12345"), "doe_john_12345-3");
        assert_eq!(names.claim("Roe_Jane_4411"), "Roe_Jane_4411");
    }

    #[test]
    fn test_claim_skips_taken_suffix() {
        let mut names = UniqueNames::new();
        names.claim("a-2");
        names.claim("a");
        assert_eq!(names.claim("a"), "a-3");
    }
}
