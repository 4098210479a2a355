use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// One concrete observation produced by a static-analysis tool run: a file
/// location plus a severity.
///
/// Identity is a digest over the four identifying fields, not object
/// identity, so two findings describing the same location and severity are
/// interchangeable regardless of which tool run produced them. This is what
/// makes de-duplication across repeated runs stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "lineNumber")]
    pub line_number: u32,
    #[serde(rename = "characterNumber")]
    pub character_number: u32,
    pub severity: u32,
}

impl Finding {
    pub fn new(
        file_path: impl Into<String>,
        line_number: u32,
        character_number: u32,
        severity: u32,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            line_number,
            character_number,
            severity,
        }
    }

    /// Constructor for findings with no meaningful location, e.g. synthetic
    /// fixtures. The seed feeds the identity digest, so two anonymous
    /// findings are equal only when built from the same seed. Excluded from
    /// the de-duplication guarantees located findings carry.
    pub fn anonymous(seed: u64) -> Self {
        Self::new(format!("anonymous/{seed}"), 0, 0, 0)
    }

    /// Deterministic identity digest over (file path, line, character,
    /// severity).
    pub fn identity(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.file_path.as_bytes());
        hasher.update(self.line_number.to_be_bytes());
        hasher.update(self.character_number.to_be_bytes());
        hasher.update(self.severity.to_be_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn location(&self) -> String {
        format!(
            "{},{},{}",
            self.file_path, self.line_number, self.character_number
        )
    }
}

impl PartialEq for Finding {
    fn eq(&self, other: &Self) -> bool {
        self.file_path == other.file_path
            && self.line_number == other.line_number
            && self.character_number == other.character_number
            && self.severity == other.severity
    }
}

impl Eq for Finding {}

impl Ord for Finding {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl PartialOrd for Finding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Finding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn findings_with_identical_fields_are_equal() {
        let a = Finding::new("src/lib.rs", 5, 2, 1);
        let b = Finding::new("src/lib.rs", 5, 2, 1);
        assert_eq!(a, b);
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn findings_differing_in_any_field_are_distinct() {
        let base = Finding::new("src/lib.rs", 5, 2, 1);
        assert_ne!(base, Finding::new("src/main.rs", 5, 2, 1));
        assert_ne!(base, Finding::new("src/lib.rs", 6, 2, 1));
        assert_ne!(base, Finding::new("src/lib.rs", 5, 3, 1));
        assert_ne!(base, Finding::new("src/lib.rs", 5, 2, 2));
    }

    #[test]
    fn independently_constructed_duplicates_deduplicate() {
        let mut findings = BTreeSet::new();
        findings.insert(Finding::new("a.rs", 1, 1, 1));
        findings.insert(Finding::new("a.rs", 1, 1, 1));
        findings.insert(Finding::new("a.rs", 2, 1, 1));
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn anonymous_findings_are_distinct_per_seed() {
        assert_ne!(Finding::anonymous(1), Finding::anonymous(2));
        assert_eq!(Finding::anonymous(7), Finding::anonymous(7));
    }

    #[test]
    fn location_joins_path_line_and_character() {
        let finding = Finding::new("src/lib.rs", 5, 2, 1);
        assert_eq!(finding.location(), "src/lib.rs,5,2");
    }
}
