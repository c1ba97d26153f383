//! Finding categories and records.

use crate::trace::SourcePath;

/// Classification of a finding.
///
/// Declaration order is the order sections appear in the rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// The construct cannot be represented; the owning entity or sub-tree is dropped.
    Critical,
    /// No equivalent concept exists in the target.
    Inconvertible,
    /// Needs a human to finish the migration by hand.
    ManualAction,
    InvalidType,
    MissingParameter,
    UnknownKey,
    /// Ambiguous or risky input; migration proceeded with a stated choice.
    Problem,
    /// Recognized legacy-only setting, dropped on purpose.
    IgnoredKey,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Critical,
        Category::Inconvertible,
        Category::ManualAction,
        Category::InvalidType,
        Category::MissingParameter,
        Category::UnknownKey,
        Category::Problem,
        Category::IgnoredKey,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Critical => "critical",
            Category::Inconvertible => "inconvertible",
            Category::ManualAction => "manual_action",
            Category::InvalidType => "invalid_type",
            Category::MissingParameter => "missing_parameter",
            Category::UnknownKey => "unknown_key",
            Category::Problem => "problem",
            Category::IgnoredKey => "ignored_key",
        }
    }

    /// Phrase completing "N setting(s) ..." in the report.
    pub fn description(&self, target: &str) -> String {
        match self {
            Category::Critical => "caused critical problem(s)".to_string(),
            Category::Inconvertible => format!(
                "cannot be converted because no equivalent concept exists in {}",
                target
            ),
            Category::ManualAction => "require manual action".to_string(),
            Category::InvalidType => "have an invalid type".to_string(),
            Category::MissingParameter => "are missing a required parameter".to_string(),
            Category::UnknownKey => "are not known to the migrator".to_string(),
            Category::Problem => "caused other problem(s)".to_string(),
            Category::IgnoredKey => "are ignored for migration".to_string(),
        }
    }
}

/// All messages recorded for one (source, category) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub category: Category,
    pub source: SourcePath,
    pub value: Option<String>,
    pub messages: Vec<String>,
    /// Set when the finding makes the whole run fail.
    pub fatal: bool,
}

/// Severity of a message with no specific source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericSeverity {
    Critical,
    Problem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericMessage {
    pub severity: GenericSeverity,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_order_matches_all() {
        let mut sorted = Category::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Category::ALL.to_vec());
    }

    #[test]
    fn test_inconvertible_description_names_target() {
        assert!(Category::Inconvertible
            .description("Search Guard")
            .ends_with("exists in Search Guard"));
    }
}
