//! Artifact labels derived from the QA export's file name.

use std::path::Path;

use qnasync_shared::NamingConfig;

/// Label used when no naming rule matches.
pub const UNDEFINED_LABEL: &str = "not_defined";

/// First configured label that occurs in `path`, or [`UNDEFINED_LABEL`].
pub fn classify<'a>(path: &Path, naming: &'a NamingConfig) -> &'a str {
    let text = path.to_string_lossy();
    naming
        .rules
        .iter()
        .find(|label| !label.is_empty() && text.contains(label.as_str()))
        .map(String::as_str)
        .unwrap_or(UNDEFINED_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(list: &[&str]) -> NamingConfig {
        NamingConfig {
            rules: list.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let naming = rules(&["billing", "faq", "faq_billing"]);
        let label = classify(Path::new("/exports/kb_faq_billing_2024.xlsx"), &naming);
        assert_eq!(label, "billing");
    }

    #[test]
    fn no_match_is_undefined() {
        let naming = rules(&["support"]);
        assert_eq!(classify(Path::new("qa.xlsx"), &naming), UNDEFINED_LABEL);
        assert_eq!(classify(Path::new("qa.xlsx"), &rules(&[])), UNDEFINED_LABEL);
    }

    #[test]
    fn blank_rule_never_matches() {
        let naming = rules(&["", "qa"]);
        assert_eq!(classify(Path::new("qa.xlsx"), &naming), "qa");
    }
}
