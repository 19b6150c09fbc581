//! Embedded default prompts
//!
//! Compiled into the binary from `prompts/*.md` and used unless an override
//! directory provides a file with the same stem.

use super::keys;

pub const CLASSIFY_INTENT: &str = include_str!("../../../prompts/classify_intent.md");
pub const GENERAL: &str = include_str!("../../../prompts/general.md");
pub const OVERALL: &str = include_str!("../../../prompts/overall.md");
pub const EXTEND_SCENARIOS: &str = include_str!("../../../prompts/extend_scenarios.md");
pub const EXTRACT_TERMS: &str = include_str!("../../../prompts/extract_terms.md");
pub const ADD_FEATURES: &str = include_str!("../../../prompts/add_features.md");
pub const ADD_CONSTRAINTS: &str = include_str!("../../../prompts/add_constraints.md");
pub const DESIGN_SPECS: &str = include_str!("../../../prompts/design_specs.md");

/// All embedded prompts keyed by their upper-cased file stem
pub const ALL: &[(&str, &str)] = &[
    (keys::CLASSIFY_INTENT, CLASSIFY_INTENT),
    (keys::GENERAL, GENERAL),
    (keys::OVERALL, OVERALL),
    (keys::EXTEND_SCENARIOS, EXTEND_SCENARIOS),
    (keys::EXTRACT_TERMS, EXTRACT_TERMS),
    (keys::ADD_FEATURES, ADD_FEATURES),
    (keys::ADD_CONSTRAINTS, ADD_CONSTRAINTS),
    (keys::DESIGN_SPECS, DESIGN_SPECS),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_prompts_non_empty() {
        for (key, prompt) in ALL {
            assert!(!prompt.trim().is_empty(), "{} is empty", key);
        }
    }

    #[test]
    fn test_general_has_readme_placeholder() {
        assert!(GENERAL.contains(crate::constants::prompts::README_PLACEHOLDER));
    }

    #[test]
    fn test_classifier_names_both_routes() {
        assert!(CLASSIFY_INTENT.contains("DESIGN_SPECS"));
        assert!(CLASSIFY_INTENT.contains("GENERAL"));
    }
}
