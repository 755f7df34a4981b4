//! Scenario post-processing
//!
//! Generated text arrives as a markdown-fenced Gherkin blob. This module
//! strips the fences and splits the blob into one file per scenario,
//! each carrying its feature header, with a deterministic file name
//! derived from the component and scenario title.

use regex::Regex;
use std::sync::OnceLock;

fn leading_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^```(?:gherkin)?[ \t]*\n?").expect("static pattern"))
}

fn trailing_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n?```\s*$").expect("static pattern"))
}

/// Strip markdown code fences from generated scenario text.
///
/// Removes a leading ```` ```gherkin ```` (or bare) fence, a trailing
/// fence, and any stray fence markers left in the body.
#[must_use]
pub fn clean_generated_text(raw: &str) -> String {
    let cleaned = raw.trim();
    let cleaned = leading_fence_re().replace(cleaned, "");
    let cleaned = trailing_fence_re().replace(&cleaned, "");
    cleaned.replace("```", "").trim().to_string()
}

/// One scenario ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioUnit {
    /// `<component>-<hyphenated-title>.feature`
    pub file_name: String,
    /// Feature header, blank separator, scenario body
    pub content: String,
}

#[derive(Default)]
struct FeatureBlock {
    header: Vec<String>,
    scenarios: Vec<Vec<String>>,
}

/// Split cleaned Gherkin text into per-scenario units.
///
/// Each `Scenario:` block becomes one unit prefixed by its feature
/// header. A scenario still open when a new `Feature:` line appears
/// belongs to the new feature, not the old one. Text with no scenarios
/// yields nothing.
#[must_use]
pub fn split_into_scenarios(gherkin: &str, component_name: &str) -> Vec<ScenarioUnit> {
    let mut features: Vec<FeatureBlock> = Vec::new();
    let mut current = FeatureBlock::default();
    let mut open_scenario: Option<Vec<String>> = None;

    for line in gherkin.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("Feature:") {
            if !current.scenarios.is_empty() {
                features.push(std::mem::take(&mut current));
            }
            current.header.push(line.to_string());
        } else if trimmed.starts_with("Scenario:") {
            if let Some(scenario) = open_scenario.take() {
                current.scenarios.push(scenario);
            }
            open_scenario = Some(vec![line.to_string()]);
        } else if let Some(scenario) = open_scenario.as_mut() {
            scenario.push(line.to_string());
        } else {
            current.header.push(line.to_string());
        }
    }
    if let Some(scenario) = open_scenario {
        current.scenarios.push(scenario);
    }
    if !current.header.is_empty() || !current.scenarios.is_empty() {
        features.push(current);
    }

    let mut units = Vec::new();
    for feature in &features {
        for scenario in &feature.scenarios {
            let title = scenario[0]
                .trim()
                .trim_start_matches("Scenario:")
                .trim()
                .to_lowercase();
            let slug = title.split_whitespace().collect::<Vec<_>>().join("-");
            let file_name = format!("{}-{slug}.feature", component_name.to_lowercase());
            let mut content_lines = feature.header.clone();
            content_lines.push(String::new());
            content_lines.extend(scenario.iter().cloned());
            units.push(ScenarioUnit {
                file_name,
                content: content_lines.join("\n"),
            });
        }
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fences_are_stripped() {
        let raw = "```gherkin\nFeature: Login\n  Scenario: Valid\n    Given a user\n```";
        assert_eq!(
            clean_generated_text(raw),
            "Feature: Login\n  Scenario: Valid\n    Given a user"
        );
    }

    #[test]
    fn bare_and_stray_fences_are_stripped() {
        let raw = "```\nFeature: X\n```\nextra\n```";
        assert_eq!(clean_generated_text(raw), "Feature: X\n\nextra");
    }

    #[test]
    fn unfenced_text_only_gets_trimmed() {
        assert_eq!(clean_generated_text("  Feature: X  "), "Feature: X");
    }

    #[test]
    fn one_unit_per_scenario_with_shared_header() {
        let text = "Feature: Login\n  As a user\n\n  Scenario: Valid credentials\n    Given a login form\n  Scenario: Bad password\n    Given a login form";
        let units = split_into_scenarios(text, "Login");
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].file_name, "login-valid-credentials.feature");
        assert_eq!(units[1].file_name, "login-bad-password.feature");
        assert!(units[0].content.starts_with("Feature: Login\n  As a user\n"));
        assert!(units[0].content.contains("\n\n  Scenario: Valid credentials"));
        assert!(units[0].content.ends_with("Given a login form"));
        assert!(!units[0].content.contains("Bad password"));
    }

    #[test]
    fn scenario_title_whitespace_collapses_in_file_name() {
        let text = "Feature: F\n  Scenario: Multi   Word    Title\n    Given x";
        let units = split_into_scenarios(text, "Dash");
        assert_eq!(units[0].file_name, "dash-multi-word-title.feature");
    }

    #[test]
    fn open_scenario_moves_to_the_next_feature() {
        let text = "Feature: One\n  Scenario: First\n    Given a\n  Scenario: Second\n    Given b\nFeature: Two\n  Scenario: Third\n    Given c";
        let units = split_into_scenarios(text, "App");
        assert_eq!(units.len(), 3);
        assert!(units[0].content.starts_with("Feature: One"));
        assert!(units[0].content.contains("Scenario: First"));
        // Second was still open at the Feature: Two line, so it lands
        // under the second feature's header.
        assert!(units[1].content.starts_with("Feature: Two"));
        assert!(units[1].content.contains("Scenario: Second"));
        assert!(units[2].content.starts_with("Feature: Two"));
        assert!(units[2].content.contains("Scenario: Third"));
    }

    #[test]
    fn text_without_scenarios_yields_nothing() {
        assert!(split_into_scenarios("Feature: Empty\n  just prose", "X").is_empty());
        assert!(split_into_scenarios("", "X").is_empty());
    }
}
