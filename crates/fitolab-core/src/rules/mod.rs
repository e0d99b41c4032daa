pub mod condition;
pub mod schema;

use crate::error::FitolabError;
use schema::{Rule, RuleDef};
use std::path::Path;

/// Load a list of rules from a JSON file (an array of rule objects).
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, FitolabError> {
    let content = std::fs::read_to_string(path).map_err(|e| FitolabError::RuleLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_rules(&content, path)
}

/// Parse a list of rules from a JSON string.
pub fn parse_rules(json: &str, source: &Path) -> Result<Vec<Rule>, FitolabError> {
    let defs: Vec<RuleDef> = serde_json::from_str(json).map_err(|e| FitolabError::RuleLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    defs.into_iter()
        .enumerate()
        .map(|(i, def)| {
            validate_rule(def).map_err(|e| FitolabError::RuleLoad {
                path: source.to_path_buf(),
                reason: format!("rule #{}: {}", i + 1, e),
            })
        })
        .collect()
}

/// Parse a single rule from a JSON string (no file path context).
pub fn parse_rule_str(json: &str) -> Result<Rule, FitolabError> {
    let def: RuleDef = serde_json::from_str(json)?;
    validate_rule(def)
}

/// Validate a rule definition and convert it into its typed form.
pub fn validate_rule(def: RuleDef) -> Result<Rule, FitolabError> {
    Rule::try_from(def)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;
    use crate::rules::condition::Condition;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_valid_rule() {
        let json = r#"{
            "area": "nematologia",
            "analyte": "Meloidogyne",
            "comparator": ">",
            "threshold": { "value": 100 },
            "message": "{analyte}: {value}",
            "severity": "high"
        }"#;
        let rule = parse_rule_str(json).unwrap();
        assert_eq!(rule.area.as_deref(), Some("nematologia"));
        assert_eq!(rule.condition, Condition::Greater(dec!(100)));
        assert_eq!(rule.severity, Severity::High);
        assert!(rule.active);
    }

    #[test]
    fn test_analyte_pattern_kept_as_written() {
        let json = r#"{
            "analyte": "Meloidogyne ",
            "comparator": ">",
            "threshold": { "value": 1 },
            "message": "x",
            "severity": "low"
        }"#;
        assert_eq!(parse_rule_str(json).unwrap().analyte, "Meloidogyne ");
    }

    #[test]
    fn test_camel_case_crop_next_accepted() {
        let json = r#"{
            "cropNext": "Pimiento",
            "analyte": "Fusarium",
            "comparator": "=",
            "threshold": { "flag": "positivo" },
            "message": "x",
            "severity": "low"
        }"#;
        let rule = parse_rule_str(json).unwrap();
        assert_eq!(rule.crop_next.as_deref(), Some("Pimiento"));
    }

    #[test]
    fn test_blank_filters_become_none() {
        let json = r#"{
            "area": "",
            "species": "  ",
            "analyte": "Fusarium",
            "comparator": "=",
            "threshold": { "flag": "positivo" },
            "message": "x",
            "severity": "low"
        }"#;
        let rule = parse_rule_str(json).unwrap();
        assert!(rule.area.is_none());
        assert!(rule.species.is_none());
    }

    #[test]
    fn test_empty_analyte_rejected() {
        let json = r#"{
            "analyte": " ",
            "comparator": ">",
            "threshold": { "value": 1 },
            "message": "x",
            "severity": "low"
        }"#;
        assert!(parse_rule_str(json).is_err());
    }

    #[test]
    fn test_missing_threshold_rejected() {
        let json = r#"{
            "analyte": "Meloidogyne",
            "comparator": ">",
            "message": "x",
            "severity": "low"
        }"#;
        let err = parse_rule_str(json).unwrap_err();
        assert!(err.to_string().contains("Meloidogyne"));
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let json = r#"{
            "analyte": "Meloidogyne",
            "comparator": ">",
            "threshold": { "value": 1 },
            "message": "x",
            "severity": "critical"
        }"#;
        assert!(parse_rule_str(json).is_err());
    }

    #[test]
    fn test_parse_rules_reports_position() {
        let json = r#"[
            { "analyte": "A", "comparator": ">", "threshold": { "value": 1 }, "message": "m", "severity": "low" },
            { "analyte": "B", "comparator": "~", "threshold": { "value": 1 }, "message": "m", "severity": "low" }
        ]"#;
        let err = parse_rules(json, Path::new("rules.json")).unwrap_err();
        assert!(err.to_string().contains("rule #2"));
    }

    #[test]
    fn test_rule_serializes_to_stored_form() {
        let json = r#"{
            "analyte": "TSWV",
            "comparator": "in",
            "threshold": { "values": ["positivo", 3] },
            "message": "{analyte} {flag}",
            "severity": "moderate"
        }"#;
        let rule = parse_rule_str(json).unwrap();
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["comparator"], "in");
        assert_eq!(value["threshold"]["values"][1], 3);
        assert_eq!(value["message"], "{analyte} {flag}");
        let back: schema::Rule = serde_json::from_value(value).unwrap();
        assert_eq!(back, rule);
    }
}
