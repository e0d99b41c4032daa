use fitolab_core::error::FitolabError;
use fitolab_core::rules::schema::{RuleDef, RuleFilter};
use fitolab_core::store::RuleRepository;
use std::path::Path;
use uuid::Uuid;

use crate::config::CliConfig;
use crate::output;

pub fn list(
    config: &CliConfig,
    area: Option<String>,
    all: bool,
    output_format: &str,
) -> Result<(), FitolabError> {
    let store = config.open_store()?;
    let filter = RuleFilter {
        area,
        active: if all { None } else { Some(true) },
    };
    let rules = store.list_rules(&filter)?;

    match output_format {
        "json" => output::json::print(&rules)?,
        _ => output::table::print_rules(&rules),
    }
    Ok(())
}

pub fn add(config: &CliConfig, file: &Path) -> Result<(), FitolabError> {
    let content = std::fs::read_to_string(file).map_err(|e| FitolabError::RuleLoad {
        path: file.to_path_buf(),
        reason: e.to_string(),
    })?;
    let def: RuleDef = serde_json::from_str(&content).map_err(|e| FitolabError::RuleLoad {
        path: file.to_path_buf(),
        reason: e.to_string(),
    })?;

    let store = config.open_store()?;
    let rule = store.create_rule(def)?;
    println!("Rule {} created ({} {}).", rule.id, rule.analyte, rule.condition);
    Ok(())
}

pub fn deactivate(config: &CliConfig, rule_id: Uuid) -> Result<(), FitolabError> {
    let store = config.open_store()?;
    if store.deactivate_rule(rule_id)? {
        println!("Rule {} deactivated.", rule_id);
        Ok(())
    } else {
        Err(FitolabError::RuleNotFound(rule_id))
    }
}

pub fn validate(file: &Path) -> Result<(), FitolabError> {
    let rules = fitolab_core::rules::load_rules(file)?;

    println!("Rule file '{}' is valid.", file.display());
    println!("  Rules: {}", rules.len());

    // Potential issues (warnings, not errors)
    let mut warnings = Vec::new();
    for rule in &rules {
        if rule.message.placeholders().is_empty() {
            warnings.push(format!(
                "rule for '{}' has a message without placeholders",
                rule.analyte
            ));
        }
        for token in rule.message.unknown_tokens() {
            warnings.push(format!(
                "rule for '{}' uses unknown placeholder {}, it will be kept as text",
                rule.analyte, token
            ));
        }
        if !rule.active {
            warnings.push(format!("rule for '{}' is inactive", rule.analyte));
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

pub fn schema() -> Result<(), FitolabError> {
    print!(
        r#"JSON Rule Schema
================

A rule describes when a diagnostic interpretation applies to a sample.
When you run `fitolab interpret`, every active rule is checked against
every result of the sample, and one interpretation is stored per match.

Fields:
  area          (string, optional)  Only apply when at least one result in
                                    the sample was tested in this area
                                    (e.g., "nematologia", "virologia").
  species       (string, optional)  Only apply when the sample species is
                                    exactly this value.
  crop_next     (string, optional)  Only apply when the sample's next crop
                                    is exactly this value. "cropNext" is
                                    accepted as well.
  analyte       (string, required)  Case-insensitive substring matched
                                    against each result's analyte name.
  comparator    (string, required)  One of ">", ">=", "=", "in".
  threshold     (object, required)  Depends on the comparator:
                                      ">" / ">="  {{ "value": 100 }}
                                      "="         {{ "value": 3 }} or {{ "flag": "positivo" }}
                                      "in"        {{ "values": ["positivo", "negativo", 5] }}
                                    "in" matches when the list contains the
                                    result value, the result flag, or the
                                    analyte name.
  message       (string, required)  Message template. Placeholders:
                                    {{analyte}} {{value}} {{flag}} {{unit_code}} {{unit_label}}
                                    {{species}} {{variety}} {{sample_code}}
                                    Missing fields render as "N/A".
  severity      (string, required)  "low", "moderate" or "high".
  active        (bool, optional)    Default: true.

Example:
{{
  "area": "nematologia",
  "species": "Tomate",
  "analyte": "Meloidogyne",
  "comparator": ">",
  "threshold": {{ "value": 100 }},
  "message": "{{analyte}} detected at {{value}} in {{unit_label}}",
  "severity": "high"
}}

`fitolab rules add` takes one such object; `fitolab rules validate` and
`fitolab evaluate --rules` take a file holding an array of them.
"#
    );
    Ok(())
}
