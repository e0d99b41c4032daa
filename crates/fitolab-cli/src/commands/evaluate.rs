use fitolab_core::error::FitolabError;
use fitolab_core::model::Sample;
use fitolab_core::rules::schema::Rule;
use std::path::PathBuf;
use tracing::info;

use crate::output;

pub fn run(
    sample_file: PathBuf,
    rule_files: Vec<PathBuf>,
    output_format: &str,
    explain: bool,
) -> Result<(), FitolabError> {
    let mut rules: Vec<Rule> = Vec::new();
    for path in &rule_files {
        rules.extend(fitolab_core::rules::load_rules(path)?);
    }
    if rules.is_empty() {
        return Err(FitolabError::RuleInvalid("no rules specified".into()));
    }

    let json_bytes = std::fs::read(&sample_file)?;
    let sample: Sample = serde_json::from_slice(&json_bytes)?;
    info!(
        sample_id = %sample.id,
        rules = rules.len(),
        "evaluating sample file"
    );

    let evaluation = fitolab_core::evaluate(&sample, &rules);

    match output_format {
        "json" => output::json::print(&evaluation)?,
        _ => {
            let label = sample
                .code
                .clone()
                .unwrap_or_else(|| sample.id.to_string());
            output::table::print_drafts(&label, &evaluation.interpretations);
            if explain {
                output::table::print_traces(&evaluation.traces);
            }
        }
    }
    Ok(())
}
