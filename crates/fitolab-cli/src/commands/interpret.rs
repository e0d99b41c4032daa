use fitolab_core::error::FitolabError;
use fitolab_core::Interpreter;
use serde_json::json;
use uuid::Uuid;

use crate::config::CliConfig;
use crate::output;

pub fn apply(config: &CliConfig, sample_id: Uuid, output_format: &str) -> Result<(), FitolabError> {
    let store = config.open_store()?;
    let interpreter = Interpreter::new(&store, &store, &store);
    let applied = interpreter.evaluate_and_apply(sample_id)?;

    match output_format {
        "json" => output::json::print(&applied)?,
        _ => output::table::print_applied(&sample_id.to_string(), &applied),
    }
    Ok(())
}

pub fn preview(
    config: &CliConfig,
    sample_id: Uuid,
    output_format: &str,
    explain: bool,
) -> Result<(), FitolabError> {
    let store = config.open_store()?;
    let interpreter = Interpreter::new(&store, &store, &store);
    let evaluation = interpreter.dry_run(sample_id)?;

    match output_format {
        "json" => output::json::print(&json!({
            "sample_id": sample_id,
            "interpretations": evaluation.interpretations,
            "traces": explain.then_some(&evaluation.traces),
        }))?,
        _ => {
            output::table::print_drafts(&sample_id.to_string(), &evaluation.interpretations);
            if explain {
                output::table::print_traces(&evaluation.traces);
            }
        }
    }
    Ok(())
}

pub fn list(config: &CliConfig, sample_id: Uuid, output_format: &str) -> Result<(), FitolabError> {
    let store = config.open_store()?;
    let interpreter = Interpreter::new(&store, &store, &store);
    let views = interpreter.list_with_rules(sample_id)?;

    match output_format {
        "json" => output::json::print(&views)?,
        _ => output::table::print_views(&sample_id.to_string(), &views),
    }
    Ok(())
}
