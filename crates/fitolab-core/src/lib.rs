pub mod error;
pub mod interpret;
pub mod model;
pub mod rules;
pub mod store;

use interpret::outcome::Evaluation;
use model::Sample;
use rules::schema::Rule;

pub use error::FitolabError;
pub use interpret::Interpreter;

/// Main API entry point for a dry run: evaluate a sample against a rule list.
///
/// Nothing is persisted. Inactive rules are reported as skipped in the
/// traces and never produce interpretations.
pub fn evaluate(sample: &Sample, rules: &[Rule]) -> Evaluation {
    Evaluation {
        sample_id: sample.id,
        interpretations: interpret::interpret_sample(sample, rules),
        traces: interpret::trace_rules(sample, rules),
    }
}
