use crate::interpret::outcome::{RuleMatch, RuleOutcome, RuleTrace, SkipReason};
use crate::model::Sample;
use crate::rules::schema::Rule;
use tracing::debug;

/// Match every applicable rule against every result of a sample.
///
/// Matches come out in rule order, then unit order, then result order.
/// A rule can match several times, once per satisfying result.
pub fn match_rules<'a>(sample: &'a Sample, rules: &'a [Rule]) -> Vec<RuleMatch<'a>> {
    let mut matches = Vec::new();

    for rule in rules {
        if let Err(reason) = check_applicable(rule, sample) {
            debug!(rule_id = %rule.id, analyte = %rule.analyte, %reason, "rule skipped");
            continue;
        }

        let pattern = rule.analyte.to_lowercase();
        let before = matches.len();
        for (unit, result) in sample.results() {
            if analyte_matches(&result.analyte, &pattern) && rule.condition.evaluate(result) {
                matches.push(RuleMatch { rule, unit, result });
            }
        }
        debug!(
            rule_id = %rule.id,
            analyte = %rule.analyte,
            matches = matches.len() - before,
            "rule evaluated"
        );
    }

    matches
}

/// Explain, per rule, what the matcher did with it.
pub fn trace_rules(sample: &Sample, rules: &[Rule]) -> Vec<RuleTrace> {
    rules
        .iter()
        .map(|rule| {
            let outcome = match check_applicable(rule, sample) {
                Err(reason) => RuleOutcome::Skipped(reason),
                Ok(()) => {
                    let pattern = rule.analyte.to_lowercase();
                    let candidates: Vec<_> = sample
                        .results()
                        .filter(|(_, r)| analyte_matches(&r.analyte, &pattern))
                        .collect();
                    RuleOutcome::Evaluated {
                        candidates: candidates.len(),
                        matches: candidates
                            .iter()
                            .filter(|(_, r)| rule.condition.evaluate(r))
                            .count(),
                    }
                }
            };
            RuleTrace {
                rule_id: rule.id,
                analyte: rule.analyte.clone(),
                condition: rule.condition.to_string(),
                outcome,
            }
        })
        .collect()
}

/// Sample-level gates: activity, tested area, species, next crop.
fn check_applicable(rule: &Rule, sample: &Sample) -> Result<(), SkipReason> {
    if !rule.active {
        return Err(SkipReason::Inactive);
    }

    if let Some(ref area) = rule.area {
        if !sample.has_test_area(area) {
            return Err(SkipReason::AreaNotTested { area: area.clone() });
        }
    }

    if let Some(ref species) = rule.species {
        if sample.species.as_deref() != Some(species.as_str()) {
            return Err(SkipReason::SpeciesMismatch {
                expected: species.clone(),
                actual: sample.species.clone(),
            });
        }
    }

    if let Some(ref crop) = rule.crop_next {
        if sample.next_crop.as_deref() != Some(crop.as_str()) {
            return Err(SkipReason::CropMismatch {
                expected: crop.clone(),
                actual: sample.next_crop.clone(),
            });
        }
    }

    Ok(())
}

/// `pattern` must already be lowercased.
fn analyte_matches(analyte: &str, pattern: &str) -> bool {
    analyte.to_lowercase().contains(pattern)
}
