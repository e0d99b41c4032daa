use fitolab_core::interpret::outcome::{InterpretationView, RuleOutcome, RuleTrace};
use fitolab_core::model::{AppliedInterpretation, NewInterpretation, Sample, Severity};
use fitolab_core::rules::schema::Rule;

fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "!!!",
        Severity::Moderate => "!! ",
        Severity::Low => "!  ",
    }
}

pub fn print_applied(sample_id: &str, applied: &[AppliedInterpretation]) {
    println!("=== Sample {} ===\n", sample_id);
    if applied.is_empty() {
        println!("  No rule matched.\n");
        return;
    }
    for a in applied {
        println!(
            "  {} {:<8} {}",
            severity_marker(a.severity),
            a.severity,
            a.message
        );
    }
    println!("\n  {} interpretation(s) stored.\n", applied.len());
}

pub fn print_drafts(sample_id: &str, drafts: &[NewInterpretation]) {
    println!("=== Sample {} (preview) ===\n", sample_id);
    if drafts.is_empty() {
        println!("  No rule matched.\n");
        return;
    }
    for d in drafts {
        println!(
            "  {} {:<8} {}",
            severity_marker(d.severity),
            d.severity,
            d.message
        );
    }
    println!();
}

pub fn print_traces(traces: &[RuleTrace]) {
    if traces.is_empty() {
        println!("  No active rules.\n");
        return;
    }
    let max_name = traces.iter().map(|t| t.analyte.len()).max().unwrap_or(10);

    println!("  Rules:");
    for t in traces {
        let detail = match &t.outcome {
            RuleOutcome::Skipped(reason) => format!("skipped: {}", reason),
            RuleOutcome::Evaluated {
                candidates: 0,
                ..
            } => "no result with a matching analyte".to_string(),
            RuleOutcome::Evaluated {
                candidates,
                matches,
            } => format!("{} of {} result(s) matched", matches, candidates),
        };
        println!(
            "    {:<width$}  {:<24} {}",
            t.analyte,
            t.condition,
            detail,
            width = max_name
        );
    }
    println!();
}

pub fn print_views(sample_id: &str, views: &[InterpretationView]) {
    println!("=== Sample {} ===\n", sample_id);
    if views.is_empty() {
        println!("  No interpretations stored.\n");
        return;
    }
    for v in views {
        let i = &v.interpretation;
        println!(
            "  {} {:<8} {}",
            severity_marker(i.severity),
            i.severity,
            i.message
        );
        match &v.rule {
            Some(rule) => println!(
                "      rule {} ({} {}), {}",
                rule.id,
                rule.analyte,
                rule.condition,
                i.created_at.format("%Y-%m-%d %H:%M")
            ),
            None => println!("      rule {} (deleted)", i.rule_id),
        }
    }
    println!();
}

pub fn print_rules(rules: &[Rule]) {
    if rules.is_empty() {
        println!("No rules.");
        return;
    }
    let max_name = rules.iter().map(|r| r.analyte.len()).max().unwrap_or(10);

    for rule in rules {
        let status = if rule.active { "" } else { " [inactive]" };
        println!(
            "{}  {:<width$}  {:<24} {:<8}{}",
            rule.id,
            rule.analyte,
            rule.condition.to_string(),
            rule.severity,
            status,
            width = max_name
        );
        let mut filters = Vec::new();
        if let Some(ref area) = rule.area {
            filters.push(format!("area={}", area));
        }
        if let Some(ref species) = rule.species {
            filters.push(format!("species={}", species));
        }
        if let Some(ref crop) = rule.crop_next {
            filters.push(format!("crop_next={}", crop));
        }
        if !filters.is_empty() {
            println!("    when {}", filters.join(", "));
        }
        println!("    \"{}\"", rule.message);
    }
}

pub fn print_samples(samples: &[Sample]) {
    if samples.is_empty() {
        println!("No samples.");
        return;
    }
    for s in samples {
        let results: usize = s.units.iter().map(|u| u.results.len()).sum();
        println!(
            "{}  {:<14} {:<14} {} unit(s), {} result(s)",
            s.id,
            s.code.as_deref().unwrap_or("-"),
            s.species.as_deref().unwrap_or("-"),
            s.units.len(),
            results
        );
    }
}
