use crate::model::{AnalyteResult, Sample, SampleUnit};
use std::fmt;

/// Text substituted for fields that are absent.
pub const MISSING: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Analyte,
    Value,
    Flag,
    UnitCode,
    UnitLabel,
    Species,
    Variety,
    SampleCode,
}

impl Placeholder {
    pub const ALL: [Placeholder; 8] = [
        Placeholder::Analyte,
        Placeholder::Value,
        Placeholder::Flag,
        Placeholder::UnitCode,
        Placeholder::UnitLabel,
        Placeholder::Species,
        Placeholder::Variety,
        Placeholder::SampleCode,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::Analyte => "analyte",
            Placeholder::Value => "value",
            Placeholder::Flag => "flag",
            Placeholder::UnitCode => "unit_code",
            Placeholder::UnitLabel => "unit_label",
            Placeholder::Species => "species",
            Placeholder::Variety => "variety",
            Placeholder::SampleCode => "sample_code",
        }
    }

    pub fn from_name(name: &str) -> Option<Placeholder> {
        Placeholder::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Placeholder),
}

/// A message template compiled into literal and placeholder segments.
///
/// Unknown `{tokens}` and stray braces are kept as literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl MessageTemplate {
    pub fn parse(source: &str) -> MessageTemplate {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let field = after.find('}').and_then(|close| {
                Placeholder::from_name(&after[..close]).map(|p| (close, p))
            });
            match field {
                Some((close, placeholder)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(placeholder));
                    rest = &after[close + 1..];
                }
                None => {
                    literal.push('{');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        MessageTemplate {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct placeholders used by the template, in order of first use.
    pub fn placeholders(&self) -> Vec<Placeholder> {
        let mut seen = Vec::new();
        for segment in &self.segments {
            if let Segment::Field(p) = segment {
                if !seen.contains(p) {
                    seen.push(*p);
                }
            }
        }
        seen
    }

    /// `{name}` tokens in the source that are not known placeholders.
    pub fn unknown_tokens(&self) -> Vec<&str> {
        let mut tokens = Vec::new();
        let mut rest = self.source.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            let name = &after[..close];
            if !name.contains('{') && Placeholder::from_name(name).is_none() {
                tokens.push(&rest[open..open + close + 2]);
            }
            rest = &after[close + 1..];
        }
        tokens
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(p) => match ctx.field(*p) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(MISSING),
                },
            }
        }
        out
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// The matching result with its owning unit and parent sample.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub sample: &'a Sample,
    pub unit: &'a SampleUnit,
    pub result: &'a AnalyteResult,
}

impl<'a> RenderContext<'a> {
    pub fn new(sample: &'a Sample, unit: &'a SampleUnit, result: &'a AnalyteResult) -> Self {
        RenderContext {
            sample,
            unit,
            result,
        }
    }

    fn field(&self, placeholder: Placeholder) -> Option<String> {
        match placeholder {
            Placeholder::Analyte => Some(self.result.analyte.clone()),
            Placeholder::Value => self.result.result_value.map(|v| v.normalize().to_string()),
            Placeholder::Flag => self.result.result_flag.clone(),
            Placeholder::UnitCode => self.unit.code.clone(),
            Placeholder::UnitLabel => self.unit.label.clone(),
            Placeholder::Species => self.sample.species.clone(),
            Placeholder::Variety => self.sample.variety.clone(),
            Placeholder::SampleCode => self.sample.code.clone(),
        }
    }
}
