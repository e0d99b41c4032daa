use crate::error::FitolabError;
use crate::model::AnalyteResult;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Greater,
    GreaterOrEqual,
    Equal,
    In,
}

impl Comparator {
    pub const ALL: [Comparator; 4] = [
        Comparator::Greater,
        Comparator::GreaterOrEqual,
        Comparator::Equal,
        Comparator::In,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Greater => ">",
            Comparator::GreaterOrEqual => ">=",
            Comparator::Equal => "=",
            Comparator::In => "in",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Comparator> {
        let s = s.trim();
        Comparator::ALL
            .into_iter()
            .find(|c| c.symbol().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A member of an `in` threshold set.
///
/// Numbers only ever compare against the result value, text against the
/// result flag and the analyte name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetMember {
    Number(Decimal),
    Text(String),
}

impl fmt::Display for SetMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetMember::Number(d) => write!(f, "{}", d.normalize()),
            SetMember::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A rule's comparator together with its typed threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Greater(Decimal),
    GreaterOrEqual(Decimal),
    EqualValue(Decimal),
    EqualFlag(String),
    In(Vec<SetMember>),
}

impl Condition {
    pub fn comparator(&self) -> Comparator {
        match self {
            Condition::Greater(_) => Comparator::Greater,
            Condition::GreaterOrEqual(_) => Comparator::GreaterOrEqual,
            Condition::EqualValue(_) | Condition::EqualFlag(_) => Comparator::Equal,
            Condition::In(_) => Comparator::In,
        }
    }

    /// Check one result against this condition. Missing fields never match.
    pub fn evaluate(&self, result: &AnalyteResult) -> bool {
        match self {
            Condition::Greater(threshold) => result.result_value.is_some_and(|v| v > *threshold),
            Condition::GreaterOrEqual(threshold) => {
                result.result_value.is_some_and(|v| v >= *threshold)
            }
            Condition::EqualValue(threshold) => result.result_value == Some(*threshold),
            Condition::EqualFlag(flag) => result.result_flag.as_deref() == Some(flag.as_str()),
            Condition::In(values) => values.iter().any(|member| match member {
                SetMember::Number(n) => result.result_value == Some(*n),
                SetMember::Text(t) => {
                    result.result_flag.as_deref() == Some(t.as_str()) || result.analyte == *t
                }
            }),
        }
    }

    /// Build a condition from the loosely shaped stored form
    /// (`comparator` symbol plus a `threshold` object).
    pub fn from_parts(comparator: &str, threshold: &Value) -> Result<Condition, FitolabError> {
        let cmp = Comparator::from_symbol(comparator).ok_or_else(|| {
            FitolabError::RuleInvalid(format!(
                "unknown comparator '{}' (expected one of >, >=, =, in)",
                comparator
            ))
        })?;

        if !threshold.is_object() {
            return Err(FitolabError::RuleInvalid(format!(
                "threshold for comparator '{}' must be an object",
                cmp
            )));
        }
        let field = |name: &str| threshold.get(name).filter(|v| !v.is_null());

        match cmp {
            Comparator::Greater | Comparator::GreaterOrEqual => {
                let value = field("value")
                    .and_then(decimal_from_json)
                    .ok_or_else(|| {
                        FitolabError::RuleInvalid(format!(
                            "comparator '{}' requires a numeric threshold.value",
                            cmp
                        ))
                    })?;
                Ok(if cmp == Comparator::Greater {
                    Condition::Greater(value)
                } else {
                    Condition::GreaterOrEqual(value)
                })
            }
            Comparator::Equal => {
                if let Some(raw) = field("value") {
                    let value = decimal_from_json(raw).ok_or_else(|| {
                        FitolabError::RuleInvalid(format!(
                            "threshold.value '{}' is not a number",
                            raw
                        ))
                    })?;
                    return Ok(Condition::EqualValue(value));
                }
                match field("flag") {
                    Some(Value::String(flag)) => Ok(Condition::EqualFlag(flag.clone())),
                    Some(other) => Err(FitolabError::RuleInvalid(format!(
                        "threshold.flag must be a string, got {}",
                        other
                    ))),
                    None => Err(FitolabError::RuleInvalid(
                        "comparator '=' requires threshold.value or threshold.flag".into(),
                    )),
                }
            }
            Comparator::In => {
                let values = field("values").and_then(Value::as_array).ok_or_else(|| {
                    FitolabError::RuleInvalid("comparator 'in' requires a threshold.values list".into())
                })?;
                if values.is_empty() {
                    return Err(FitolabError::RuleInvalid(
                        "threshold.values must not be empty".into(),
                    ));
                }
                let members = values
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => Ok(SetMember::Text(s.clone())),
                        Value::Number(_) => decimal_from_json(v).map(SetMember::Number).ok_or_else(
                            || FitolabError::RuleInvalid(format!("invalid number {} in threshold.values", v)),
                        ),
                        other => Err(FitolabError::RuleInvalid(format!(
                            "threshold.values may only hold numbers and strings, got {}",
                            other
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Condition::In(members))
            }
        }
    }

    /// The stored (JSON) form of the threshold.
    pub fn threshold_json(&self) -> Value {
        match self {
            Condition::Greater(v) | Condition::GreaterOrEqual(v) | Condition::EqualValue(v) => {
                json!({ "value": decimal_to_json(*v) })
            }
            Condition::EqualFlag(flag) => json!({ "flag": flag }),
            Condition::In(values) => {
                let members: Vec<Value> = values
                    .iter()
                    .map(|m| match m {
                        SetMember::Number(d) => decimal_to_json(*d),
                        SetMember::Text(s) => Value::String(s.clone()),
                    })
                    .collect();
                json!({ "values": members })
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Greater(v) | Condition::GreaterOrEqual(v) | Condition::EqualValue(v) => {
                write!(f, "{} {}", self.comparator(), v.normalize())
            }
            Condition::EqualFlag(flag) => write!(f, "= \"{}\"", flag),
            Condition::In(values) => {
                let parts: Vec<String> = values.iter().map(|m| m.to_string()).collect();
                write!(f, "in [{}]", parts.join(", "))
            }
        }
    }
}

/// Accept JSON numbers and numeric strings ("0.25", "1e3").
fn decimal_from_json(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn decimal_to_json(d: Decimal) -> Value {
    let text = d.normalize().to_string();
    match serde_json::Number::from_str(&text) {
        Ok(n) => Value::Number(n),
        Err(_) => Value::String(text),
    }
}
