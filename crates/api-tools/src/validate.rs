//! Argument validation against an operation's parameter schema.

use crate::config::Secret;
use crate::error::{DispatchError, Result};
use crate::registry::{Location, MAX_TEXT_CHARS, Operation, Param, ParamType};
use serde_json::{Map, Value};
use url::Url;

/// Arguments that passed validation, with defaults applied and empty values dropped.
#[derive(Debug)]
pub struct ValidatedArgs {
    /// Present values in parameter declaration order (credential excluded).
    pub values: Vec<(&'static Param, Value)>,
    /// Per-call credential override, if supplied.
    pub credential: Option<Secret>,
}

impl ValidatedArgs {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(p, _)| p.name == name)
            .map(|(_, v)| v)
    }
}

/// Validate raw call arguments for `op`.
///
/// # Errors
///
/// Returns [`DispatchError::InvalidArgument`] naming the offending parameter when the arguments
/// are not an object, contain an unknown name, miss a required value, or violate a type, range,
/// length, enum, URL or "at least one of" constraint.
pub fn validate_arguments(op: &'static Operation, arguments: &Value) -> Result<ValidatedArgs> {
    let empty = Map::new();
    let args = match arguments {
        Value::Null => &empty,
        Value::Object(map) => map,
        _ => {
            return Err(DispatchError::invalid(
                "arguments",
                "expected a JSON object of named arguments",
            ));
        }
    };

    reject_unknown(op, args)?;

    let mut values = Vec::new();
    let mut credential = None;

    for param in op.params {
        let supplied = args.get(param.name).filter(|v| !is_empty_value(v));
        let value = supplied
            .cloned()
            .or_else(|| param.default.map(|d| d.to_value()));

        let Some(value) = value else {
            if param.required {
                return Err(DispatchError::invalid(param.name, "is required"));
            }
            continue;
        };

        let value = check_value(param, value)?;
        if param.location == Location::Credential {
            credential = value.as_str().and_then(Secret::new);
        } else {
            values.push((param, value));
        }
    }

    if !op.require_any.is_empty()
        && !op
            .require_any
            .iter()
            .any(|name| values.iter().any(|(p, _)| p.name == *name))
    {
        return Err(DispatchError::invalid(
            op.require_any.join("|"),
            format!(
                "provide at least one of: {}",
                op.require_any.join(", ")
            ),
        ));
    }

    Ok(ValidatedArgs { values, credential })
}

/// Absent-equivalent values: omitted from the request so upstream defaults apply.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn reject_unknown(op: &Operation, args: &Map<String, Value>) -> Result<()> {
    let Some(unknown) = args.keys().find(|k| op.param(k).is_none()) else {
        return Ok(());
    };

    let known: Vec<&str> = op.params.iter().map(|p| p.name).collect();
    let reason = match find_similar_strings(unknown, &known).first() {
        Some(suggestion) => format!("unknown parameter; did you mean '{suggestion}'?"),
        None if known.is_empty() => "unknown parameter; this operation takes none".to_string(),
        None => format!("unknown parameter; expected one of: {}", known.join(", ")),
    };
    Err(DispatchError::invalid(unknown.as_str(), reason))
}

fn find_similar_strings(unknown: &str, known: &[&str]) -> Vec<String> {
    let mut candidates: Vec<(f64, String)> = known
        .iter()
        .map(|k| (strsim::jaro(unknown, k), (*k).to_string()))
        .filter(|(score, _)| *score > 0.7)
        .collect();
    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    candidates.into_iter().map(|(_, s)| s).collect()
}

fn check_value(param: &Param, value: Value) -> Result<Value> {
    let name = param.name;
    match param.kind {
        ParamType::String { max_len } => {
            let s = expect_str(name, &value)?;
            check_len(name, s, max_len)?;
            Ok(value)
        }
        ParamType::Enum(allowed) => {
            let s = expect_str(name, &value)?;
            if allowed.contains(&s) {
                Ok(value)
            } else {
                Err(DispatchError::invalid(
                    name,
                    format!("must be one of: {}", allowed.join(", ")),
                ))
            }
        }
        ParamType::Integer { min, max } => {
            let out_of_range =
                || DispatchError::invalid(name, format!("must be an integer between {min} and {max}"));
            let n = as_integer(&value).ok_or_else(out_of_range)?;
            if (min..=max).contains(&n) {
                Ok(Value::from(n))
            } else {
                Err(out_of_range())
            }
        }
        ParamType::StringArray { max_items } => check_string_array(name, value, max_items),
        ParamType::Url => {
            let s = expect_str(name, &value)?;
            check_len(name, s, MAX_TEXT_CHARS)?;
            check_url(name, s)?;
            Ok(value)
        }
    }
}

fn expect_str<'a>(name: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| DispatchError::invalid(name, "must be a string"))
}

fn check_len(name: &str, s: &str, max_len: usize) -> Result<()> {
    if s.chars().count() > max_len {
        return Err(DispatchError::invalid(
            name,
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(())
}

/// Integers, or floats with no fractional part (some clients send `3.0`).
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    #[allow(clippy::cast_possible_truncation)]
    let n = f as i64;
    #[allow(clippy::cast_precision_loss)]
    (f.fract() == 0.0 && (n as f64) == f).then_some(n)
}

/// Arrays of strings. A comma-separated string is accepted and split.
fn check_string_array(name: &str, value: Value, max_items: usize) -> Result<Value> {
    let items: Vec<String> = match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| match v {
                Value::String(s) if !s.is_empty() => Ok(s),
                _ => Err(DispatchError::invalid(
                    name,
                    "must be an array of non-empty strings",
                )),
            })
            .collect::<Result<_>>()?,
        _ => {
            return Err(DispatchError::invalid(
                name,
                "must be an array of strings",
            ));
        }
    };

    if items.len() > max_items {
        return Err(DispatchError::invalid(
            name,
            format!("must have at most {max_items} entries"),
        ));
    }
    Ok(Value::from(items))
}

fn check_url(name: &str, s: &str) -> Result<()> {
    let invalid = || DispatchError::invalid(name, "must be an absolute http(s) URL");
    let url = Url::parse(s).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(())
}
