//! Plan normalizer: reshapes model output into the canonical plan schema.
//!
//! This is the single place that knows about alternate field names. New
//! aliases go into the tables below, first match wins.

use serde_json::{Map, Value};

use super::model::{CareerOption, CareerPlan};

/// Accepted source keys for `why`, in priority order.
const WHY_KEYS: &[&str] = &["why_matched", "why"];
/// Accepted source keys for `example_programs`, in priority order.
const PROGRAM_KEYS: &[&str] = &["alt_programs", "example_programs"];

const DEFAULT_DIFFICULTY: &str = "medium";

/// Result of normalizing an arbitrary value.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// The input had a `careers` sequence and was reshaped.
    Plan(CareerPlan),
    /// The input was not plan-shaped and is returned untouched.
    Passthrough(Value),
}

impl Normalized {
    pub fn into_plan(self) -> Option<CareerPlan> {
        match self {
            Self::Plan(plan) => Some(plan),
            Self::Passthrough(_) => None,
        }
    }

    /// The normalized plan as JSON, or the original input.
    pub fn into_value(self) -> Value {
        match self {
            Self::Plan(plan) => serde_json::to_value(plan).unwrap_or(Value::Null),
            Self::Passthrough(value) => value,
        }
    }
}

/// Normalize a plan-like value.
///
/// Inputs whose `careers` is not an array are passed through unchanged.
/// Non-object entries inside `careers` are dropped.
pub fn normalize_plan(raw: Value) -> Normalized {
    let careers = match raw.get("careers") {
        Some(Value::Array(careers)) => careers,
        _ => return Normalized::Passthrough(raw),
    };

    let careers = careers
        .iter()
        .filter_map(Value::as_object)
        .map(normalize_career)
        .collect();

    Normalized::Plan(CareerPlan { careers })
}

fn normalize_career(entry: &Map<String, Value>) -> CareerOption {
    CareerOption {
        title: text_field(entry, &["title"]).unwrap_or_default(),
        why: text_field(entry, WHY_KEYS).unwrap_or_default(),
        path: text_field(entry, &["path"]).unwrap_or_default(),
        example_programs: first_present(entry, PROGRAM_KEYS)
            .map(string_list)
            .unwrap_or_default(),
        difficulty: text_field(entry, &["difficulty"])
            .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
        category: text_field(entry, &["category"]),
    }
}

/// First key in `keys` that is present with a non-null value.
fn first_present<'a>(entry: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .find(|value| !value.is_null())
}

fn text_field(entry: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_present(entry, keys).map(scalar_text)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
