//! Ratings pool place records and normalization
//!
//! Place data arrives loosely typed: from the generative model's JSON output
//! or from the bulk ingest endpoint. Everything crosses [`RawPlace`] first,
//! so code past this module only ever handles a [`PlaceDraft`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored ratings pool record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Derived de-duplication key (see [`crate::slug::pool_key`])
    pub id: String,
    pub name: String,
    /// 0-10 scale
    pub rating: f64,
    /// "$" through "$$$$", or empty when unknown
    pub price: String,
    pub cuisine: Vec<String>,
    /// Neighborhood first, city last
    pub location: Vec<String>,
    /// RFC 3339 timestamp of the last write
    pub created_at: String,
}

/// Canonical place shape before it is keyed and stamped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDraft {
    pub name: String,
    pub rating: f64,
    pub price: String,
    pub cuisine: Vec<String>,
    pub location: Vec<String>,
}

impl PlaceDraft {
    /// A place without a (non-whitespace) name is not a valid place
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Loosely-typed place input at the normalization boundary
#[derive(Debug, Clone, PartialEq)]
pub enum RawPlace {
    /// A JSON object, coerced field by field
    Valid(PlaceDraft),
    /// Anything that is not a JSON object (null, scalars, arrays)
    Malformed(Value),
}

impl RawPlace {
    /// Classify an arbitrary JSON value. Never fails.
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Object(_) => RawPlace::Valid(normalize_object(&value)),
            other => RawPlace::Malformed(other),
        }
    }

    /// Canonical draft; malformed input yields the empty draft, which the
    /// name filter later drops.
    pub fn into_draft(self) -> PlaceDraft {
        match self {
            RawPlace::Valid(draft) => draft,
            RawPlace::Malformed(value) => {
                tracing::debug!(kind = value_kind(&value), "Malformed place entry");
                PlaceDraft::default()
            }
        }
    }
}

/// Normalize one loosely-typed place value
pub fn normalize_place(value: Value) -> PlaceDraft {
    RawPlace::classify(value).into_draft()
}

/// Normalize every element of a list of loosely-typed place values
pub fn normalize_places(values: Vec<Value>) -> Vec<PlaceDraft> {
    values.into_iter().map(normalize_place).collect()
}

/// Drop drafts whose name is empty or whitespace-only
pub fn retain_named(drafts: Vec<PlaceDraft>) -> Vec<PlaceDraft> {
    drafts.into_iter().filter(PlaceDraft::has_name).collect()
}

/// Find the list of places in a parsed payload
///
/// Accepts a bare array, or an object carrying the array under `places`.
/// Anything else yields no places.
pub fn extract_place_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("places") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn normalize_object(value: &Value) -> PlaceDraft {
    let price = match value.get("price").and_then(Value::as_str) {
        Some(price) => price.to_string(),
        None => value
            .get("pricey")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    };

    PlaceDraft {
        name: coerce_name(value.get("name")),
        rating: coerce_rating(value.get("rating")),
        price,
        cuisine: coerce_string_list(value.get("cuisine")),
        location: coerce_string_list(value.get("location")),
    }
}

fn coerce_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn coerce_rating(value: Option<&Value>) -> f64 {
    let rating = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    if rating.is_finite() {
        rating
    } else {
        0.0
    }
}

/// Arrays only: a scalar is not promoted to a one-element list
fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
