//! Weakly-typed provider payloads and optional-chained access into them
//!
//! Payloads arrive as JSON trees in which any group or leaf may be missing.
//! Lookups return `Option` and compose with `and_then`; nothing here fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A nested key path, e.g. `&["outdoor", "temperature"]`.
pub type FieldPath = &'static [&'static str];

/// Raw realtime payload for one station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawStationPayload(Value);

/// Raw history payload holding per-metric `timestamp -> value` maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawHistoricalPayload(Value);

/// Response wrapper fields (`code`, `msg`, `time`) some providers add.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub time: Option<DateTime<Utc>>,
}

impl Envelope {
    /// A missing code counts as success.
    pub fn is_success(&self) -> bool {
        self.code.map_or(true, |c| c == 0)
    }
}

/// A reading leaf such as `{"value": "21.3", "unit": "℃"}`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Leaf<'a> {
    /// `None` when the value is absent or not a finite number.
    pub value: Option<f64>,
    pub unit: Option<&'a str>,
}

macro_rules! payload_impl {
    ($ty:ident) => {
        impl $ty {
            pub fn new(value: Value) -> Self {
                Self(value)
            }

            pub fn from_json(s: &str) -> serde_json::Result<Self> {
                serde_json::from_str(s).map(Self)
            }

            /// The whole tree, envelope included.
            pub fn raw(&self) -> &Value {
                &self.0
            }

            /// The `data` object when wrapped in an envelope, else the root.
            pub fn body(&self) -> &Value {
                body_of(&self.0)
            }

            pub fn envelope(&self) -> Envelope {
                envelope_of(&self.0)
            }

            pub fn into_inner(self) -> Value {
                self.0
            }
        }

        impl From<Value> for $ty {
            fn from(value: Value) -> Self {
                Self(value)
            }
        }
    };
}

payload_impl!(RawStationPayload);
payload_impl!(RawHistoricalPayload);

fn body_of(root: &Value) -> &Value {
    match root.get("data") {
        Some(data) if data.is_object() => data,
        _ => root,
    }
}

fn envelope_of(root: &Value) -> Envelope {
    Envelope {
        code: root.get("code").and_then(parse_integer),
        message: root
            .get("msg")
            .and_then(Value::as_str)
            .map(str::to_string),
        time: root
            .get("time")
            .and_then(parse_integer)
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
    }
}

/// Follow `path` from `root`; `None` as soon as a key is missing.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |node, key| node.get(*key))
        .filter(|v| !v.is_null())
}

/// First candidate path that resolves to a non-null node.
pub fn first_present<'a>(root: &'a Value, candidates: &[FieldPath]) -> Option<&'a Value> {
    candidates.iter().find_map(|path| lookup(root, path))
}

/// Parse a numeric value sent either as a JSON number or as text.
///
/// Non-finite results (`"NaN"`, `"inf"`) are rejected.
pub fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Read a leaf node. A bare scalar is accepted as a unitless value.
pub fn leaf(node: &Value) -> Leaf<'_> {
    match node {
        Value::Object(map) => Leaf {
            value: map.get("value").and_then(parse_number),
            unit: map.get("unit").and_then(Value::as_str),
        },
        other => Leaf {
            value: parse_number(other),
            unit: None,
        },
    }
}

/// Leaf at the first present candidate path.
pub fn leaf_at<'a>(root: &'a Value, candidates: &[FieldPath]) -> Option<Leaf<'a>> {
    first_present(root, candidates).map(leaf)
}

/// First non-empty string among the candidate paths.
pub fn text_at<'a>(root: &'a Value, candidates: &[FieldPath]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|path| lookup(root, path).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}
