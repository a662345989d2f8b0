//! The scalar cell value and its element-kind tag.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The inferred element kind of a column.
///
/// `Unknown` covers columns that have never seen a non-absent value (a
/// freshly created all-absent column, for instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Integer,
    Real,
    Text,
    Boolean,
    Timestamp,
    Date,
    Unknown,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElementKind::Integer => "integer",
            ElementKind::Real => "real",
            ElementKind::Text => "text",
            ElementKind::Boolean => "boolean",
            ElementKind::Timestamp => "timestamp",
            ElementKind::Date => "date",
            ElementKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A single cell value. `Absent` is first-class: missing data is never
/// represented by a sentinel embedded in another variant.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Absent,
}

impl Value {
    pub fn kind(&self) -> ElementKind {
        match self {
            Value::Integer(_) => ElementKind::Integer,
            Value::Real(_) => ElementKind::Real,
            Value::Text(_) => ElementKind::Text,
            Value::Boolean(_) => ElementKind::Boolean,
            Value::Timestamp(_) => ElementKind::Timestamp,
            Value::Date(_) => ElementKind::Date,
            Value::Absent => ElementKind::Unknown,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Best-effort numeric coercion, used by arithmetic and aggregation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => {
                if r.is_finite() {
                    Some(*r)
                } else {
                    None
                }
            }
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Stringified form used for join/merge key normalization: integers and
    /// text that represent the same logical value must compare equal.
    pub fn normalized_key(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => {
                if r.fract() == 0.0 && r.is_finite() {
                    format!("{}", *r as i64)
                } else {
                    r.to_string()
                }
            }
            Value::Text(s) => s.trim().to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Absent => String::new(),
        }
    }

    /// Rendering used by `to_text` coercion and display contexts.
    pub fn display_text(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Absent => String::new(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            Value::Real(r) => Some(*r != 0.0),
            Value::Text(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            Value::Absent => None,
            _ => None,
        }
    }

    /// Safe JSON projection: absent/NaN/infinite become an
    /// empty string, timestamps render ISO-8601 with seconds precision.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Integer(i) => serde_json::json!(i),
            Value::Real(r) => {
                if r.is_finite() {
                    serde_json::json!(r)
                } else {
                    serde_json::json!("")
                }
            }
            Value::Text(s) => serde_json::json!(s),
            Value::Boolean(b) => serde_json::json!(b),
            Value::Timestamp(ts) => serde_json::json!(ts.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Value::Date(d) => serde_json::json!(d.format("%Y-%m-%d").to_string()),
            Value::Absent => serde_json::json!(""),
        }
    }

    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Absent, Value::Absent) => Some(Ordering::Equal),
            (Value::Absent, _) => Some(Ordering::Less),
            (_, Value::Absent) => Some(Ordering::Greater),
            _ => {
                if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
                    return a.partial_cmp(&b);
                }
                self.display_text().partial_cmp(&other.display_text())
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) => true,
            (Value::Absent, _) | (_, Value::Absent) => false,
            _ => {
                if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
                    a == b
                } else {
                    self.normalized_key() == other.normalized_key()
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_f64_rejects_nan_and_infinite_reals_but_coerces_text_and_booleans() {
        assert_eq!(Value::Real(f64::NAN).as_f64(), None);
        assert_eq!(Value::Real(f64::INFINITY).as_f64(), None);
        assert_eq!(Value::Text(" 3.5 ".to_string()).as_f64(), Some(3.5));
        assert_eq!(Value::Boolean(true).as_f64(), Some(1.0));
        assert_eq!(Value::Text("abc".to_string()).as_f64(), None);
    }

    #[test]
    fn to_json_maps_absent_and_non_finite_reals_to_empty_string() {
        assert_eq!(Value::Absent.to_json(), serde_json::json!(""));
        assert_eq!(Value::Real(f64::NAN).to_json(), serde_json::json!(""));
        assert_eq!(Value::Real(f64::INFINITY).to_json(), serde_json::json!(""));
        assert_eq!(Value::Real(1.5).to_json(), serde_json::json!(1.5));
    }

    #[test]
    fn normalized_key_unifies_integer_and_whole_valued_real_and_text() {
        assert_eq!(Value::Integer(42).normalized_key(), "42");
        assert_eq!(Value::Real(42.0).normalized_key(), "42");
        assert_eq!(Value::Text(" 42 ".to_string()).normalized_key(), "42");
        assert_eq!(Value::Real(42.5).normalized_key(), "42.5");
    }

    #[test]
    fn equality_treats_integer_and_text_of_the_same_number_as_equal_but_absent_only_equals_absent() {
        assert_eq!(Value::Integer(42), Value::Text("42".to_string()));
        assert_eq!(Value::Absent, Value::Absent);
        assert_ne!(Value::Integer(1), Value::Absent);
    }

    #[test]
    fn as_bool_parses_common_text_tokens_and_rejects_unknown_ones() {
        assert_eq!(Value::Text("true".to_string()).as_bool(), Some(true));
        assert_eq!(Value::Text("No".to_string()).as_bool(), Some(false));
        assert_eq!(Value::Text("maybe".to_string()).as_bool(), None);
        assert_eq!(Value::Integer(0).as_bool(), Some(false));
    }

    #[test]
    fn partial_cmp_value_orders_absent_below_everything_else() {
        use std::cmp::Ordering;
        assert_eq!(Value::Absent.partial_cmp_value(&Value::Integer(0)), Some(Ordering::Less));
        assert_eq!(Value::Integer(5).partial_cmp_value(&Value::Absent), Some(Ordering::Greater));
        assert_eq!(Value::Integer(1).partial_cmp_value(&Value::Integer(2)), Some(Ordering::Less));
    }
}
