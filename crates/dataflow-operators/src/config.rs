//! Small helpers for reading operator `config` maps out of the loosely
//! typed `serde_json::Value` the scheduler hands every operator, turning
//! a missing/mistyped key into the `operator_config_missing` category
//! uniformly across the library.

use dataflow_engine::{DataflowError, Result};
use serde_json::Value;

pub fn require_str<'a>(config: &'a Value, key: &str) -> Result<&'a str> {
    config
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DataflowError::config_missing(key))
}

pub fn opt_str<'a>(config: &'a Value, key: &str) -> Option<&'a str> {
    config.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

pub fn opt_str_or<'a>(config: &'a Value, key: &str, default: &'a str) -> &'a str {
    opt_str(config, key).unwrap_or(default)
}

pub fn opt_u64(config: &Value, key: &str, default: u64) -> u64 {
    config.get(key).and_then(|v| v.as_u64()).unwrap_or(default)
}

pub fn opt_f64(config: &Value, key: &str, default: f64) -> f64 {
    config.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
}

pub fn opt_bool(config: &Value, key: &str, default: bool) -> bool {
    config.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

/// Accepts either a bare string or a list of strings, the shape of
/// `left_on`/`right_on`/`join_keys`-style config fields.
pub fn str_or_list(config: &Value, key: &str) -> Option<Vec<String>> {
    match config.get(key)? {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()),
        _ => None,
    }
}

pub fn require_str_or_list(config: &Value, key: &str) -> Result<Vec<String>> {
    str_or_list(config, key).filter(|v| !v.is_empty()).ok_or_else(|| DataflowError::config_missing(key))
}

pub fn opt_str_list(config: &Value, key: &str) -> Vec<String> {
    str_or_list(config, key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_str_rejects_missing_and_empty_values() {
        let config = serde_json::json!({"a": "x", "b": ""});
        assert_eq!(require_str(&config, "a").unwrap(), "x");
        assert!(require_str(&config, "b").is_err());
        assert!(require_str(&config, "missing").is_err());
    }

    #[test]
    fn opt_str_or_falls_back_to_the_default() {
        let config = serde_json::json!({"a": "x"});
        assert_eq!(opt_str_or(&config, "a", "fallback"), "x");
        assert_eq!(opt_str_or(&config, "b", "fallback"), "fallback");
    }

    #[test]
    fn str_or_list_accepts_either_shape() {
        let config = serde_json::json!({"bare": "k1", "list": ["k1", "k2"], "other": 5});
        assert_eq!(str_or_list(&config, "bare").unwrap(), vec!["k1".to_string()]);
        assert_eq!(str_or_list(&config, "list").unwrap(), vec!["k1".to_string(), "k2".to_string()]);
        assert!(str_or_list(&config, "other").is_none());
        assert!(str_or_list(&config, "missing").is_none());
    }

    #[test]
    fn require_str_or_list_fails_on_empty_list() {
        let config = serde_json::json!({"empty": []});
        assert!(require_str_or_list(&config, "empty").is_err());
        assert!(require_str_or_list(&config, "missing").is_err());
    }

    #[test]
    fn opt_u64_f64_bool_fall_back_on_wrong_type() {
        let config = serde_json::json!({"n": 5, "f": 1.5, "b": true, "wrong": "nope"});
        assert_eq!(opt_u64(&config, "n", 9), 5);
        assert_eq!(opt_u64(&config, "wrong", 9), 9);
        assert_eq!(opt_f64(&config, "f", 0.0), 1.5);
        assert!(opt_bool(&config, "b", false));
        assert!(!opt_bool(&config, "missing", false));
    }
}
