//! Dataset snapshot returned by the backend, and the scalar helpers used to chart its cells.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// One row: column name → scalar as received from the backend.
pub type Row = Map<String, Value>;

/// Client-held representation of an uploaded dataset. Replaced wholesale on each upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    pub rows: u64,
    pub columns: Vec<String>,
    #[serde(default)]
    pub preview: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_data: Option<Vec<Row>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl DatasetSnapshot {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

fn decimal_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("static regex is valid")
    })
}

fn parse_numeric_str(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix = match t.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix(&t[2..], radix);
    }
    if decimal_literal().is_match(t) {
        t.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// Unsigned digits after a `0x`/`0o`/`0b` prefix. Values past `u64` keep growing as a float.
fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return f64::NAN;
    }
    match u64::from_str_radix(digits, radix) {
        Ok(v) => v as f64,
        Err(_) => digits
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d)),
    }
}

/// Numeric value of a cell. `None` is a missing key and yields NaN; null yields 0.
pub fn numeric(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_numeric_str(s),
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

/// Whether a cell counts as present for "Y or X" fallbacks.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Display text for a cell, used for chart labels and the preview table.
pub fn label_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_matches_number_semantics() {
        assert_eq!(numeric(Some(&json!(42))), 42.0);
        assert_eq!(numeric(Some(&json!(2.5))), 2.5);
        assert_eq!(numeric(Some(&json!(" 7 "))), 7.0);
        assert_eq!(numeric(Some(&json!("1e3"))), 1000.0);
        assert_eq!(numeric(Some(&json!(".5"))), 0.5);
        assert_eq!(numeric(Some(&json!("0x10"))), 16.0);
        assert!(numeric(Some(&json!("0x+10"))).is_nan());
        assert!(numeric(Some(&json!("0b-1"))).is_nan());
        assert!(numeric(Some(&json!("0x"))).is_nan());
        assert_eq!(numeric(Some(&json!("0o17"))), 15.0);
        // 2^64, one past u64::MAX
        assert_eq!(numeric(Some(&json!("0x10000000000000000"))), 18446744073709551616.0);
        assert_eq!(numeric(Some(&json!(""))), 0.0);
        assert_eq!(numeric(Some(&json!(null))), 0.0);
        assert_eq!(numeric(Some(&json!(true))), 1.0);
        assert_eq!(numeric(Some(&json!("-Infinity"))), f64::NEG_INFINITY);
        assert!(numeric(Some(&json!("abc"))).is_nan());
        assert!(numeric(Some(&json!("inf"))).is_nan());
        assert!(numeric(Some(&json!("NaN"))).is_nan());
        assert!(numeric(Some(&json!("12px"))).is_nan());
        assert!(numeric(None).is_nan());
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!(3))));
    }

    #[test]
    fn labels() {
        assert_eq!(label_text(Some(&json!("alice"))), "alice");
        assert_eq!(label_text(Some(&json!(3))), "3");
        assert_eq!(label_text(Some(&json!(3.0))), "3");
        assert_eq!(label_text(Some(&json!(3.25))), "3.25");
        assert_eq!(label_text(Some(&json!(null))), "");
        assert_eq!(label_text(None), "");
    }

    #[test]
    fn deserialize_upload_response() {
        let body = json!({
            "filename": "people.csv",
            "columns": ["name", "score"],
            "rows": 2,
            "preview": [{"name": "a", "score": 1}, {"name": "b", "score": 2}],
            "full_data": [{"name": "a", "score": 1}, {"name": "b", "score": 2}],
            "unexpected": true
        });
        let snap: DatasetSnapshot = serde_json::from_value(body).unwrap();
        assert_eq!(snap.rows, 2);
        assert_eq!(snap.column_count(), 2);
        assert_eq!(snap.preview.len(), 2);
        assert_eq!(snap.full_data.as_ref().map(Vec::len), Some(2));
        assert_eq!(snap.filename.as_deref(), Some("people.csv"));
        assert!(snap.has_column("score"));
    }

    #[test]
    fn preview_defaults_to_empty() {
        let snap: DatasetSnapshot =
            serde_json::from_value(json!({"rows": 0, "columns": []})).unwrap();
        assert!(snap.preview.is_empty());
        assert!(snap.full_data.is_none());
    }
}
