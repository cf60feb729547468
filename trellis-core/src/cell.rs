//! Cell values and the cell validator.
//!
//! Storage is schema-flexible: a row's cells are a plain key -> value map and
//! nothing below the write path knows about column types. Every write path
//! (create, edit, suggestion) funnels raw client JSON through [`validate`],
//! so coercion rules live here and nowhere else.

use crate::{ColumnDef, ColumnType, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

static DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("Invalid date regex"));

/// A stored cell value. The typed union is enforced at write time only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret a client-supplied JSON value as a cell value without any
    /// coercion. Arrays and objects have no cell representation.
    pub fn from_json(value: &JsonValue) -> Option<CellValue> {
        match value {
            JsonValue::Null => Some(CellValue::Null),
            JsonValue::Bool(b) => Some(CellValue::Bool(*b)),
            JsonValue::Number(n) => n.as_f64().map(CellValue::Number),
            JsonValue::String(s) => Some(CellValue::Text(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            CellValue::Null => JsonValue::Null,
            CellValue::Bool(b) => JsonValue::Bool(*b),
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CellValue::Text(s) => JsonValue::String(s.clone()),
        }
    }

    /// Structural equality against a client-supplied JSON value.
    /// Numbers compare numerically, so `5` matches a stored `5.0`.
    pub fn matches_json(&self, value: &JsonValue) -> bool {
        CellValue::from_json(value).is_some_and(|other| &other == self)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("(empty)"),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// Outcome of validating one raw value against a column type.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValidation {
    /// Accepted, possibly after coercion.
    Valid(CellValue),
    /// Rejected with a human-readable reason.
    Invalid(String),
}

impl CellValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, CellValidation::Valid(_))
    }

    pub fn coerced(&self) -> Option<&CellValue> {
        match self {
            CellValidation::Valid(value) => Some(value),
            CellValidation::Invalid(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CellValidation::Valid(_) => None,
            CellValidation::Invalid(reason) => Some(reason),
        }
    }

    /// Translate into a field-named validation error at the boundary.
    pub fn into_result(self, field: &str) -> Result<CellValue, ValidationError> {
        match self {
            CellValidation::Valid(value) => Ok(value),
            CellValidation::Invalid(reason) => Err(ValidationError::InvalidValue {
                field: field.to_string(),
                reason,
            }),
        }
    }
}

/// Check and coerce `value` against `column_type`.
///
/// `options` is only consulted for [`ColumnType::Select`].
pub fn validate(value: &JsonValue, column_type: ColumnType, options: &[String]) -> CellValidation {
    if value.is_null() {
        return CellValidation::Valid(CellValue::Null);
    }

    match column_type {
        ColumnType::Text | ColumnType::Longtext => CellValidation::Valid(CellValue::Text(stringify(value))),
        ColumnType::Number => coerce_number(value),
        ColumnType::Checkbox => CellValidation::Valid(CellValue::Bool(truthy(value))),
        ColumnType::Date => match value {
            JsonValue::String(s) if DATE_PREFIX.is_match(s) => {
                CellValidation::Valid(CellValue::Text(s.clone()))
            }
            _ => CellValidation::Invalid("expected a date in YYYY-MM-DD format".to_string()),
        },
        // Stale option references degrade to an empty cell instead of failing the write.
        ColumnType::Select => match value {
            JsonValue::String(s) if options.iter().any(|o| o == s) => {
                CellValidation::Valid(CellValue::Text(s.clone()))
            }
            _ => CellValidation::Valid(CellValue::Null),
        },
    }
}

/// Validate against a column definition.
pub fn validate_for_column(value: &JsonValue, column: &ColumnDef) -> CellValidation {
    validate(value, column.column_type, &column.options)
}

fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => String::new(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string(),
    }
}

fn coerce_number(value: &JsonValue) -> CellValidation {
    match value {
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => CellValidation::Valid(CellValue::Number(f)),
            _ => CellValidation::Invalid("number is out of range".to_string()),
        },
        JsonValue::String(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() && !trimmed.is_empty() && is_decimal(trimmed) => {
                    CellValidation::Valid(CellValue::Number(f))
                }
                _ => CellValidation::Invalid(format!("'{}' is not a number", s)),
            }
        }
        _ => CellValidation::Invalid("expected a number".to_string()),
    }
}

/// `f64::from_str` also accepts `inf` and `NaN`; only plain decimals count here.
fn is_decimal(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status_options() -> Vec<String> {
        ["Applied", "Rejected", "Interview", "Offer"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_null_is_valid_for_every_type() {
        for ty in [
            ColumnType::Text,
            ColumnType::Longtext,
            ColumnType::Number,
            ColumnType::Checkbox,
            ColumnType::Date,
            ColumnType::Select,
        ] {
            assert_eq!(validate(&JsonValue::Null, ty, &[]), CellValidation::Valid(CellValue::Null));
        }
    }

    #[test]
    fn test_text_stringifies() {
        assert_eq!(
            validate(&json!(42), ColumnType::Text, &[]),
            CellValidation::Valid(CellValue::Text("42".to_string()))
        );
        assert_eq!(
            validate(&json!(true), ColumnType::Longtext, &[]),
            CellValidation::Valid(CellValue::Text("true".to_string()))
        );
        assert_eq!(
            validate(&json!(["a", 1]), ColumnType::Text, &[]),
            CellValidation::Valid(CellValue::Text("[\"a\",1]".to_string()))
        );
    }

    #[test]
    fn test_number_parses_numeric_strings() {
        assert_eq!(
            validate(&json!(" 12.5 "), ColumnType::Number, &[]),
            CellValidation::Valid(CellValue::Number(12.5))
        );
        assert_eq!(
            validate(&json!(7), ColumnType::Number, &[]),
            CellValidation::Valid(CellValue::Number(7.0))
        );
    }

    #[test]
    fn test_number_rejects_non_numeric() {
        assert!(!validate(&json!("twelve"), ColumnType::Number, &[]).is_valid());
        assert!(!validate(&json!(""), ColumnType::Number, &[]).is_valid());
        assert!(!validate(&json!("NaN"), ColumnType::Number, &[]).is_valid());
        assert!(!validate(&json!("inf"), ColumnType::Number, &[]).is_valid());
        assert!(!validate(&json!(true), ColumnType::Number, &[]).is_valid());
        assert!(!validate(&json!({"n": 1}), ColumnType::Number, &[]).is_valid());
    }

    #[test]
    fn test_checkbox_truthiness() {
        let cases = [
            (json!(false), false),
            (json!(0), false),
            (json!(""), false),
            (json!(true), true),
            (json!(1), true),
            (json!("false"), true),
            (json!([]), true),
        ];
        for (input, expected) in cases {
            assert_eq!(
                validate(&input, ColumnType::Checkbox, &[]),
                CellValidation::Valid(CellValue::Bool(expected)),
                "input {}",
                input
            );
        }
    }

    #[test]
    fn test_date_requires_prefix() {
        assert_eq!(
            validate(&json!("2024-03-01"), ColumnType::Date, &[]),
            CellValidation::Valid(CellValue::Text("2024-03-01".to_string()))
        );
        assert!(validate(&json!("2024-03-01T10:00:00Z"), ColumnType::Date, &[]).is_valid());
        assert!(!validate(&json!("03/01/2024"), ColumnType::Date, &[]).is_valid());
        assert!(!validate(&json!(20240301), ColumnType::Date, &[]).is_valid());
        // Only ASCII digits count.
        assert!(!validate(&json!("٢٠٢٤-٠١-٠١"), ColumnType::Date, &[]).is_valid());
        assert!(!validate(&json!("２０２４-０１-０１"), ColumnType::Date, &[]).is_valid());
    }

    #[test]
    fn test_select_soft_failure() {
        let options = status_options();
        assert_eq!(
            validate(&json!("Offer"), ColumnType::Select, &options),
            CellValidation::Valid(CellValue::Text("Offer".to_string()))
        );
        assert_eq!(
            validate(&json!("Ghosted"), ColumnType::Select, &options),
            CellValidation::Valid(CellValue::Null)
        );
        assert_eq!(
            validate(&json!(3), ColumnType::Select, &options),
            CellValidation::Valid(CellValue::Null)
        );
    }

    #[test]
    fn test_into_result_names_field() {
        let err = validate(&json!("soon"), ColumnType::Date, &[])
            .into_result("dateApplied")
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "dateApplied"));
    }

    #[test]
    fn test_cell_value_json_shape() {
        let json = serde_json::to_value(CellValue::Null).expect("serialize");
        assert_eq!(json, JsonValue::Null);
        let parsed: CellValue = serde_json::from_value(json!("Acme")).expect("deserialize");
        assert_eq!(parsed, CellValue::Text("Acme".to_string()));
        let parsed: CellValue = serde_json::from_value(json!(3)).expect("deserialize");
        assert_eq!(parsed, CellValue::Number(3.0));
    }

    #[test]
    fn test_matches_json_numeric() {
        assert!(CellValue::Number(5.0).matches_json(&json!(5)));
        assert!(CellValue::Null.matches_json(&JsonValue::Null));
        assert!(!CellValue::Text("5".to_string()).matches_json(&json!(5)));
        assert!(!CellValue::Null.matches_json(&json!({})));
    }
}
