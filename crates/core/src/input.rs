//! Lenient coercion of loosely-typed JSON input.
//!
//! Browser forms send numbers where text is expected (house numbers, phones)
//! and text where numbers are expected (amounts typed into inputs). These
//! helpers turn such scalars into the types the domain uses without failing
//! the whole request.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

/// Render a JSON scalar as text. Objects, arrays and `null` yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce a JSON value into a finite amount, defaulting to `0.0`.
pub fn lenient_amount(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// `deserialize_with` helper: accept any JSON scalar as optional text.
pub fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_text))
}

/// `deserialize_with` helper: a nested JSON object, or `None` when the value
/// is anything else (text, arrays, `null`) or does not fit `T`.
pub fn loose_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => Ok(serde_json::from_value(value).ok()),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn scalars_become_text() {
        assert_eq!(scalar_text(&json!("abc")), Some("abc".into()));
        assert_eq!(scalar_text(&json!(42)), Some("42".into()));
        assert_eq!(scalar_text(&json!(true)), Some("true".into()));
        assert_eq!(scalar_text(&json!({"a": 1})), None);
        assert_eq!(scalar_text(&Value::Null), None);
    }

    #[test]
    fn amounts_default_to_zero() {
        assert_eq!(lenient_amount(Some(&json!(12.5))), 12.5);
        assert_eq!(lenient_amount(Some(&json!(" 40 "))), 40.0);
        assert_eq!(lenient_amount(Some(&json!("doze"))), 0.0);
        assert_eq!(lenient_amount(Some(&json!("NaN"))), 0.0);
        assert_eq!(lenient_amount(Some(&json!([1]))), 0.0);
        assert_eq!(lenient_amount(None), 0.0);
    }

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "loose_text")]
        numero: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct Nested {
        #[serde(default, deserialize_with = "loose_object")]
        form: Option<Form>,
    }

    #[test]
    fn loose_object_ignores_non_objects() {
        let n: Nested = serde_json::from_value(json!({"form": {"numero": "7"}})).unwrap();
        assert_eq!(n.form.and_then(|f| f.numero).as_deref(), Some("7"));

        for odd in [json!("Rua A 1, Lisboa"), json!([1, 2]), json!(3), Value::Null] {
            let n: Nested = serde_json::from_value(json!({ "form": odd })).unwrap();
            assert!(n.form.is_none());
        }
        let n: Nested = serde_json::from_value(json!({})).unwrap();
        assert!(n.form.is_none());
    }

    #[test]
    fn loose_text_accepts_numbers_and_missing_fields() {
        let f: Form = serde_json::from_value(json!({"numero": 221})).unwrap();
        assert_eq!(f.numero.as_deref(), Some("221"));
        let f: Form = serde_json::from_value(json!({})).unwrap();
        assert_eq!(f.numero, None);
    }
}
