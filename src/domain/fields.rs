//! Lenient field decoding for backend records.
//!
//! The backend is inconsistent about scalar encodings: ids arrive as numbers
//! or strings, flags as booleans, `0`/`1`, or `"true"`/`"yes"`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Truthiness of a publish-style flag.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        _ => false,
    }
}

/// Render a scalar as a plain string (numbers without quotes).
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Number or numeric string to `u64`.
pub fn scalar_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64))
        }
        _ => None,
    }
}

pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(&value).ok_or_else(|| serde::de::Error::custom("expected string or number id"))
}

pub fn opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value))
}

pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

pub fn opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Number or numeric string to `i64`, e.g. a year that may be BCE.
pub fn opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    })
}

pub fn opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_u64(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy_variants() {
        for v in [json!(true), json!(1), json!("1"), json!("true"), json!(" YES "), json!("on")] {
            assert!(is_truthy(&v), "{v} should be truthy");
        }
        for v in [json!(false), json!(0), json!("0"), json!("false"), json!("no"), json!(null), json!([])] {
            assert!(!is_truthy(&v), "{v} should be falsy");
        }
    }

    #[test]
    fn test_scalar_to_u64() {
        assert_eq!(scalar_to_u64(&json!(7)), Some(7));
        assert_eq!(scalar_to_u64(&json!("12")), Some(12));
        assert_eq!(scalar_to_u64(&json!("3.0")), Some(3));
        assert_eq!(scalar_to_u64(&json!("abc")), None);
        assert_eq!(scalar_to_u64(&json!(-4)), None);
    }

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "id")]
        id: String,
        #[serde(default, deserialize_with = "flag")]
        on: bool,
        #[serde(default, deserialize_with = "opt_f64")]
        price: Option<f64>,
    }

    #[test]
    fn test_record_helpers() {
        let p: Sample = serde_json::from_value(json!({"id": 42, "on": "yes", "price": "9.5"})).unwrap();
        assert_eq!(p.id, "42");
        assert!(p.on);
        assert_eq!(p.price, Some(9.5));

        let p: Sample = serde_json::from_value(json!({"id": "a-1"})).unwrap();
        assert_eq!(p.id, "a-1");
        assert!(!p.on);
        assert_eq!(p.price, None);
    }
}
