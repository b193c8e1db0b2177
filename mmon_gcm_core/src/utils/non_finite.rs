//! Serde adapter for `f64` values that may be infinite or NaN
//!
//! JSON has no representation for non-finite numbers (serde_json writes them as
//! `null`), so they are written as the strings `"inf"`, `"-inf"` and `"NaN"`.
//! Use with `#[serde(with = "crate::utils::non_finite")]`.
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Repr::deserialize(deserializer)? {
        Repr::Number(value) => Ok(value),
        Repr::Text(text) => match text.as_str() {
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            "NaN" => Ok(f64::NAN),
            other => Err(D::Error::custom(format!("invalid float {}", other))),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Bound {
        #[serde(with = "super")]
        value: f64,
    }

    #[test]
    fn infinite_values_survive_json() {
        let json = serde_json::to_string(&Bound { value: f64::NEG_INFINITY }).unwrap();
        assert_eq!(json, r#"{"value":"-inf"}"#);
        let bound: Bound = serde_json::from_str(&json).unwrap();
        assert_eq!(bound.value, f64::NEG_INFINITY);
        let bound: Bound = serde_json::from_str(r#"{"value":3}"#).unwrap();
        assert_eq!(bound.value, 3.);
        assert!(serde_json::from_str::<Bound>(r#"{"value":"big"}"#).is_err());
    }
}
