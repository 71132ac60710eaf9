//! Named value extractors.
//!
//! A [`Metric<R>`] is a name plus a pure function from a record `&R` to a
//! [`Value`]. Extraction must be referentially transparent: the same record
//! always yields the same value. A record lacking what the metric reads is an
//! error, never a default.
//!
//! # Example
//! ```
//! use crosstally::{Metric, Value};
//! use serde_json::json;
//!
//! let direction = Metric::field("direction", "direction");
//! let msg_type = Metric::first_pointer(
//!     "messageType",
//!     ["/body/0/metadata/messageType", "/body/metadata/messageType"],
//! );
//!
//! let rec = json!({"direction": "IN", "body": {"metadata": {"messageType": "Cancel"}}});
//! assert_eq!(direction.extract(&rec), Ok(Value::from("IN")));
//! assert_eq!(msg_type.extract(&rec), Ok(Value::from("Cancel")));
//! ```

use crate::error::ExtractReason;
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

type ExtractFn<R> = dyn Fn(&R) -> Result<Value, ExtractReason> + Send + Sync;

/// A named, immutable classification function over records of type `R`.
pub struct Metric<R> {
    name: String,
    extract: Arc<ExtractFn<R>>,
}

impl<R> Metric<R> {
    /// Build a metric from an extractor that returns `None` when the value is
    /// absent.
    pub fn new<V, F>(name: impl Into<String>, f: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&R) -> Option<V> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            extract: Arc::new(move |r: &R| {
                f(r).map(Into::into)
                    .ok_or_else(|| ExtractReason::missing("value"))
            }),
        }
    }

    /// Build a metric from a fallible extractor with its own failure reasons.
    pub fn try_new<V, F>(name: impl Into<String>, f: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&R) -> Result<V, ExtractReason> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            extract: Arc::new(move |r: &R| f(r).map(Into::into)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the extractor on one record.
    ///
    /// # Errors
    /// Returns the extractor's [`ExtractReason`] when no value can be produced.
    pub fn extract(&self, record: &R) -> Result<Value, ExtractReason> {
        (self.extract)(record)
    }
}

impl<R> Clone for Metric<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<R> fmt::Debug for Metric<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Metric<{}>", self.name)
    }
}

/* ===================== JSON records ===================== */

impl Metric<JsonValue> {
    /// Read a top-level object field.
    pub fn field(name: impl Into<String>, key: impl Into<String>) -> Self {
        let key = key.into();
        Self::try_new(name, move |r: &JsonValue| {
            let v = r
                .get(&key)
                .ok_or_else(|| ExtractReason::missing(format!("field '{key}'")))?;
            json_scalar(v)
        })
    }

    /// Read the value at an RFC 6901 JSON pointer (e.g. `/body/metadata/type`).
    pub fn pointer(name: impl Into<String>, pointer: impl Into<String>) -> Self {
        let pointer = pointer.into();
        Self::try_new(name, move |r: &JsonValue| {
            let v = r
                .pointer(&pointer)
                .ok_or_else(|| ExtractReason::missing(format!("path '{pointer}'")))?;
            json_scalar(v)
        })
    }

    /// Read the first of several pointers that resolves.
    ///
    /// Useful when the same logical field sits at different paths depending
    /// on record shape (a single body object vs. a list of bodies).
    pub fn first_pointer<I, S>(name: impl Into<String>, pointers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pointers: Vec<String> = pointers.into_iter().map(Into::into).collect();
        Self::try_new(name, move |r: &JsonValue| {
            let v = pointers
                .iter()
                .find_map(|p| r.pointer(p))
                .ok_or_else(|| ExtractReason::missing(format!("any of {pointers:?}")))?;
            json_scalar(v)
        })
    }
}

/// Convert a JSON scalar into a [`Value`].
///
/// # Errors
/// Floats, out-of-range integers, arrays and objects are
/// [`ExtractReason::Unsupported`].
pub fn json_scalar(v: &JsonValue) -> Result<Value, ExtractReason> {
    match v {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| ExtractReason::unsupported(format!("number {n}"))),
        JsonValue::String(s) => Ok(Value::Str(s.clone())),
        JsonValue::Array(_) => Err(ExtractReason::unsupported("array")),
        JsonValue::Object(_) => Err(ExtractReason::unsupported("object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_reports_missing_key() {
        let m = Metric::field("session", "sessionId");
        let err = m.extract(&json!({"direction": "IN"})).unwrap_err();
        assert_eq!(err, ExtractReason::missing("field 'sessionId'"));
    }

    #[test]
    fn json_scalars_map_to_values() {
        assert_eq!(json_scalar(&json!(null)), Ok(Value::Null));
        assert_eq!(json_scalar(&json!(false)), Ok(Value::Bool(false)));
        assert_eq!(json_scalar(&json!(-4)), Ok(Value::Int(-4)));
        assert!(matches!(
            json_scalar(&json!(1.5)),
            Err(ExtractReason::Unsupported(_))
        ));
        assert!(matches!(
            json_scalar(&json!([1])),
            Err(ExtractReason::Unsupported(_))
        ));
    }

    #[test]
    fn first_pointer_handles_both_body_shapes() {
        let m = Metric::first_pointer(
            "messageType",
            ["/body/0/metadata/messageType", "/body/metadata/messageType"],
        );
        let listed = json!({"body": [{"metadata": {"messageType": "Amend"}}]});
        let single = json!({"body": {"metadata": {"messageType": "Cancel"}}});
        assert_eq!(m.extract(&listed), Ok(Value::from("Amend")));
        assert_eq!(m.extract(&single), Ok(Value::from("Cancel")));
        assert!(m.extract(&json!({"body": {}})).is_err());
    }

    #[test]
    fn closures_over_plain_structs() {
        struct Event {
            successful: bool,
        }
        let m = Metric::new("successful", |e: &Event| Some(e.successful));
        assert_eq!(m.extract(&Event { successful: true }), Ok(Value::Bool(true)));
        assert_eq!(format!("{m:?}"), "Metric<successful>");
    }
}
