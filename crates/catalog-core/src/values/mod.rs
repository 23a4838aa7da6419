pub mod id;
pub mod path;

pub use id::RecordId;
pub use path::{FieldPath, PathSegment};

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Field map of a single record, ordered by field name.
pub type Fields = BTreeMap<String, FieldValue>;

/// A JSON-shaped field value as the backend sends it.
///
/// Integers and floats are kept apart so that a phone number stays an
/// integer after a round trip through the dashboard. Equality is
/// structural and recursive, which is what dirty tracking relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum FieldValue {
    Null,
    Int64(i64),
    Float64(f64),
    Boolean(bool),
    String(String),
    Array(Vec<FieldValue>),
    Object(Fields),
}

impl FieldValue {
    /// Returns the type name as a string, useful for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int64(_) => "int64",
            Self::Float64(_) => "float64",
            Self::Boolean(_) => "boolean",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(n) => Some(*n),
            Self::Int64(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<FieldValue>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Fields> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Fields> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// String form used by text search.
    ///
    /// Scalars render the way a form field shows them: numbers in decimal,
    /// booleans as `true`/`false`. Null, arrays and objects have no text form
    /// and never match a query.
    pub fn search_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) => Some(Cow::Borrowed(s)),
            Self::Int64(n) => Some(Cow::Owned(n.to_string())),
            Self::Float64(n) => Some(Cow::Owned(n.to_string())),
            Self::Boolean(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Self::Null | Self::Array(_) | Self::Object(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// From conversions for ergonomic value construction
// ---------------------------------------------------------------------------

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Fields> for FieldValue {
    fn from(v: Fields) -> Self {
        Self::Object(v)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(v: Vec<FieldValue>) -> Self {
        Self::Array(v)
    }
}

// ---------------------------------------------------------------------------
// JSON interop
// ---------------------------------------------------------------------------

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int64(i)
                } else {
                    Self::Float64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(arr) => Self::Array(arr.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(obj) => {
                Self::Object(obj.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<FieldValue> for serde_json::Value {
    fn from(v: FieldValue) -> Self {
        match v {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Boolean(b) => serde_json::Value::Bool(b),
            FieldValue::Int64(i) => serde_json::json!(i),
            FieldValue::Float64(f) => serde_json::json!(f),
            FieldValue::String(s) => serde_json::Value::String(s),
            FieldValue::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            FieldValue::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Helper macro for constructing `FieldValue::Object` inline.
///
/// # Example
/// ```
/// use catalog_core::field_object;
/// use catalog_core::values::FieldValue;
///
/// let obj = field_object! {
///     "name" => "Kurti",
///     "stock" => 12i64
/// };
/// assert_eq!(obj.as_object().map(|o| o.len()), Some(2));
/// ```
#[macro_export]
macro_rules! field_object {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = $crate::values::Fields::new();
        $(
            map.insert($key.to_string(), $crate::values::FieldValue::from($value));
        )*
        $crate::values::FieldValue::Object(map)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names() {
        assert_eq!(FieldValue::Null.type_name(), "null");
        assert_eq!(FieldValue::Int64(42).type_name(), "int64");
        assert_eq!(FieldValue::Float64(2.72).type_name(), "float64");
        assert_eq!(FieldValue::Boolean(true).type_name(), "boolean");
        assert_eq!(FieldValue::String("hello".into()).type_name(), "string");
        assert_eq!(FieldValue::Array(vec![]).type_name(), "array");
        assert_eq!(FieldValue::Object(Fields::new()).type_name(), "object");
    }

    #[test]
    fn equality_is_structural() {
        let a = field_object! {
            "items" => vec![field_object! { "status" => "Pending" }],
        };
        let b = field_object! {
            "items" => vec![field_object! { "status" => "Pending" }],
        };
        let c = field_object! {
            "items" => vec![field_object! { "status" => "Delivered" }],
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(FieldValue::Int64(42), FieldValue::Float64(42.0));
    }

    #[test]
    fn search_text_of_scalars() {
        assert_eq!(FieldValue::from("Saree").search_text().as_deref(), Some("Saree"));
        assert_eq!(
            FieldValue::from(9876543210i64).search_text().as_deref(),
            Some("9876543210")
        );
        assert_eq!(FieldValue::from(499.5).search_text().as_deref(), Some("499.5"));
        assert_eq!(FieldValue::from(true).search_text().as_deref(), Some("true"));
        assert_eq!(FieldValue::Null.search_text(), None);
        assert_eq!(FieldValue::Array(vec![]).search_text(), None);
    }

    #[test]
    fn json_roundtrip_nested() {
        let original = field_object! {
            "firstName" => "Asha",
            "address" => field_object! { "city" => "Jaipur", "number" => 9876543210i64 },
            "cartItems" => vec![field_object! { "price" => 1299.5, "quantity" => 2i64 }],
        };
        let json: serde_json::Value = original.clone().into();
        assert_eq!(json["address"]["city"], "Jaipur");
        assert_eq!(FieldValue::from(json), original);
    }

    #[test]
    fn serde_uses_plain_json() {
        let value: FieldValue = serde_json::from_str(r#"{"stock": 3, "tags": ["a"]}"#).unwrap();
        assert_eq!(
            value,
            field_object! { "stock" => 3i64, "tags" => vec![FieldValue::from("a")] }
        );
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"stock":3,"tags":["a"]}"#);
    }

    #[test]
    fn accessor_methods() {
        assert_eq!(FieldValue::String("hi".into()).as_str(), Some("hi"));
        assert_eq!(FieldValue::Int64(42).as_i64(), Some(42));
        assert_eq!(FieldValue::Int64(42).as_f64(), Some(42.0));
        assert_eq!(FieldValue::Boolean(true).as_bool(), Some(true));
        assert!(FieldValue::Null.is_null());
        assert_eq!(FieldValue::Null.as_str(), None);
        assert!(FieldValue::Array(vec![]).as_array().is_some());
    }
}
