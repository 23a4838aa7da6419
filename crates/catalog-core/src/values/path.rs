use super::{FieldValue, Fields};
use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a value inside a record, e.g. `address.city` or
/// `cartItems[1].status`.
///
/// Paths always start at a top-level field name. Numeric segments, written
/// either as `.1` or `[1]`, index into arrays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// A path to a top-level field.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Key(name.into())],
        }
    }

    /// A path to one field of one element of a line-item array.
    pub fn line_item(items_field: &str, index: usize, field: &str) -> Self {
        Self {
            segments: vec![
                PathSegment::Key(items_field.to_owned()),
                PathSegment::Index(index),
                PathSegment::Key(field.to_owned()),
            ],
        }
    }

    pub fn parse(raw: &str) -> CoreResult<Self> {
        let invalid = || CoreError::InvalidField(format!("malformed field path `{raw}`"));
        let mut segments = Vec::new();
        for part in raw.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if name.is_empty() && rest.is_empty() {
                return Err(invalid());
            }
            if !name.is_empty() {
                match name.parse::<usize>() {
                    Ok(index) if !segments.is_empty() => segments.push(PathSegment::Index(index)),
                    _ => segments.push(PathSegment::Key(name.to_owned())),
                }
            }
            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(invalid)?;
                let index = rest[1..close].parse::<usize>().map_err(|_| invalid())?;
                segments.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid());
                }
            }
        }
        match segments.first() {
            Some(PathSegment::Key(_)) => Ok(Self { segments }),
            _ => Err(invalid()),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The top-level field this path starts at.
    pub fn root(&self) -> &str {
        match self.segments.first() {
            Some(PathSegment::Key(name)) => name,
            _ => "",
        }
    }

    /// Resolve the path against a record's fields.
    pub fn lookup<'a>(&self, fields: &'a Fields) -> Option<&'a FieldValue> {
        let (first, rest) = self.segments.split_first()?;
        let PathSegment::Key(name) = first else {
            return None;
        };
        let mut current = fields.get(name)?;
        for segment in rest {
            current = match (segment, current) {
                (PathSegment::Key(key), FieldValue::Object(map)) => map.get(key)?,
                (PathSegment::Index(i), FieldValue::Array(items)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write `value` at the path, creating the final object key if missing.
    ///
    /// Intermediate containers must already exist and array indexes must be
    /// in bounds; the record shape is owned by the backend.
    pub fn assign(&self, fields: &mut Fields, value: FieldValue) -> CoreResult<()> {
        let (last, parents) = self
            .segments
            .split_last()
            .ok_or_else(|| CoreError::InvalidField("empty field path".into()))?;
        if parents.is_empty() {
            let PathSegment::Key(name) = last else {
                return Err(CoreError::InvalidField(format!("path `{self}` must start with a field name")));
            };
            fields.insert(name.clone(), value);
            return Ok(());
        }

        let (first, middle) = parents.split_first().ok_or_else(|| self.missing())?;
        let PathSegment::Key(name) = first else {
            return Err(self.missing());
        };
        let mut current = fields.get_mut(name).ok_or_else(|| self.missing())?;
        for segment in middle {
            current = match (segment, current) {
                (PathSegment::Key(key), FieldValue::Object(map)) => {
                    map.get_mut(key).ok_or_else(|| self.missing())?
                }
                (PathSegment::Index(i), FieldValue::Array(items)) => {
                    items.get_mut(*i).ok_or_else(|| self.missing())?
                }
                _ => return Err(self.missing()),
            };
        }

        match (last, current) {
            (PathSegment::Key(key), FieldValue::Object(map)) => {
                map.insert(key.clone(), value);
                Ok(())
            }
            (PathSegment::Index(i), FieldValue::Array(items)) => {
                let slot = items.get_mut(*i).ok_or_else(|| self.missing())?;
                *slot = value;
                Ok(())
            }
            _ => Err(self.missing()),
        }
    }

    fn missing(&self) -> CoreError {
        CoreError::InvalidField(format!("no value at `{self}`"))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for FieldPath {
    /// Treats the whole string as a single top-level field name.
    fn from(name: &str) -> Self {
        Self::field(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_object;

    fn order_fields() -> Fields {
        match field_object! {
            "firstName" => "Asha",
            "address" => field_object! { "city" => "Jaipur" },
            "cartItems" => vec![
                field_object! { "name" => "Kurti", "status" => "Pending" },
                field_object! { "name" => "Saree", "status" => "Pending" },
            ],
        } {
            FieldValue::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn parse_dotted_and_bracketed() {
        let dotted = FieldPath::parse("cartItems.1.status").unwrap();
        let bracketed = FieldPath::parse("cartItems[1].status").unwrap();
        assert_eq!(dotted, bracketed);
        assert_eq!(dotted, FieldPath::line_item("cartItems", 1, "status"));
        assert_eq!(dotted.to_string(), "cartItems[1].status");
        assert_eq!(dotted.root(), "cartItems");
    }

    #[test]
    fn parse_rejects_malformed_paths() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse("[0].status").is_err());
        assert!(FieldPath::parse("items[x]").is_err());
        assert!(FieldPath::parse("items[0]x").is_err());
    }

    #[test]
    fn lookup_nested_values() {
        let fields = order_fields();
        let city = FieldPath::parse("address.city").unwrap();
        assert_eq!(city.lookup(&fields), Some(&FieldValue::from("Jaipur")));
        let status = FieldPath::line_item("cartItems", 1, "status");
        assert_eq!(status.lookup(&fields), Some(&FieldValue::from("Pending")));
        assert_eq!(FieldPath::line_item("cartItems", 5, "status").lookup(&fields), None);
    }

    #[test]
    fn assign_nested_values() {
        let mut fields = order_fields();
        let status = FieldPath::line_item("cartItems", 0, "status");
        status.assign(&mut fields, FieldValue::from("Delivered")).unwrap();
        assert_eq!(status.lookup(&fields), Some(&FieldValue::from("Delivered")));

        FieldPath::field("coupon")
            .assign(&mut fields, FieldValue::from("DIWALI10"))
            .unwrap();
        assert_eq!(fields.get("coupon"), Some(&FieldValue::from("DIWALI10")));
    }

    #[test]
    fn assign_out_of_bounds_fails() {
        let mut fields = order_fields();
        let err = FieldPath::line_item("cartItems", 9, "status")
            .assign(&mut fields, FieldValue::from("Delivered"))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidField(_)));
    }
}
