mod kinds;

pub use kinds::LineItemStatus;

use crate::error::{CoreError, CoreResult};
use crate::values::{FieldPath, FieldValue, Fields};
use std::collections::BTreeMap;

/// Describes the expected type of a record field.
///
/// The dashboard posts form data, so numeric fields often arrive as strings;
/// schemas for those fields use `Union(Number, String)` rather than `Number`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    /// Any number (Int64 or Float64).
    Number,
    Boolean,
    Null,
    /// An array where every element matches the inner type.
    Array(Box<FieldType>),
    /// An object with a defined set of fields. Extra keys are allowed.
    Object(BTreeMap<String, FieldDefinition>),
    /// A value that may be one of several types.
    Union(Vec<FieldType>),
    /// A string drawn from a closed set of values.
    OneOf(Vec<String>),
    /// Accepts any value (opts out of validation for this field).
    Any,
}

/// A single field definition within a record schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub field_type: FieldType,
    pub optional: bool,
}

impl FieldDefinition {
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            optional: false,
        }
    }

    pub fn optional(field_type: FieldType) -> Self {
        Self {
            field_type,
            optional: true,
        }
    }
}

/// Nested line items carried by a record (the cart of an order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemSpec {
    /// Top-level field holding the array of items.
    pub field: String,
    /// Per-item field holding a [`LineItemStatus`].
    pub status_field: String,
}

/// Schema descriptor for one record kind.
///
/// This is the only thing that differs between the product, customer and
/// order screens: which field carries the id, which fields a search looks
/// at, whether records carry line items, and which field must be unique.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    kind: String,
    id_field: String,
    searchable: Vec<FieldPath>,
    line_items: Option<LineItemSpec>,
    unique_key: Option<String>,
    fields: BTreeMap<String, FieldDefinition>,
}

impl RecordSchema {
    /// Start a schema for `kind` with the backend's default id field `_id`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id_field: "_id".to_owned(),
            searchable: Vec::new(),
            line_items: None,
            unique_key: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn searchable<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        self.searchable.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_line_items(mut self, field: impl Into<String>, status_field: impl Into<String>) -> Self {
        self.line_items = Some(LineItemSpec {
            field: field.into(),
            status_field: status_field.into(),
        });
        self
    }

    pub fn with_unique_key(mut self, field: impl Into<String>) -> Self {
        self.unique_key = Some(field.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.insert(name.into(), definition);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn searchable_fields(&self) -> &[FieldPath] {
        &self.searchable
    }

    pub fn line_items(&self) -> Option<&LineItemSpec> {
        self.line_items.as_ref()
    }

    pub fn unique_key(&self) -> Option<&str> {
        self.unique_key.as_deref()
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldDefinition> {
        &self.fields
    }

    /// Canonicalize values the backend may send loosely.
    ///
    /// Line-item statuses outside the closed set (or missing) become
    /// `Pending`, so an edit session never starts from an unrepresentable
    /// status.
    pub fn normalize(&self, fields: &mut Fields) {
        let Some(spec) = &self.line_items else {
            return;
        };
        let Some(items) = fields.get_mut(&spec.field).and_then(FieldValue::as_array_mut) else {
            return;
        };
        for item in items.iter_mut().filter_map(FieldValue::as_object_mut) {
            let status = LineItemStatus::parse_lenient(item.get(&spec.status_field));
            item.insert(spec.status_field.clone(), FieldValue::from(status.as_str()));
        }
    }

    /// Check a create/update payload against the declared field definitions.
    ///
    /// Fields not declared in the schema are accepted; the backend owns the
    /// full shape.
    pub fn validate(&self, fields: &Fields) -> CoreResult<()> {
        validate_fields(fields, &self.fields)
            .map_err(|msg| CoreError::InvalidField(format!("{}: {msg}", self.kind)))
    }
}

/// Validate a field map against a set of definitions.
///
/// Returns `Ok(())` if the fields are valid, or a descriptive error message.
pub fn validate_fields(
    fields: &Fields,
    definitions: &BTreeMap<String, FieldDefinition>,
) -> Result<(), String> {
    for (field_name, definition) in definitions {
        if !definition.optional && !fields.contains_key(field_name) {
            return Err(format!("missing required field: `{field_name}`"));
        }
    }

    for (field_name, value) in fields {
        if let Some(definition) = definitions.get(field_name) {
            validate_value(value, &definition.field_type, field_name)?;
        }
    }

    Ok(())
}

/// Validate a single value against a field type, recursively.
fn validate_value(value: &FieldValue, expected: &FieldType, path: &str) -> Result<(), String> {
    match expected {
        FieldType::Any => Ok(()),
        FieldType::Null => match value {
            FieldValue::Null => Ok(()),
            _ => Err(type_error(path, "null", value)),
        },
        FieldType::String => match value {
            FieldValue::String(_) => Ok(()),
            _ => Err(type_error(path, "string", value)),
        },
        FieldType::Number => match value {
            FieldValue::Int64(_) | FieldValue::Float64(_) => Ok(()),
            _ => Err(type_error(path, "number", value)),
        },
        FieldType::Boolean => match value {
            FieldValue::Boolean(_) => Ok(()),
            _ => Err(type_error(path, "boolean", value)),
        },
        FieldType::Array(element_type) => match value {
            FieldValue::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    validate_value(item, element_type, &item_path)?;
                }
                Ok(())
            }
            _ => Err(type_error(path, "array", value)),
        },
        FieldType::Object(field_defs) => match value {
            FieldValue::Object(obj) => {
                for (key, def) in field_defs {
                    if !def.optional && !obj.contains_key(key) {
                        return Err(format!("field `{path}.{key}`: required but missing"));
                    }
                }
                for (key, val) in obj {
                    if let Some(def) = field_defs.get(key) {
                        validate_value(val, &def.field_type, &format!("{path}.{key}"))?;
                    }
                }
                Ok(())
            }
            _ => Err(type_error(path, "object", value)),
        },
        FieldType::Union(variants) => {
            if variants.iter().any(|v| validate_value(value, v, path).is_ok()) {
                return Ok(());
            }
            let type_names: Vec<&str> = variants.iter().map(field_type_name).collect();
            Err(format!(
                "field `{path}`: expected one of [{}], got {}",
                type_names.join(", "),
                value.type_name()
            ))
        }
        FieldType::OneOf(allowed) => match value {
            FieldValue::String(s) if allowed.iter().any(|a| a == s) => Ok(()),
            FieldValue::String(s) => Err(format!(
                "field `{path}`: \"{s}\" is not one of [{}]",
                allowed.join(", ")
            )),
            _ => Err(type_error(path, "string", value)),
        },
    }
}

fn type_error(path: &str, expected: &str, got: &FieldValue) -> String {
    format!("field `{path}`: expected {expected}, got {}", got.type_name())
}

fn field_type_name(ft: &FieldType) -> &'static str {
    match ft {
        FieldType::String => "string",
        FieldType::Number => "number",
        FieldType::Boolean => "boolean",
        FieldType::Null => "null",
        FieldType::Array(_) => "array",
        FieldType::Object(_) => "object",
        FieldType::Union(_) => "union",
        FieldType::OneOf(_) => "one_of",
        FieldType::Any => "any",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_object;

    fn fields(value: FieldValue) -> Fields {
        match value {
            FieldValue::Object(map) => map,
            other => panic!("expected object, got {}", other.type_name()),
        }
    }

    #[test]
    fn product_requires_name_category_and_sku() {
        let schema = RecordSchema::product();
        let ok = fields(field_object! {
            "name" => "Banarasi Saree",
            "category" => "Sarees",
            "sku" => "SAR001",
            "price" => "4999",
        });
        assert!(schema.validate(&ok).is_ok());

        let missing = fields(field_object! { "name" => "Banarasi Saree", "category" => "Sarees" });
        let err = schema.validate(&missing).unwrap_err();
        assert!(err.to_string().contains("sku"));
    }

    #[test]
    fn numeric_form_fields_accept_strings_and_numbers() {
        let schema = RecordSchema::product();
        let as_number = fields(field_object! {
            "name" => "Kurti", "category" => "Kurtis", "sku" => "KUR001", "price" => 799i64,
        });
        let as_text = fields(field_object! {
            "name" => "Kurti", "category" => "Kurtis", "sku" => "KUR001", "price" => "799",
        });
        let as_bool = fields(field_object! {
            "name" => "Kurti", "category" => "Kurtis", "sku" => "KUR001", "price" => true,
        });
        assert!(schema.validate(&as_number).is_ok());
        assert!(schema.validate(&as_text).is_ok());
        let err = schema.validate(&as_bool).unwrap_err().to_string();
        assert!(err.contains("expected one of"));
    }

    #[test]
    fn line_item_status_must_be_known() {
        let schema = RecordSchema::order();
        let bad = fields(field_object! {
            "cartItems" => vec![field_object! { "name" => "Kurti", "status" => "Lost" }],
        });
        let err = schema.validate(&bad).unwrap_err().to_string();
        assert!(err.contains("cartItems[0].status"));
    }

    #[test]
    fn normalize_defaults_unknown_statuses() {
        let schema = RecordSchema::order();
        let mut order = fields(field_object! {
            "cartItems" => vec![
                field_object! { "name" => "Kurti" },
                field_object! { "name" => "Saree", "status" => "Shipped" },
                field_object! { "name" => "Dupatta", "status" => "Delivered" },
            ],
        });
        schema.normalize(&mut order);
        let statuses: Vec<&str> = order["cartItems"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item.as_object().unwrap()["status"].as_str().unwrap())
            .collect();
        assert_eq!(statuses, vec!["Pending", "Pending", "Delivered"]);
    }

    #[test]
    fn normalize_ignores_kinds_without_line_items() {
        let schema = RecordSchema::customer();
        let mut customer = fields(field_object! { "username" => "asha", "status" => "weird" });
        let before = customer.clone();
        schema.normalize(&mut customer);
        assert_eq!(customer, before);
    }

    #[test]
    fn nested_object_validation() {
        let schema = RecordSchema::order();
        let bad = fields(field_object! {
            "address" => field_object! { "address" => "12 MG Road", "city" => 42i64 },
        });
        let err = schema.validate(&bad).unwrap_err().to_string();
        assert!(err.contains("address.city"));
    }

    #[test]
    fn builder_sets_descriptor_parts() {
        let schema = RecordSchema::new("widgets")
            .with_id_field("id")
            .searchable(["label"])
            .with_unique_key("code");
        assert_eq!(schema.kind(), "widgets");
        assert_eq!(schema.id_field(), "id");
        assert_eq!(schema.searchable_fields(), &[FieldPath::field("label")]);
        assert_eq!(schema.unique_key(), Some("code"));
        assert!(schema.line_items().is_none());
    }
}
