use crate::error::{CoreError, CoreResult};
use crate::schema::RecordSchema;
use crate::values::{FieldPath, FieldValue, Fields, RecordId};
use serde::Serialize;

/// One remote record: a backend-assigned id plus an open set of fields.
///
/// The id is kept outside the field map so it cannot be edited through
/// field paths. Equality compares id and every field recursively.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    id: RecordId,
    fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode a record from a backend JSON object.
    ///
    /// The schema names the id field; it is lifted out of the field map.
    /// Numeric ids are accepted and rendered in decimal. The result is
    /// normalized through the schema.
    pub fn from_json(value: serde_json::Value, schema: &RecordSchema) -> CoreResult<Self> {
        let object = match value {
            serde_json::Value::Object(object) => object,
            other => {
                return Err(CoreError::Schema(format!(
                    "{}: expected a record object, got {}",
                    schema.kind(),
                    json_type_name(&other)
                )))
            }
        };
        let mut fields: Fields = object
            .into_iter()
            .map(|(k, v)| (k, FieldValue::from(v)))
            .collect();

        let id = match fields.remove(schema.id_field()) {
            Some(FieldValue::String(id)) if !id.is_empty() => RecordId::new(id),
            Some(FieldValue::Int64(id)) => RecordId::new(id.to_string()),
            Some(other) => {
                return Err(CoreError::Schema(format!(
                    "{}: `{}` must be a non-empty string, got {}",
                    schema.kind(),
                    schema.id_field(),
                    other.type_name()
                )))
            }
            None => {
                return Err(CoreError::Schema(format!(
                    "{}: record is missing `{}`",
                    schema.kind(),
                    schema.id_field()
                )))
            }
        };
        schema.normalize(&mut fields);
        Ok(Self { id, fields })
    }

    /// Encode back to the backend's JSON shape, id included.
    pub fn to_json(&self, schema: &RecordSchema) -> serde_json::Value {
        let mut object: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(v.clone())))
            .collect();
        object.insert(
            schema.id_field().to_owned(),
            serde_json::Value::String(self.id.to_string()),
        );
        serde_json::Value::Object(object)
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_path(&self, path: &FieldPath) -> Option<&FieldValue> {
        path.lookup(&self.fields)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn set_path(&mut self, path: &FieldPath, value: FieldValue) -> CoreResult<()> {
        path.assign(&mut self.fields, value)
    }

    /// Remove a field, returning its previous value if it existed.
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
