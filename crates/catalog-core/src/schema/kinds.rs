//! Built-in descriptors for the three record kinds the catalog backend serves.

use super::{FieldDefinition, FieldType, RecordSchema};
use crate::values::{FieldPath, FieldValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fulfilment status of one order line item. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LineItemStatus {
    #[default]
    Pending,
    #[serde(rename = "Ready for Dispatch")]
    ReadyForDispatch,
    Delivered,
}

impl LineItemStatus {
    pub const ALL: [LineItemStatus; 3] = [Self::Pending, Self::ReadyForDispatch, Self::Delivered];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::ReadyForDispatch => "Ready for Dispatch",
            Self::Delivered => "Delivered",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }

    /// Anything missing or outside the closed set reads as `Pending`.
    pub fn parse_lenient(value: Option<&FieldValue>) -> Self {
        value
            .and_then(FieldValue::as_str)
            .and_then(Self::parse)
            .unwrap_or_default()
    }
}

impl fmt::Display for LineItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LineItemStatus> for FieldValue {
    fn from(status: LineItemStatus) -> Self {
        FieldValue::from(status.as_str())
    }
}

fn numeric_text() -> FieldType {
    FieldType::Union(vec![FieldType::Number, FieldType::String])
}

impl RecordSchema {
    pub fn product() -> Self {
        RecordSchema::new("products")
            .searchable(["name", "category", "sku"])
            .with_unique_key("sku")
            .field("name", FieldDefinition::required(FieldType::String))
            .field("category", FieldDefinition::required(FieldType::String))
            .field("categoryId", FieldDefinition::optional(FieldType::String))
            .field("price", FieldDefinition::optional(numeric_text()))
            .field("sku", FieldDefinition::required(FieldType::String))
            .field("color", FieldDefinition::optional(FieldType::String))
            .field("material", FieldDefinition::optional(FieldType::String))
            .field("description", FieldDefinition::optional(FieldType::String))
            .field("length", FieldDefinition::optional(numeric_text()))
            .field("width", FieldDefinition::optional(numeric_text()))
            .field("details", FieldDefinition::optional(FieldType::String))
            .field("stock", FieldDefinition::optional(numeric_text()))
            .field(
                "images",
                FieldDefinition::optional(FieldType::Array(Box::new(FieldType::String))),
            )
    }

    pub fn customer() -> Self {
        RecordSchema::new("customers")
            .searchable(["username", "email"])
            .field("username", FieldDefinition::optional(FieldType::String))
            .field("mobilenumber", FieldDefinition::optional(numeric_text()))
            .field("email", FieldDefinition::optional(FieldType::String))
    }

    pub fn order() -> Self {
        let address = BTreeMap::from([
            ("address".to_owned(), FieldDefinition::optional(FieldType::String)),
            ("city".to_owned(), FieldDefinition::optional(FieldType::String)),
            ("number".to_owned(), FieldDefinition::optional(numeric_text())),
        ]);
        let statuses = LineItemStatus::ALL.iter().map(|s| s.as_str().to_owned()).collect();
        let line_item = BTreeMap::from([
            ("name".to_owned(), FieldDefinition::optional(FieldType::String)),
            ("category".to_owned(), FieldDefinition::optional(FieldType::String)),
            ("price".to_owned(), FieldDefinition::optional(numeric_text())),
            ("quantity".to_owned(), FieldDefinition::optional(numeric_text())),
            (
                "images".to_owned(),
                FieldDefinition::optional(FieldType::Array(Box::new(FieldType::String))),
            ),
            ("status".to_owned(), FieldDefinition::optional(FieldType::OneOf(statuses))),
        ]);

        RecordSchema::new("orders")
            .searchable([FieldPath::field("firstName"), FieldPath::field("phoneNumber")])
            .with_line_items("cartItems", "status")
            .field("firstName", FieldDefinition::optional(FieldType::String))
            .field("phoneNumber", FieldDefinition::optional(numeric_text()))
            .field("totalAmount", FieldDefinition::optional(numeric_text()))
            .field("paymentMethod", FieldDefinition::optional(FieldType::String))
            .field("formattedDate", FieldDefinition::optional(FieldType::String))
            .field("coupon", FieldDefinition::optional(FieldType::Any))
            .field("address", FieldDefinition::optional(FieldType::Object(address)))
            .field(
                "cartItems",
                FieldDefinition::optional(FieldType::Array(Box::new(FieldType::Object(line_item)))),
            )
    }

    /// Look up a built-in schema by its kind name.
    pub fn builtin(kind: &str) -> Option<Self> {
        match kind {
            "products" | "product" => Some(Self::product()),
            "customers" | "customer" => Some(Self::customer()),
            "orders" | "order" => Some(Self::order()),
            _ => None,
        }
    }
}
