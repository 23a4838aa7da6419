mod http;
mod memory;

pub use http::{Endpoints, HttpGateway};
pub use memory::{InMemoryGateway, Operation};

use crate::error::CoreResult;
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::values::{Fields, RecordId};
use async_trait::async_trait;

/// A file sent alongside a create/update payload (product images).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Form field the file is sent under.
    pub field: String,
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// Body of a create or update call.
///
/// Updates always carry the full field set; the backend replaces the record
/// (including any line-item array) wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    pub fields: Fields,
    pub attachments: Vec<Attachment>,
}

impl Payload {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn is_multipart(&self) -> bool {
        !self.attachments.is_empty()
    }
}

impl From<Fields> for Payload {
    fn from(fields: Fields) -> Self {
        Self::new(fields)
    }
}

/// Typed access to one remote collection.
///
/// Implementations report every failure verbatim and never retry; retry
/// policy belongs to the caller.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Descriptor of the records this collection serves.
    fn schema(&self) -> &RecordSchema;

    /// Fetch the whole collection. A response that is not a sequence is a
    /// `Schema` error.
    async fn list(&self) -> CoreResult<Vec<Record>>;

    async fn create(&self, payload: &Payload) -> CoreResult<Record>;

    async fn update(&self, id: &RecordId, payload: &Payload) -> CoreResult<Record>;

    async fn remove(&self, id: &RecordId) -> CoreResult<()>;

    /// Whether a record already holds `key` in the schema's unique-key field.
    async fn exists(&self, key: &str) -> CoreResult<bool>;
}
