pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod manager;
pub mod pagination;
pub mod record;
pub mod schema;
pub mod session;
pub mod sku;
pub mod values;

pub use cache::RecordCache;
pub use config::{AdminConfig, PageSizes};
pub use error::{CoreError, CoreResult};
pub use gateway::{
    Attachment, Endpoints, HttpGateway, InMemoryGateway, Operation, Payload, RemoteCollection,
};
pub use manager::{RecordManager, Row, View};
pub use pagination::{paginate, Page, PageWindow};
pub use record::Record;
pub use schema::{FieldDefinition, FieldType, LineItemSpec, LineItemStatus, RecordSchema};
pub use session::{EditSession, SessionState};
pub use sku::SkuAllocator;
pub use values::{FieldPath, FieldValue, Fields, RecordId};
