pub mod firestore;
pub mod memory;
pub mod postgres;

pub use firestore::FirestoreGateway;
pub use memory::{InMemoryGateway, StoredDocument};
pub use postgres::PostgresGateway;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const FACILITIES_COLLECTION: &str = "facilitiesFeedback";
pub const SYLLABUS_COLLECTION: &str = "syllabusFeedbackNested";

/// Field name every stored document carries its submission time under.
pub const SUBMITTED_AT_FIELD: &str = "submittedAt";

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Document store rejected the write ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Payload serialization failed: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Handle of a freshly appended document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    pub collection: String,
    pub id: String,
}

/// A document about to be written: its fields plus the submission timestamp,
/// kept apart so each backend can store the time in its native type.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPayload {
    pub fields: Map<String, Value>,
    pub submitted_at: DateTime<Utc>,
}

impl DocumentPayload {
    pub fn from_document<D: SubmissionDocument>(document: &D) -> Result<Self> {
        let value = serde_json::to_value(document)
            .map_err(|e| GatewayError::Serialization(e.to_string()))?;

        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(GatewayError::Serialization(format!(
                    "document must serialize to an object, got {}",
                    other
                )))
            }
        };
        fields.remove(SUBMITTED_AT_FIELD);

        Ok(Self {
            fields,
            submitted_at: document.submitted_at(),
        })
    }

    /// Full JSON form with `submittedAt` as an RFC 3339 string.
    pub fn to_json(&self) -> Value {
        let mut fields = self.fields.clone();
        fields.insert(
            SUBMITTED_AT_FIELD.to_string(),
            Value::String(self.submitted_at.to_rfc3339()),
        );
        Value::Object(fields)
    }
}

/// Snapshot produced by a form's serializer, bound to the collection it is
/// stored in.
pub trait SubmissionDocument: Serialize {
    const COLLECTION: &'static str;

    fn submitted_at(&self) -> DateTime<Utc>;
}

/// Append-only write port of the document store.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn append_document(&self, collection: &str, payload: DocumentPayload) -> Result<DocumentHandle>;
}
