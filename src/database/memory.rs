use async_trait::async_trait;
use log::{info, warn};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{DocumentHandle, DocumentPayload, GatewayError, Result, SubmissionGateway};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub handle: DocumentHandle,
    pub payload: DocumentPayload,
}

/// Process-local document store. Used for tests and for running the forms
/// without a backend.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    documents: Mutex<Vec<StoredDocument>>,
    attempts: Mutex<usize>,
    failures_remaining: Mutex<usize>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the next `count` appends with an availability error.
    pub fn fail_next(&self, count: usize) {
        *self.failures_remaining.lock() = count;
    }

    pub fn documents(&self) -> Vec<StoredDocument> {
        self.documents.lock().clone()
    }

    pub fn documents_in(&self, collection: &str) -> Vec<StoredDocument> {
        self.documents
            .lock()
            .iter()
            .filter(|doc| doc.handle.collection == collection)
            .cloned()
            .collect()
    }

    /// Number of append calls received, successful or not.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

#[async_trait]
impl SubmissionGateway for InMemoryGateway {
    async fn append_document(&self, collection: &str, payload: DocumentPayload) -> Result<DocumentHandle> {
        *self.attempts.lock() += 1;

        {
            let mut failures = self.failures_remaining.lock();
            if *failures > 0 {
                *failures -= 1;
                warn!("In-memory store rejecting append to {}", collection);
                return Err(GatewayError::Connection("document store unavailable".to_string()));
            }
        }

        let handle = DocumentHandle {
            collection: collection.to_string(),
            id: Uuid::new_v4().to_string(),
        };

        self.documents.lock().push(StoredDocument {
            handle: handle.clone(),
            payload,
        });

        info!("Stored document {} in {}", handle.id, collection);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{json, Map};

    fn payload(name: &str) -> DocumentPayload {
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!(name));
        DocumentPayload {
            fields,
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_and_filter_by_collection() {
        let gateway = InMemoryGateway::new();
        gateway.append_document("a", payload("one")).await.unwrap();
        gateway.append_document("b", payload("two")).await.unwrap();
        gateway.append_document("a", payload("three")).await.unwrap();

        assert_eq!(gateway.documents().len(), 3);
        let in_a = gateway.documents_in("a");
        assert_eq!(in_a.len(), 2);
        assert_eq!(in_a[1].payload.fields["name"], json!("three"));
    }

    #[tokio::test]
    async fn test_fail_next_rejects_then_recovers() {
        let gateway = InMemoryGateway::new();
        gateway.fail_next(1);

        let first = gateway.append_document("a", payload("one")).await;
        assert!(matches!(first, Err(GatewayError::Connection(_))));
        assert!(gateway.documents().is_empty());

        gateway.append_document("a", payload("one")).await.unwrap();
        assert_eq!(gateway.documents().len(), 1);
        assert_eq!(gateway.attempts(), 2);
    }
}
