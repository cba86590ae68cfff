use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde_json::{json, Map, Value};

use super::{DocumentHandle, DocumentPayload, GatewayError, Result, SubmissionGateway, SUBMITTED_AT_FIELD};
use crate::config::FirestoreSettings;

/// Writes documents through the Firestore REST API.
#[derive(Debug, Clone)]
pub struct FirestoreGateway {
    client: Client,
    settings: FirestoreSettings,
}

impl FirestoreGateway {
    pub fn new(settings: FirestoreSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.project_id,
            collection
        )
    }
}

#[async_trait]
impl SubmissionGateway for FirestoreGateway {
    async fn append_document(&self, collection: &str, payload: DocumentPayload) -> Result<DocumentHandle> {
        let body = encode_document(&payload);

        let mut request = self.client.post(self.collection_url(collection)).json(&body);
        if let Some(api_key) = &self.settings.api_key {
            request = request.query(&[("key", api_key)]);
        }
        if let Some(token) = &self.settings.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!("Firestore request to {} failed: {}", collection, e);
            GatewayError::Transport(format!("Firestore request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Firestore rejected write to {}: {} {}", collection, status, message);
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let created: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("Failed to parse Firestore response: {}", e)))?;

        let name = created["name"]
            .as_str()
            .ok_or_else(|| GatewayError::Transport("No document name in Firestore response".to_string()))?;

        let id = document_id_from_name(name).to_string();
        info!("Stored document {} in {}", id, collection);

        Ok(DocumentHandle {
            collection: collection.to_string(),
            id,
        })
    }
}

/// Request body for `documents.createDocument`.
pub fn encode_document(payload: &DocumentPayload) -> Value {
    let mut fields: Map<String, Value> = payload
        .fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();

    fields.insert(
        SUBMITTED_AT_FIELD.to_string(),
        json!({ "timestampValue": payload.submitted_at.to_rfc3339() }),
    );

    json!({ "fields": fields })
}

/// Converts plain JSON into Firestore's typed value representation.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // int64 travels as a decimal string
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => {
            let fields: Map<String, Value> = map
                .iter()
                .map(|(key, value)| (key.clone(), encode_value(value)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

fn document_id_from_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
