use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use log::{error, info};
use serde_json::Value;
use tokio_postgres::NoTls;
use uuid::Uuid;

use super::memory::StoredDocument;
use super::{DocumentHandle, DocumentPayload, GatewayError, Result, SubmissionGateway};
use crate::config::PostgresSettings;

/// Document store backed by a single JSONB table.
#[derive(Debug, Clone)]
pub struct PostgresGateway {
    pool: Pool,
}

impl PostgresGateway {
    pub async fn connect(settings: &PostgresSettings) -> Result<Self> {
        info!(
            "Connecting to database: {}@{}:{}/{}",
            settings.user, settings.host, settings.port, settings.dbname
        );

        let mut cfg = Config::new();
        cfg.host = Some(settings.host.clone());
        cfg.port = Some(settings.port);
        cfg.dbname = Some(settings.dbname.clone());
        cfg.user = Some(settings.user.clone());
        cfg.password = Some(settings.password.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| GatewayError::Connection(format!("Pool creation failed: {}", e)))?;

        // Test connection
        let _client = pool
            .get()
            .await
            .map_err(|e| GatewayError::Connection(format!("Connection test failed: {}", e)))?;

        info!("Database connection established successfully");

        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self.client().await?;

        client
            .batch_execute(
                r#"
                CREATE TABLE IF NOT EXISTS feedback_documents (
                    id UUID PRIMARY KEY,
                    collection TEXT NOT NULL,
                    payload JSONB NOT NULL,
                    submitted_at TIMESTAMPTZ NOT NULL
                );
                CREATE INDEX IF NOT EXISTS feedback_documents_collection_idx
                    ON feedback_documents (collection, submitted_at DESC);
                "#,
            )
            .await
            .map_err(|e| {
                error!("Failed to create feedback_documents table: {}", e);
                GatewayError::Transport(format!("Schema setup failed: {}", e))
            })?;

        info!("feedback_documents table ready");
        Ok(())
    }

    /// Documents of one collection, newest first.
    pub async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let client = self.client().await?;

        let rows = client
            .query(
                r#"
                SELECT id, collection, payload, submitted_at
                FROM feedback_documents
                WHERE collection = $1
                ORDER BY submitted_at DESC
                "#,
                &[&collection],
            )
            .await
            .map_err(|e| {
                error!("Failed to list documents in {}: {}", collection, e);
                GatewayError::Transport(format!("Query failed: {}", e))
            })?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                let collection: String = row.get("collection");
                let payload: Value = row.get("payload");
                let submitted_at: DateTime<Utc> = row.get("submitted_at");

                let fields = match payload {
                    Value::Object(fields) => fields,
                    other => {
                        return Err(GatewayError::Serialization(format!(
                            "stored payload {} is not an object: {}",
                            id, other
                        )))
                    }
                };

                Ok(StoredDocument {
                    handle: DocumentHandle {
                        collection,
                        id: id.to_string(),
                    },
                    payload: DocumentPayload { fields, submitted_at },
                })
            })
            .collect()
    }

    async fn client(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))
    }
}

#[async_trait]
impl SubmissionGateway for PostgresGateway {
    async fn append_document(&self, collection: &str, payload: DocumentPayload) -> Result<DocumentHandle> {
        let client = self.client().await?;

        let id = Uuid::new_v4();
        let fields = Value::Object(payload.fields);

        client
            .execute(
                r#"
                INSERT INTO feedback_documents (id, collection, payload, submitted_at)
                VALUES ($1, $2, $3, $4)
                "#,
                &[&id, &collection, &fields, &payload.submitted_at],
            )
            .await
            .map_err(|e| {
                error!("Failed to append document to {}: {}", collection, e);
                GatewayError::Transport(format!("Insert failed: {}", e))
            })?;

        info!("Stored document {} in {}", id, collection);

        Ok(DocumentHandle {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }
}
