use std::sync::Arc;

use config::{Config, Environment};
use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

use crate::database::{FirestoreGateway, GatewayError, InMemoryGateway, PostgresGateway, SubmissionGateway};

const ENV_PREFIX: &str = "FEEDBACK";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Missing configuration section: {0}")]
    Missing(&'static str),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    Postgres,
    Firestore,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FirestoreSettings {
    #[validate(length(min = 1))]
    pub project_id: String,
    #[validate(length(min = 1))]
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
    #[serde(default = "default_firestore_url")]
    #[validate(url)]
    pub base_url: String,
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend: Backend,
    pub postgres: PostgresSettings,
    pub firestore: Option<FirestoreSettings>,
}

impl AppConfig {
    /// Reads `.env` (if any) and the `FEEDBACK_*` environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Don't fail if .env doesn't exist
        Self::from_environment(environment())
    }

    pub fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("backend", "memory")?
            .set_default("postgres.host", "localhost")?
            .set_default("postgres.port", 5432)?
            .set_default("postgres.dbname", "campus_feedback")?
            .set_default("postgres.user", "campus_feedback")?
            .set_default("postgres.password", "")?
            .add_source(env)
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;

        if let Some(firestore) = &config.firestore {
            firestore
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("firestore: {}", e)))?;
        }

        Ok(config)
    }
}

/// `FEEDBACK_BACKEND`, `FEEDBACK_POSTGRES__HOST`, `FEEDBACK_FIRESTORE__PROJECT_ID`, ...
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Builds the document store selected by `config.backend`.
pub async fn connect_gateway(config: &AppConfig) -> Result<Arc<dyn SubmissionGateway>, ConfigError> {
    match config.backend {
        Backend::Memory => {
            warn!("Using in-memory document store - submissions are not persisted");
            Ok(Arc::new(InMemoryGateway::new()))
        }
        Backend::Postgres => {
            let gateway = PostgresGateway::connect(&config.postgres).await?;
            gateway.ensure_schema().await?;
            Ok(Arc::new(gateway))
        }
        Backend::Firestore => {
            let settings = config.firestore.clone().ok_or(ConfigError::Missing("firestore"))?;
            info!("Using Firestore project {}", settings.project_id);
            Ok(Arc::new(FirestoreGateway::new(settings)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(vars))
    }

    #[test]
    fn test_defaults_to_memory_backend() {
        let config = AppConfig::from_environment(env_from(&[])).unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.postgres.host, "localhost");
        assert_eq!(config.postgres.port, 5432);
        assert!(config.firestore.is_none());
    }

    #[test]
    fn test_postgres_settings_from_env() {
        let config = AppConfig::from_environment(env_from(&[
            ("FEEDBACK_BACKEND", "postgres"),
            ("FEEDBACK_POSTGRES__HOST", "db.internal"),
            ("FEEDBACK_POSTGRES__PORT", "6543"),
        ]))
        .unwrap();

        assert_eq!(config.backend, Backend::Postgres);
        assert_eq!(config.postgres.host, "db.internal");
        assert_eq!(config.postgres.port, 6543);
        assert_eq!(config.postgres.dbname, "campus_feedback");
    }

    #[test]
    fn test_firestore_settings_validated() {
        let config = AppConfig::from_environment(env_from(&[
            ("FEEDBACK_BACKEND", "firestore"),
            ("FEEDBACK_FIRESTORE__PROJECT_ID", "campus-feedback"),
        ]))
        .unwrap();
        let firestore = config.firestore.unwrap();
        assert_eq!(firestore.project_id, "campus-feedback");
        assert_eq!(firestore.base_url, "https://firestore.googleapis.com/v1");

        let invalid = AppConfig::from_environment(env_from(&[
            ("FEEDBACK_FIRESTORE__PROJECT_ID", "campus-feedback"),
            ("FEEDBACK_FIRESTORE__BASE_URL", "not a url"),
        ]));
        assert!(matches!(invalid, Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_firestore_backend_requires_section() {
        let config = AppConfig::from_environment(env_from(&[("FEEDBACK_BACKEND", "firestore")])).unwrap();
        let result = connect_gateway(&config).await;
        assert!(matches!(result, Err(ConfigError::Missing("firestore"))));
    }
}
