use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

pub const USERNAME_KEY: &str = "username";
pub const UNKNOWN_USER: &str = "unknown";

/// Read-only key lookup into the current user's session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Session values held in memory, filled by the front-end after login.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().remove(key)
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

/// Who is submitting. Resolved once and handed to the syllabus controller.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionIdentity {
    username: String,
}

impl SessionIdentity {
    pub fn new(username: Option<String>) -> Self {
        let username = username
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        Self { username }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn from_store(store: &dyn SessionStore) -> Self {
        Self::new(store.get(USERNAME_KEY))
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
