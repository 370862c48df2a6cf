use async_trait::async_trait;
use std::collections::HashMap;

/// Per-user sizing defaults, read-only from the core's point of view.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserDefaults {
    pub leverage: Option<u32>,
    pub position_size: Option<f64>,
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_defaults(&self, requester: i64) -> UserDefaults;
}

/// Fixed in-memory store. Users without an entry fall through to the
/// builder's global defaults.
#[derive(Debug, Default)]
pub struct StaticSettingsStore {
    users: HashMap<i64, UserDefaults>,
}

impl StaticSettingsStore {
    pub fn new(users: HashMap<i64, UserDefaults>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl SettingsStore for StaticSettingsStore {
    async fn get_defaults(&self, requester: i64) -> UserDefaults {
        self.users.get(&requester).copied().unwrap_or_default()
    }
}
