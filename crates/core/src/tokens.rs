//! Credential pair state and the persistent store seam

use std::collections::HashMap;
use std::sync::RwLock;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Access/refresh credential pair
///
/// Both halves are independently optional: an access token without a
/// refresh token is usable, just not renewable. The pair is always
/// replaced as a whole so concurrent readers never observe a torn update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenPair {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl TokenPair {
    /// Load whatever tokens the store currently holds
    pub fn load(store: &dyn TokenStore) -> Self {
        Self {
            access: store.get(ACCESS_TOKEN_KEY),
            refresh: store.get(REFRESH_TOKEN_KEY),
        }
    }

    /// Partial update: a `None` argument leaves that half untouched
    pub fn updated(&self, access: Option<&str>, refresh: Option<&str>) -> Self {
        Self {
            access: access.map(str::to_owned).or_else(|| self.access.clone()),
            refresh: refresh.map(str::to_owned).or_else(|| self.refresh.clone()),
        }
    }
}

/// Key-value storage for persisted credentials
///
/// Values survive client re-construction for as long as the store itself
/// lives. A browser host backs this with origin-scoped local storage;
/// everywhere else [`MemoryTokenStore`] is the default.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Process-local token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .expect("token store lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .expect("token store lock poisoned")
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.values
            .write()
            .expect("token store lock poisoned")
            .remove(key);
    }
}
