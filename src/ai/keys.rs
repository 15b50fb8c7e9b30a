use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::Vendor;

/// In-memory API key storage, one key per vendor, plus the selected vendor.
///
/// Keys live only for the lifetime of the process and are never persisted.
#[derive(Default)]
pub struct ApiKeyManager {
    keys: RwLock<HashMap<Vendor, String>>,
    selected: RwLock<Vendor>,
}

impl ApiKeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a key for `vendor`.
    ///
    /// Surrounding whitespace and control characters are stripped so the key
    /// is safe to put in a header. A key that is blank after cleaning clears
    /// any stored key instead. Returns whether a key is now set.
    pub fn save_api_key(&self, vendor: Vendor, key: &str) -> bool {
        let cleaned: String = key.trim().chars().filter(|c| !c.is_control()).collect();
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        if cleaned.is_empty() {
            keys.remove(&vendor);
            false
        } else {
            keys.insert(vendor, cleaned);
            true
        }
    }

    pub fn has_api_key(&self, vendor: Vendor) -> bool {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&vendor)
    }

    pub fn api_key(&self, vendor: Vendor) -> Option<String> {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&vendor)
            .cloned()
    }

    pub fn clear_api_key(&self, vendor: Vendor) {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&vendor);
    }

    pub fn select_vendor(&self, vendor: Vendor) {
        *self.selected.write().unwrap_or_else(PoisonError::into_inner) = vendor;
    }

    pub fn selected_vendor(&self) -> Vendor {
        *self.selected.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ApiKeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        let configured: Vec<&Vendor> = keys.keys().collect();
        f.debug_struct("ApiKeyManager")
            .field("configured", &configured)
            .field("selected", &self.selected_vendor())
            .finish()
    }
}
