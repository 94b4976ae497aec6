//! Persistence for WiFi credentials.
//!
//! Credentials live in the `wifi` namespace under `ssid` and `pass` so they
//! persist across reboots.

use super::config::WifiCredentials;
use crate::storage::{ConfigStore, Namespace, NamespaceHandle, OpenMode, Storage, StorageError};

/// Key for the stored SSID.
const SSID_KEY: &str = "ssid";

/// Key for the stored password.
const PASSWORD_KEY: &str = "pass";

/// Load station credentials.
///
/// Returns `None` unless both SSID and password are stored and non-empty.
pub fn load_credentials<S: Storage>(store: &ConfigStore<S>) -> Option<WifiCredentials> {
    let ssid = store.get_str(Namespace::Wifi, SSID_KEY, "");
    let password = store.get_str(Namespace::Wifi, PASSWORD_KEY, "");
    if ssid.is_empty() || password.is_empty() {
        return None;
    }
    Some(WifiCredentials { ssid, password })
}

/// Last SSID the device joined, if any.
pub fn last_connected_ssid<S: Storage>(store: &ConfigStore<S>) -> Option<String> {
    Some(store.get_str(Namespace::Wifi, SSID_KEY, "")).filter(|ssid| !ssid.is_empty())
}

/// Save station credentials, both keys under one open namespace.
pub fn save_credentials<S: Storage>(
    store: &ConfigStore<S>,
    credentials: &WifiCredentials,
) -> Result<(), StorageError> {
    store.with_namespace(Namespace::Wifi, OpenMode::ReadWrite, |ns| {
        ns.set_str(SSID_KEY, &credentials.ssid)?;
        ns.set_str(PASSWORD_KEY, &credentials.password)
    })
}

/// Clear stored credentials.
pub fn clear_credentials<S: Storage>(store: &ConfigStore<S>) -> Result<(), StorageError> {
    store.with_namespace(Namespace::Wifi, OpenMode::ReadWrite, |ns| {
        ns.remove(SSID_KEY)?;
        ns.remove(PASSWORD_KEY)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> ConfigStore<MemoryStorage> {
        ConfigStore::new(MemoryStorage::new())
    }

    #[test]
    fn test_load_without_credentials() {
        assert!(load_credentials(&store()).is_none());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let store = store();
        let credentials = WifiCredentials::new("HomeNet", "password123").unwrap();
        save_credentials(&store, &credentials).unwrap();
        assert_eq!(load_credentials(&store), Some(credentials));
        assert_eq!(last_connected_ssid(&store).as_deref(), Some("HomeNet"));
    }

    #[test]
    fn test_ssid_without_password_is_not_loaded() {
        let store = store();
        store.set_str(Namespace::Wifi, "ssid", "HomeNet").unwrap();
        assert!(load_credentials(&store).is_none());
    }

    #[test]
    fn test_clear_credentials() {
        let store = store();
        let credentials = WifiCredentials::new("HomeNet", "password123").unwrap();
        save_credentials(&store, &credentials).unwrap();
        clear_credentials(&store).unwrap();
        assert!(load_credentials(&store).is_none());
        assert!(last_connected_ssid(&store).is_none());
    }
}
