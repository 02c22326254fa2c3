//! Key store indirection for option values.
//!
//! A value written as `USE_KEYSTORE@<key>` is replaced by the secret stored
//! under `<key>` before conversion, so credentials never appear verbatim on
//! a command line.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::ConfigError;
use crate::Result;

static RE_USE_KEYSTORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^USE_KEYSTORE@(.*)$").unwrap());

/// Source of secret option values.
#[cfg_attr(test, mockall::automock)]
pub trait KeyStoreClient {
    fn is_available(&self) -> bool;
    fn contains_key(&self, key: &str) -> bool;
    fn fetch_key(&self, key: &str) -> Option<String>;
}

/// A key store that is never available.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubKeyStoreClient;

impl KeyStoreClient for StubKeyStoreClient {
    fn is_available(&self) -> bool {
        false
    }

    fn contains_key(&self, _key: &str) -> bool {
        false
    }

    fn fetch_key(&self, _key: &str) -> Option<String> {
        None
    }
}

impl KeyStoreClient for HashMap<String, String> {
    fn is_available(&self) -> bool {
        true
    }

    fn contains_key(&self, key: &str) -> bool {
        HashMap::contains_key(self, key)
    }

    fn fetch_key(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// The key named by a `USE_KEYSTORE@` reference, if `text` is one.
pub fn key_store_reference(text: &str) -> Option<&str> {
    RE_USE_KEYSTORE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Replace a key store reference with the stored value. Plain text is
/// returned unchanged without touching the client.
pub(crate) fn resolve(
    store: Option<&dyn KeyStoreClient>,
    option_name: &str,
    text: &str,
) -> Result<String> {
    let Some(key) = key_store_reference(text) else {
        return Ok(text.to_string());
    };
    let fail = |reason: &str| ConfigError::KeyStore {
        name: option_name.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    };
    let store = store.ok_or_else(|| fail("no key store configured"))?;
    if !store.is_available() {
        log::warn!("key store unavailable while resolving option '{}'", option_name);
        return Err(fail("key store is not available"));
    }
    if !store.contains_key(key) {
        return Err(fail("key not found"));
    }
    store
        .fetch_key(key)
        .ok_or_else(|| fail("key store returned no value"))
}
