//! Storage port.

use color_eyre::Result;

/// Prefix for every persisted key.
pub const NAMESPACE: &str = "@iottu";

/// Namespaced key, e.g. `@iottu:user`.
pub fn storage_key(name: &str) -> String {
  format!("{}:{}", NAMESPACE, name)
}

/// Trait for key-value storage backends.
pub trait KeyValueStore: Send + Sync {
  /// Value stored under `key`, if any.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Store `value` under `key`, replacing any previous value.
  fn set(&self, key: &str, value: &str) -> Result<()>;

  /// Remove `key`. Removing a missing key is not an error.
  fn remove(&self, key: &str) -> Result<()>;
}
