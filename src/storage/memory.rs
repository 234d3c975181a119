use color_eyre::Result;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::traits::KeyValueStore;

/// Storage kept in process memory; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
  values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(values.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
    values.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
    values.remove(key);
    Ok(())
  }
}
