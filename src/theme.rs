//! Persisted light/dark preference.

use color_eyre::Result;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

use crate::storage::{storage_key, KeyValueStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
  #[default]
  Dark,
  Light,
}

impl Theme {
  pub fn as_str(self) -> &'static str {
    match self {
      Theme::Dark => "dark",
      Theme::Light => "light",
    }
  }

  /// Parse a stored value; anything unrecognized is `None`.
  pub fn parse(value: &str) -> Option<Self> {
    match value {
      "dark" => Some(Theme::Dark),
      "light" => Some(Theme::Light),
      _ => None,
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      Theme::Dark => Theme::Light,
      Theme::Light => Theme::Dark,
    }
  }
}

impl fmt::Display for Theme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

pub struct ThemeStore {
  store: Arc<dyn KeyValueStore>,
  current: RwLock<Theme>,
}

impl ThemeStore {
  /// Load the stored preference, defaulting to dark.
  pub fn restore(store: Arc<dyn KeyValueStore>) -> Self {
    let current = match store.get(&storage_key("theme")) {
      Ok(value) => value.as_deref().and_then(Theme::parse).unwrap_or_default(),
      Err(e) => {
        warn!(error = %e, "could not read stored theme");
        Theme::default()
      }
    };

    Self {
      store,
      current: RwLock::new(current),
    }
  }

  pub fn current(&self) -> Theme {
    *self.current.read().unwrap_or_else(PoisonError::into_inner)
  }

  /// Persist a preference. The in-memory value changes only if storing succeeds.
  pub fn set(&self, theme: Theme) -> Result<()> {
    self.store.set(&storage_key("theme"), theme.as_str())?;
    *self.current.write().unwrap_or_else(PoisonError::into_inner) = theme;
    Ok(())
  }

  pub fn toggle(&self) -> Result<Theme> {
    let next = self.current().toggled();
    self.set(next)?;
    Ok(next)
  }
}
