//! Persisted identity of the signed-in user.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use crate::api::types::{Role, User};
use crate::storage::{storage_key, KeyValueStore};

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  #[serde(rename = "id_usuario")]
  pub id: u64,
  #[serde(rename = "nome_usuario")]
  pub name: String,
  #[serde(rename = "email_usuario")]
  pub email: String,
  pub role: Role,
}

impl Session {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }

  /// User id list requests must be restricted to; `None` means unscoped.
  pub fn scope_user_id(&self) -> Option<u64> {
    match self.role {
      Role::Admin => None,
      Role::User => Some(self.id),
    }
  }
}

impl From<User> for Session {
  fn from(user: User) -> Self {
    Self {
      id: user.id,
      name: user.name,
      email: user.email,
      role: user.role,
    }
  }
}

/// Session kept in memory and mirrored to a [`KeyValueStore`].
pub struct SessionStore {
  store: Arc<dyn KeyValueStore>,
  current: RwLock<Option<Session>>,
}

impl SessionStore {
  /// Load the persisted session, if any.
  ///
  /// Unreadable or corrupt values are discarded and yield no session.
  pub fn restore(store: Arc<dyn KeyValueStore>) -> Self {
    let current = Self::load(store.as_ref());
    Self {
      store,
      current: RwLock::new(current),
    }
  }

  fn key() -> String {
    storage_key("user")
  }

  fn load(store: &dyn KeyValueStore) -> Option<Session> {
    let raw = match store.get(&Self::key()) {
      Ok(raw) => raw?,
      Err(e) => {
        warn!(error = %e, "could not read stored session");
        return None;
      }
    };

    match serde_json::from_str(&raw) {
      Ok(session) => Some(session),
      Err(e) => {
        warn!(error = %e, "discarding corrupt stored session");
        if let Err(e) = store.remove(&Self::key()) {
          warn!(error = %e, "could not remove corrupt session");
        }
        None
      }
    }
  }

  pub fn current(&self) -> Option<Session> {
    self
      .current
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn is_signed_in(&self) -> bool {
    self
      .current
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .is_some()
  }

  /// Persist and activate a session.
  pub fn save(&self, session: Session) -> Result<()> {
    let raw =
      serde_json::to_string(&session).map_err(|e| eyre!("Failed to serialize session: {}", e))?;
    self.store.set(&Self::key(), &raw)?;

    info!(user_id = session.id, role = ?session.role, "session stored");
    *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    Ok(())
  }

  /// Forget the session in memory and in storage.
  pub fn clear(&self) -> Result<()> {
    *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    self.store.remove(&Self::key())
  }
}
