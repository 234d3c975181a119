//! Serde shapes that exist only on the wire.

use serde::{Deserialize, Serialize};

use super::resource::Resource;
use super::types::{Role, User};
use crate::error::ApiError;

/// A reference the backend sends either as a bare id or as the embedded object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Embedded<T> {
  Id(u64),
  Full(T),
}

impl<T: Resource> Embedded<T> {
  pub fn id(&self) -> u64 {
    match self {
      Embedded::Id(id) => *id,
      Embedded::Full(entity) => entity.id(),
    }
  }

  /// The embedded object, when the backend sent one.
  pub fn full(&self) -> Option<&T> {
    match self {
      Embedded::Id(_) => None,
      Embedded::Full(entity) => Some(entity),
    }
  }
}

/// Body returned by `POST /auth/login`.
///
/// Every field is optional here so that a partial body is reported as
/// [`ApiError::MalformedLogin`] rather than a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct ApiLoginResponse {
  pub id_usuario: Option<u64>,
  pub nome_usuario: Option<String>,
  pub email_usuario: Option<String>,
  pub role: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
}

impl ApiLoginResponse {
  /// Convert to a user, requiring the identity fields.
  pub fn into_user(self) -> Result<User, ApiError> {
    let present = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.is_empty());

    match self.id_usuario {
      Some(id) if id > 0 && present(&self.nome_usuario) && present(&self.email_usuario) => {
        Ok(User {
          id,
          name: self.nome_usuario.unwrap_or_default(),
          email: self.email_usuario.unwrap_or_default(),
          role: self.role.map(Role::from).unwrap_or_default(),
        })
      }
      _ => Err(ApiError::MalformedLogin),
    }
  }
}
