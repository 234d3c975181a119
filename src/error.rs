//! Failure taxonomy for API calls and the two ways of reading it.
//!
//! [`classify`] yields a structured [`ErrorInfo`] for callers that branch on
//! the kind of failure. [`user_message`] and [`login_message`] yield a single
//! localized string for callers that only display an alert.

use serde_json::Value;

use crate::messages::Messages;
use crate::validation::ValidationErrors;

/// Message carried by failures where no response was received.
pub const NETWORK_ERROR: &str = "Network Error";

/// A failed API call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
  /// No response was received
  #[error("{message}")]
  Network { message: String },
  /// The server answered outside [200, 300)
  #[error("{message}")]
  Http {
    status: u16,
    payload: Option<Value>,
    message: String,
  },
  /// Rejected before any request was issued
  #[error("{0}")]
  Validation(ValidationErrors),
  /// Login succeeded at the HTTP level but the identity fields are missing
  #[error("login response is missing the user identity")]
  MalformedLogin,
  /// A 2xx body that does not match the expected shape
  #[error("failed to decode response: {message}")]
  Decode { message: String },
  /// Client state could not be persisted
  #[error("failed to store client state: {message}")]
  Storage { message: String },
}

impl ApiError {
  pub fn network() -> Self {
    Self::Network {
      message: NETWORK_ERROR.to_string(),
    }
  }

  pub fn http(status: u16, payload: Option<Value>) -> Self {
    Self::Http {
      status,
      payload,
      message: format!("Request failed with status code {}", status),
    }
  }

  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Http { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub fn payload(&self) -> Option<&Value> {
    match self {
      Self::Http { payload, .. } => payload.as_ref(),
      _ => None,
    }
  }
}

impl From<ValidationErrors> for ApiError {
  fn from(errors: ValidationErrors) -> Self {
    Self::Validation(errors)
  }
}

/// Structural kind of an HTTP failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
  ForeignKey,
  Unique,
  NotFound,
  Unknown,
}

/// Structured description of a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
  pub status: Option<u16>,
  pub message: String,
  pub constraint: Option<Constraint>,
}

/// Non-empty string field of a JSON object payload.
fn string_field<'a>(payload: Option<&'a Value>, field: &str) -> Option<&'a str> {
  payload?
    .get(field)?
    .as_str()
    .filter(|s| !s.is_empty())
}

/// Server-provided message: a string body, or `detail` then `message`.
fn server_message(payload: Option<&Value>) -> Option<&str> {
  match payload? {
    Value::String(s) if !s.is_empty() => Some(s),
    Value::Object(_) => string_field(payload, "detail").or_else(|| string_field(payload, "message")),
    _ => None,
  }
}

fn constraint_for(status: Option<u16>, text: &str) -> Option<Constraint> {
  let text = text.to_lowercase();
  let mentions = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

  if status == Some(409) || mentions(&["foreign key", "integrity", "constraint"]) {
    Some(Constraint::ForeignKey)
  } else if status == Some(404) || mentions(&["not found"]) {
    Some(Constraint::NotFound)
  } else if mentions(&["unique"]) {
    Some(Constraint::Unique)
  } else if status.is_some_and(|s| s >= 400) {
    Some(Constraint::Unknown)
  } else {
    None
  }
}

/// Classify a failure for programmatic branching.
pub fn classify(error: &ApiError, messages: &Messages) -> ErrorInfo {
  let status = error.status();
  let server = server_message(error.payload()).unwrap_or_default();
  let constraint = constraint_for(status, server);

  let message = if !server.is_empty() {
    server.to_string()
  } else {
    let raw = error.to_string();
    if raw.is_empty() {
      messages.unknown_error.clone()
    } else {
      raw
    }
  };

  ErrorInfo {
    status,
    message,
    constraint,
  }
}

/// Localized message for displaying a failed request.
pub fn user_message(error: &ApiError, messages: &Messages) -> String {
  match error {
    ApiError::Network { .. } => messages.network_error.clone(),
    ApiError::Validation(errors) => errors
      .first()
      .map(|(_, issue)| messages.issue(issue))
      .unwrap_or_else(|| messages.invalid_data.clone()),
    ApiError::MalformedLogin => messages.server_response_error.clone(),
    ApiError::Decode { message } => message.clone(),
    ApiError::Storage { .. } => messages.unknown_error.clone(),
    ApiError::Http {
      status,
      payload,
      message,
    } => {
      let payload = payload.as_ref();
      match *status {
        400 => string_field(payload, "message")
          .map(String::from)
          .unwrap_or_else(|| messages.invalid_data.clone()),
        401 | 403 => messages.no_permission.clone(),
        404 => messages.not_found.clone(),
        409 => string_field(payload, "message")
          .map(String::from)
          .unwrap_or_else(|| messages.duplicate.clone()),
        s if s >= 500 => messages.server_error.clone(),
        _ => {
          if let Some(server) = ["detail", "message", "error"]
            .into_iter()
            .find_map(|field| string_field(payload, field))
          {
            server.to_string()
          } else if message == NETWORK_ERROR {
            messages.network_error.clone()
          } else if message.is_empty() {
            messages.unknown_error.clone()
          } else {
            message.clone()
          }
        }
      }
    }
  }
}

/// Localized message for a failed sign-in.
pub fn login_message(error: &ApiError, messages: &Messages) -> String {
  match error {
    ApiError::Http {
      status: 401 | 403, ..
    } => messages.invalid_credentials.clone(),
    ApiError::Http { status: 400, .. } => messages.check_email.clone(),
    ApiError::Http { payload, .. } => ["detail", "message", "error"]
      .into_iter()
      .find_map(|field| string_field(payload.as_ref(), field))
      .map(String::from)
      .unwrap_or_else(|| messages.login_error.clone()),
    ApiError::Network { .. } => messages.network_error.clone(),
    ApiError::MalformedLogin => messages.server_response_error.clone(),
    ApiError::Validation(_) => user_message(error, messages),
    ApiError::Decode { .. } | ApiError::Storage { .. } => messages.login_error.clone(),
  }
}
