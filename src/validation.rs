//! Client-side payload validation.
//!
//! Validation runs before any request is built; a payload that fails never
//! reaches the transport. Each field reports only its first failing rule.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::api::types::{
  AntennaPayload, LoginCredentials, MotorcyclePayload, TagPayload, UserPayload, YardPayload,
};

static EMAIL: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// A single failed rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
  Required,
  MinLength(usize),
  ExactLength(usize),
  NotANumber,
  Negative,
  OutOfRange { min: f64, max: f64 },
  InvalidEmail,
}

/// Per-field failures, in form order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
  fields: Vec<(&'static str, Issue)>,
}

impl ValidationErrors {
  fn collect<const N: usize>(checks: [(&'static str, Option<Issue>); N]) -> Result<(), Self> {
    let fields: Vec<_> = checks
      .into_iter()
      .filter_map(|(field, issue)| issue.map(|i| (field, i)))
      .collect();

    if fields.is_empty() {
      Ok(())
    } else {
      Err(Self { fields })
    }
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  pub fn len(&self) -> usize {
    self.fields.len()
  }

  /// Issue reported for a wire field name, if any.
  pub fn get(&self, field: &str) -> Option<&Issue> {
    self
      .fields
      .iter()
      .find(|(name, _)| *name == field)
      .map(|(_, issue)| issue)
  }

  pub fn first(&self) -> Option<(&'static str, &Issue)> {
    self.fields.first().map(|(name, issue)| (*name, issue))
  }

  pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Issue)> {
    self.fields.iter().map(|(name, issue)| (*name, issue))
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names: Vec<&str> = self.fields.iter().map(|(name, _)| *name).collect();
    write!(f, "invalid fields: {}", names.join(", "))
  }
}

/// Payloads that can be checked before submission.
pub trait Validate {
  fn validate(&self) -> Result<(), ValidationErrors>;
}

fn text(value: &str, min: usize) -> Option<Issue> {
  if value.trim().is_empty() {
    Some(Issue::Required)
  } else if value.chars().count() < min {
    Some(Issue::MinLength(min))
  } else {
    None
  }
}

fn exact(value: &str, len: usize) -> Option<Issue> {
  if value.trim().is_empty() {
    Some(Issue::Required)
  } else if value.chars().count() != len {
    Some(Issue::ExactLength(len))
  } else {
    None
  }
}

fn reference(value: Option<u64>) -> Option<Issue> {
  match value {
    Some(id) if id > 0 => None,
    _ => Some(Issue::Required),
  }
}

fn email(value: &str) -> Option<Issue> {
  if value.trim().is_empty() {
    Some(Issue::Required)
  } else if !EMAIL.is_match(value.trim()) {
    Some(Issue::InvalidEmail)
  } else {
    None
  }
}

fn coordinate(value: f64, limit: f64) -> Option<Issue> {
  if !value.is_finite() {
    Some(Issue::NotANumber)
  } else if value < -limit || value > limit {
    Some(Issue::OutOfRange {
      min: -limit,
      max: limit,
    })
  } else {
    None
  }
}

fn postal_code(value: &str) -> Option<Issue> {
  if value.trim().is_empty() {
    return Some(Issue::Required);
  }
  let digits = value.chars().filter(char::is_ascii_digit).count();
  (digits != 8).then_some(Issue::ExactLength(8))
}

impl Validate for LoginCredentials {
  fn validate(&self) -> Result<(), ValidationErrors> {
    ValidationErrors::collect([
      ("email_usuario", email(&self.email)),
      ("senha_usuario", text(&self.password, 1)),
    ])
  }
}

impl Validate for UserPayload {
  fn validate(&self) -> Result<(), ValidationErrors> {
    ValidationErrors::collect([
      ("nome_usuario", text(&self.name, 3)),
      ("email_usuario", email(&self.email)),
      ("senha_usuario", text(&self.password, 6)),
    ])
  }
}

impl Validate for YardPayload {
  fn validate(&self) -> Result<(), ValidationErrors> {
    ValidationErrors::collect([
      ("id_usuario", reference(self.owner_id)),
      ("cep_patio", postal_code(&self.postal_code)),
      ("numero_patio", text(&self.number, 1)),
      ("cidade_patio", text(&self.city, 2)),
      ("estado_patio", exact(&self.state, 2)),
      (
        "capacidade_patio",
        (self.capacity < 0).then_some(Issue::Negative),
      ),
    ])
  }
}

impl Validate for MotorcyclePayload {
  fn validate(&self) -> Result<(), ValidationErrors> {
    ValidationErrors::collect([
      ("id_status", reference(self.status_id)),
      ("id_patio", reference(self.yard_id)),
      ("placa_moto", text(&self.plate, 7)),
      ("chassi_moto", text(&self.chassis, 17)),
      ("nr_motor_moto", text(&self.engine_number, 5)),
      ("modelo_moto", text(&self.model, 2)),
      ("selected_tag_id", reference(self.tag_id)),
    ])
  }
}

impl Validate for AntennaPayload {
  fn validate(&self) -> Result<(), ValidationErrors> {
    ValidationErrors::collect([
      ("id_patio", reference(self.yard_id)),
      ("codigo_antena", text(&self.code, 3)),
      ("latitude_antena", coordinate(self.latitude, 90.0)),
      ("longitude_antena", coordinate(self.longitude, 180.0)),
    ])
  }
}

impl Validate for TagPayload {
  fn validate(&self) -> Result<(), ValidationErrors> {
    ValidationErrors::collect([
      ("codigo_rfid_tag", text(&self.rfid_code, 5)),
      ("ssid_wifi_tag", text(&self.ssid, 2)),
      ("latitude_tag", coordinate(self.latitude, 90.0)),
      ("longitude_tag", coordinate(self.longitude, 180.0)),
    ])
  }
}
