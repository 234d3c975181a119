//! Domain entities and write payloads.
//!
//! Field names on the wire follow the backend; Rust names are English.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::api_types::Embedded;

/// Account role. Unrecognized roles are treated as [`Role::User`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
  Admin,
  #[default]
  User,
}

impl From<String> for Role {
  fn from(value: String) -> Self {
    if value.eq_ignore_ascii_case("ADMIN") {
      Role::Admin
    } else {
      Role::User
    }
  }
}

impl From<Role> for String {
  fn from(role: Role) -> Self {
    match role {
      Role::Admin => "ADMIN".to_string(),
      Role::User => "USER".to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  #[serde(rename = "id_usuario")]
  pub id: u64,
  #[serde(rename = "nome_usuario", default)]
  pub name: String,
  #[serde(rename = "email_usuario", default)]
  pub email: String,
  #[serde(default)]
  pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Yard {
  #[serde(rename = "id_patio")]
  pub id: u64,
  #[serde(rename = "id_usuario", alias = "user", default)]
  pub owner: Option<Embedded<User>>,
  #[serde(rename = "cep_patio", default)]
  pub postal_code: String,
  #[serde(rename = "numero_patio", default)]
  pub number: String,
  #[serde(rename = "cidade_patio", default)]
  pub city: String,
  #[serde(rename = "estado_patio", default)]
  pub state: String,
  #[serde(rename = "capacidade_patio", default)]
  pub capacity: i64,
}

/// Read-only lookup for motorcycle states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorcycleStatus {
  #[serde(rename = "id_status")]
  pub id: u64,
  #[serde(rename = "descricao_status", default)]
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
  #[serde(rename = "id_tag")]
  pub id: u64,
  #[serde(rename = "codigo_rfid_tag", default)]
  pub rfid_code: String,
  #[serde(rename = "ssid_wifi_tag", default)]
  pub ssid: String,
  #[serde(rename = "latitude_tag", default)]
  pub latitude: f64,
  #[serde(rename = "longitude_tag", default)]
  pub longitude: f64,
  #[serde(rename = "em_uso", default)]
  pub in_use: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motorcycle {
  #[serde(rename = "id_moto")]
  pub id: u64,
  #[serde(rename = "placa_moto", default)]
  pub plate: String,
  #[serde(rename = "chassi_moto", default)]
  pub chassis: String,
  #[serde(rename = "nr_motor_moto", default)]
  pub engine_number: String,
  #[serde(rename = "modelo_moto", default)]
  pub model: String,
  #[serde(rename = "id_status", alias = "status", default)]
  pub status: Option<Embedded<MotorcycleStatus>>,
  #[serde(rename = "id_patio", alias = "yard", default)]
  pub yard: Option<Embedded<Yard>>,
  #[serde(default)]
  pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Antenna {
  #[serde(rename = "id_antena")]
  pub id: u64,
  #[serde(rename = "id_patio", alias = "yard", default)]
  pub yard: Option<Embedded<Yard>>,
  #[serde(rename = "codigo_antena", default)]
  pub code: String,
  #[serde(rename = "latitude_antena", default)]
  pub latitude: f64,
  #[serde(rename = "longitude_antena", default)]
  pub longitude: f64,
}

// ============================================================================
// Write payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginCredentials {
  #[serde(rename = "email_usuario")]
  pub email: String,
  #[serde(rename = "senha_usuario")]
  pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
  #[serde(rename = "nome_usuario")]
  pub name: String,
  #[serde(rename = "email_usuario")]
  pub email: String,
  #[serde(rename = "senha_usuario")]
  pub password: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YardPayload {
  #[serde(rename = "id_usuario")]
  pub owner_id: Option<u64>,
  #[serde(rename = "cep_patio")]
  pub postal_code: String,
  #[serde(rename = "numero_patio")]
  pub number: String,
  #[serde(rename = "cidade_patio")]
  pub city: String,
  #[serde(rename = "estado_patio")]
  pub state: String,
  #[serde(rename = "capacidade_patio")]
  pub capacity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorcyclePayload {
  #[serde(rename = "id_status")]
  pub status_id: Option<u64>,
  #[serde(rename = "id_patio")]
  pub yard_id: Option<u64>,
  #[serde(rename = "placa_moto")]
  pub plate: String,
  #[serde(rename = "chassi_moto")]
  pub chassis: String,
  #[serde(rename = "nr_motor_moto")]
  pub engine_number: String,
  #[serde(rename = "modelo_moto")]
  pub model: String,
  #[serde(rename = "selected_tag_id")]
  pub tag_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaPayload {
  #[serde(rename = "id_patio")]
  pub yard_id: Option<u64>,
  #[serde(rename = "codigo_antena")]
  pub code: String,
  #[serde(rename = "latitude_antena")]
  pub latitude: f64,
  #[serde(rename = "longitude_antena")]
  pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagPayload {
  #[serde(rename = "codigo_rfid_tag")]
  pub rfid_code: String,
  #[serde(rename = "ssid_wifi_tag")]
  pub ssid: String,
  #[serde(rename = "latitude_tag")]
  pub latitude: f64,
  #[serde(rename = "longitude_tag")]
  pub longitude: f64,
}

/// Tags not attached to any motorcycle other than `editing`.
///
/// The form for a motorcycle offers its own tag back while editing.
pub fn available_tags<'a>(
  tags: &'a [Tag],
  motorcycles: &[Motorcycle],
  editing: Option<u64>,
) -> Vec<&'a Tag> {
  let used: HashSet<u64> = motorcycles
    .iter()
    .filter(|m| Some(m.id) != editing)
    .flat_map(|m| m.tags.iter().map(|t| t.id))
    .collect();

  tags.iter().filter(|t| !used.contains(&t.id)).collect()
}
