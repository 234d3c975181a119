//! Localized user-facing strings.

use serde::Deserialize;

use crate::validation::Issue;

/// Display language for user-facing messages.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum Language {
  #[default]
  #[serde(rename = "en")]
  English,
  #[serde(rename = "pt-BR", alias = "pt-br")]
  PortugueseBrazil,
}

/// Message catalog used by the error extractors and validation rendering.
///
/// Templates may contain `{n}`, `{min}` and `{max}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
  pub unknown_error: String,
  pub invalid_data: String,
  pub no_permission: String,
  pub not_found: String,
  pub duplicate: String,
  pub server_error: String,
  pub network_error: String,

  pub login_error: String,
  pub invalid_credentials: String,
  pub check_email: String,
  pub server_response_error: String,

  pub required: String,
  pub min_length: String,
  pub exact_length: String,
  pub not_a_number: String,
  pub negative: String,
  pub out_of_range: String,
  pub invalid_email: String,
}

impl Default for Messages {
  fn default() -> Self {
    Self::english()
  }
}

impl Messages {
  pub fn for_language(language: Language) -> Self {
    match language {
      Language::English => Self::english(),
      Language::PortugueseBrazil => Self::portuguese(),
    }
  }

  pub fn english() -> Self {
    Self {
      unknown_error: "An unknown error occurred".into(),
      invalid_data: "Invalid data".into(),
      no_permission: "You do not have permission to perform this action".into(),
      not_found: "Record not found".into(),
      duplicate: "This record already exists".into(),
      server_error: "Server error, please try again later".into(),
      network_error: "Network error, check your connection".into(),

      login_error: "Could not sign in".into(),
      invalid_credentials: "Invalid e-mail or password".into(),
      check_email: "Check the e-mail address and try again".into(),
      server_response_error: "Unexpected response from the server".into(),

      required: "This field is required".into(),
      min_length: "Must be at least {n} characters".into(),
      exact_length: "Must be exactly {n} characters".into(),
      not_a_number: "Must be a valid number".into(),
      negative: "Must not be negative".into(),
      out_of_range: "Must be between {min} and {max}".into(),
      invalid_email: "Invalid e-mail address".into(),
    }
  }

  pub fn portuguese() -> Self {
    Self {
      unknown_error: "Ocorreu um erro desconhecido".into(),
      invalid_data: "Dados inválidos".into(),
      no_permission: "Você não tem permissão para realizar esta ação".into(),
      not_found: "Registro não encontrado".into(),
      duplicate: "Este registro já existe".into(),
      server_error: "Erro no servidor, tente novamente mais tarde".into(),
      network_error: "Erro de rede, verifique sua conexão".into(),

      login_error: "Não foi possível entrar".into(),
      invalid_credentials: "E-mail ou senha inválidos".into(),
      check_email: "Verifique o e-mail e tente novamente".into(),
      server_response_error: "Resposta inesperada do servidor".into(),

      required: "Campo obrigatório".into(),
      min_length: "Deve ter pelo menos {n} caracteres".into(),
      exact_length: "Deve ter exatamente {n} caracteres".into(),
      not_a_number: "Deve ser um número válido".into(),
      negative: "Não pode ser negativo".into(),
      out_of_range: "Deve estar entre {min} e {max}".into(),
      invalid_email: "E-mail inválido".into(),
    }
  }

  /// Render a single validation issue.
  pub fn issue(&self, issue: &Issue) -> String {
    match issue {
      Issue::Required => self.required.clone(),
      Issue::MinLength(n) => self.min_length.replace("{n}", &n.to_string()),
      Issue::ExactLength(n) => self.exact_length.replace("{n}", &n.to_string()),
      Issue::NotANumber => self.not_a_number.clone(),
      Issue::Negative => self.negative.clone(),
      Issue::OutOfRange { min, max } => self
        .out_of_range
        .replace("{min}", &min.to_string())
        .replace("{max}", &max.to_string()),
      Issue::InvalidEmail => self.invalid_email.clone(),
    }
  }
}
