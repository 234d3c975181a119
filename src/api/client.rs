use futures::future::BoxFuture;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use color_eyre::{eyre::eyre, Result};

use crate::api::api_types::ApiLoginResponse;
use crate::api::resource::{Resource, Resources};
use crate::api::types::{Antenna, LoginCredentials, Motorcycle, MotorcycleStatus, Tag, User, Yard};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::validation::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
  Get,
  Post,
  Put,
  Delete,
}

/// A request relative to the configured base address.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
  pub method: Method,
  pub path: String,
  pub query: Vec<(String, String)>,
  pub body: Option<Value>,
}

impl ApiRequest {
  pub fn new(method: Method, path: impl Into<String>) -> Self {
    Self {
      method,
      path: path.into(),
      query: Vec::new(),
      body: None,
    }
  }

  pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
    self.query.push((key.to_string(), value.to_string()));
    self
  }

  pub fn with_body(mut self, body: Value) -> Self {
    self.body = Some(body);
    self
  }
}

/// Status and undecoded body of a response.
#[derive(Debug, Clone)]
pub struct RawResponse {
  pub status: u16,
  pub body: String,
}

/// Carries requests to the backend.
///
/// Implementations return `Ok` for any response that arrived, whatever its
/// status, and [`ApiError::Network`] when none did.
pub trait Transport: Send + Sync {
  fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<RawResponse, ApiError>>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
  client: reqwest::Client,
  base_url: Url,
}

impl HttpTransport {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;
    if base_url.cannot_be_a_base() {
      return Err(eyre!("Invalid API base URL {}", config.base_url));
    }

    // 3xx must surface as a failure, so redirects are not followed
    let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, base_url })
  }

  fn url_for(&self, request: &ApiRequest) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      segments
        .pop_if_empty()
        .extend(request.path.split('/').filter(|s| !s.is_empty()));
    }
    if !request.query.is_empty() {
      url.query_pairs_mut().extend_pairs(request.query.iter());
    }
    url
  }
}

fn transport_error(e: reqwest::Error) -> ApiError {
  warn!(error = %e, "request failed without a response");
  if e.is_timeout() {
    ApiError::Network {
      message: "timeout exceeded".to_string(),
    }
  } else {
    ApiError::network()
  }
}

impl Transport for HttpTransport {
  fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<RawResponse, ApiError>> {
    Box::pin(async move {
      let url = self.url_for(&request);
      let method = match request.method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
      };

      let mut builder = self
        .client
        .request(method, url)
        .header(ACCEPT, "application/json");
      if let Some(body) = &request.body {
        builder = builder.json(body);
      }

      let response = builder.send().await.map_err(transport_error)?;
      let status = response.status().as_u16();
      let body = response.text().await.map_err(transport_error)?;

      Ok(RawResponse { status, body })
    })
  }
}

/// Parse a response body: empty is `None`, non-JSON text is kept as a string.
fn parse_body(body: &str) -> Option<Value> {
  if body.trim().is_empty() {
    return None;
  }
  Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}

pub(crate) fn encode<T: Serialize>(value: &T) -> std::result::Result<Value, ApiError> {
  serde_json::to_value(value).map_err(|e| ApiError::Decode {
    message: format!("request body: {}", e),
  })
}

/// Fleet API client
#[derive(Clone)]
pub struct ApiClient {
  transport: Arc<dyn Transport>,
}

impl ApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let transport = HttpTransport::new(config)?;
    Ok(Self::with_transport(Arc::new(transport)))
  }

  pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
    Self { transport }
  }

  /// Send a request and return its payload when the status is 2xx.
  pub async fn execute(&self, request: ApiRequest) -> std::result::Result<Option<Value>, ApiError> {
    let method = request.method;
    let path = request.path.clone();
    debug!(?method, %path, query = ?request.query, "sending request");

    let raw = self.transport.send(request).await?;
    let payload = parse_body(&raw.body);

    if (200..300).contains(&raw.status) {
      Ok(payload)
    } else {
      warn!(?method, %path, status = raw.status, "request rejected");
      Err(ApiError::http(raw.status, payload))
    }
  }

  /// Send a request and decode its 2xx payload.
  pub async fn fetch<T: DeserializeOwned>(
    &self,
    request: ApiRequest,
  ) -> std::result::Result<T, ApiError> {
    let payload = self.execute(request).await?;
    serde_json::from_value(payload.unwrap_or(Value::Null)).map_err(|e| ApiError::Decode {
      message: e.to_string(),
    })
  }

  /// Authenticate and return the signed-in user.
  pub async fn login(&self, credentials: &LoginCredentials) -> std::result::Result<User, ApiError> {
    credentials.validate()?;

    let request = ApiRequest::new(Method::Post, "/auth/login").with_body(encode(credentials)?);
    let payload = self.execute(request).await?;

    let response: ApiLoginResponse = payload
      .and_then(|value| serde_json::from_value(value).ok())
      .ok_or(ApiError::MalformedLogin)?;
    response.into_user()
  }

  pub fn resource<R: Resource>(&self) -> Resources<R> {
    Resources::new(self.clone())
  }

  pub fn users(&self) -> Resources<User> {
    self.resource()
  }

  pub fn yards(&self) -> Resources<Yard> {
    self.resource()
  }

  pub fn motorcycles(&self) -> Resources<Motorcycle> {
    self.resource()
  }

  pub fn antennas(&self) -> Resources<Antenna> {
    self.resource()
  }

  pub fn tags(&self) -> Resources<Tag> {
    self.resource()
  }

  pub fn motorcycle_statuses(&self) -> Resources<MotorcycleStatus> {
    self.resource()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::FakeTransport;
  use serde_json::json;

  fn config(base_url: &str) -> ApiConfig {
    ApiConfig {
      base_url: base_url.to_string(),
      timeout_secs: None,
    }
  }

  #[test]
  fn test_url_joins_base_path_and_query() {
    let transport = HttpTransport::new(&config("http://10.0.2.2:8080/api/v1")).unwrap();
    let request = ApiRequest::new(Method::Get, "/motorcycles").with_query("userId", 7);
    assert_eq!(
      transport.url_for(&request).as_str(),
      "http://10.0.2.2:8080/api/v1/motorcycles?userId=7"
    );

    let transport = HttpTransport::new(&config("http://localhost/api/v1/")).unwrap();
    let request = ApiRequest::new(Method::Delete, "/tags/3");
    assert_eq!(
      transport.url_for(&request).as_str(),
      "http://localhost/api/v1/tags/3"
    );
  }

  #[test]
  fn test_rejects_invalid_base_url() {
    assert!(HttpTransport::new(&config("not a url")).is_err());
    assert!(HttpTransport::new(&config("mailto:fleet@example.com")).is_err());
  }

  #[test]
  fn test_parse_body() {
    assert_eq!(parse_body(""), None);
    assert_eq!(parse_body("  "), None);
    assert_eq!(parse_body(r#"{"a":1}"#), Some(json!({ "a": 1 })));
    assert_eq!(parse_body("Plate taken"), Some(json!("Plate taken")));
  }

  #[tokio::test]
  async fn test_non_2xx_is_failure_with_payload() {
    let transport = FakeTransport::new();
    transport.respond(
      Method::Get,
      "/yards/9",
      404,
      json!({ "message": "Yard not found" }),
    );
    transport.respond(Method::Get, "/yards/1", 302, json!(null));
    let client = ApiClient::with_transport(transport.clone());

    let err = client
      .execute(ApiRequest::new(Method::Get, "/yards/9"))
      .await
      .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.payload(), Some(&json!({ "message": "Yard not found" })));

    let err = client
      .execute(ApiRequest::new(Method::Get, "/yards/1"))
      .await
      .unwrap_err();
    assert_eq!(err.status(), Some(302));
  }

  /// Serve one canned reply per connection, recording each request line.
  async fn serve(reply: &'static str) -> (String, Arc<std::sync::Mutex<Vec<String>>>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/api/v1", listener.local_addr().unwrap());
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
      while let Ok((mut stream, _)) = listener.accept().await {
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
          match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
          }
        }
        let head = String::from_utf8_lossy(&head);
        if let Some(line) = head.lines().next() {
          log.lock().unwrap().push(line.to_string());
        }
        let _ = stream.write_all(reply.as_bytes()).await;
        let _ = stream.shutdown().await;
      }
    });

    (base_url, seen)
  }

  #[tokio::test]
  async fn test_redirect_is_not_followed() {
    let (base_url, seen) = serve(
      "HTTP/1.1 302 Found\r\nLocation: /x\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;
    let client = ApiClient::new(&config(&base_url)).unwrap();

    let err = client
      .execute(ApiRequest::new(Method::Get, "/yards/1"))
      .await
      .unwrap_err();

    assert!(matches!(err, ApiError::Http { status: 302, .. }));
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen, vec!["GET /api/v1/yards/1 HTTP/1.1".to_string()]);
  }

  #[tokio::test]
  async fn test_silent_server_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/api/v1", listener.local_addr().unwrap());
    tokio::spawn(async move {
      let mut held = Vec::new();
      while let Ok((stream, _)) = listener.accept().await {
        held.push(stream);
      }
    });
    let client = ApiClient::new(&ApiConfig {
      base_url,
      timeout_secs: Some(1),
    })
    .unwrap();

    let err = client
      .execute(ApiRequest::new(Method::Get, "/tags"))
      .await
      .unwrap_err();

    assert!(matches!(err, ApiError::Network { ref message } if message == "timeout exceeded"));
  }

  #[tokio::test]
  async fn test_unscripted_request_is_network_error() {
    let transport = FakeTransport::new();
    let client = ApiClient::with_transport(transport);
    let err = client
      .execute(ApiRequest::new(Method::Get, "/tags"))
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }));
  }

  #[tokio::test]
  async fn test_login_returns_user() {
    let transport = FakeTransport::new();
    transport.respond(
      Method::Post,
      "/auth/login",
      200,
      json!({
        "id_usuario": 3,
        "nome_usuario": "Rafa",
        "email_usuario": "rafa@fleet.io",
        "role": "ADMIN",
        "message": "Login successful"
      }),
    );
    let client = ApiClient::with_transport(transport.clone());

    let user = client
      .login(&LoginCredentials {
        email: "rafa@fleet.io".into(),
        password: "secret".into(),
      })
      .await
      .unwrap();
    assert_eq!(user.id, 3);
    assert_eq!(user.role, crate::api::types::Role::Admin);

    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(
      sent[0].body,
      Some(json!({ "email_usuario": "rafa@fleet.io", "senha_usuario": "secret" }))
    );
  }

  #[tokio::test]
  async fn test_login_without_id_is_malformed() {
    let transport = FakeTransport::new();
    transport.respond(
      Method::Post,
      "/auth/login",
      200,
      json!({ "message": "Login successful" }),
    );
    let client = ApiClient::with_transport(transport);

    let err = client
      .login(&LoginCredentials {
        email: "rafa@fleet.io".into(),
        password: "secret".into(),
      })
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::MalformedLogin));
  }

  #[tokio::test]
  async fn test_login_validates_before_sending() {
    let transport = FakeTransport::new();
    let client = ApiClient::with_transport(transport.clone());

    let err = client
      .login(&LoginCredentials {
        email: "not-an-email".into(),
        password: String::new(),
      })
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert!(transport.requests().is_empty());
  }
}
