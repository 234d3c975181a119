//! Scripted transport for unit tests.

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{ApiRequest, Method, RawResponse, Transport};
use crate::error::ApiError;

#[derive(Clone)]
struct Scripted {
  status: u16,
  body: Value,
  delay: Duration,
}

/// Records every request and answers from a per-route script.
///
/// Responses for a route are consumed in order; the last one repeats.
/// Requests to unscripted routes fail as if no response arrived.
#[derive(Default)]
pub struct FakeTransport {
  routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
  requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
    self.respond_after(method, path, Duration::ZERO, status, body);
  }

  pub fn respond_after(
    &self,
    method: Method,
    path: &str,
    delay: Duration,
    status: u16,
    body: Value,
  ) {
    self
      .routes
      .lock()
      .unwrap()
      .entry((method, path.to_string()))
      .or_default()
      .push_back(Scripted {
        status,
        body,
        delay,
      });
  }

  /// Replace the script for a route.
  pub fn reset(&self, method: Method, path: &str) {
    self
      .routes
      .lock()
      .unwrap()
      .remove(&(method, path.to_string()));
  }

  pub fn requests(&self) -> Vec<ApiRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn count(&self, method: Method, path: &str) -> usize {
    self
      .requests
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.method == method && r.path == path)
      .count()
  }

  fn next(&self, method: Method, path: &str) -> Option<Scripted> {
    let mut routes = self.routes.lock().unwrap();
    let script = routes.get_mut(&(method, path.to_string()))?;
    if script.len() > 1 {
      script.pop_front()
    } else {
      script.front().cloned()
    }
  }
}

impl Transport for FakeTransport {
  fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<RawResponse, ApiError>> {
    let scripted = self.next(request.method, &request.path);
    self.requests.lock().unwrap().push(request);

    Box::pin(async move {
      let scripted = scripted.ok_or_else(ApiError::network)?;
      if !scripted.delay.is_zero() {
        tokio::time::sleep(scripted.delay).await;
      }
      Ok(RawResponse {
        status: scripted.status,
        body: scripted.body.to_string(),
      })
    })
  }
}
