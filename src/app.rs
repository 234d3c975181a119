use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::types::LoginCredentials;
use crate::api::{ApiClient, Resource, Transport, Writable};
use crate::config::Config;
use crate::error::{self, ApiError, ErrorInfo};
use crate::messages::Messages;
use crate::query::{Mutation, Query, QueryClient, QueryKey, QueryOptions};
use crate::session::{Session, SessionStore};
use crate::storage::KeyValueStore;
use crate::theme::{Theme, ThemeStore};

/// Application state shared by every screen: API access, query cache,
/// session and preferences.
pub struct AppContext {
  api: ApiClient,
  queries: QueryClient,
  session: SessionStore,
  theme: ThemeStore,
  messages: Messages,
}

impl AppContext {
  pub fn new(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
    let api = ApiClient::new(&config.api)?;
    Ok(Self::with_api(config, api, store))
  }

  pub fn with_transport(
    config: &Config,
    transport: Arc<dyn Transport>,
    store: Arc<dyn KeyValueStore>,
  ) -> Self {
    Self::with_api(config, ApiClient::with_transport(transport), store)
  }

  fn with_api(config: &Config, api: ApiClient, store: Arc<dyn KeyValueStore>) -> Self {
    Self {
      api,
      queries: QueryClient::new(),
      session: SessionStore::restore(store.clone()),
      theme: ThemeStore::restore(store),
      messages: Messages::for_language(config.language),
    }
  }

  pub fn api(&self) -> &ApiClient {
    &self.api
  }

  pub fn queries(&self) -> &QueryClient {
    &self.queries
  }

  pub fn messages(&self) -> &Messages {
    &self.messages
  }

  pub fn session(&self) -> Option<Session> {
    self.session.current()
  }

  /// Authenticate and persist the session.
  ///
  /// Any failure, including failing to store the new session, leaves the
  /// context signed out.
  pub async fn sign_in(&self, credentials: &LoginCredentials) -> Result<Session, ApiError> {
    let result = self.api.login(credentials).await.and_then(|user| {
      let session = Session::from(user);
      self
        .session
        .save(session.clone())
        .map_err(|e| ApiError::Storage {
          message: e.to_string(),
        })?;
      Ok(session)
    });

    self.queries.clear();
    match result {
      Ok(session) => {
        info!(user_id = session.id, role = ?session.role, "signed in");
        Ok(session)
      }
      Err(e) => {
        if let Err(clear_err) = self.session.clear() {
          warn!(error = %clear_err, "could not remove stored session");
        }
        warn!(error = %e, "sign-in failed");
        Err(e)
      }
    }
  }

  pub fn sign_out(&self) -> Result<()> {
    self.session.clear()?;
    self.queries.clear();
    info!("signed out");
    Ok(())
  }

  fn require_session(&self) -> Result<Session> {
    self
      .session
      .current()
      .ok_or_else(|| eyre!("Not signed in. Run `iottu login` first."))
  }

  /// Cache key for a collection as seen by the current session.
  pub fn list_key<R: Resource>(&self) -> Result<QueryKey> {
    let session = self.require_session()?;
    Ok(QueryKey::scoped(R::COLLECTION, session.scope_user_id()))
  }

  /// Mount a list query scoped to the signed-in user.
  ///
  /// USER sessions request only their own entities; ADMIN sessions are unscoped.
  pub fn list<R: Resource>(&self, options: QueryOptions) -> Result<Query<Vec<R>>> {
    let key = self.list_key::<R>()?;
    let resources = self.api.resource::<R>();
    let scope = key.scope;

    Ok(self.queries.query(key, options, move || {
      let resources = resources.clone();
      async move { resources.list(scope).await }
    }))
  }

  pub fn create_mutation<R: Writable>(&self) -> Mutation<R::Payload, R> {
    let resources = self.api.resource::<R>();
    Mutation::for_collection(self.queries.clone(), R::COLLECTION, move |payload: R::Payload| {
      let resources = resources.clone();
      async move { resources.create(&payload).await }
    })
  }

  pub fn update_mutation<R: Writable>(&self) -> Mutation<(u64, R::Payload), R> {
    let resources = self.api.resource::<R>();
    Mutation::for_collection(
      self.queries.clone(),
      R::COLLECTION,
      move |(id, payload): (u64, R::Payload)| {
        let resources = resources.clone();
        async move { resources.update(id, &payload).await }
      },
    )
  }

  pub fn delete_mutation<R: Writable>(&self) -> Mutation<u64, ()> {
    let resources = self.api.resource::<R>();
    Mutation::for_collection(self.queries.clone(), R::COLLECTION, move |id: u64| {
      let resources = resources.clone();
      async move { resources.remove(id).await }
    })
  }

  /// The application came back to the foreground.
  pub fn focus(&self) -> usize {
    self.queries.focus()
  }

  pub fn classify(&self, error: &ApiError) -> ErrorInfo {
    error::classify(error, &self.messages)
  }

  pub fn user_message(&self, error: &ApiError) -> String {
    error::user_message(error, &self.messages)
  }

  pub fn login_message(&self, error: &ApiError) -> String {
    error::login_message(error, &self.messages)
  }

  pub fn theme(&self) -> Theme {
    self.theme.current()
  }

  pub fn toggle_theme(&self) -> Result<Theme> {
    self.theme.toggle()
  }
}
