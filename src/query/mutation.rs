//! Writes that invalidate cached queries on success.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

use super::cache::QueryClient;
use crate::api::Collection;
use crate::error::ApiError;

type MutateFn<I, O> = Box<dyn Fn(I) -> BoxFuture<'static, Result<O, ApiError>> + Send + Sync>;
type SuccessFn<O> = Box<dyn Fn(&O, &QueryClient) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&ApiError) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
  Idle,
  Pending,
  Success,
  Error,
}

/// A write against the backend.
///
/// No optimistic updates: the cache is touched only after the write
/// succeeds, and a failure leaves it unchanged.
pub struct Mutation<I, O> {
  client: QueryClient,
  mutate: MutateFn<I, O>,
  invalidates: Vec<Collection>,
  on_success: Option<SuccessFn<O>>,
  on_error: Option<ErrorFn>,
  status: Mutex<MutationStatus>,
}

impl<I: Send + 'static, O: Send + 'static> Mutation<I, O> {
  pub fn new<F, Fut>(client: QueryClient, mutate: F) -> Self
  where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, ApiError>> + Send + 'static,
  {
    Self {
      client,
      mutate: Box::new(move |input| -> BoxFuture<'static, Result<O, ApiError>> {
        Box::pin(mutate(input))
      }),
      invalidates: Vec::new(),
      on_success: None,
      on_error: None,
      status: Mutex::new(MutationStatus::Idle),
    }
  }

  /// Mutation on `collection` that invalidates it and its coupled collections.
  pub fn for_collection<F, Fut>(client: QueryClient, collection: Collection, mutate: F) -> Self
  where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, ApiError>> + Send + 'static,
  {
    let mutation = Self::new(client, mutate).invalidates(collection);
    collection
      .coupled()
      .iter()
      .fold(mutation, |mutation, coupled| mutation.invalidates(*coupled))
  }

  pub fn invalidates(mut self, collection: Collection) -> Self {
    if !self.invalidates.contains(&collection) {
      self.invalidates.push(collection);
    }
    self
  }

  /// Runs after the declared invalidations; may invalidate more.
  pub fn on_success<F>(mut self, callback: F) -> Self
  where
    F: Fn(&O, &QueryClient) + Send + Sync + 'static,
  {
    self.on_success = Some(Box::new(callback));
    self
  }

  pub fn on_error<F>(mut self, callback: F) -> Self
  where
    F: Fn(&ApiError) + Send + Sync + 'static,
  {
    self.on_error = Some(Box::new(callback));
    self
  }

  pub fn status(&self) -> MutationStatus {
    *self.status.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn is_pending(&self) -> bool {
    self.status() == MutationStatus::Pending
  }

  fn set_status(&self, status: MutationStatus) {
    *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
  }

  pub async fn run(&self, input: I) -> Result<O, ApiError> {
    self.set_status(MutationStatus::Pending);

    match (self.mutate)(input).await {
      Ok(output) => {
        self.client.record_write();
        for collection in &self.invalidates {
          self.client.invalidate(*collection);
        }
        if let Some(callback) = &self.on_success {
          callback(&output, &self.client);
        }
        info!(invalidated = ?self.invalidates, "mutation succeeded");
        self.set_status(MutationStatus::Success);
        Ok(output)
      }
      Err(e) => {
        warn!(error = %e, "mutation failed");
        if let Some(callback) = &self.on_error {
          callback(&e);
        }
        self.set_status(MutationStatus::Error);
        Err(e)
      }
    }
  }
}
