use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ApiError;

/// When a newly mounted observer triggers a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchOnMount {
  /// Every mount refetches.
  Always,
  /// Mount refetches when the data is older than `stale_time` or invalidated.
  IfStale,
  /// Mount fetches only an entry that has never loaded.
  Never,
}

/// Per-query refresh behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
  pub refetch_on_mount: RefetchOnMount,
  pub refetch_on_window_focus: bool,
  pub stale_time: Duration,
}

impl QueryOptions {
  /// Refetch on every mount and on every focus.
  pub fn always() -> Self {
    Self {
      refetch_on_mount: RefetchOnMount::Always,
      refetch_on_window_focus: true,
      stale_time: Duration::ZERO,
    }
  }

  pub fn if_stale(stale_time: Duration) -> Self {
    Self {
      refetch_on_mount: RefetchOnMount::IfStale,
      refetch_on_window_focus: true,
      stale_time,
    }
  }

  pub fn with_refetch_on_mount(mut self, refetch_on_mount: RefetchOnMount) -> Self {
    self.refetch_on_mount = refetch_on_mount;
    self
  }

  pub fn with_refetch_on_window_focus(mut self, enabled: bool) -> Self {
    self.refetch_on_window_focus = enabled;
    self
  }

  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }
}

/// Status of a cache entry as seen by a consumer.
///
/// `Loading` takes precedence: a refetching entry never reports `Fresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Never fetched.
  Empty,
  /// A request is in flight. Earlier data stays readable.
  Loading,
  /// The last applied request succeeded.
  Fresh,
  /// The last applied request failed. Earlier data stays readable.
  Error,
}

/// Snapshot of a cache entry.
#[derive(Debug)]
pub struct QueryState<T> {
  pub status: QueryStatus,
  pub data: Option<Arc<T>>,
  pub error: Option<ApiError>,
  pub updated_at: Option<DateTime<Utc>>,
  pub stale: bool,
}

impl<T> QueryState<T> {
  pub(crate) fn empty() -> Self {
    Self {
      status: QueryStatus::Empty,
      data: None,
      error: None,
      updated_at: None,
      stale: true,
    }
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_fresh(&self) -> bool {
    self.status == QueryStatus::Fresh
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }
}

impl<T> Clone for QueryState<T> {
  fn clone(&self) -> Self {
    Self {
      status: self.status,
      data: self.data.clone(),
      error: self.error.clone(),
      updated_at: self.updated_at,
      stale: self.stale,
    }
  }
}
