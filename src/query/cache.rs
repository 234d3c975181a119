//! Keyed cache of server state with observer handles.
//!
//! Each key holds at most one authoritative result. Fetches run on spawned
//! tokio tasks and settle back into the cache; observers read snapshots and
//! can wait for the entry to settle.
//!
//! ```ignore
//! let tags = api.tags();
//! let query = cache.query(QueryKey::all(Collection::Tags), QueryOptions::always(), move || {
//!   let tags = tags.clone();
//!   async move { tags.list(None).await }
//! });
//!
//! let state = query.settled().await;
//! match state.status {
//!   QueryStatus::Fresh => render(state.data()),
//!   QueryStatus::Error => render_error(state.error),
//!   _ => {}
//! }
//! ```

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::key::QueryKey;
use super::state::{QueryOptions, QueryState, QueryStatus, RefetchOnMount};
use crate::api::Collection;
use crate::error::ApiError;

type Erased = Arc<dyn Any + Send + Sync>;

/// Produces a fresh request future for an entry.
type FetcherFn = Arc<dyn Fn() -> BoxFuture<'static, Result<Erased, ApiError>> + Send + Sync>;

/// How a fetch trigger treats a request that is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
  /// Mount and focus: ride along with any in-flight request.
  Coalesce,
  /// Manual refetch: always issue a new request.
  Force,
  /// Invalidation: ride along only if the in-flight request began after the last write.
  Invalidate,
}

struct Entry {
  id: u64,
  data: Option<Erased>,
  data_seq: u64,
  error: Option<ApiError>,
  updated_at: Option<DateTime<Utc>>,
  /// Data produced by requests up to this sequence number is stale.
  invalidated_seq: u64,
  latest_seq: u64,
  applied_seq: u64,
  /// Write generation when `latest_seq` was issued.
  request_generation: u64,
  fetcher: FetcherFn,
  stale_time: Duration,
  observers: usize,
  focus_observers: usize,
}

impl Entry {
  fn is_fetching(&self) -> bool {
    self.latest_seq > self.applied_seq
  }

  fn is_stale(&self) -> bool {
    if self.data.is_none() || self.data_seq <= self.invalidated_seq {
      return true;
    }
    match self.updated_at {
      Some(at) => Utc::now()
        .signed_duration_since(at)
        .to_std()
        .map(|age| age >= self.stale_time)
        .unwrap_or(false),
      None => true,
    }
  }

  fn status(&self) -> QueryStatus {
    if self.is_fetching() {
      QueryStatus::Loading
    } else if self.error.is_some() {
      QueryStatus::Error
    } else if self.data.is_some() {
      QueryStatus::Fresh
    } else {
      QueryStatus::Empty
    }
  }

  fn snapshot<T: Send + Sync + 'static>(&self) -> QueryState<T> {
    QueryState {
      status: self.status(),
      data: self.data.clone().and_then(|data| data.downcast::<T>().ok()),
      error: self.error.clone(),
      updated_at: self.updated_at,
      stale: self.is_stale(),
    }
  }
}

/// A request reserved under the lock and started after releasing it.
struct Pending {
  entry_id: u64,
  seq: u64,
  fetcher: FetcherFn,
}

struct Inner {
  entries: Mutex<HashMap<QueryKey, Entry>>,
  changes: watch::Sender<u64>,
  next_seq: AtomicU64,
  next_entry: AtomicU64,
  write_generation: AtomicU64,
}

/// Shared handle to the query cache.
#[derive(Clone)]
pub struct QueryClient {
  inner: Arc<Inner>,
}

impl Default for QueryClient {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryClient {
  pub fn new() -> Self {
    let (changes, _) = watch::channel(0);
    Self {
      inner: Arc::new(Inner {
        entries: Mutex::new(HashMap::new()),
        changes,
        next_seq: AtomicU64::new(0),
        next_entry: AtomicU64::new(0),
        write_generation: AtomicU64::new(0),
      }),
    }
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
    self
      .inner
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  fn notify(&self) {
    self.inner.changes.send_modify(|version| *version += 1);
  }

  /// Receiver that ticks whenever any entry changes.
  pub fn changes(&self) -> watch::Receiver<u64> {
    self.inner.changes.subscribe()
  }

  /// Mount an observer on `key`, creating the entry on first use.
  ///
  /// `fetch` replaces the entry's fetcher. Must be called inside a tokio runtime.
  pub fn query<T, F, Fut>(&self, key: QueryKey, options: QueryOptions, fetch: F) -> Query<T>
  where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let fetcher: FetcherFn = Arc::new(move || -> BoxFuture<'static, Result<Erased, ApiError>> {
      let future = fetch();
      Box::pin(async move { future.await.map(|data| Arc::new(data) as Erased) })
    });

    let (entry_id, pending) = {
      let mut entries = self.entries();
      let entry = entries.entry(key).or_insert_with(|| Entry {
        id: self.inner.next_entry.fetch_add(1, Ordering::SeqCst) + 1,
        data: None,
        data_seq: 0,
        error: None,
        updated_at: None,
        invalidated_seq: 0,
        latest_seq: 0,
        applied_seq: 0,
        request_generation: 0,
        fetcher: fetcher.clone(),
        stale_time: options.stale_time,
        observers: 0,
        focus_observers: 0,
      });

      entry.fetcher = fetcher;
      entry.stale_time = options.stale_time;
      entry.observers += 1;
      if options.refetch_on_window_focus {
        entry.focus_observers += 1;
      }

      let wanted = match options.refetch_on_mount {
        RefetchOnMount::Always => true,
        RefetchOnMount::IfStale => entry.is_stale(),
        RefetchOnMount::Never => entry.data.is_none() && entry.error.is_none(),
      };
      let pending = if wanted {
        self.begin(entry, FetchMode::Coalesce)
      } else {
        None
      };
      (entry.id, pending)
    };

    if let Some(pending) = pending {
      self.start(key, pending);
    }

    Query {
      client: self.clone(),
      key,
      entry_id,
      focus: options.refetch_on_window_focus,
      _marker: PhantomData,
    }
  }

  /// Reserve a request for `entry` unless an in-flight one already covers `mode`.
  fn begin(&self, entry: &mut Entry, mode: FetchMode) -> Option<Pending> {
    let generation = self.inner.write_generation.load(Ordering::SeqCst);
    if entry.is_fetching() {
      let covered = match mode {
        FetchMode::Coalesce => true,
        FetchMode::Force => false,
        FetchMode::Invalidate => entry.request_generation >= generation,
      };
      if covered {
        return None;
      }
    }

    let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
    entry.latest_seq = seq;
    entry.request_generation = generation;
    Some(Pending {
      entry_id: entry.id,
      seq,
      fetcher: entry.fetcher.clone(),
    })
  }

  fn start(&self, key: QueryKey, pending: Pending) {
    debug!(%key, seq = pending.seq, "fetching");
    self.notify();

    let future = (pending.fetcher)();
    let client = self.clone();
    tokio::spawn(async move {
      let result = future.await;
      client.settle(key, pending.entry_id, pending.seq, result);
    });
  }

  fn settle(&self, key: QueryKey, entry_id: u64, seq: u64, result: Result<Erased, ApiError>) {
    {
      let mut entries = self.entries();
      let entry = match entries.get_mut(&key) {
        Some(entry) if entry.id == entry_id => entry,
        _ => {
          debug!(%key, seq, "discarding result for removed entry");
          return;
        }
      };
      if seq <= entry.applied_seq {
        debug!(%key, seq, applied = entry.applied_seq, "discarding out-of-order result");
        return;
      }

      entry.applied_seq = seq;
      match result {
        Ok(data) => {
          entry.data = Some(data);
          entry.data_seq = seq;
          entry.error = None;
          entry.updated_at = Some(Utc::now());
        }
        Err(e) => {
          warn!(%key, seq, error = %e, "query failed");
          entry.error = Some(e);
        }
      }
    }
    self.notify();
  }

  fn dispatch(&self, key: &QueryKey, mode: FetchMode) -> bool {
    let pending = {
      let mut entries = self.entries();
      match entries.get_mut(key) {
        Some(entry) => self.begin(entry, mode),
        None => None,
      }
    };

    match pending {
      Some(pending) => {
        self.start(*key, pending);
        true
      }
      None => false,
    }
  }

  fn release(&self, key: &QueryKey, entry_id: u64, focus: bool) {
    let mut entries = self.entries();
    if let Some(entry) = entries.get_mut(key) {
      if entry.id != entry_id {
        return;
      }
      entry.observers = entry.observers.saturating_sub(1);
      if focus {
        entry.focus_observers = entry.focus_observers.saturating_sub(1);
      }
    }
  }

  /// Record a successful write; requests issued before it can no longer
  /// satisfy an invalidation.
  pub(crate) fn record_write(&self) {
    self.inner.write_generation.fetch_add(1, Ordering::SeqCst);
  }

  /// Mark matching entries stale and refetch those that are observed.
  ///
  /// Returns the number of entries marked.
  fn invalidate_where(&self, label: &str, matches: impl Fn(&QueryKey) -> bool) -> usize {
    let generation = self.inner.write_generation.load(Ordering::SeqCst);
    let issued = self.inner.next_seq.load(Ordering::SeqCst);

    let mut marked = 0;
    let mut started = Vec::new();
    {
      let mut entries = self.entries();
      for (key, entry) in entries.iter_mut().filter(|(key, _)| matches(key)) {
        marked += 1;
        let satisfied_in_flight = entry.is_fetching() && entry.request_generation >= generation;
        let boundary = if satisfied_in_flight {
          entry.latest_seq - 1
        } else {
          issued
        };
        entry.invalidated_seq = entry.invalidated_seq.max(boundary);

        if entry.observers > 0 {
          if let Some(pending) = self.begin(entry, FetchMode::Invalidate) {
            started.push((*key, pending));
          }
        }
      }
    }

    info!(queries = label, marked, refetching = started.len(), "invalidated queries");
    for (key, pending) in started {
      self.start(key, pending);
    }
    if marked > 0 {
      self.notify();
    }
    marked
  }

  /// Invalidate every entry of `collection`, whatever its scope.
  pub fn invalidate(&self, collection: Collection) -> usize {
    self.invalidate_where(collection.name(), |key| key.collection == collection)
  }

  pub fn invalidate_key(&self, key: &QueryKey) -> usize {
    self.invalidate_where(&key.to_string(), |candidate| candidate == key)
  }

  /// The application regained focus: refetch stale entries that opted in.
  pub fn focus(&self) -> usize {
    let started: Vec<(QueryKey, Pending)> = {
      let mut entries = self.entries();
      entries
        .iter_mut()
        .filter(|(_, entry)| entry.focus_observers > 0 && entry.is_stale())
        .filter_map(|(key, entry)| {
          self
            .begin(entry, FetchMode::Coalesce)
            .map(|pending| (*key, pending))
        })
        .collect()
    };

    let count = started.len();
    for (key, pending) in started {
      self.start(key, pending);
    }
    count
  }

  /// Drop every entry. Results of requests still in flight are discarded.
  pub fn clear(&self) {
    let dropped = {
      let mut entries = self.entries();
      let dropped = entries.len();
      entries.clear();
      dropped
    };
    info!(dropped, "query cache cleared");
    self.notify();
  }

  pub fn state<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
    self
      .entries()
      .get(key)
      .map(Entry::snapshot::<T>)
      .unwrap_or_else(QueryState::empty)
  }

  pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
    self.state::<T>(key).data
  }

  pub fn is_fetching(&self, key: &QueryKey) -> bool {
    self
      .entries()
      .get(key)
      .map(Entry::is_fetching)
      .unwrap_or(false)
  }

  /// Wait until `key` has no request in flight.
  pub async fn settled(&self, key: &QueryKey) {
    let mut changes = self.inner.changes.subscribe();
    while self.is_fetching(key) {
      if changes.changed().await.is_err() {
        return;
      }
    }
  }
}

/// An observer of one cache entry. Dropping it unmounts the observer but
/// does not cancel requests.
pub struct Query<T> {
  client: QueryClient,
  key: QueryKey,
  entry_id: u64,
  focus: bool,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Query<T> {
  pub fn key(&self) -> QueryKey {
    self.key
  }

  pub fn state(&self) -> QueryState<T> {
    self.client.state(&self.key)
  }

  pub fn status(&self) -> QueryStatus {
    self.state().status
  }

  /// Last good data, which may be stale.
  pub fn data(&self) -> Option<Arc<T>> {
    self.state().data
  }

  pub fn error(&self) -> Option<ApiError> {
    self.state().error
  }

  pub fn is_loading(&self) -> bool {
    self.state().is_loading()
  }

  /// Issue a new request even if one is in flight.
  pub fn refetch(&self) -> bool {
    self.client.dispatch(&self.key, FetchMode::Force)
  }

  /// Wait for in-flight requests to settle and return the resulting state.
  pub async fn settled(&self) -> QueryState<T> {
    self.client.settled(&self.key).await;
    self.state()
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    self.client.release(&self.key, self.entry_id, self.focus);
  }
}

impl<T> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("entry_id", &self.entry_id)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::Tag;
  use crate::api::{ApiClient, Method};
  use crate::testing::FakeTransport;
  use serde_json::json;
  use std::sync::atomic::AtomicUsize;

  fn tags(rfid: &str) -> serde_json::Value {
    json!([{ "id_tag": 1, "codigo_rfid_tag": rfid }])
  }

  fn mount_tags(client: &QueryClient, api: &ApiClient, options: QueryOptions) -> Query<Vec<Tag>> {
    let resources = api.tags();
    client.query(QueryKey::all(Collection::Tags), options, move || {
      let resources = resources.clone();
      async move { resources.list(None).await }
    })
  }

  fn rfid(state: &QueryState<Vec<Tag>>) -> Option<String> {
    state.data().map(|tags| tags[0].rfid_code.clone())
  }

  #[tokio::test]
  async fn test_mount_fetches_and_settles_fresh() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, "/tags", 200, tags("RFID-0001"));
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();

    let query = mount_tags(&client, &api, QueryOptions::always());
    assert_eq!(query.status(), QueryStatus::Loading);

    let state = query.settled().await;
    assert_eq!(state.status, QueryStatus::Fresh);
    assert_eq!(rfid(&state).as_deref(), Some("RFID-0001"));
    assert!(state.updated_at.is_some());
  }

  #[tokio::test]
  async fn test_second_mount_coalesces_onto_in_flight_request() {
    let transport = FakeTransport::new();
    transport.respond_after(
      Method::Get,
      "/tags",
      Duration::from_millis(30),
      200,
      tags("RFID-0001"),
    );
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();

    let first = mount_tags(&client, &api, QueryOptions::always());
    let second = mount_tags(&client, &api, QueryOptions::always());
    second.settled().await;

    assert_eq!(transport.count(Method::Get, "/tags"), 1);
    assert_eq!(first.status(), QueryStatus::Fresh);
  }

  #[tokio::test]
  async fn test_refetch_keeps_data_while_loading() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, "/tags", 200, tags("RFID-0001"));
    transport.respond_after(
      Method::Get,
      "/tags",
      Duration::from_millis(30),
      200,
      tags("RFID-0002"),
    );
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();

    let query = mount_tags(&client, &api, QueryOptions::always());
    query.settled().await;

    assert!(query.refetch());
    let loading = query.state();
    assert_eq!(loading.status, QueryStatus::Loading);
    assert_eq!(rfid(&loading).as_deref(), Some("RFID-0001"));

    let state = query.settled().await;
    assert_eq!(state.status, QueryStatus::Fresh);
    assert_eq!(rfid(&state).as_deref(), Some("RFID-0002"));
  }

  #[tokio::test]
  async fn test_error_keeps_last_good_data() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, "/tags", 200, tags("RFID-0001"));
    transport.respond(Method::Get, "/tags", 500, json!({ "message": "boom" }));
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();

    let query = mount_tags(&client, &api, QueryOptions::always());
    query.settled().await;
    query.refetch();

    let state = query.settled().await;
    assert_eq!(state.status, QueryStatus::Error);
    assert_eq!(state.error.as_ref().and_then(ApiError::status), Some(500));
    assert_eq!(rfid(&state).as_deref(), Some("RFID-0001"));
  }

  #[tokio::test]
  async fn test_older_response_is_discarded() {
    let transport = FakeTransport::new();
    transport.respond_after(
      Method::Get,
      "/tags",
      Duration::from_millis(50),
      200,
      tags("RFID-SLOW"),
    );
    transport.respond(Method::Get, "/tags", 200, tags("RFID-FAST"));
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();

    let query = mount_tags(&client, &api, QueryOptions::always());
    query.refetch();
    query.settled().await;
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(transport.count(Method::Get, "/tags"), 2);
    let state = query.state();
    assert_eq!(state.status, QueryStatus::Fresh);
    assert_eq!(rfid(&state).as_deref(), Some("RFID-FAST"));
  }

  #[tokio::test]
  async fn test_double_invalidate_issues_one_request() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, "/tags", 200, tags("RFID-0001"));
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();

    let query = mount_tags(&client, &api, QueryOptions::always());
    query.settled().await;

    assert_eq!(client.invalidate(Collection::Tags), 1);
    assert_eq!(client.invalidate(Collection::Tags), 1);
    let state = query.settled().await;

    assert_eq!(transport.count(Method::Get, "/tags"), 2);
    assert_eq!(state.status, QueryStatus::Fresh);
  }

  #[tokio::test]
  async fn test_invalidation_after_write_does_not_reuse_older_request() {
    let transport = FakeTransport::new();
    transport.respond_after(
      Method::Get,
      "/tags",
      Duration::from_millis(30),
      200,
      tags("RFID-0001"),
    );
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();

    let query = mount_tags(&client, &api, QueryOptions::always());
    client.record_write();
    client.invalidate(Collection::Tags);
    query.settled().await;

    assert_eq!(transport.count(Method::Get, "/tags"), 2);
  }

  #[tokio::test]
  async fn test_unobserved_entry_is_only_marked_stale() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, "/tags", 200, tags("RFID-0001"));
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();
    let options = QueryOptions::if_stale(Duration::from_secs(300));

    let query = mount_tags(&client, &api, options);
    query.settled().await;
    drop(query);

    assert_eq!(client.invalidate(Collection::Tags), 1);
    assert!(!client.is_fetching(&QueryKey::all(Collection::Tags)));
    assert!(client.state::<Vec<Tag>>(&QueryKey::all(Collection::Tags)).stale);
    assert_eq!(transport.count(Method::Get, "/tags"), 1);

    let query = mount_tags(&client, &api, options);
    assert!(query.is_loading());
    query.settled().await;
    assert_eq!(transport.count(Method::Get, "/tags"), 2);
  }

  #[tokio::test]
  async fn test_fresh_data_is_not_refetched_when_mounting_if_stale() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, "/tags", 200, tags("RFID-0001"));
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();
    let options = QueryOptions::if_stale(Duration::from_secs(300));

    let first = mount_tags(&client, &api, options);
    first.settled().await;
    let second = mount_tags(&client, &api, options);

    assert_eq!(second.status(), QueryStatus::Fresh);
    assert_eq!(transport.count(Method::Get, "/tags"), 1);
  }

  #[tokio::test]
  async fn test_never_mount_fetches_only_unsettled_entries() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, "/tags", 200, tags("RFID-0001"));
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();
    let options = QueryOptions::always().with_refetch_on_mount(RefetchOnMount::Never);

    let first = mount_tags(&client, &api, options);
    assert!(first.is_loading());
    first.settled().await;
    assert_eq!(transport.count(Method::Get, "/tags"), 1);

    let second = mount_tags(&client, &api, options);
    assert_eq!(second.status(), QueryStatus::Fresh);
    assert!(!client.is_fetching(&QueryKey::all(Collection::Tags)));
    assert_eq!(transport.count(Method::Get, "/tags"), 1);
  }

  #[tokio::test]
  async fn test_never_mount_does_not_retry_failed_entry() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = QueryKey::all(Collection::Yards);
    let options = QueryOptions::always().with_refetch_on_mount(RefetchOnMount::Never);
    let failing = |calls: Arc<AtomicUsize>| {
      move || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<Vec<u64>, _>(ApiError::network()) }
      }
    };

    let first = client.query(key, options, failing(calls.clone()));
    assert_eq!(first.settled().await.status, QueryStatus::Error);

    let second = client.query(key, options, failing(calls.clone()));
    assert_eq!(second.status(), QueryStatus::Error);
    assert!(!client.is_fetching(&key));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_focus_refetches_opted_in_entries() {
    let transport = FakeTransport::new();
    transport.respond(Method::Get, "/tags", 200, tags("RFID-0001"));
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();

    let quiet = mount_tags(
      &client,
      &api,
      QueryOptions::always().with_refetch_on_window_focus(false),
    );
    quiet.settled().await;
    assert_eq!(client.focus(), 0);

    let query = mount_tags(&client, &api, QueryOptions::always());
    query.settled().await;
    assert_eq!(client.focus(), 1);
    query.settled().await;

    assert_eq!(transport.count(Method::Get, "/tags"), 3);
  }

  #[tokio::test]
  async fn test_clear_discards_in_flight_results() {
    let transport = FakeTransport::new();
    transport.respond_after(
      Method::Get,
      "/tags",
      Duration::from_millis(20),
      200,
      tags("RFID-0001"),
    );
    let api = ApiClient::with_transport(transport.clone());
    let client = QueryClient::new();

    let query = mount_tags(&client, &api, QueryOptions::always());
    client.clear();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = query.state();
    assert_eq!(state.status, QueryStatus::Empty);
    assert!(state.data.is_none());
  }

  #[tokio::test]
  async fn test_scoped_keys_are_independent() {
    let client = QueryClient::new();
    let mine = client.query(
      QueryKey::scoped(Collection::Yards, Some(7)),
      QueryOptions::always(),
      || async { Ok::<_, ApiError>(vec![7u64]) },
    );
    let all = client.query(
      QueryKey::all(Collection::Yards),
      QueryOptions::always(),
      || async { Ok::<_, ApiError>(vec![7u64, 9]) },
    );

    assert_eq!(mine.settled().await.data().map(Vec::len), Some(1));
    assert_eq!(all.settled().await.data().map(Vec::len), Some(2));
    assert_eq!(client.invalidate(Collection::Yards), 2);
  }
}
