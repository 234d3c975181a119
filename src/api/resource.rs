//! Typed CRUD operations per entity collection.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

use super::client::{encode, ApiClient, ApiRequest, Method};
use super::types::{
  Antenna, AntennaPayload, Motorcycle, MotorcyclePayload, MotorcycleStatus, Tag, TagPayload, User,
  UserPayload, Yard, YardPayload,
};
use crate::error::ApiError;
use crate::validation::Validate;

/// Server-side entity collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum Collection {
  Users,
  Yards,
  Motorcycles,
  Antennas,
  Tags,
  MotorcycleStatuses,
}

impl Collection {
  pub const ALL: [Collection; 6] = [
    Collection::Users,
    Collection::Yards,
    Collection::Motorcycles,
    Collection::Antennas,
    Collection::Tags,
    Collection::MotorcycleStatuses,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Collection::Users => "users",
      Collection::Yards => "yards",
      Collection::Motorcycles => "motorcycles",
      Collection::Antennas => "antennas",
      Collection::Tags => "tags",
      Collection::MotorcycleStatuses => "motorcycle-statuses",
    }
  }

  pub fn path(self) -> String {
    format!("/{}", self.name())
  }

  /// Collections whose derived state changes when this one is written.
  ///
  /// A tag's in-use flag comes from the motorcycle-tag association.
  pub fn coupled(self) -> &'static [Collection] {
    match self {
      Collection::Motorcycles => &[Collection::Tags],
      _ => &[],
    }
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// An entity served from one collection.
pub trait Resource: DeserializeOwned + Serialize + Send + Sync + 'static {
  const COLLECTION: Collection;

  fn id(&self) -> u64;
}

/// An entity the client may create, update and delete.
pub trait Writable: Resource {
  type Payload: DeserializeOwned + Serialize + Validate + Send + Sync + 'static;
}

macro_rules! resource {
  ($entity:ty, $collection:expr) => {
    impl Resource for $entity {
      const COLLECTION: Collection = $collection;

      fn id(&self) -> u64 {
        self.id
      }
    }
  };
  ($entity:ty, $collection:expr, $payload:ty) => {
    resource!($entity, $collection);

    impl Writable for $entity {
      type Payload = $payload;
    }
  };
}

resource!(User, Collection::Users, UserPayload);
resource!(Yard, Collection::Yards, YardPayload);
resource!(Motorcycle, Collection::Motorcycles, MotorcyclePayload);
resource!(Antenna, Collection::Antennas, AntennaPayload);
resource!(Tag, Collection::Tags, TagPayload);
resource!(MotorcycleStatus, Collection::MotorcycleStatuses);

/// Request set for one entity type. No retries; failures surface immediately.
pub struct Resources<R> {
  api: ApiClient,
  _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for Resources<R> {
  fn clone(&self) -> Self {
    Self {
      api: self.api.clone(),
      _marker: PhantomData,
    }
  }
}

impl<R: Resource> Resources<R> {
  pub(crate) fn new(api: ApiClient) -> Self {
    Self {
      api,
      _marker: PhantomData,
    }
  }

  fn item_path(id: u64) -> String {
    format!("{}/{}", R::COLLECTION.path(), id)
  }

  /// List the collection, restricted to one user's data when `scope` is set.
  pub async fn list(&self, scope: Option<u64>) -> Result<Vec<R>, ApiError> {
    let mut request = ApiRequest::new(Method::Get, R::COLLECTION.path());
    if let Some(user_id) = scope {
      request = request.with_query("userId", user_id);
    }
    self.api.fetch(request).await
  }

  pub async fn get(&self, id: u64) -> Result<R, ApiError> {
    self
      .api
      .fetch(ApiRequest::new(Method::Get, Self::item_path(id)))
      .await
  }
}

impl<R: Writable> Resources<R> {
  pub async fn create(&self, payload: &R::Payload) -> Result<R, ApiError> {
    payload.validate()?;
    let request = ApiRequest::new(Method::Post, R::COLLECTION.path()).with_body(encode(payload)?);
    self.api.fetch(request).await
  }

  pub async fn update(&self, id: u64, payload: &R::Payload) -> Result<R, ApiError> {
    payload.validate()?;
    let request = ApiRequest::new(Method::Put, Self::item_path(id)).with_body(encode(payload)?);
    self.api.fetch(request).await
  }

  pub async fn remove(&self, id: u64) -> Result<(), ApiError> {
    self
      .api
      .execute(ApiRequest::new(Method::Delete, Self::item_path(id)))
      .await
      .map(|_| ())
  }
}
