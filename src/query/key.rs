use std::fmt;

use crate::api::Collection;

/// Identifies one cached result: a collection, optionally restricted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
  pub collection: Collection,
  pub scope: Option<u64>,
}

impl QueryKey {
  pub fn all(collection: Collection) -> Self {
    Self {
      collection,
      scope: None,
    }
  }

  pub fn scoped(collection: Collection, scope: Option<u64>) -> Self {
    Self { collection, scope }
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.scope {
      Some(user_id) => write!(f, "{}:{}", self.collection, user_id),
      None => write!(f, "{}", self.collection),
    }
  }
}
