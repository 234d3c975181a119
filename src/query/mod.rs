//! Client-side cache of server state.
//!
//! Inspired by TanStack Query: entries are keyed by collection and scope,
//! refreshed on mount, focus, manual refetch and invalidation, and keep
//! serving their last good data while a refresh is in flight.

mod cache;
mod key;
mod mutation;
mod state;

pub use cache::{Query, QueryClient};
pub use key::QueryKey;
pub use mutation::{Mutation, MutationStatus};
pub use state::{QueryOptions, QueryState, QueryStatus, RefetchOnMount};
