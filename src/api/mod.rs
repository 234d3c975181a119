//! REST client for the fleet backend.

pub mod api_types;
pub mod client;
pub mod resource;
pub mod types;

pub use client::{ApiClient, ApiRequest, HttpTransport, Method, RawResponse, Transport};
pub use resource::{Collection, Resource, Resources, Writable};
