//! Data layer for the IoTTU fleet-tracking client: REST access, query cache,
//! mutations, session persistence and error classification.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod messages;
pub mod query;
pub mod session;
pub mod storage;
pub mod theme;
pub mod validation;

#[cfg(test)]
mod testing;
