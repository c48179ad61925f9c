//! Jaeger HTTP query API backend
//!
//! - `client` - reqwest client implementing `TraceRepository`
//! - `types` - JSON wire format and conversion into the neutral trace model

mod client;
pub mod types;

pub use client::JaegerClient;
