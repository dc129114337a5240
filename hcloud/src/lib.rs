//! Hetzner Cloud API client
//!
//! Thin typed wrapper around the hcloud REST API: bearer-token auth, JSON
//! request/response bodies, and a small verb trait so consumers can be
//! exercised against a recording client in tests. Retries, backoff, and
//! rate limiting are left to callers.

mod client;
mod error;

pub use client::{Api, HetznerClient};
pub use error::ApiError;
