//! Remote console API
//!
//! Thin reqwest wrapper that injects the active identity's credential header
//! and turns 401/403 responses into [`AuthSignal`](crate::events::AuthSignal)s.

pub mod client;

pub use client::{ApiClient, PERMISSIONS_PATH, REQUEST_ID_HEADER};
