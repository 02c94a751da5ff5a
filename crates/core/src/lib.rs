//! Core contracts for the gthome backend.
//!
//! Everything in this crate is pure: record shapes and key builders for the
//! single-table store, lifecycle event payloads, HTTP envelopes, and the
//! traits the imperative shell implements. No I/O happens here.

#[cfg(feature = "auth")]
pub mod auth;
pub mod events;
pub mod http;
pub mod serde;
pub mod storage;
pub mod tables;
