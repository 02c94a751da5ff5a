//! Serverless backend for the Geisa Thome catalogue.
//!
//! The crate wires the contracts in `gthome_core` to real I/O: storage
//! backends, route handlers, lifecycle event handlers, the axum development
//! server and the Lambda entry points in `src/bin`.

pub mod app;
pub mod config;
pub mod events;
pub mod handlers;
pub mod router;
pub mod state;
pub mod storage;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;
