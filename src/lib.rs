//! Mailhook — inbound email webhook receiver.
//!
//! Accepts a JSON payload describing a received email, validates it into
//! a canonical record, routes it through a per-sender pipeline of pure
//! steps, and persists the result to a document store.

pub mod config;
pub mod email;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod routes;
pub mod store;
