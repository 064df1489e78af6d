//! Typed client for the SoleMate REST backend.
//!
//! `client` holds the single request path; the other modules add thin
//! endpoint wrappers as `impl ApiClient` blocks.

pub mod admin;
pub mod auth;
pub mod client;
pub mod feet;
pub mod minigame;

pub use admin::AdminUsersQuery;
pub use client::ApiClient;
