// Library exports for SoleMate
// The binary and the integration tests both go through these modules

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod library;
pub mod models;
pub mod navigation;
pub mod render;
pub mod session;
pub mod state;
pub mod storage;
pub mod views;
