//! # Orderdesk API Library
//!
//! Core functionality for the Orderdesk multi-tenant ordering service,
//! including handlers, models, repositories and server configuration.

pub mod auth;
pub mod config;
pub mod cursor;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub use migration;
