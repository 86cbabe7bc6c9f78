//! Database seeding functionality
//!
//! Populates a fresh database with a demo tenant and a small menu so the
//! API is explorable right after startup. Seeding only runs when enabled
//! in the configuration and is idempotent.

pub mod demo;

pub use demo::seed_demo_tenant;
