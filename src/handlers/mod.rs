//! HTTP handler modules.
//! Used by: server.

pub mod admin;
pub mod browse;
pub mod health;
pub mod metrics;
pub mod upload;
