//! # PropAuth API
//!
//! Actix-web surface over `pa_core`. The binary in `main.rs` wires the
//! storage stack; everything else is exported for integration tests.

pub mod app;
pub mod config;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
