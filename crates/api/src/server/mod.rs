//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Inject shared application state (`AppState`) into handlers.
//! - Encrypt sensitive fields on write; decrypt, mask, or safe-decrypt on read.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
