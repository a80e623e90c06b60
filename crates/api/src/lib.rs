//! HTTP API layer for memoriaviva.
//!
//! A thin translation layer over the core services:
//!
//! - **Endpoints**: communities, posts, users
//! - **Extractors**: authenticated identity
//! - **Middleware**: identity resolution, logging
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
