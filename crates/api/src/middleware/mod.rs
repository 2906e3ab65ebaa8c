//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (when origins are configured)
//!
//! Trailing slashes are trimmed by `NormalizePathLayer` before routing.

pub mod auth;
pub mod request_id;

pub use auth::{RequireAuth, RequireStaff};
pub use request_id::request_id_middleware;
