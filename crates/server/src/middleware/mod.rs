//! HTTP middleware stack for the server.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. Admission gate (global one-per-interval limit)
//! 3. Request ID (add unique ID to each request)
//! 4. `TraceLayer` (request tracing)

pub mod admission;
pub mod request_id;

pub use admission::{Admission, AdmissionError, AdmissionGate, admission_middleware};
pub use request_id::request_id_middleware;
