//! Global admission gate using governor.
//!
//! One shared limiter for the whole service, not keyed by client or path: at
//! most one request is admitted per interval and everything else is rejected
//! immediately with 429. Checking and consuming the permit is a single atomic
//! operation inside governor, so concurrent requests cannot both be admitted.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use thiserror::Error;

use crate::error::AppError;

/// Errors constructing an [`AdmissionGate`].
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The refill interval must be positive.
    #[error("admission interval must be greater than zero")]
    ZeroInterval,
}

/// Outcome of asking the gate to admit a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Rejected,
}

/// Single permit refilled once per interval, consumed without waiting.
#[derive(Clone)]
pub struct AdmissionGate {
    limiter: Arc<DefaultDirectRateLimiter>,
    interval: Duration,
}

impl AdmissionGate {
    /// Create a gate admitting one request per `interval`.
    ///
    /// The permit starts available, so the first request is admitted at once.
    ///
    /// # Errors
    ///
    /// Returns `AdmissionError::ZeroInterval` if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, AdmissionError> {
        let quota = Quota::with_period(interval)
            .ok_or(AdmissionError::ZeroInterval)?
            .allow_burst(NonZeroU32::MIN);

        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            interval,
        })
    }

    /// Consume the pending permit if there is one.
    #[must_use]
    pub fn admit(&self) -> Admission {
        match self.limiter.check() {
            Ok(()) => Admission::Allowed,
            Err(_) => Admission::Rejected,
        }
    }

    /// The refill interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl std::fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Middleware that rejects requests the gate does not admit.
///
/// Rejected requests never reach a handler.
pub async fn admission_middleware(
    State(gate): State<AdmissionGate>,
    request: Request,
    next: Next,
) -> Response {
    match gate.admit() {
        Admission::Allowed => next.run(request).await,
        Admission::Rejected => {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "Rate limit hit"
            );
            AppError::RateLimited.into_response()
        }
    }
}
