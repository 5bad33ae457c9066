//! Unified error handling for the runtest library.
//!
//! Every failure mode here is non-fatal by design: provider errors become
//! informational status text for the renderer, and platform side-effect
//! failures are logged and ignored. Nothing in the core surfaces a panic
//! to the user.

use thiserror::Error;

/// Errors reported by the host's location provider.
///
/// These are surfaced to the renderer as informational status text while
/// the subscription stays active; distance simply stops accumulating
/// until a valid fix arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user denied the geolocation permission prompt.
    #[error("location permission denied")]
    PermissionDenied,
    /// No fix arrived within the acquisition timeout.
    #[error("location request timed out")]
    Timeout,
    /// The provider could not determine a position.
    #[error("position unavailable")]
    PositionUnavailable,
}

/// Failure of a best-effort platform side effect.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// The display wake lock could not be acquired.
    #[error("wake lock unavailable: {0}")]
    WakeLock(String),
}

/// An action token from the input surface did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action token '{0}'")]
pub struct UnknownAction(pub String);
