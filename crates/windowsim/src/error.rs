//! Platform errors

use thiserror::Error;

use crate::surface::{SurfaceId, SurfaceKind};

/// Errors raised by surfaces, the placement engine and the screen registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowingError {
    /// An operation was invoked on a window or popup after `close()`
    #[error("{kind} {id} is closed")]
    ClosedSurface { kind: SurfaceKind, id: SurfaceId },

    /// A capability the headless platform deliberately does not provide
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Degenerate or negative geometry (zero-area constraint, negative size, ...)
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// `screen::init` called twice without a `screen::reset` in between
    #[error("screen registry is already initialized")]
    RegistryInitialized,
}

pub type Result<T, E = WindowingError> = std::result::Result<T, E>;
