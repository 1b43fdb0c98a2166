//! Error types shared by every part of the GUI core

use thiserror_no_std::Error;

/// Errors reported by GUI operations.
///
/// All of these are local and recoverable: the failing operation is aborted
/// and the tree, timers and clip state are left exactly as they were.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuiError {
    /// Capacity for a new widget or timer is exhausted
    #[error("Allocation failed: capacity exhausted")]
    AllocationFailed,

    /// A widget that needs a containing window was created without one
    #[error("No active window to hold the widget")]
    NoActiveWindow,

    /// The handle names a destroyed or unknown widget or timer
    #[error("Invalid or stale handle")]
    InvalidHandle,

    /// The drawing driver could not be bound at init
    #[error("Display driver unavailable")]
    DriverUnavailable,

    /// The requested parent cannot own children
    #[error("Parent widget is not a container")]
    NotAContainer,

    /// The widget would be nested deeper than the clip stack allows
    #[error("Widget nesting exceeds maximum depth ({max})")]
    NestingTooDeep {
        /// Maximum nesting depth
        max: usize,
    },

    /// Too many nested clip regions were pushed
    #[error("Clip stack overflow")]
    ClipStackOverflow,

    /// A periodic timer was requested with a zero period
    #[error("Periodic timer requires a non-zero period")]
    ZeroPeriod,

    /// The raw input queue is full and the sample was dropped
    #[error("Input queue full")]
    InputQueueFull,

    /// Configuration is malformed or out of range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with it
        reason: &'static str,
    },
}

/// Result type for GUI operations
pub type GuiResult<T> = Result<T, GuiError>;
