//! # Trajectory control module
//!
//! Drives the measured pose towards a time-parameterised reference
//! trajectory with cascaded position/heading controllers plus feed-forward
//! from the trajectory's instantaneous velocity.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controllers;
mod params;
mod state;
mod trajectory;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use params::*;
pub use state::*;
pub use trajectory::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TrajCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    /// A trajectory is already loaded. Occurs when attempting to start a new
    /// trajectory before the current one has been finished or aborted.
    #[error("Attempted to load a trajectory while one is already executing")]
    TrajectoryAlreadyLoaded,

    /// A trajectory must contain at least two time-ordered samples.
    #[error("Trajectory has too few samples ({0}), need at least 2")]
    TooFewSamples(usize),

    /// Sample timestamps must be strictly increasing.
    #[error("Trajectory sample timestamps are not strictly increasing at index {0}")]
    NonMonotonicTime(usize),

    /// A generated trajectory would have zero length.
    #[error("Cannot generate a trajectory between coincident poses")]
    DegeneratePath,

    /// Generator limits must be positive.
    #[error("Trajectory generation limits must be positive (speed {speed_ms} m/s, accel {accel_mss} m/s^2)")]
    InvalidLimits { speed_ms: f64, accel_mss: f64 },
}
