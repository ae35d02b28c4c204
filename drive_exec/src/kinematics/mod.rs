//! Swerve kinematics module
//!
//! Pure transforms between chassis-frame velocity and per-module
//! speed/angle states, plus the exact inverse used for odometry.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod chassis;
mod module;
mod swerve;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use chassis::*;
pub use module::*;
pub use swerve::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when building the kinematic transforms.
#[derive(Debug, thiserror::Error)]
pub enum KinematicsError {
    #[error("The module geometry does not admit an inverse kinematic map: {0}")]
    DegenerateGeometry(&'static str),
}
