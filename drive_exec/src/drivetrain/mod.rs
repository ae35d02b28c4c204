//! # Drivetrain module
//!
//! The coordinator composing kinematics, module control and pose estimation
//! into the drivetrain's public surface: velocity commands in, pose
//! estimates out.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

use crate::kinematics::KinematicsError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when building the drivetrain.
#[derive(Debug, thiserror::Error)]
pub enum DrivetrainError {
    #[error("Invalid drivetrain geometry: {0}")]
    InvalidGeometry(#[from] KinematicsError),
}
