//! Parameters structure for the drivetrain

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::kinematics::{ModuleGeometry, PerModule};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drivetrain parameters.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Longitudinal distance between the front and back module axes.
    ///
    /// Units: meters
    pub wheel_base_m: f64,

    /// Lateral distance between the left and right module axes.
    ///
    /// Units: meters
    pub track_width_m: f64,

    /// The maximum achievable wheel speed, used for desaturation.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// The maximum angular rate the chassis will be commanded at.
    ///
    /// Units: radians/second
    pub max_omega_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// The module mounting offsets implied by the wheelbase and track.
    ///
    /// The robot frame has X forward and Y left, so the front modules are at
    /// +X and the left modules at +Y.
    pub fn geometry(&self) -> PerModule<ModuleGeometry> {
        let half_base_m = self.wheel_base_m / 2.0;
        let half_track_m = self.track_width_m / 2.0;

        PerModule::new(
            ModuleGeometry::new(half_base_m, half_track_m),
            ModuleGeometry::new(half_base_m, -half_track_m),
            ModuleGeometry::new(-half_base_m, half_track_m),
            ModuleGeometry::new(-half_base_m, -half_track_m),
        )
    }
}
