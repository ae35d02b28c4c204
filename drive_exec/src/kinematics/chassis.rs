//! Chassis-level velocity and displacement types

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A chassis velocity demand or measurement.
///
/// The frame the velocity is expressed in is carried by [`VelocityCommand`],
/// never by convention.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct ChassisVelocity {
    /// Linear velocity along the frame's X axis.
    ///
    /// Units: meters/second
    pub vx_ms: f64,

    /// Linear velocity along the frame's Y axis.
    ///
    /// Units: meters/second
    pub vy_ms: f64,

    /// Angular velocity about the frame's Z axis (counter-clockwise
    /// positive).
    ///
    /// Units: radians/second
    pub omega_rads: f64,
}

/// A chassis displacement over one control period, in the robot frame.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ChassisDisplacement {
    /// Displacement along the robot's X (forward) axis.
    ///
    /// Units: meters
    pub dx_m: f64,

    /// Displacement along the robot's Y (left) axis.
    ///
    /// Units: meters
    pub dy_m: f64,

    /// Change in heading implied by the module displacements.
    ///
    /// Units: radians
    pub dheading_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A velocity command with its frame made explicit.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum VelocityCommand {
    /// The velocity is expressed in the robot frame (X forward, Y left).
    RobotRelative(ChassisVelocity),

    /// The velocity is expressed in the field frame and must be rotated by
    /// the robot's current heading before the kinematic transform.
    FieldRelative(ChassisVelocity),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisVelocity {
    pub fn new(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self {
            vx_ms,
            vy_ms,
            omega_rads,
        }
    }

    /// Magnitude of the translational component of the velocity.
    pub fn speed_ms(&self) -> f64 {
        self.vx_ms.hypot(self.vy_ms)
    }
}

impl VelocityCommand {
    /// Resolve the command into the robot frame.
    ///
    /// `heading_rad` is the robot's current heading in the field frame; it is
    /// only used for field-relative commands.
    pub fn into_robot_relative(self, heading_rad: f64) -> ChassisVelocity {
        match self {
            VelocityCommand::RobotRelative(v) => v,
            VelocityCommand::FieldRelative(v) => {
                let (sin_h, cos_h) = heading_rad.sin_cos();

                ChassisVelocity {
                    vx_ms: v.vx_ms * cos_h + v.vy_ms * sin_h,
                    vy_ms: -v.vx_ms * sin_h + v.vy_ms * cos_h,
                    omega_rads: v.omega_rads,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_field_to_robot() {
        // Facing +90 deg, a field +X demand becomes a robot -Y demand
        let cmd = VelocityCommand::FieldRelative(ChassisVelocity::new(1.0, 0.0, 0.5));
        let v = cmd.into_robot_relative(std::f64::consts::FRAC_PI_2);

        assert_approx_eq!(f64, v.vx_ms, 0.0, epsilon = 1e-12);
        assert_approx_eq!(f64, v.vy_ms, -1.0, epsilon = 1e-12);
        assert_approx_eq!(f64, v.omega_rads, 0.5);

        // Robot-relative commands pass through untouched
        let cmd = VelocityCommand::RobotRelative(ChassisVelocity::new(1.0, 2.0, 3.0));
        let v = cmd.into_robot_relative(1.234);
        assert_approx_eq!(f64, v.vx_ms, 1.0);
        assert_approx_eq!(f64, v.vy_ms, 2.0);
    }
}
