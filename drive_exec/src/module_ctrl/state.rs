//! Implementation of the swerve module controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use crate::hw::ModuleActuator;
use crate::kinematics::{ModulePosition, ModuleState};
use util::maths::{ang_diff, wrap_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Controller for a single swerve module.
///
/// Owns the module's actuator pair and performs the steer-target
/// optimisation before any demand reaches the hardware.
pub struct SwerveModule<A: ModuleActuator> {
    actuator: A,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A: ModuleActuator> SwerveModule<A> {
    pub fn new(actuator: A) -> Self {
        Self { actuator }
    }

    /// Command the module towards the desired state.
    ///
    /// The steer target is chosen to minimise rotation from the module's
    /// current angle: driving the wheel backwards at the flipped angle
    /// (+180 deg) is kinematically equivalent to the requested forward
    /// state, so whichever of {angle, angle + 180 deg} is within 90 deg of
    /// the current angle is used, negating the speed if the flipped option
    /// is chosen.
    ///
    /// The actuator always receives a continuous angle target (current
    /// angle plus the shortest signed rotation), never a wrapped one.
    pub fn set_desired_state(&mut self, desired: &ModuleState) {
        let current_rad = self.actuator.read_angle();

        let mut speed_ms = desired.speed_ms;
        let mut rotation_rad = ang_diff(current_rad, desired.angle_rad);

        if rotation_rad.abs() > std::f64::consts::FRAC_PI_2 {
            speed_ms = -speed_ms;
            rotation_rad = ang_diff(current_rad, wrap_pi(desired.angle_rad + std::f64::consts::PI));
        }

        let target_rad = current_rad + rotation_rad;

        trace!(
            "Module demand: speed {:.3} m/s, steer {:.3} rad ({:+.3} rad rotation)",
            speed_ms,
            target_rad,
            rotation_rad
        );

        self.actuator.command_angle(target_rad);
        self.actuator.command_speed(speed_ms);
    }

    /// The module's sensed state.
    pub fn state(&self) -> ModuleState {
        ModuleState {
            speed_ms: self.actuator.read_speed(),
            angle_rad: self.actuator.read_angle(),
        }
    }

    /// The module's sensed odometry position.
    pub fn position(&self) -> ModulePosition {
        ModulePosition {
            distance_m: self.actuator.read_distance(),
            angle_rad: self.actuator.read_angle(),
        }
    }

    /// Stop the drive motor, holding the current steer angle.
    pub fn halt(&mut self) {
        self.actuator.command_speed(0.0);
    }

    /// Zero the cumulative distance tracking.
    ///
    /// Must be coordinated with a pose estimator reset to keep odometry
    /// baselines consistent, see `Drivetrain::reset_encoders`.
    pub fn reset_encoders(&mut self) {
        self.actuator.reset_distance();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::assert_approx_eq;

    const PI: f64 = std::f64::consts::PI;

    /// Actuator stub which records the last commanded demands.
    #[derive(Default)]
    struct TestActuator {
        angle_rad: f64,
        commanded_speed_ms: f64,
        commanded_angle_rad: f64,
    }

    impl ModuleActuator for TestActuator {
        fn command_speed(&mut self, speed_ms: f64) {
            self.commanded_speed_ms = speed_ms;
        }

        fn command_angle(&mut self, angle_rad: f64) {
            self.commanded_angle_rad = angle_rad;
        }

        fn read_speed(&self) -> f64 {
            self.commanded_speed_ms
        }

        fn read_angle(&self) -> f64 {
            self.angle_rad
        }

        fn read_distance(&self) -> f64 {
            0.0
        }

        fn reset_distance(&mut self) {}
    }

    #[test]
    fn test_small_rotation_passes_through() {
        let mut module = SwerveModule::new(TestActuator {
            angle_rad: 0.2,
            ..Default::default()
        });

        module.set_desired_state(&ModuleState {
            speed_ms: 1.0,
            angle_rad: 0.5,
        });

        assert_approx_eq!(f64, module.actuator.commanded_angle_rad, 0.5, epsilon = 1e-12);
        assert_approx_eq!(f64, module.actuator.commanded_speed_ms, 1.0);
    }

    #[test]
    fn test_flip_avoids_long_rotation() {
        // Current angle is theta + 170 deg; commanding theta must steer to
        // theta + 180 deg and negate the speed, never rotate 170 deg.
        let theta = 0.3;
        let current = theta + 170.0 * PI / 180.0;

        let mut module = SwerveModule::new(TestActuator {
            angle_rad: current,
            ..Default::default()
        });

        module.set_desired_state(&ModuleState {
            speed_ms: 2.0,
            angle_rad: theta,
        });

        assert_approx_eq!(
            f64,
            module.actuator.commanded_angle_rad,
            theta + PI,
            epsilon = 1e-9
        );
        assert_approx_eq!(f64, module.actuator.commanded_speed_ms, -2.0);

        // Rotation performed is only 10 deg
        assert!((module.actuator.commanded_angle_rad - current).abs() < 0.2);
    }

    #[test]
    fn test_continuous_target_across_wrap() {
        // A module sitting at 350 deg (unwrapped) commanded to 5 deg must
        // rotate forwards 15 deg, not unwind a full turn.
        let current = 350.0 * PI / 180.0;
        let desired = wrap_pi(5.0 * PI / 180.0);

        let mut module = SwerveModule::new(TestActuator {
            angle_rad: current,
            ..Default::default()
        });

        module.set_desired_state(&ModuleState {
            speed_ms: 1.0,
            angle_rad: desired,
        });

        assert_approx_eq!(
            f64,
            module.actuator.commanded_angle_rad,
            current + 15.0 * PI / 180.0,
            epsilon = 1e-9
        );
        assert_approx_eq!(f64, module.actuator.commanded_speed_ms, 1.0);
    }
}
