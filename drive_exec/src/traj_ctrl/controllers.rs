//! # Trajectory controllers module
//!
//! This module provides the PID controllers used for TrajCtrl, including
//! their error calculations.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::TrajectorySample;
use crate::kinematics::ChassisVelocity;
use crate::loc::Pose;
use util::maths::{ang_diff, clamp};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller.
///
/// The control loop runs at a fixed rate, so the timestep is passed in
/// explicitly each cycle rather than measured, keeping the controller
/// deterministic.
#[derive(Debug, Default, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

/// The trajectory controllers.
#[derive(Debug, Default, Serialize, Clone)]
pub struct TrajControllers {
    /// Longitudinal (along-course) error controller
    long_ctrl: PidController,

    /// Lateral (cross-course) error controller
    lat_ctrl: PidController,

    /// Heading error controller
    head_ctrl: PidController,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            integral: 0.0,
            prev_error: None,
        }
    }

    /// Get the value of the controller for the given error and timestep.
    pub fn get(&mut self, error: f64, dt_s: f64) -> f64 {
        self.integral += error * dt_s;

        // On the first call there is no previous error, assume zero
        // derivative rather than producing a spike.
        let deriv = match self.prev_error {
            Some(e) if dt_s > 0.0 => (error - e) / dt_s,
            _ => 0.0,
        };

        self.prev_error = Some(error);

        self.k_p * error + self.k_i * self.integral + self.k_d * deriv
    }

    /// Clear the accumulated state, e.g. between trajectories.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}

impl TrajControllers {
    /// Create a new instance of the controllers from the parameters.
    pub fn new(params: &super::Params) -> Self {
        Self {
            long_ctrl: PidController::new(params.long_k_p, params.long_k_i, params.long_k_d),
            lat_ctrl: PidController::new(params.lat_k_p, params.lat_k_i, params.lat_k_d),
            head_ctrl: PidController::new(params.head_k_p, params.head_k_i, params.head_k_d),
        }
    }

    /// Compute the field-frame chassis velocity demand for the current
    /// reference point and pose.
    ///
    /// The position error is decomposed into the course frame (longitudinal
    /// error along the direction of travel, lateral error across it), each
    /// axis is closed with its own controller, and the reference velocity is
    /// added as feed-forward along the course. The heading axis closes the
    /// shortest-path heading error and adds `velocity * curvature` as its
    /// feed-forward.
    pub fn get_drive_cmd(
        &mut self,
        reference: &TrajectorySample,
        course_rad: f64,
        pose: &Pose,
        dt_s: f64,
        report: &mut super::StatusReport,
        params: &super::Params,
    ) -> ChassisVelocity {
        let (sin_c, cos_c) = course_rad.sin_cos();

        // Position error in the field frame, then decomposed into the
        // course frame
        let error_m = reference.pose.position_m - pose.position_m;
        let long_error_m = cos_c * error_m[0] + sin_c * error_m[1];
        let lat_error_m = -sin_c * error_m[0] + cos_c * error_m[1];

        // Shortest-path heading error: +179 deg and -179 deg are 2 deg
        // apart, never 358
        let head_error_rad = ang_diff(pose.heading_rad, reference.pose.heading_rad);

        report.long_error_m = long_error_m;
        report.lat_error_m = lat_error_m;
        report.head_error_rad = head_error_rad;

        if lat_error_m.abs() > params.lat_error_limit_m {
            report.lat_error_limit_exceeded = true;
        }
        if head_error_rad.abs() > params.head_error_limit_rad {
            report.head_error_limit_exceeded = true;
        }

        // Feedback plus feed-forward per axis
        let v_long_ms = reference.velocity_ms + self.long_ctrl.get(long_error_m, dt_s);
        let v_lat_ms = self.lat_ctrl.get(lat_error_m, dt_s);
        let omega_ff_rads = reference.velocity_ms * reference.curvature_m;
        let omega_rads = clamp(
            &(omega_ff_rads + self.head_ctrl.get(head_error_rad, dt_s)),
            &-params.max_omega_dem_rads,
            &params.max_omega_dem_rads,
        );

        // Rotate the course-frame demand back into the field frame
        let mut vx_ms = cos_c * v_long_ms - sin_c * v_lat_ms;
        let mut vy_ms = sin_c * v_long_ms + cos_c * v_lat_ms;

        // Limit the translational demand without changing its direction
        let speed_ms = vx_ms.hypot(vy_ms);
        if speed_ms > params.max_speed_dem_ms {
            let scale = params.max_speed_dem_ms / speed_ms;
            vx_ms *= scale;
            vy_ms *= scale;
        }

        ChassisVelocity {
            vx_ms,
            vy_ms,
            omega_rads,
        }
    }

    /// Clear all controller state.
    pub fn reset(&mut self) {
        self.long_ctrl.reset();
        self.lat_ctrl.reset();
        self.head_ctrl.reset();
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

    fn params() -> super::super::Params {
        super::super::Params {
            long_k_p: 1.0,
            lat_k_p: 1.0,
            head_k_p: 1.0,
            max_speed_dem_ms: 3.0,
            max_omega_dem_rads: PI,
            lat_error_limit_m: 1.0,
            head_error_limit_rad: 1.0,
            ..Default::default()
        }
    }

    fn reference_at(x_m: f64, heading_rad: f64, velocity_ms: f64) -> TrajectorySample {
        TrajectorySample {
            time_s: 0.0,
            pose: Pose::new(x_m, 0.0, heading_rad),
            velocity_ms,
            curvature_m: 0.0,
        }
    }

    #[test]
    fn test_zero_error_gives_pure_feed_forward() {
        let params = params();
        let mut ctrls = TrajControllers::new(&params);
        let mut report = super::super::StatusReport::default();

        let cmd = ctrls.get_drive_cmd(
            &reference_at(0.0, 0.0, 1.5),
            0.0,
            &Pose::default(),
            0.02,
            &mut report,
            &params,
        );

        assert_approx_eq!(f64, cmd.vx_ms, 1.5, epsilon = 1e-9);
        assert_approx_eq!(f64, cmd.vy_ms, 0.0, epsilon = 1e-9);
        assert_approx_eq!(f64, cmd.omega_rads, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_position_error_feedback() {
        let params = params();
        let mut ctrls = TrajControllers::new(&params);
        let mut report = super::super::StatusReport::default();

        // Robot is 0.5 m behind the reference along the course
        let cmd = ctrls.get_drive_cmd(
            &reference_at(0.5, 0.0, 1.0),
            0.0,
            &Pose::default(),
            0.02,
            &mut report,
            &params,
        );

        assert_approx_eq!(f64, report.long_error_m, 0.5, epsilon = 1e-9);
        assert_approx_eq!(f64, cmd.vx_ms, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_heading_error_wraps() {
        let params = params();
        let mut ctrls = TrajControllers::new(&params);
        let mut report = super::super::StatusReport::default();

        // Reference heading pi-0.01, measured -pi+0.01: the error is 0.02
        // the short way round, commanded clockwise-negative
        ctrls.get_drive_cmd(
            &reference_at(0.0, PI - 0.01, 0.0),
            0.0,
            &Pose::new(0.0, 0.0, -PI + 0.01),
            0.02,
            &mut report,
            &params,
        );

        assert_approx_eq!(f64, report.head_error_rad, -0.02, epsilon = 1e-9);
        assert!(!report.head_error_limit_exceeded);
    }

    #[test]
    fn test_demand_limits() {
        let params = params();
        let mut ctrls = TrajControllers::new(&params);
        let mut report = super::super::StatusReport::default();

        // A huge position error must saturate at the demand limits
        let cmd = ctrls.get_drive_cmd(
            &reference_at(100.0, PI, 0.0),
            0.0,
            &Pose::default(),
            0.02,
            &mut report,
            &params,
        );

        assert_approx_eq!(f64, cmd.speed_ms(), params.max_speed_dem_ms, epsilon = 1e-9);
        assert!(cmd.omega_rads.abs() <= params.max_omega_dem_rads + 1e-12);
    }
}
