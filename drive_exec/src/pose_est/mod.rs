//! # Pose estimation module
//!
//! Maintains the robot's field-frame pose by integrating per-module
//! odometry deltas through the inverse kinematics, corrected each tick by
//! the absolute heading measurement.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use crate::kinematics::{ModulePosition, PerModule, SwerveKinematics};
use crate::loc::Pose;
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The swerve pose estimator.
///
/// The estimator is always in one of two states: tracking (every `update`
/// call) or resetting (`reset_position`, applied atomically within the
/// call). The stored pose is owned exclusively by the estimator; consumers
/// receive copies.
pub struct PoseEstimator {
    kinematics: SwerveKinematics,

    /// The current pose estimate.
    pose: Pose,

    /// Offset added to the measured heading to obtain the field-frame
    /// heading. Set on `reset_position` so a pose reset does not require
    /// re-zeroing the physical sensor.
    heading_offset_rad: f64,

    /// The module positions seen on the previous update, the baseline for
    /// the next delta computation.
    last_positions: PerModule<ModulePosition>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PoseEstimator {
    /// Create an estimator seeded with the given initial conditions.
    ///
    /// The initial module positions become the first delta baseline, so an
    /// `update` immediately after construction yields a near-zero
    /// displacement if nothing has moved.
    pub fn new(
        kinematics: SwerveKinematics,
        heading_rad: f64,
        positions: PerModule<ModulePosition>,
        initial_pose: Pose,
    ) -> Self {
        Self {
            kinematics,
            heading_offset_rad: wrap_pi(initial_pose.heading_rad - heading_rad),
            pose: Pose::new(
                initial_pose.position_m[0],
                initial_pose.position_m[1],
                initial_pose.heading_rad,
            ),
            last_positions: positions,
        }
    }

    /// The current pose estimate.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Advance the estimate by one tick.
    ///
    /// The per-module distance deltas since the previous call are mapped
    /// through the inverse kinematics to a robot-frame displacement, rotated
    /// into the field frame and accumulated. The measured absolute heading
    /// replaces the stored heading outright: the sensor is trusted over
    /// wheel-based heading integration, which is the point of fusing it.
    pub fn update(
        &mut self,
        heading_rad: f64,
        positions: &PerModule<ModulePosition>,
    ) -> Pose {
        let deltas = positions.zip(self.last_positions).map(|(current, last)| {
            ModulePosition {
                distance_m: current.distance_m - last.distance_m,
                angle_rad: current.angle_rad,
            }
        });

        let displacement = self.kinematics.to_chassis_displacement(&deltas);

        let field_heading_rad = wrap_pi(heading_rad + self.heading_offset_rad);
        let (sin_h, cos_h) = field_heading_rad.sin_cos();

        self.pose.position_m[0] += displacement.dx_m * cos_h - displacement.dy_m * sin_h;
        self.pose.position_m[1] += displacement.dx_m * sin_h + displacement.dy_m * cos_h;
        self.pose.heading_rad = field_heading_rad;

        self.last_positions = *positions;

        trace!(
            "Pose estimate: ({:.3}, {:.3}) m, {:.3} rad",
            self.pose.position_m[0],
            self.pose.position_m[1],
            self.pose.heading_rad
        );

        self.pose
    }

    /// Atomically reset the estimate to `new_pose`.
    ///
    /// The retained module position snapshot is replaced along with the
    /// pose, so the next `update` computes deltas relative to the reset
    /// point rather than jumping from stale baselines.
    pub fn reset_position(
        &mut self,
        heading_rad: f64,
        positions: &PerModule<ModulePosition>,
        new_pose: Pose,
    ) {
        self.heading_offset_rad = wrap_pi(new_pose.heading_rad - heading_rad);
        self.pose = Pose::new(
            new_pose.position_m[0],
            new_pose.position_m[1],
            new_pose.heading_rad,
        );
        self.last_positions = *positions;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
