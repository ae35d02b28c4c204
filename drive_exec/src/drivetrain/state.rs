//! # Drivetrain state
//!
//! The drivetrain owns the four module controllers, the heading sensor and
//! the pose estimator, and sequences them each tick: sensors are read and
//! fused in `periodic`, demands are issued in `drive`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;

// Internal
use super::{DrivetrainError, Params};
use crate::hw::{HeadingSensor, ModuleActuator};
use crate::kinematics::{
    ModuleId, ModulePosition, ModuleState, PerModule, SwerveKinematics, VelocityCommand,
};
use crate::loc::Pose;
use crate::module_ctrl::SwerveModule;
use crate::pose_est::PoseEstimator;
use util::{
    archive::{Archived, Archiver},
    maths::clamp,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The swerve drivetrain.
pub struct Drivetrain<A: ModuleActuator, H: HeadingSensor> {
    params: Params,

    kinematics: SwerveKinematics,

    modules: PerModule<SwerveModule<A>>,

    heading_sensor: H,

    estimator: PoseEstimator,

    report: StatusReport,

    arch_pose: Archiver,

    arch_modules: Archiver,
}

/// A report on the status of the drivetrain.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// The heading sensor is faulted; the drivetrain is commanding zero
    /// output until it recovers.
    pub heading_fault: bool,

    /// The last velocity command exceeded the achievable wheel speed and
    /// was uniformly rescaled.
    pub desaturated: bool,
}

/// Flat pose record for CSV archiving.
#[derive(Serialize)]
struct PoseRecord {
    x_m: f64,
    y_m: f64,
    heading_rad: f64,
}

/// Flat module state record for CSV archiving.
#[derive(Serialize)]
struct ModuleStatesRecord {
    fl_speed_ms: f64,
    fl_angle_rad: f64,
    fr_speed_ms: f64,
    fr_angle_rad: f64,
    bl_speed_ms: f64,
    bl_angle_rad: f64,
    br_speed_ms: f64,
    br_angle_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A: ModuleActuator, H: HeadingSensor> Drivetrain<A, H> {
    /// Build the drivetrain from its parameters and hardware.
    ///
    /// If the heading sensor is faulted at startup the estimate is seeded
    /// with a zero heading; `periodic` will pick up the sensor once it
    /// recovers.
    pub fn new(
        params: Params,
        actuators: PerModule<A>,
        heading_sensor: H,
    ) -> Result<Self, DrivetrainError> {
        let kinematics = SwerveKinematics::new(params.geometry())?;

        let modules = actuators.map(SwerveModule::new);
        let positions = modules.as_ref().map(|m| m.position());

        let heading_rad = match heading_sensor.read_heading() {
            Ok(h) => h,
            Err(e) => {
                warn!("Heading sensor faulted at startup, assuming zero: {}", e);
                0.0
            }
        };

        let estimator = PoseEstimator::new(
            kinematics.clone(),
            heading_rad,
            positions,
            Pose::default(),
        );

        Ok(Self {
            params,
            kinematics,
            modules,
            heading_sensor,
            estimator,
            report: StatusReport::default(),
            arch_pose: Archiver::default(),
            arch_modules: Archiver::default(),
        })
    }

    /// Set up the drivetrain's telemetry archives in the given session.
    pub fn init_archives(&mut self, session: &Session) {
        self.arch_pose = match Archiver::from_path(session, "pose.csv") {
            Ok(a) => a,
            Err(e) => {
                warn!("Could not create pose archive: {}", e);
                Archiver::default()
            }
        };
        self.arch_modules = match Archiver::from_path(session, "module_states.csv") {
            Ok(a) => a,
            Err(e) => {
                warn!("Could not create module states archive: {}", e);
                Archiver::default()
            }
        };
    }

    /// Cyclic sensor processing, to be called once per control period
    /// before any `drive` call.
    ///
    /// Reads the module odometry and the absolute heading and advances the
    /// pose estimate. A heading fault halts the modules and freezes the
    /// estimate until the sensor recovers; it is reported, never fatal.
    pub fn periodic(&mut self) {
        let positions = self.positions();

        match self.heading_sensor.read_heading() {
            Ok(heading_rad) => {
                if self.report.heading_fault {
                    info!("Heading sensor recovered");
                    self.report.heading_fault = false;
                }

                self.estimator.update(heading_rad, &positions);
            }
            Err(e) => {
                if !self.report.heading_fault {
                    warn!("Heading sensor fault, halting drivetrain: {}", e);
                    self.report.heading_fault = true;
                }

                self.halt();
            }
        }
    }

    /// Command the chassis at the given velocity.
    ///
    /// Field-relative commands are rotated into the robot frame using the
    /// estimated heading. The implied module speeds are desaturated
    /// uniformly so the commanded direction of motion is preserved even
    /// when the demand exceeds the wheels' capability.
    ///
    /// While the heading sensor is faulted all commands degrade to a halt.
    pub fn drive(&mut self, command: VelocityCommand) {
        if self.report.heading_fault {
            self.halt();
            return;
        }

        let mut velocity = command.into_robot_relative(self.estimator.pose().heading_rad);
        velocity.omega_rads = clamp(
            &velocity.omega_rads,
            &-self.params.max_omega_rads,
            &self.params.max_omega_rads,
        );

        let hold_angles = self.module_states().map(|s| s.angle_rad);
        let mut states = self.kinematics.to_module_states(&velocity, &hold_angles);

        self.report.desaturated = SwerveKinematics::desaturate(&mut states, self.params.max_speed_ms);

        for id in ModuleId::ALL {
            self.modules.get_mut(id).set_desired_state(states.get(id));
        }
    }

    /// Stop all drive motors, holding the current steer angles.
    pub fn halt(&mut self) {
        self.modules.apply(|m| m.halt());
    }

    /// The current pose estimate.
    pub fn pose(&self) -> Pose {
        self.estimator.pose()
    }

    /// The sensed state of each module.
    pub fn module_states(&self) -> PerModule<ModuleState> {
        self.modules.as_ref().map(|m| m.state())
    }

    /// The drivetrain's status report.
    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Reset the pose estimate to `new_pose`.
    ///
    /// The current module positions and heading reading become the new
    /// odometry baseline, so the physical sensor never needs re-zeroing.
    pub fn reset_pose(&mut self, new_pose: Pose) {
        let positions = self.positions();
        let heading_rad = match self.heading_sensor.read_heading() {
            Ok(h) => h,
            Err(e) => {
                warn!("Heading sensor faulted during pose reset: {}", e);
                return;
            }
        };

        self.estimator.reset_position(heading_rad, &positions, new_pose);
    }

    /// Re-zero the heading sensor and declare the current heading as the
    /// field-frame zero, keeping the position estimate.
    ///
    /// After `zero_heading` the sensor reads zero by definition, so the
    /// estimator is re-baselined against that known reading directly rather
    /// than read back from the sensor. A fault between the zeroing and the
    /// re-baseline therefore cannot strand a stale heading offset.
    pub fn reset_heading(&mut self) {
        self.heading_sensor.zero_heading();

        let positions = self.positions();
        let position_m = self.estimator.pose().position_m;
        self.estimator.reset_position(
            0.0,
            &positions,
            Pose::new(position_m[0], position_m[1], 0.0),
        );
    }

    /// Zero all module distance encoders and re-baseline the estimator so
    /// the next update sees no spurious delta.
    pub fn reset_encoders(&mut self) {
        self.modules.apply(|m| m.reset_encoders());

        let pose = self.estimator.pose();
        self.reset_pose(pose);
    }

    fn positions(&self) -> PerModule<ModulePosition> {
        self.modules.as_ref().map(|m| m.position())
    }
}

impl<A: ModuleActuator, H: HeadingSensor> Archived for Drivetrain<A, H> {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let pose = self.estimator.pose();
        self.arch_pose.serialise(PoseRecord {
            x_m: pose.position_m[0],
            y_m: pose.position_m[1],
            heading_rad: pose.heading_rad,
        })?;

        let states = self.module_states();
        self.arch_modules.serialise(ModuleStatesRecord {
            fl_speed_ms: states.front_left.speed_ms,
            fl_angle_rad: states.front_left.angle_rad,
            fr_speed_ms: states.front_right.speed_ms,
            fr_angle_rad: states.front_right.angle_rad,
            bl_speed_ms: states.back_left.speed_ms,
            bl_angle_rad: states.back_left.angle_rad,
            br_speed_ms: states.back_right.speed_ms,
            br_angle_rad: states.back_right.angle_rad,
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::ChassisVelocity;
    use crate::sim::{SimHeading, SimModule, SwerveSim};
    use float_cmp::assert_approx_eq;

    const DT_S: f64 = 0.02;

    fn params() -> Params {
        Params {
            wheel_base_m: 0.6,
            track_width_m: 0.6,
            max_speed_ms: 5.0,
            max_omega_rads: 2.0 * std::f64::consts::PI,
        }
    }

    fn drivetrain() -> (SwerveSim, Drivetrain<SimModule, SimHeading>) {
        let params = params();
        let sim = SwerveSim::new(SwerveKinematics::new(params.geometry()).unwrap());
        let dt = Drivetrain::new(params, sim.modules(), sim.heading_sensor()).unwrap();
        (sim, dt)
    }

    #[test]
    fn test_forward_drive_advances_pose() {
        let (mut sim, mut dt) = drivetrain();

        // A single cycle of 1 m/s forward moves the pose by exactly one
        // period's travel
        dt.periodic();
        dt.drive(VelocityCommand::RobotRelative(ChassisVelocity::new(
            1.0, 0.0, 0.0,
        )));
        sim.step(DT_S);
        dt.periodic();

        let pose = dt.pose();
        assert_approx_eq!(f64, pose.position_m[0], DT_S, epsilon = 1e-9);
        assert_approx_eq!(f64, pose.position_m[1], 0.0, epsilon = 1e-9);
        assert_approx_eq!(f64, pose.heading_rad, 0.0, epsilon = 1e-9);

        // And a further second of driving integrates to 1 m
        for _ in 0..50 {
            dt.periodic();
            dt.drive(VelocityCommand::RobotRelative(ChassisVelocity::new(
                1.0, 0.0, 0.0,
            )));
            sim.step(DT_S);
        }
        dt.periodic();

        let pose = dt.pose();
        assert_approx_eq!(f64, pose.position_m[0], 1.0 + DT_S, epsilon = 1e-6);
        assert_approx_eq!(f64, pose.position_m[1], 0.0, epsilon = 1e-6);
        assert_approx_eq!(f64, pose.heading_rad, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_field_relative_uses_estimated_heading() {
        let (mut sim, mut dt) = drivetrain();

        // Spin the robot to +90 deg, then command field +X
        for _ in 0..50 {
            dt.periodic();
            dt.drive(VelocityCommand::RobotRelative(ChassisVelocity::new(
                0.0,
                0.0,
                std::f64::consts::FRAC_PI_2,
            )));
            sim.step(DT_S);
        }
        dt.periodic();
        assert_approx_eq!(
            f64,
            dt.pose().heading_rad,
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-6
        );

        let before = dt.pose();
        for _ in 0..50 {
            dt.periodic();
            dt.drive(VelocityCommand::FieldRelative(ChassisVelocity::new(
                1.0, 0.0, 0.0,
            )));
            sim.step(DT_S);
        }
        dt.periodic();

        // The robot moved along field +X despite facing +Y
        let pose = dt.pose();
        assert_approx_eq!(
            f64,
            pose.position_m[0] - before.position_m[0],
            1.0,
            epsilon = 1e-3
        );
        assert_approx_eq!(
            f64,
            pose.position_m[1] - before.position_m[1],
            0.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_desaturation_reported() {
        let (_sim, mut dt) = drivetrain();

        dt.periodic();
        dt.drive(VelocityCommand::RobotRelative(ChassisVelocity::new(
            100.0, 0.0, 0.0,
        )));

        assert!(dt.report().desaturated);

        // No module exceeds the speed limit after desaturation
        for state in dt.module_states().as_array() {
            assert!(state.speed_ms.abs() <= params().max_speed_ms + 1e-9);
        }
    }

    #[test]
    fn test_heading_fault_halts_drivetrain() {
        let (mut sim, mut dt) = drivetrain();

        sim.set_heading_fault(true);
        dt.periodic();
        dt.drive(VelocityCommand::RobotRelative(ChassisVelocity::new(
            1.0, 0.0, 0.0,
        )));

        assert!(dt.report().heading_fault);
        for state in dt.module_states().as_array() {
            assert_approx_eq!(f64, state.speed_ms, 0.0);
        }

        // Recovery clears the flag and driving resumes
        sim.set_heading_fault(false);
        dt.periodic();
        assert!(!dt.report().heading_fault);

        dt.drive(VelocityCommand::RobotRelative(ChassisVelocity::new(
            1.0, 0.0, 0.0,
        )));
        assert!(dt.module_states().front_left.speed_ms.abs() > 0.0);
    }

    #[test]
    fn test_reset_heading_during_fault_leaves_no_stale_offset() {
        let (mut sim, mut dt) = drivetrain();

        // Spin up a non-zero sensor reading, then reset the pose so the
        // estimator carries a non-zero heading offset
        for _ in 0..50 {
            dt.periodic();
            dt.drive(VelocityCommand::RobotRelative(ChassisVelocity::new(
                0.0,
                0.0,
                std::f64::consts::FRAC_PI_2,
            )));
            sim.step(DT_S);
        }
        dt.periodic();
        dt.reset_pose(Pose::new(1.0, 1.0, std::f64::consts::PI));

        // Re-zero the heading while the sensor is faulted
        sim.set_heading_fault(true);
        dt.periodic();
        dt.reset_heading();

        // On recovery the heading must be the declared zero, not a jump
        // from the pre-reset offset
        sim.set_heading_fault(false);
        dt.periodic();

        let pose = dt.pose();
        assert_approx_eq!(f64, pose.heading_rad, 0.0, epsilon = 1e-9);
        assert_approx_eq!(f64, pose.position_m[0], 1.0, epsilon = 1e-9);
        assert_approx_eq!(f64, pose.position_m[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reset_pose() {
        let (mut sim, mut dt) = drivetrain();

        // Drive somewhere first
        for _ in 0..25 {
            dt.periodic();
            dt.drive(VelocityCommand::RobotRelative(ChassisVelocity::new(
                2.0, 0.0, 0.0,
            )));
            sim.step(DT_S);
        }
        dt.periodic();

        dt.reset_pose(Pose::new(5.0, 5.0, std::f64::consts::FRAC_PI_2));
        dt.periodic();

        let pose = dt.pose();
        assert_approx_eq!(f64, pose.position_m[0], 5.0, epsilon = 1e-9);
        assert_approx_eq!(f64, pose.position_m[1], 5.0, epsilon = 1e-9);
        assert_approx_eq!(
            f64,
            pose.heading_rad,
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-9
        );
    }
}
