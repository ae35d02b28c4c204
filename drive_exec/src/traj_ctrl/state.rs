//! # TrajCtrl state
//!
//! The trajectory controller's state and its cyclic processing.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use serde::Serialize;

// Internal
use super::{Params, TrajControllers, TrajCtrlError, Trajectory};
use crate::kinematics::VelocityCommand;
use crate::loc::Pose;
use util::{
    archive::{Archived, Archiver},
    module, params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory control module state.
#[derive(Default)]
pub struct TrajCtrl {
    params: Params,

    controllers: TrajControllers,

    /// The trajectory currently being followed, if any.
    trajectory: Option<Trajectory>,

    /// Time since the start of the current trajectory.
    ///
    /// Accumulated from the input timesteps so the follower is independent
    /// of wall-clock time.
    elapsed_s: f64,

    report: StatusReport,

    arch_report: Archiver,
}

/// Input data for TrajCtrl's cyclic processing.
#[derive(Debug, Copy, Clone)]
pub struct InputData {
    /// The current best estimate of the robot's pose in the field frame.
    pub pose: Pose,

    /// Time since the previous cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// A report on the status of trajectory control.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Along-course position error.
    ///
    /// Units: meters
    pub long_error_m: f64,

    /// Cross-course position error.
    ///
    /// Units: meters
    pub lat_error_m: f64,

    /// Heading error, signed shortest path.
    ///
    /// Units: radians
    pub head_error_rad: f64,

    /// The lateral error has exceeded its configured limit.
    pub lat_error_limit_exceeded: bool,

    /// The heading error has exceeded its configured limit.
    pub head_error_limit_exceeded: bool,

    /// The current trajectory has been completed this cycle.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl module::State for TrajCtrl {
    type InitData = &'static str;
    type InitError = TrajCtrlError;

    type InputData = InputData;
    type OutputData = Option<VelocityCommand>;
    type StatusReport = StatusReport;
    type ProcError = TrajCtrlError;

    /// Initialise the TrajCtrl module.
    ///
    /// Expected init data is the path to the module's parameter file,
    /// relative to the software root's `params` directory.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), TrajCtrlError> {
        self.params = params::load(init_data)?;

        self.controllers = TrajControllers::new(&self.params);

        self.arch_report = match Archiver::from_path(session, "traj_ctrl.csv") {
            Ok(a) => a,
            Err(e) => {
                log::warn!("Could not create TrajCtrl archive: {}", e);
                Archiver::default()
            }
        };

        Ok(())
    }

    /// Cyclic processing for TrajCtrl.
    ///
    /// Produces `Some(command)` while a trajectory is being followed and
    /// `None` when idle. The command holds the end pose for the cycle on
    /// which the trajectory completes, then the module goes idle.
    fn proc(
        &mut self,
        input_data: &InputData,
    ) -> Result<(Option<VelocityCommand>, StatusReport), TrajCtrlError> {
        // Limit-exceeded flags latch for the duration of a trajectory, the
        // errors themselves are per-cycle
        self.report.finished = false;

        let trajectory = match self.trajectory {
            Some(ref t) => t,
            None => return Ok((None, self.report)),
        };

        self.elapsed_s += input_data.dt_s;

        let reference = trajectory.sample(self.elapsed_s);
        let course_rad = trajectory.course_rad(self.elapsed_s);

        let velocity = self.controllers.get_drive_cmd(
            &reference,
            course_rad,
            &input_data.pose,
            input_data.dt_s,
            &mut self.report,
            &self.params,
        );

        if self.elapsed_s >= trajectory.duration_s() {
            info!(
                "Trajectory complete after {:.2} s, end pose error {:.3} m",
                self.elapsed_s,
                (trajectory.end_pose().position_m - input_data.pose.position_m).norm()
            );
            self.trajectory = None;
            self.report.finished = true;
        }

        Ok((Some(VelocityCommand::FieldRelative(velocity)), self.report))
    }
}

impl TrajCtrl {
    /// Build a TrajCtrl directly from parameters, without archiving.
    ///
    /// Useful for embedding the follower where no session exists, such as
    /// the end-to-end tests; the executable initialises via
    /// [`util::module::State::init`] instead.
    pub fn with_params(params: Params) -> Self {
        let controllers = TrajControllers::new(&params);

        Self {
            params,
            controllers,
            ..Default::default()
        }
    }

    /// Begin following a trajectory.
    ///
    /// Fails if a trajectory is already being followed. The caller must
    /// finish or abort the current one first.
    pub fn begin_trajectory(&mut self, trajectory: Trajectory) -> Result<(), TrajCtrlError> {
        if self.trajectory.is_some() {
            return Err(TrajCtrlError::TrajectoryAlreadyLoaded);
        }

        info!(
            "Beginning trajectory, duration {:.2} s",
            trajectory.duration_s()
        );

        self.controllers.reset();
        self.elapsed_s = 0.0;
        self.report = StatusReport::default();
        self.trajectory = Some(trajectory);

        Ok(())
    }

    /// Abandon the current trajectory, if any.
    pub fn abort_trajectory(&mut self) {
        if self.trajectory.take().is_some() {
            info!("Trajectory aborted after {:.2} s", self.elapsed_s);
        }
    }

    /// True while a trajectory is being followed.
    pub fn is_following(&self) -> bool {
        self.trajectory.is_some()
    }
}

impl Archived for TrajCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::assert_approx_eq;
    use util::module::State;

    const DT_S: f64 = 0.02;

    fn traj_ctrl() -> TrajCtrl {
        TrajCtrl::with_params(Params {
            long_k_p: 1.0,
            lat_k_p: 1.0,
            head_k_p: 1.0,
            max_speed_dem_ms: 3.0,
            max_omega_dem_rads: std::f64::consts::PI,
            lat_error_limit_m: 1.0,
            head_error_limit_rad: 1.0,
            ..Default::default()
        })
    }

    fn line() -> Trajectory {
        Trajectory::straight_line(
            Pose::new(0.0, 0.0, 0.0),
            Pose::new(3.0, 0.0, 0.0),
            1.0,
            1.0,
            DT_S,
        )
        .unwrap()
    }

    #[test]
    fn test_idle_produces_no_command() {
        let mut tc = traj_ctrl();

        let (cmd, report) = tc
            .proc(&InputData {
                pose: Pose::default(),
                dt_s: DT_S,
            })
            .unwrap();

        assert!(cmd.is_none());
        assert!(!report.finished);
    }

    #[test]
    fn test_double_load_rejected() {
        let mut tc = traj_ctrl();

        tc.begin_trajectory(line()).unwrap();
        assert!(matches!(
            tc.begin_trajectory(line()),
            Err(TrajCtrlError::TrajectoryAlreadyLoaded)
        ));

        tc.abort_trajectory();
        assert!(!tc.is_following());
        tc.begin_trajectory(line()).unwrap();
    }

    #[test]
    fn test_finishes_at_duration() {
        let mut tc = traj_ctrl();
        let duration_s = line().duration_s();
        tc.begin_trajectory(line()).unwrap();

        // Feed a pose that tracks the reference perfectly
        let mut finished = false;
        let mut elapsed_s = 0.0;
        let reference = line();

        while elapsed_s < duration_s + 1.0 {
            let pose = reference.sample(elapsed_s).pose;
            let (_, report) = tc.proc(&InputData { pose, dt_s: DT_S }).unwrap();
            elapsed_s += DT_S;

            if report.finished {
                finished = true;
                break;
            }
        }

        assert!(finished);
        assert!(!tc.is_following());
        assert!((elapsed_s - duration_s).abs() < 2.0 * DT_S);
    }

    #[test]
    fn test_perfect_tracking_demands_reference_velocity() {
        let mut tc = traj_ctrl();
        let reference = line();
        tc.begin_trajectory(line()).unwrap();

        // Step to the cruise section of the profile
        let mut elapsed_s = 0.0;
        let mut last_cmd = None;
        while elapsed_s < 2.0 {
            elapsed_s += DT_S;
            let pose = reference.sample(elapsed_s).pose;
            let (cmd, _) = tc.proc(&InputData { pose, dt_s: DT_S }).unwrap();
            last_cmd = cmd;
        }

        // With zero tracking error the demand is the cruise feed-forward
        match last_cmd {
            Some(VelocityCommand::FieldRelative(v)) => {
                assert_approx_eq!(f64, v.vx_ms, 1.0, epsilon = 1e-6);
                assert_approx_eq!(f64, v.vy_ms, 0.0, epsilon = 1e-6);
            }
            other => panic!("Expected a field-relative command, got {:?}", other),
        }
    }
}
