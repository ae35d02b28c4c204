//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The executable runs a fixed-rate control loop over the drivetrain:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Sensor acquisition and pose estimation (`Drivetrain::periodic`)
//!         - Trajectory control processing (`TrajCtrl::proc`)
//!         - Drivetrain demand output (`Drivetrain::drive`)
//!         - Telemetry archiving
//!
//! The drivetrain here runs against the in-process simulation; a deployment
//! substitutes real implementations of the `hw` traits without touching the
//! loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use drive_lib::{
    drivetrain::{self, Drivetrain},
    kinematics::SwerveKinematics,
    loc::Pose,
    sim::SwerveSim,
    traj_ctrl::{InputData, TrajCtrl, Trajectory},
};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one control cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Swerve Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let drivetrain_params: drivetrain::Params =
        util::params::load("drivetrain.toml").wrap_err("Could not load drivetrain params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    let kinematics = SwerveKinematics::new(drivetrain_params.geometry())
        .wrap_err("Could not build the kinematic transforms")?;

    let mut sim = SwerveSim::new(kinematics);

    let mut drivetrain = Drivetrain::new(drivetrain_params, sim.modules(), sim.heading_sensor())
        .wrap_err("Failed to initialise the drivetrain")?;
    drivetrain.init_archives(&session);

    let mut traj_ctrl = TrajCtrl::default();
    traj_ctrl
        .init("traj_ctrl.toml", &session)
        .wrap_err("Failed to initialise TrajCtrl")?;

    info!("Modules initialised");

    // ---- LOAD TRAJECTORY ----

    // Demo trajectory: 3 m diagonal translation with a 90 degree turn.
    let trajectory = Trajectory::straight_line(
        Pose::new(0.0, 0.0, 0.0),
        Pose::new(3.0, 1.0, std::f64::consts::FRAC_PI_2),
        1.0,
        1.0,
        CYCLE_PERIOD_S,
    )
    .wrap_err("Failed to generate the demo trajectory")?;

    traj_ctrl
        .begin_trajectory(trajectory)
        .wrap_err("Failed to begin the trajectory")?;

    // ---- MAIN LOOP ----

    loop {
        let cycle_start_instant = Instant::now();

        // ---- SENSOR PROCESSING ----

        drivetrain.periodic();

        // ---- CONTROL ALGORITHM PROCESSING ----

        let (command, report) = traj_ctrl
            .proc(&InputData {
                pose: drivetrain.pose(),
                dt_s: CYCLE_PERIOD_S,
            })
            .wrap_err("Error during TrajCtrl processing")?;

        match command {
            Some(c) => drivetrain.drive(c),
            None => drivetrain.halt(),
        }

        // ---- TELEMETRY ----

        if let Err(e) = drivetrain.write() {
            warn!("Could not archive drivetrain telemetry: {}", e);
        }
        if let Err(e) = traj_ctrl.write() {
            warn!("Could not archive TrajCtrl telemetry: {}", e);
        }

        if report.finished {
            let pose = drivetrain.pose();
            info!(
                "Trajectory finished at ({:.3}, {:.3}) m, {:.3} rad",
                pose.position_m[0], pose.position_m[1], pose.heading_rad
            );
            break;
        }

        // ---- SIMULATION ----

        sim.step(CYCLE_PERIOD_S);

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
            ),
        }
    }

    // ---- SHUTDOWN ----

    drivetrain.halt();

    info!("End of execution");

    Ok(())
}
