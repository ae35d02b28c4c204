//! # Swerve drive software library
//!
//! This library contains the motion-control core of a four-module swerve
//! drivetrain:
//!
//! - [`kinematics`] - the chassis velocity <-> module state transform and its
//!   exact inverse, used both for commanding and for odometry.
//! - [`module_ctrl`] - closed-loop control of a single drive/steer module
//!   pair, including continuous steer-angle optimisation.
//! - [`pose_est`] - fusion of per-module odometry and absolute heading into a
//!   running 2D pose estimate.
//! - [`traj_ctrl`] - closed-loop following of a time-parameterised reference
//!   trajectory.
//! - [`drivetrain`] - the coordinator composing the above, exposing the
//!   drive/pose interface to callers and running the periodic update tick.
//!
//! Hardware is reached only through the narrow traits in [`hw`]; the [`sim`]
//! module provides in-process implementations of those traits for the demo
//! executable and the tests.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod drivetrain;
pub mod hw;
pub mod kinematics;
pub mod loc;
pub mod module_ctrl;
pub mod pose_est;
pub mod sim;
pub mod traj_ctrl;
