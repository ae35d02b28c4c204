//! # Drivetrain simulation
//!
//! In-process implementations of the hardware traits with perfect actuator
//! response: commanded speeds and angles are achieved instantly, and the
//! simulated heading integrates the chassis angular rate implied by the
//! commanded module states. Used by the demo executable and the end-to-end
//! tests.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::cell::RefCell;
use std::rc::Rc;

// Internal
use crate::hw::{HeadingError, HeadingSensor, ModuleActuator};
use crate::kinematics::{ModuleId, ModuleState, PerModule, SwerveKinematics};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Shared state of the simulated drivetrain.
struct SimState {
    /// The most recent demands, achieved instantly.
    commanded: PerModule<ModuleState>,

    /// Cumulative signed wheel travel per module.
    distance_m: PerModule<f64>,

    /// The simulated absolute heading.
    heading_rad: f64,

    /// When set the heading sensor reports a fault instead of a reading.
    heading_fault: bool,
}

/// A simulated four-module swerve drivetrain.
///
/// Hands out [`SimModule`] actuators and a [`SimHeading`] sensor which all
/// share this simulation's state, then advances the physics on each call to
/// [`SwerveSim::step`].
pub struct SwerveSim {
    state: Rc<RefCell<SimState>>,
    kinematics: SwerveKinematics,
}

/// The actuator pair of one simulated module.
pub struct SimModule {
    state: Rc<RefCell<SimState>>,
    id: ModuleId,
}

/// The simulated heading sensor.
pub struct SimHeading {
    state: Rc<RefCell<SimState>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveSim {
    pub fn new(kinematics: SwerveKinematics) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState {
                commanded: PerModule::default(),
                distance_m: PerModule::default(),
                heading_rad: 0.0,
                heading_fault: false,
            })),
            kinematics,
        }
    }

    /// The actuators of the four simulated modules.
    pub fn modules(&self) -> PerModule<SimModule> {
        let module = |id| SimModule {
            state: Rc::clone(&self.state),
            id,
        };

        PerModule::new(
            module(ModuleId::FrontLeft),
            module(ModuleId::FrontRight),
            module(ModuleId::BackLeft),
            module(ModuleId::BackRight),
        )
    }

    /// The simulated heading sensor.
    pub fn heading_sensor(&self) -> SimHeading {
        SimHeading {
            state: Rc::clone(&self.state),
        }
    }

    /// Advance the simulation by one timestep.
    ///
    /// Wheel travel integrates the commanded speeds, and the heading
    /// integrates the chassis angular rate recovered from the commanded
    /// module states through the forward kinematics.
    pub fn step(&mut self, dt_s: f64) {
        let mut state = self.state.borrow_mut();

        let chassis = self.kinematics.to_chassis_velocity(&state.commanded);
        state.heading_rad += chassis.omega_rads * dt_s;

        let commanded = state.commanded;
        for id in ModuleId::ALL {
            *state.distance_m.get_mut(id) += commanded.get(id).speed_ms * dt_s;
        }
    }

    /// Put the heading sensor into (or out of) a faulted state.
    pub fn set_heading_fault(&mut self, faulted: bool) {
        self.state.borrow_mut().heading_fault = faulted;
    }

    /// The simulated true heading, for test assertions.
    pub fn true_heading_rad(&self) -> f64 {
        self.state.borrow().heading_rad
    }
}

impl ModuleActuator for SimModule {
    fn command_speed(&mut self, speed_ms: f64) {
        self.state.borrow_mut().commanded.get_mut(self.id).speed_ms = speed_ms;
    }

    fn command_angle(&mut self, angle_rad: f64) {
        self.state.borrow_mut().commanded.get_mut(self.id).angle_rad = angle_rad;
    }

    fn read_speed(&self) -> f64 {
        self.state.borrow().commanded.get(self.id).speed_ms
    }

    fn read_angle(&self) -> f64 {
        self.state.borrow().commanded.get(self.id).angle_rad
    }

    fn read_distance(&self) -> f64 {
        *self.state.borrow().distance_m.get(self.id)
    }

    fn reset_distance(&mut self) {
        *self.state.borrow_mut().distance_m.get_mut(self.id) = 0.0;
    }
}

impl HeadingSensor for SimHeading {
    fn read_heading(&self) -> Result<f64, HeadingError> {
        let state = self.state.borrow();

        if state.heading_fault {
            Err(HeadingError::SensorFault("simulated fault".into()))
        } else {
            Ok(state.heading_rad)
        }
    }

    fn zero_heading(&mut self) {
        self.state.borrow_mut().heading_rad = 0.0;
    }
}
