//! Per-module state types and the fixed-order module container

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The instantaneous state of one swerve module.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct ModuleState {
    /// Signed linear speed of the wheel.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Heading of the wheel in the robot frame. Continuous, no wrap
    /// discontinuity is exposed to consumers.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

/// The odometry-facing counterpart of [`ModuleState`]: cumulative signed
/// wheel travel rather than instantaneous speed.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct ModulePosition {
    /// Cumulative signed distance travelled by the wheel.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Heading of the wheel in the robot frame.
    ///
    /// Units: radians
    pub angle_rad: f64,
}

/// Fixed geometry of one module, set once at drivetrain construction.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ModuleGeometry {
    /// Translation from the robot centre to the module's contact patch, in
    /// the robot frame (X forward, Y left).
    ///
    /// Units: meters
    pub offset_m: Vector2<f64>,
}

/// A value held for each of the four swerve modules.
///
/// Module order is fixed by the named fields, so it cannot drift between the
/// kinematics, the drivetrain and the pose estimator. All per-module APIs in
/// this crate take and return `PerModule` rather than slices.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PerModule<T> {
    pub front_left: T,
    pub front_right: T,
    pub back_left: T,
    pub back_right: T,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Identifies one of the four modules.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ModuleId {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> PerModule<T> {
    pub fn new(front_left: T, front_right: T, back_left: T, back_right: T) -> Self {
        Self {
            front_left,
            front_right,
            back_left,
            back_right,
        }
    }

    /// Borrow all four values in the fixed (FL, FR, BL, BR) order.
    pub fn as_array(&self) -> [&T; 4] {
        [
            &self.front_left,
            &self.front_right,
            &self.back_left,
            &self.back_right,
        ]
    }

    /// Borrow each value.
    pub fn as_ref(&self) -> PerModule<&T> {
        PerModule {
            front_left: &self.front_left,
            front_right: &self.front_right,
            back_left: &self.back_left,
            back_right: &self.back_right,
        }
    }

    /// Apply a function to each module's value, consuming self.
    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> PerModule<U> {
        PerModule {
            front_left: f(self.front_left),
            front_right: f(self.front_right),
            back_left: f(self.back_left),
            back_right: f(self.back_right),
        }
    }

    /// Pair each module's value with the corresponding value from `other`.
    pub fn zip<U>(self, other: PerModule<U>) -> PerModule<(T, U)> {
        PerModule {
            front_left: (self.front_left, other.front_left),
            front_right: (self.front_right, other.front_right),
            back_left: (self.back_left, other.back_left),
            back_right: (self.back_right, other.back_right),
        }
    }

    /// Mutate each module's value in place.
    pub fn apply<F: FnMut(&mut T)>(&mut self, mut f: F) {
        f(&mut self.front_left);
        f(&mut self.front_right);
        f(&mut self.back_left);
        f(&mut self.back_right);
    }

    pub fn get(&self, id: ModuleId) -> &T {
        match id {
            ModuleId::FrontLeft => &self.front_left,
            ModuleId::FrontRight => &self.front_right,
            ModuleId::BackLeft => &self.back_left,
            ModuleId::BackRight => &self.back_right,
        }
    }

    pub fn get_mut(&mut self, id: ModuleId) -> &mut T {
        match id {
            ModuleId::FrontLeft => &mut self.front_left,
            ModuleId::FrontRight => &mut self.front_right,
            ModuleId::BackLeft => &mut self.back_left,
            ModuleId::BackRight => &mut self.back_right,
        }
    }
}

impl<T: Clone> PerModule<T> {
    /// A `PerModule` holding a copy of `value` for every module.
    pub fn uniform(value: T) -> Self {
        Self {
            front_left: value.clone(),
            front_right: value.clone(),
            back_left: value.clone(),
            back_right: value,
        }
    }
}

impl ModuleGeometry {
    pub fn new(x_m: f64, y_m: f64) -> Self {
        Self {
            offset_m: Vector2::new(x_m, y_m),
        }
    }
}

impl ModuleId {
    /// All module ids in the fixed (FL, FR, BL, BR) order.
    pub const ALL: [ModuleId; 4] = [
        ModuleId::FrontLeft,
        ModuleId::FrontRight,
        ModuleId::BackLeft,
        ModuleId::BackRight,
    ];
}
