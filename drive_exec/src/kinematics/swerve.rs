//! Chassis <-> module kinematic transforms

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{MatrixMN, Vector3, VectorN, U3, U8};

// Internal
use super::{
    ChassisDisplacement, ChassisVelocity, KinematicsError, ModuleGeometry, ModulePosition,
    ModuleState, PerModule,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Module speeds below this threshold are treated as a stationary module,
/// whose steer angle must be held rather than recomputed from a degenerate
/// velocity vector.
const STATIONARY_SPEED_MS: f64 = 1e-6;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Maps (vx, vy, omega) to the stacked (x, y) velocity components of the
/// four modules.
type InvKinMatrix = MatrixMN<f64, U8, U3>;

/// The least-squares inverse of [`InvKinMatrix`].
type FwdKinMatrix = MatrixMN<f64, U3, U8>;

type ModuleVector = VectorN<f64, U8>;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The kinematic transforms for a fixed module geometry.
///
/// The chassis->module map and its pseudo-inverse are precomputed at
/// construction, so the two directions are exact inverses of one another for
/// the same geometry.
#[derive(Debug, Clone)]
pub struct SwerveKinematics {
    geometry: PerModule<ModuleGeometry>,
    inv_kin: InvKinMatrix,
    fwd_kin: FwdKinMatrix,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveKinematics {
    /// Build the transforms for the given module geometry.
    pub fn new(geometry: PerModule<ModuleGeometry>) -> Result<Self, KinematicsError> {
        let mut inv_kin = InvKinMatrix::zeros();

        // Each module contributes two rows: the module's velocity is the
        // chassis translation plus the tangential velocity omega x offset.
        for (i, geom) in geometry.as_array().iter().enumerate() {
            inv_kin[(2 * i, 0)] = 1.0;
            inv_kin[(2 * i, 2)] = -geom.offset_m[1];
            inv_kin[(2 * i + 1, 1)] = 1.0;
            inv_kin[(2 * i + 1, 2)] = geom.offset_m[0];
        }

        let fwd_kin = inv_kin
            .pseudo_inverse(1e-10)
            .map_err(KinematicsError::DegenerateGeometry)?;

        Ok(Self {
            geometry,
            inv_kin,
            fwd_kin,
        })
    }

    /// The module geometry this transform was built for.
    pub fn geometry(&self) -> &PerModule<ModuleGeometry> {
        &self.geometry
    }

    /// Convert a robot-frame chassis velocity into per-module states.
    ///
    /// `hold_angles` carries each module's current steer angle; a module
    /// whose required speed is (near) zero keeps its held angle so that a
    /// stopped robot never scrubs its wheels back to zero.
    pub fn to_module_states(
        &self,
        velocity: &ChassisVelocity,
        hold_angles: &PerModule<f64>,
    ) -> PerModule<ModuleState> {
        let chassis = Vector3::new(velocity.vx_ms, velocity.vy_ms, velocity.omega_rads);
        let components = self.inv_kin * chassis;

        let state = |i: usize, hold_rad: f64| {
            let vx = components[2 * i];
            let vy = components[2 * i + 1];
            let speed_ms = vx.hypot(vy);

            if speed_ms < STATIONARY_SPEED_MS {
                ModuleState {
                    speed_ms: 0.0,
                    angle_rad: hold_rad,
                }
            } else {
                ModuleState {
                    speed_ms,
                    angle_rad: vy.atan2(vx),
                }
            }
        };

        PerModule {
            front_left: state(0, hold_angles.front_left),
            front_right: state(1, hold_angles.front_right),
            back_left: state(2, hold_angles.back_left),
            back_right: state(3, hold_angles.back_right),
        }
    }

    /// Uniformly rescale all module speeds so that none exceeds
    /// `max_speed_ms`.
    ///
    /// Scaling is always applied to all four modules together, preserving
    /// the ratio between module speeds and therefore the commanded direction
    /// of motion. Returns true if scaling was applied.
    pub fn desaturate(states: &mut PerModule<ModuleState>, max_speed_ms: f64) -> bool {
        let highest_ms = states
            .as_array()
            .iter()
            .map(|s| s.speed_ms.abs())
            .fold(0.0, f64::max);

        if highest_ms > max_speed_ms && highest_ms > 0.0 {
            let scale = max_speed_ms / highest_ms;
            states.apply(|s| s.speed_ms *= scale);
            true
        } else {
            false
        }
    }

    /// The least-squares inverse transform: measured module states back to a
    /// robot-frame chassis velocity.
    pub fn to_chassis_velocity(&self, states: &PerModule<ModuleState>) -> ChassisVelocity {
        let chassis = self.solve_chassis(&states.as_ref().map(|s| (s.speed_ms, s.angle_rad)));

        ChassisVelocity {
            vx_ms: chassis[0],
            vy_ms: chassis[1],
            omega_rads: chassis[2],
        }
    }

    /// The inverse transform applied to per-module distance deltas, yielding
    /// the robot-frame displacement over one tick. Used by the pose
    /// estimator.
    pub fn to_chassis_displacement(
        &self,
        deltas: &PerModule<ModulePosition>,
    ) -> ChassisDisplacement {
        let chassis = self.solve_chassis(&deltas.as_ref().map(|d| (d.distance_m, d.angle_rad)));

        ChassisDisplacement {
            dx_m: chassis[0],
            dy_m: chassis[1],
            dheading_rad: chassis[2],
        }
    }

    /// Solve the over-determined module->chassis system for a set of
    /// per-module (magnitude, angle) vectors.
    fn solve_chassis(&self, modules: &PerModule<(f64, f64)>) -> Vector3<f64> {
        let mut components = ModuleVector::zeros();

        for (i, (magnitude, angle_rad)) in modules.as_array().iter().enumerate() {
            components[2 * i] = magnitude * angle_rad.cos();
            components[2 * i + 1] = magnitude * angle_rad.sin();
        }

        self.fwd_kin * components
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::assert_approx_eq;

    const FRAC_PI_2: f64 = std::f64::consts::FRAC_PI_2;

    /// A square 0.6 m footprint, FL/FR/BL/BR.
    fn square_geometry() -> PerModule<ModuleGeometry> {
        PerModule::new(
            ModuleGeometry::new(0.3, 0.3),
            ModuleGeometry::new(0.3, -0.3),
            ModuleGeometry::new(-0.3, 0.3),
            ModuleGeometry::new(-0.3, -0.3),
        )
    }

    fn kinematics() -> SwerveKinematics {
        SwerveKinematics::new(square_geometry()).unwrap()
    }

    #[test]
    fn test_pure_translation() {
        let kin = kinematics();
        let states = kin.to_module_states(
            &ChassisVelocity::new(0.0, 2.0, 0.0),
            &PerModule::uniform(0.0),
        );

        // All modules point along +Y at the same speed
        for state in states.as_array().iter() {
            assert_approx_eq!(f64, state.speed_ms, 2.0, epsilon = 1e-9);
            assert_approx_eq!(f64, state.angle_rad, FRAC_PI_2, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_pure_rotation() {
        let kin = kinematics();
        let omega = 1.5;
        let states = kin.to_module_states(
            &ChassisVelocity::new(0.0, 0.0, omega),
            &PerModule::uniform(0.0),
        );

        // Every module's speed is omega * |offset|
        let radius = (0.3f64.powi(2) + 0.3f64.powi(2)).sqrt();
        for state in states.as_array().iter() {
            assert_approx_eq!(f64, state.speed_ms, omega * radius, epsilon = 1e-9);
        }

        // The front-left wheel's velocity is tangential to its offset:
        // omega x (0.3, 0.3) points along (-1, 1), i.e. 135 deg
        assert_approx_eq!(
            f64,
            states.front_left.angle_rad,
            3.0 * std::f64::consts::FRAC_PI_4,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_round_trip() {
        let kin = kinematics();

        let cases = [
            ChassisVelocity::new(1.0, 0.0, 0.0),
            ChassisVelocity::new(0.0, -2.0, 0.0),
            ChassisVelocity::new(1.2, 0.7, -0.9),
            ChassisVelocity::new(-0.4, 1.9, 2.3),
        ];

        for v in cases.iter() {
            let states = kin.to_module_states(v, &PerModule::uniform(0.0));
            let back = kin.to_chassis_velocity(&states);

            assert_approx_eq!(f64, back.vx_ms, v.vx_ms, epsilon = 1e-9);
            assert_approx_eq!(f64, back.vy_ms, v.vy_ms, epsilon = 1e-9);
            assert_approx_eq!(f64, back.omega_rads, v.omega_rads, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_desaturation_preserves_ratios() {
        let kin = kinematics();
        let demand = ChassisVelocity::new(4.0, 0.0, 3.0);
        let mut states = kin.to_module_states(&demand, &PerModule::uniform(0.0));
        let unscaled = states;

        let max_speed_ms = 2.0;
        let scaled = SwerveKinematics::desaturate(&mut states, max_speed_ms);
        assert!(scaled);

        // No module exceeds the limit
        for state in states.as_array().iter() {
            assert!(state.speed_ms.abs() <= max_speed_ms + 1e-12);
        }

        // Ratios between module speeds are unchanged and angles untouched
        let ratio = states.front_left.speed_ms / unscaled.front_left.speed_ms;
        for (after, before) in states.as_array().iter().zip(unscaled.as_array().iter()) {
            assert_approx_eq!(
                f64,
                after.speed_ms / before.speed_ms,
                ratio,
                epsilon = 1e-12
            );
            assert_approx_eq!(f64, after.angle_rad, before.angle_rad);
        }
    }

    #[test]
    fn test_no_desaturation_below_limit() {
        let kin = kinematics();
        let mut states = kin.to_module_states(
            &ChassisVelocity::new(1.0, 0.0, 0.0),
            &PerModule::uniform(0.0),
        );

        assert!(!SwerveKinematics::desaturate(&mut states, 5.0));
        assert_approx_eq!(f64, states.front_left.speed_ms, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stationary_holds_angles() {
        let kin = kinematics();
        let hold = PerModule::new(0.1, -0.7, 1.3, 2.9);
        let states = kin.to_module_states(&ChassisVelocity::new(0.0, 0.0, 0.0), &hold);

        // Zero demand must not snap the wheels back to zero
        for (state, held) in states.as_array().iter().zip(hold.as_array().iter()) {
            assert_approx_eq!(f64, state.speed_ms, 0.0);
            assert_approx_eq!(f64, state.angle_rad, **held);
        }
    }
}
