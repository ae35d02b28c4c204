//! Parameters structure for TrajCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    // ---- CONTROLLER GAINS ----

    /// Longitudinal (along-path) position controller gains.
    pub long_k_p: f64,
    pub long_k_i: f64,
    pub long_k_d: f64,

    /// Lateral (cross-path) position controller gains.
    pub lat_k_p: f64,
    pub lat_k_i: f64,
    pub lat_k_d: f64,

    /// Heading controller gains.
    pub head_k_p: f64,
    pub head_k_i: f64,
    pub head_k_d: f64,

    // ---- OUTPUT LIMITS ----

    /// Maximum translational speed the controller may demand.
    ///
    /// Units: meters/second
    pub max_speed_dem_ms: f64,

    /// Maximum angular rate the controller may demand. Bounds the heading
    /// axis so unachievable angular accelerations are never commanded.
    ///
    /// Units: radians/second
    pub max_omega_dem_rads: f64,

    // ---- ERROR LIMITS ----

    /// Limit on the absolute lateral error before the follow is flagged as
    /// diverged.
    ///
    /// Units: meters
    pub lat_error_limit_m: f64,

    /// Limit on the absolute heading error before the follow is flagged as
    /// diverged.
    ///
    /// Units: radians
    pub head_error_limit_rad: f64,
}
