//! # Hardware interfaces
//!
//! The narrow traits through which the control core reaches the excluded
//! collaborators: motor controllers and the heading sensor. Register-level
//! configuration (PID gain upload, sensor wiring, status frame rates) is the
//! implementor's concern and never leaks into the core.

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors reported by a heading sensor.
#[derive(Debug, thiserror::Error)]
pub enum HeadingError {
    /// The sensor reports an invalid or faulted state. The drivetrain
    /// responds by commanding zero output rather than acting on a stale
    /// heading; this is never fatal.
    #[error("Heading sensor fault: {0}")]
    SensorFault(String),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// One module's actuator pair: a closed-loop drive motor and a closed-loop
/// steer motor.
///
/// Angle demands are continuous (the implementor receives targets without
/// wrap discontinuities) and distances are cumulative signed wheel travel.
pub trait ModuleActuator {
    /// Demand a closed-loop wheel speed in meters/second.
    fn command_speed(&mut self, speed_ms: f64);

    /// Demand a closed-loop steer position in radians.
    fn command_angle(&mut self, angle_rad: f64);

    /// Sensed wheel speed in meters/second.
    fn read_speed(&self) -> f64;

    /// Sensed steer position in radians.
    fn read_angle(&self) -> f64;

    /// Sensed cumulative signed wheel travel in meters.
    fn read_distance(&self) -> f64;

    /// Zero the cumulative wheel travel.
    ///
    /// Callers must re-baseline the pose estimator afterwards, see
    /// `Drivetrain::reset_encoders`.
    fn reset_distance(&mut self);
}

/// An absolute, field-referenced heading source.
///
/// This is an injected capability rather than a concrete gyro type so that
/// a simulated or fused (e.g. vision-corrected) source can be substituted
/// without touching the pose estimator.
pub trait HeadingSensor {
    /// The current heading in radians, bias and mount-offset corrected.
    fn read_heading(&self) -> Result<f64, HeadingError>;

    /// Re-zero the sensor so the current physical heading reads as zero.
    fn zero_heading(&mut self);
}
