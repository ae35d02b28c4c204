//! Time-parameterised reference trajectories
//!
//! Trajectories are produced by an external generator (or the simple
//! straight-line generator below) and passed to the follower in memory.
//! They are immutable once built and are only ever queried by elapsed time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::TrajCtrlError;
use crate::loc::Pose;
use util::maths::{ang_diff, lin_map, wrap_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One sample of a reference trajectory.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct TrajectorySample {
    /// Time of this sample from the start of the trajectory.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Reference pose at this time.
    pub pose: Pose,

    /// Reference speed along the path at this time.
    ///
    /// Units: meters/second
    pub velocity_ms: f64,

    /// Path curvature (1/radius) at this time.
    ///
    /// Units: 1/meters
    pub curvature_m: f64,
}

/// An immutable, time-indexed reference trajectory spanning
/// `[start time, start time + duration]`.
#[derive(Debug, Clone)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    /// Build a trajectory from a sequence of samples.
    ///
    /// The sequence must contain at least two samples with strictly
    /// increasing timestamps.
    pub fn new(samples: Vec<TrajectorySample>) -> Result<Self, TrajCtrlError> {
        if samples.len() < 2 {
            return Err(TrajCtrlError::TooFewSamples(samples.len()));
        }

        for i in 1..samples.len() {
            if samples[i].time_s <= samples[i - 1].time_s {
                return Err(TrajCtrlError::NonMonotonicTime(i));
            }
        }

        Ok(Self { samples })
    }

    /// Total duration of the trajectory in seconds.
    pub fn duration_s(&self) -> f64 {
        self.samples[self.samples.len() - 1].time_s - self.samples[0].time_s
    }

    /// The trajectory's final reference pose.
    pub fn end_pose(&self) -> Pose {
        self.samples[self.samples.len() - 1].pose
    }

    /// Sample the trajectory at the given elapsed time.
    ///
    /// Queries outside `[0, duration]` are clamped to the nearest boundary
    /// sample rather than failing: a follower may legitimately be queried
    /// slightly before the start or after nominal completion. Between
    /// samples the reference is interpolated linearly, with headings
    /// interpolated along the shortest angular path.
    pub fn sample(&self, elapsed_s: f64) -> TrajectorySample {
        let first = &self.samples[0];
        let last = &self.samples[self.samples.len() - 1];

        let time_s = first.time_s + elapsed_s;

        if time_s <= first.time_s {
            return *first;
        }
        if time_s >= last.time_s {
            return *last;
        }

        // Find the bracketing pair. Sample counts are small (hundreds), a
        // linear scan is fine at the 50 Hz control rate.
        let upper_index = self
            .samples
            .iter()
            .position(|s| s.time_s >= time_s)
            .unwrap_or(self.samples.len() - 1);
        let lower = &self.samples[upper_index - 1];
        let upper = &self.samples[upper_index];

        let alpha = (time_s - lower.time_s) / (upper.time_s - lower.time_s);

        TrajectorySample {
            time_s,
            pose: Pose {
                position_m: lower.pose.position_m
                    + (upper.pose.position_m - lower.pose.position_m) * alpha,
                heading_rad: wrap_pi(
                    lower.pose.heading_rad
                        + ang_diff(lower.pose.heading_rad, upper.pose.heading_rad) * alpha,
                ),
            },
            velocity_ms: lin_map((0.0, 1.0), (lower.velocity_ms, upper.velocity_ms), alpha),
            curvature_m: lin_map((0.0, 1.0), (lower.curvature_m, upper.curvature_m), alpha),
        }
    }

    /// The direction of travel (course) of the path at the given elapsed
    /// time, in the field frame.
    ///
    /// For a holonomic chassis the course is independent of the reference
    /// heading, so it is derived from the positions of the bracketing
    /// samples. Falls back to the reference heading where the path is
    /// locally stationary.
    pub fn course_rad(&self, elapsed_s: f64) -> f64 {
        let time_s = self.samples[0].time_s + elapsed_s;

        // Clamp into the last segment when beyond the end
        let upper_index = self
            .samples
            .iter()
            .position(|s| s.time_s > time_s)
            .unwrap_or(self.samples.len() - 1)
            .max(1);

        let lower = &self.samples[upper_index - 1];
        let upper = &self.samples[upper_index];

        let segment = upper.pose.position_m - lower.pose.position_m;

        if segment.norm() < 1e-9 {
            self.sample(elapsed_s).pose.heading_rad
        } else {
            segment[1].atan2(segment[0])
        }
    }

    /// Generate a straight-line trajectory between two poses with a
    /// trapezoidal (accelerate / cruise / decelerate) speed profile.
    ///
    /// The heading reference rotates along the shortest angular path in
    /// proportion to distance travelled. Curvature is zero throughout.
    pub fn straight_line(
        start: Pose,
        end: Pose,
        max_speed_ms: f64,
        max_accel_mss: f64,
        step_s: f64,
    ) -> Result<Self, TrajCtrlError> {
        if max_speed_ms <= 0.0 || max_accel_mss <= 0.0 || step_s <= 0.0 {
            return Err(TrajCtrlError::InvalidLimits {
                speed_ms: max_speed_ms,
                accel_mss: max_accel_mss,
            });
        }

        let path = end.position_m - start.position_m;
        let total_m = path.norm();

        if total_m < 1e-9 {
            return Err(TrajCtrlError::DegeneratePath);
        }

        let direction: Vector2<f64> = path / total_m;
        let turn_rad = ang_diff(start.heading_rad, end.heading_rad);

        // Peak speed is limited either by the cruise limit or, for short
        // moves, by the distance available to accelerate and brake
        let peak_ms = max_speed_ms.min((max_accel_mss * total_m).sqrt());
        let t_accel_s = peak_ms / max_accel_mss;
        let d_accel_m = 0.5 * max_accel_mss * t_accel_s * t_accel_s;
        let t_cruise_s = (total_m - 2.0 * d_accel_m).max(0.0) / peak_ms;
        let duration_s = 2.0 * t_accel_s + t_cruise_s;

        let profile = |t_s: f64| -> (f64, f64) {
            if t_s < t_accel_s {
                (0.5 * max_accel_mss * t_s * t_s, max_accel_mss * t_s)
            } else if t_s < t_accel_s + t_cruise_s {
                (d_accel_m + peak_ms * (t_s - t_accel_s), peak_ms)
            } else {
                let remaining_s = (duration_s - t_s).max(0.0);
                (
                    total_m - 0.5 * max_accel_mss * remaining_s * remaining_s,
                    max_accel_mss * remaining_s,
                )
            }
        };

        let num_steps = (duration_s / step_s).ceil() as usize;
        let mut samples = Vec::with_capacity(num_steps + 1);

        for i in 0..=num_steps {
            let t_s = (i as f64 * step_s).min(duration_s);
            let (s_m, v_ms) = profile(t_s);
            let fraction = s_m / total_m;

            samples.push(TrajectorySample {
                time_s: t_s,
                pose: Pose {
                    position_m: start.position_m + direction * s_m,
                    heading_rad: wrap_pi(start.heading_rad + turn_rad * fraction),
                },
                velocity_ms: v_ms,
                curvature_m: 0.0,
            });
        }

        Self::new(samples)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
