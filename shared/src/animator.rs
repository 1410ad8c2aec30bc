use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::entry::{normalize_angle, Entry};
use crate::error::SpinError;
use crate::selector::SpinOutcome;

// Easing function for smooth deceleration: 1 - (1-t)^4
pub fn ease_out_quart(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(4)
}

/// Derivative of [`ease_out_quart`]; reaches zero at `t = 1`.
pub fn ease_out_quart_slope(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    4.0 * (1.0 - t).powi(3)
}

/// Wheel angle as a function of elapsed time, ending on a committed stop angle.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct RotationSchedule {
    start_angle: f64,
    distance: f64,
    duration_ms: f64,
}

impl RotationSchedule {
    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    /// Absolute angle the wheel rests at when the schedule completes.
    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.distance
    }

    /// Total degrees travelled.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn progress_at(&self, elapsed_ms: f64) -> f64 {
        if elapsed_ms.is_nan() {
            return 0.0;
        }
        (elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self, elapsed_ms: f64) -> bool {
        elapsed_ms >= self.duration_ms
    }

    pub fn angle_at(&self, elapsed_ms: f64) -> f64 {
        if self.is_complete(elapsed_ms) {
            return self.end_angle();
        }
        self.start_angle + self.distance * ease_out_quart(self.progress_at(elapsed_ms))
    }

    /// Angular velocity in degrees per millisecond.
    pub fn velocity_at(&self, elapsed_ms: f64) -> f64 {
        self.distance / self.duration_ms * ease_out_quart_slope(self.progress_at(elapsed_ms))
    }

    /// Samples `(elapsed_ms, angle)` every `step_ms`, always ending with the final frame.
    pub fn frames(&self, step_ms: f64) -> Frames<'_> {
        let step_ms = if step_ms.is_finite() && step_ms > 0.0 {
            step_ms
        } else {
            self.duration_ms
        };
        Frames {
            schedule: self,
            step_ms,
            next: 0,
            done: false,
        }
    }
}

pub struct Frames<'a> {
    schedule: &'a RotationSchedule,
    step_ms: f64,
    next: u64,
    done: bool,
}

impl Iterator for Frames<'_> {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let elapsed = (self.next as f64 * self.step_ms).min(self.schedule.duration_ms);
        self.next += 1;
        if elapsed >= self.schedule.duration_ms {
            self.done = true;
        }
        Some((elapsed, self.schedule.angle_at(elapsed)))
    }
}

fn effective_duration(duration_hint_ms: f64) -> f64 {
    if !duration_hint_ms.is_finite() || duration_hint_ms <= 0.0 {
        return SPIN_DURATION_MS;
    }
    duration_hint_ms.clamp(MIN_SPIN_DURATION_MS, MAX_SPIN_DURATION_MS)
}

/// Builds the rotation that carries the wheel from `current_angle` to the
/// outcome's stop angle after `outcome.extra_turns` full turns.
///
/// `entries` must be the list the outcome was drawn from; anything else is
/// reported as [`SpinError::StaleOutcome`].
pub fn build_timeline(
    outcome: &SpinOutcome,
    entries: &[Entry],
    current_angle: f64,
    duration_hint_ms: f64,
) -> Result<RotationSchedule, SpinError> {
    outcome.verify(entries)?;
    if !current_angle.is_finite() {
        return Err(SpinError::InvalidAngle(current_angle));
    }

    let landing = normalize_angle(outcome.stop_angle - current_angle);
    let distance = f64::from(outcome.extra_turns) * FULL_TURN + landing;

    Ok(RotationSchedule {
        start_angle: current_angle,
        distance,
        duration_ms: effective_duration(duration_hint_ms),
    })
}
