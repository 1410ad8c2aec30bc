use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Tunables for spinning a wheel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpinConfig {
    pub duration_ms: f64,
    pub min_turns: u32,
    pub max_turns: u32,
    /// Fraction of the winning arc kept clear on each side of the stop angle.
    pub edge_margin: f64,
    /// Take the winner off the wheel once the spin completes.
    pub remove_winner: bool,
    pub history_limit: usize,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            duration_ms: SPIN_DURATION_MS,
            min_turns: MIN_SPINS,
            max_turns: MAX_SPINS,
            edge_margin: EDGE_MARGIN,
            remove_winner: false,
            history_limit: MAX_HISTORY,
        }
    }
}

impl SpinConfig {
    /// Clamps values that would break the selector or the animator.
    pub fn sanitized(mut self) -> Self {
        self.min_turns = self.min_turns.clamp(1, MAX_TURNS);
        self.max_turns = self.max_turns.clamp(self.min_turns, MAX_TURNS);
        self.edge_margin = if self.edge_margin.is_finite() {
            self.edge_margin.clamp(0.0, MAX_EDGE_MARGIN)
        } else {
            EDGE_MARGIN
        };
        if !self.duration_ms.is_finite() || self.duration_ms <= 0.0 {
            self.duration_ms = SPIN_DURATION_MS;
        }
        self.duration_ms = self.duration_ms.clamp(MIN_SPIN_DURATION_MS, MAX_SPIN_DURATION_MS);
        self.history_limit = self.history_limit.min(MAX_HISTORY);
        self
    }
}
