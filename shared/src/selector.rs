use serde::{Deserialize, Serialize};

use crate::config::SpinConfig;
use crate::entry::{arc_for, cumulative_weights, ArcSpan, Entry, EntryId};
use crate::error::SpinError;
use crate::random::SecureRandom;

/// The committed result of a spin, fixed before any animation exists.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SpinOutcome {
    pub winning_index: usize,
    pub winner_id: EntryId,
    pub entry_count: usize,
    pub arc: ArcSpan,
    pub stop_angle: f64,
    pub extra_turns: u32,
}

impl SpinOutcome {
    /// Fails unless `entries` is still the list this outcome was drawn from.
    pub fn verify(&self, entries: &[Entry]) -> Result<(), SpinError> {
        let stale = SpinError::StaleOutcome {
            index: self.winning_index,
            len: entries.len(),
        };
        match entries.get(self.winning_index) {
            Some(entry) if entry.id == self.winner_id && entries.len() == self.entry_count => Ok(()),
            _ => Err(stale),
        }
    }
}

/// Picks a winner with the default spin settings.
pub fn select_winner<R>(entries: &[Entry], rng: &mut R) -> Result<SpinOutcome, SpinError>
where
    R: SecureRandom + ?Sized,
{
    select_winner_with(entries, rng, &SpinConfig::default())
}

/// Picks a winner with probability proportional to weight.
///
/// The winning index comes from an unbiased integer draw over the total
/// weight. A second draw places the stop angle somewhere inside the winning
/// arc, away from both boundaries, and a third picks how many full turns the
/// animation makes before landing.
pub fn select_winner_with<R>(entries: &[Entry], rng: &mut R, config: &SpinConfig) -> Result<SpinOutcome, SpinError>
where
    R: SecureRandom + ?Sized,
{
    let config = config.clone().sanitized();
    let (bounds, total) = cumulative_weights(entries)?;

    let target = rng.uniform_below(total);
    // bounds are sorted and contiguous, so the first arc ending past the target owns it
    let winning_index = bounds.partition_point(|&(_, end)| end <= target);
    let arc = arc_for(bounds[winning_index], total);

    let margin = config.edge_margin;
    let offset = margin + (1.0 - 2.0 * margin) * rng.unit_fraction();
    let mut stop_angle = arc.start + offset * arc.span();
    if !arc.contains_strictly(stop_angle) {
        stop_angle = arc.midpoint();
    }

    let spread = u64::from(config.max_turns - config.min_turns) + 1;
    let extra_turns = config.min_turns + rng.uniform_below(spread) as u32;

    log::debug!(
        "Committed spin: index {} of {}, stop angle {:.4}, {} extra turns",
        winning_index,
        entries.len(),
        stop_angle,
        extra_turns
    );

    Ok(SpinOutcome {
        winning_index,
        winner_id: entries[winning_index].id,
        entry_count: entries.len(),
        arc,
        stop_angle,
        extra_turns,
    })
}
