use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::animator::{build_timeline, RotationSchedule};
use crate::config::SpinConfig;
use crate::constants::*;
use crate::entry::{entry_at_angle, normalize_angle, palette_color, Entry, EntryId};
use crate::error::{EntryError, SpinError};
use crate::random::SecureRandom;
use crate::selector::{select_winner_with, SpinOutcome};
use crate::share_codec::{SharedEntry, WheelSnapshot};
use crate::validation::{validate_color, validate_label, validate_name, validate_weight};

/// A spin that has been committed and is being animated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ActiveSpin {
    pub outcome: SpinOutcome,
    pub schedule: RotationSchedule,
    pub started_at_ms: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub enum SpinState {
    #[default]
    Idle,
    Spinning(ActiveSpin),
}

/// The published result of a completed spin.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpinResult {
    pub outcome: SpinOutcome,
    pub entry: Entry,
    /// The winner was taken off the wheel after being recorded.
    pub removed: bool,
}

/// What the renderer should draw for one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Idle { angle: f64 },
    Turning { angle: f64, progress: f64 },
    Finished(SpinResult),
}

/// Represents the current state of a wheel
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Wheel {
    name: Option<String>,
    entries: Vec<Entry>,
    history: Vec<String>,
    rotation: f64,
    #[serde(skip)]
    state: SpinState,
    #[serde(default)]
    config: SpinConfig,
}

impl Default for Wheel {
    fn default() -> Self {
        Self::new(SpinConfig::default())
    }
}

impl Wheel {
    pub fn new(config: SpinConfig) -> Self {
        Self {
            name: None,
            entries: Vec::new(),
            history: Vec::new(),
            rotation: 0.0,
            state: SpinState::Idle,
            config: config.sanitized(),
        }
    }

    /// Builds an independent wheel from a snapshot. Every entry gets a fresh id.
    pub fn from_snapshot(snapshot: WheelSnapshot, config: SpinConfig) -> Result<Self, EntryError> {
        let mut wheel = Self::new(config);
        if snapshot.entries.len() > MAX_ENTRIES {
            return Err(EntryError::TooManyEntries { max: MAX_ENTRIES });
        }
        wheel.set_name(snapshot.name)?;
        for shared in snapshot.entries {
            wheel.add_entry_with(&shared.label, Some(&shared.color), shared.weight)?;
        }
        let skip = snapshot.history.len().saturating_sub(wheel.config.history_limit);
        wheel.history = snapshot.history.into_iter().skip(skip).collect();
        Ok(wheel)
    }

    pub fn snapshot(&self) -> WheelSnapshot {
        WheelSnapshot {
            entries: self
                .entries
                .iter()
                .map(|entry| SharedEntry {
                    label: entry.label.clone(),
                    color: entry.color.clone(),
                    weight: entry.weight,
                })
                .collect(),
            name: self.name.clone(),
            history: self.history.clone(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn config(&self) -> &SpinConfig {
        &self.config
    }

    pub fn state(&self) -> &SpinState {
        &self.state
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.state, SpinState::Spinning(_))
    }

    /// Current resting or in-flight angle, as last rendered.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn entry_under_pointer(&self) -> Option<&Entry> {
        entry_at_angle(&self.entries, self.rotation).and_then(|index| self.entries.get(index))
    }

    // === Editing ===

    fn ensure_editable(&self) -> Result<(), EntryError> {
        if self.is_spinning() {
            return Err(EntryError::SpinInProgress);
        }
        Ok(())
    }

    fn position(&self, id: EntryId) -> Result<usize, EntryError> {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(EntryError::NotFound(id))
    }

    pub fn set_name(&mut self, name: Option<String>) -> Result<(), EntryError> {
        self.ensure_editable()?;
        let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if let Some(name) = &name {
            validate_name(name)?;
        }
        self.name = name;
        Ok(())
    }

    /// Adds an equal-weight entry colored from the default palette.
    pub fn add_entry(&mut self, label: &str) -> Result<EntryId, EntryError> {
        self.add_entry_with(label, None, DEFAULT_WEIGHT)
    }

    pub fn add_entry_with(&mut self, label: &str, color: Option<&str>, weight: u32) -> Result<EntryId, EntryError> {
        self.ensure_editable()?;
        if self.entries.len() >= MAX_ENTRIES {
            return Err(EntryError::TooManyEntries { max: MAX_ENTRIES });
        }
        let color = color.unwrap_or_else(|| palette_color(self.entries.len()));
        let entry = Entry::new(label, color)?.with_weight(weight)?;
        let id = entry.id;
        self.entries.push(entry);
        Ok(id)
    }

    /// Adds one entry per non-blank line. Nothing is added if any line is invalid.
    pub fn add_entries_from_text(&mut self, text: &str) -> Result<Vec<EntryId>, EntryError> {
        self.ensure_editable()?;
        let labels: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        for label in &labels {
            validate_label(label)?;
        }
        if self.entries.len() + labels.len() > MAX_ENTRIES {
            return Err(EntryError::TooManyEntries { max: MAX_ENTRIES });
        }
        labels.into_iter().map(|label| self.add_entry(label)).collect()
    }

    pub fn remove_entry(&mut self, id: EntryId) -> Result<Entry, EntryError> {
        self.ensure_editable()?;
        let index = self.position(id)?;
        Ok(self.entries.remove(index))
    }

    pub fn rename_entry(&mut self, id: EntryId, label: &str) -> Result<(), EntryError> {
        self.ensure_editable()?;
        validate_label(label)?;
        let index = self.position(id)?;
        self.entries[index].label = label.trim().to_string();
        Ok(())
    }

    pub fn recolor_entry(&mut self, id: EntryId, color: &str) -> Result<(), EntryError> {
        self.ensure_editable()?;
        validate_color(color)?;
        let index = self.position(id)?;
        self.entries[index].color = color.trim().to_string();
        Ok(())
    }

    pub fn set_weight(&mut self, id: EntryId, weight: u32) -> Result<(), EntryError> {
        self.ensure_editable()?;
        validate_weight(weight)?;
        let index = self.position(id)?;
        self.entries[index].weight = weight;
        Ok(())
    }

    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<(), EntryError> {
        self.ensure_editable()?;
        let len = self.entries.len();
        for index in [from, to] {
            if index >= len {
                return Err(EntryError::IndexOutOfRange { index, len });
            }
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        Ok(())
    }

    pub fn shuffle<R: SecureRandom + ?Sized>(&mut self, rng: &mut R) -> Result<(), EntryError> {
        self.ensure_editable()?;
        self.entries.shuffle(rng);
        Ok(())
    }

    pub fn sort_by_label(&mut self) -> Result<(), EntryError> {
        self.ensure_editable()?;
        self.entries
            .sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
        Ok(())
    }

    pub fn clear_entries(&mut self) -> Result<(), EntryError> {
        self.ensure_editable()?;
        self.entries.clear();
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // === Spinning ===

    /// Commits to a winner and starts animating towards it.
    pub fn start_spin<R: SecureRandom + ?Sized>(&mut self, rng: &mut R, now_ms: f64) -> Result<SpinOutcome, SpinError> {
        if self.is_spinning() {
            return Err(SpinError::SpinInProgress);
        }
        let outcome = select_winner_with(&self.entries, rng, &self.config)?;
        let schedule = build_timeline(&outcome, &self.entries, self.rotation, self.config.duration_ms)?;

        log::info!(
            "Spin started: {} entries, landing after {:.0}ms",
            self.entries.len(),
            schedule.duration_ms()
        );

        self.state = SpinState::Spinning(ActiveSpin {
            outcome,
            schedule,
            started_at_ms: now_ms,
        });
        Ok(outcome)
    }

    /// Advances the animation to `now_ms`.
    ///
    /// Returns [`Frame::Finished`] exactly once per spin, carrying the winner
    /// committed by [`Wheel::start_spin`].
    pub fn tick(&mut self, now_ms: f64) -> Result<Frame, SpinError> {
        let (angle, progress, complete) = match &self.state {
            SpinState::Idle => return Ok(Frame::Idle { angle: self.rotation }),
            SpinState::Spinning(active) => {
                // edits are locked while spinning, but state can be restored from elsewhere
                if let Err(err) = active.outcome.verify(&self.entries) {
                    log::warn!("Abandoning spin: {}", err);
                    self.state = SpinState::Idle;
                    return Err(err);
                }
                let elapsed = elapsed_since(active.started_at_ms, now_ms);
                (
                    active.schedule.angle_at(elapsed),
                    active.schedule.progress_at(elapsed),
                    active.schedule.is_complete(elapsed),
                )
            }
        };

        self.rotation = angle;
        if !complete {
            return Ok(Frame::Turning { angle, progress });
        }

        match std::mem::take(&mut self.state) {
            SpinState::Spinning(active) => Ok(Frame::Finished(self.complete_spin(active.outcome))),
            SpinState::Idle => Ok(Frame::Idle { angle }),
        }
    }

    fn complete_spin(&mut self, outcome: SpinOutcome) -> SpinResult {
        self.rotation = normalize_angle(self.rotation);
        let entry = self.entries[outcome.winning_index].clone();

        if entry_at_angle(&self.entries, self.rotation) != Some(outcome.winning_index) {
            log::warn!("Pointer rests outside the committed arc for {:?}", entry.label);
        }

        self.history.push(entry.label.clone());
        if self.history.len() > self.config.history_limit {
            let excess = self.history.len() - self.config.history_limit;
            self.history.drain(..excess);
        }

        let removed = self.config.remove_winner;
        if removed {
            self.entries.remove(outcome.winning_index);
        }

        log::info!("Spin finished: {:?} won", entry.label);
        SpinResult {
            outcome,
            entry,
            removed,
        }
    }

    /// Abandons the current spin, leaving the wheel where it was at `now_ms`.
    /// The discarded outcome is never published. Returns whether a spin was running.
    pub fn cancel(&mut self, now_ms: f64) -> bool {
        match std::mem::take(&mut self.state) {
            SpinState::Idle => false,
            SpinState::Spinning(active) => {
                let elapsed = elapsed_since(active.started_at_ms, now_ms);
                self.rotation = normalize_angle(active.schedule.angle_at(elapsed));
                log::info!("Spin cancelled");
                true
            }
        }
    }
}

fn elapsed_since(started_at_ms: f64, now_ms: f64) -> f64 {
    let elapsed = now_ms - started_at_ms;
    if elapsed.is_finite() {
        elapsed.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;

    fn lunch_wheel(config: SpinConfig) -> Wheel {
        let mut wheel = Wheel::new(config);
        wheel.add_entries_from_text("Pizza\nSushi\n\n  Tacos  \nCurry").unwrap();
        wheel
    }

    fn run_to_end(wheel: &mut Wheel, start_ms: f64) -> SpinResult {
        let mut now = start_ms;
        loop {
            now += 16.0;
            if let Frame::Finished(result) = wheel.tick(now).unwrap() {
                return result;
            }
        }
    }

    #[test]
    fn test_add_entries_from_text() {
        let wheel = lunch_wheel(SpinConfig::default());
        let labels: Vec<&str> = wheel.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Pizza", "Sushi", "Tacos", "Curry"]);
        assert_eq!(wheel.entries()[0].color, DEFAULT_PALETTE[0]);
        assert_eq!(wheel.entries()[3].color, DEFAULT_PALETTE[3]);
    }

    #[test]
    fn test_bulk_add_is_all_or_nothing() {
        let mut wheel = lunch_wheel(SpinConfig::default());
        let too_long = "x".repeat(MAX_LABEL_CHARS + 1);
        assert!(wheel.add_entries_from_text(&format!("Ramen\n{too_long}")).is_err());
        assert_eq!(wheel.entries().len(), 4);
    }

    #[test]
    fn test_capacity() {
        let mut wheel = Wheel::default();
        for i in 0..MAX_ENTRIES {
            wheel.add_entry(&format!("Guest {i}")).unwrap();
        }
        assert_eq!(
            wheel.add_entry("One more"),
            Err(EntryError::TooManyEntries { max: MAX_ENTRIES })
        );
    }

    #[test]
    fn test_editing() {
        let mut wheel = lunch_wheel(SpinConfig::default());
        let id = wheel.entries()[1].id;
        wheel.rename_entry(id, " Ramen ").unwrap();
        wheel.recolor_entry(id, "#123456").unwrap();
        wheel.set_weight(id, 3).unwrap();
        assert_eq!(wheel.entries()[1].label, "Ramen");
        assert_eq!(wheel.entries()[1].color, "#123456");
        assert_eq!(wheel.entries()[1].weight, 3);
        assert!(wheel.set_weight(id, 0).is_err());

        wheel.move_entry(1, 3).unwrap();
        assert_eq!(wheel.entries()[3].id, id);
        assert_eq!(
            wheel.move_entry(0, 9),
            Err(EntryError::IndexOutOfRange { index: 9, len: 4 })
        );

        let removed = wheel.remove_entry(id).unwrap();
        assert_eq!(removed.label, "Ramen");
        assert_eq!(wheel.remove_entry(id), Err(EntryError::NotFound(id)));

        wheel.sort_by_label().unwrap();
        let labels: Vec<&str> = wheel.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Curry", "Pizza", "Tacos"]);
    }

    #[test]
    fn test_shuffle_keeps_entries() {
        let mut wheel = lunch_wheel(SpinConfig::default());
        let mut before: Vec<EntryId> = wheel.entries().iter().map(|e| e.id).collect();
        wheel.shuffle(&mut SeededRandom::new(77)).unwrap();
        let mut after: Vec<EntryId> = wheel.entries().iter().map(|e| e.id).collect();
        before.sort_by_key(|id| id.to_string());
        after.sort_by_key(|id| id.to_string());
        assert_eq!(before, after);

        let labels = |wheel: &Wheel| wheel.entries().iter().map(|e| e.label.clone()).collect::<Vec<_>>();
        let mut first = lunch_wheel(SpinConfig::default());
        let mut second = lunch_wheel(SpinConfig::default());
        first.shuffle(&mut SeededRandom::new(5)).unwrap();
        second.shuffle(&mut SeededRandom::new(5)).unwrap();
        assert_eq!(labels(&first), labels(&second));
    }

    #[test]
    fn test_empty_wheel_cannot_spin() {
        let mut wheel = Wheel::default();
        assert_eq!(
            wheel.start_spin(&mut SeededRandom::new(1), 0.0),
            Err(SpinError::EmptyWheel)
        );
        assert!(!wheel.is_spinning());
    }

    #[test]
    fn test_spin_publishes_committed_winner() {
        let mut wheel = lunch_wheel(SpinConfig::default());
        let outcome = wheel.start_spin(&mut SeededRandom::new(5), 1000.0).unwrap();
        assert!(wheel.is_spinning());

        let result = run_to_end(&mut wheel, 1000.0);
        assert_eq!(result.outcome, outcome);
        assert_eq!(result.entry.id, outcome.winner_id);
        assert!(!result.removed);
        assert!(!wheel.is_spinning());
        assert_eq!(wheel.history(), &[result.entry.label.clone()]);
        assert_eq!(wheel.entry_under_pointer().map(|e| e.id), Some(outcome.winner_id));
        assert!((wheel.rotation() - outcome.stop_angle).abs() < ANGLE_EPSILON);
        assert_eq!(wheel.tick(1e9).unwrap(), Frame::Idle { angle: wheel.rotation() });
    }

    #[test]
    fn test_second_spin_is_rejected_while_spinning() {
        let mut wheel = lunch_wheel(SpinConfig::default());
        let mut rng = SeededRandom::new(9);
        wheel.start_spin(&mut rng, 0.0).unwrap();
        assert_eq!(wheel.start_spin(&mut rng, 10.0), Err(SpinError::SpinInProgress));
        assert_eq!(wheel.add_entry("Late"), Err(EntryError::SpinInProgress));
        assert!(matches!(wheel.tick(100.0).unwrap(), Frame::Turning { .. }));
    }

    #[test]
    fn test_tick_abandons_outcome_for_changed_entries() {
        let mut wheel = lunch_wheel(SpinConfig::default());
        let outcome = wheel.start_spin(&mut SeededRandom::new(8), 0.0).unwrap();
        // editing is locked while spinning; only restored or hand-built state gets here
        wheel.entries.remove(outcome.winning_index);
        assert_eq!(
            wheel.tick(100.0),
            Err(SpinError::StaleOutcome {
                index: outcome.winning_index,
                len: 3
            })
        );
        assert!(!wheel.is_spinning());
        assert!(wheel.history().is_empty());
    }

    #[test]
    fn test_cancel_discards_outcome() {
        let mut wheel = lunch_wheel(SpinConfig::default());
        wheel.start_spin(&mut SeededRandom::new(3), 0.0).unwrap();
        wheel.tick(500.0).unwrap();
        assert!(wheel.cancel(700.0));
        assert!(!wheel.is_spinning());
        assert!(wheel.history().is_empty());
        assert!(wheel.rotation() >= 0.0 && wheel.rotation() < FULL_TURN);
        assert_eq!(wheel.tick(10_000.0).unwrap(), Frame::Idle { angle: wheel.rotation() });
        assert!(!wheel.cancel(800.0));
    }

    #[test]
    fn test_consecutive_spins_continue_from_rest() {
        let mut wheel = lunch_wheel(SpinConfig::default());
        let mut rng = SeededRandom::new(31);
        let mut now = 0.0;
        for _ in 0..5 {
            let rest = wheel.rotation();
            let outcome = wheel.start_spin(&mut rng, now).unwrap();
            match wheel.tick(now).unwrap() {
                Frame::Turning { angle, .. } => assert_eq!(angle, rest),
                other => panic!("unexpected frame {other:?}"),
            }
            let result = run_to_end(&mut wheel, now);
            assert_eq!(result.entry.id, outcome.winner_id);
            now += 10_000.0;
        }
        assert_eq!(wheel.history().len(), 5);
    }

    #[test]
    fn test_remove_winner_and_history_limit() {
        let config = SpinConfig {
            remove_winner: true,
            history_limit: 2,
            ..SpinConfig::default()
        };
        let mut wheel = lunch_wheel(config);
        let mut rng = SeededRandom::new(17);
        let mut winners = Vec::new();
        for round in 0..3 {
            let start = round as f64 * 10_000.0;
            wheel.start_spin(&mut rng, start).unwrap();
            let result = run_to_end(&mut wheel, start);
            assert!(result.removed);
            assert!(wheel.entries().iter().all(|e| e.id != result.entry.id));
            winners.push(result.entry.label);
        }
        assert_eq!(wheel.entries().len(), 1);
        assert_eq!(wheel.history(), &winners[1..]);
    }

    #[test]
    fn test_snapshot_round_trip_regenerates_ids() {
        let mut wheel = lunch_wheel(SpinConfig::default());
        wheel.set_name(Some("  Lunch ".to_string())).unwrap();
        let id = wheel.entries()[2].id;
        wheel.set_weight(id, 4).unwrap();
        wheel.start_spin(&mut SeededRandom::new(2), 0.0).unwrap();
        run_to_end(&mut wheel, 0.0);

        let snapshot = wheel.snapshot();
        assert_eq!(snapshot.name.as_deref(), Some("Lunch"));
        let copy = Wheel::from_snapshot(snapshot.clone(), SpinConfig::default()).unwrap();
        assert_eq!(copy.snapshot(), snapshot);
        assert!(copy.entries().iter().zip(wheel.entries()).all(|(a, b)| a.id != b.id));
    }

    #[test]
    fn test_wheel_serializes_for_local_storage() {
        let wheel = lunch_wheel(SpinConfig::default());
        let json = serde_json::to_string(&wheel).unwrap();
        let restored: Wheel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.entries(), wheel.entries());
        assert!(!restored.is_spinning());
    }
}
