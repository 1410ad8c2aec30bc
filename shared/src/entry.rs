use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::*;
use crate::error::{EntryError, SpinError};
use crate::validation::{validate_color, validate_label, validate_weight};

/// Stable identity of an entry within one wheel.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One labeled slice of the wheel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Entry {
    pub id: EntryId,
    pub label: String,
    pub color: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}

impl Entry {
    /// Creates an equal-weight entry with a fresh id. Label and color are trimmed.
    pub fn new(label: &str, color: &str) -> Result<Self, EntryError> {
        validate_label(label)?;
        validate_color(color)?;
        Ok(Self {
            id: EntryId::new(),
            label: label.trim().to_string(),
            color: color.trim().to_string(),
            weight: DEFAULT_WEIGHT,
        })
    }

    pub fn with_weight(mut self, weight: u32) -> Result<Self, EntryError> {
        validate_weight(weight)?;
        self.weight = weight;
        Ok(self)
    }
}

/// Palette color for the entry at `position`, cycling.
pub fn palette_color(position: usize) -> &'static str {
    DEFAULT_PALETTE[position % DEFAULT_PALETTE.len()]
}

/// Angular span `[start, end)` in degrees, clockwise from 12 o'clock.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ArcSpan {
    pub start: f64,
    pub end: f64,
}

impl ArcSpan {
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn midpoint(&self) -> f64 {
        self.start + self.span() / 2.0
    }

    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.start && angle < self.end
    }

    /// Strictly inside: neither boundary counts.
    pub fn contains_strictly(&self, angle: f64) -> bool {
        angle > self.start && angle < self.end
    }
}

/// Wraps any finite angle into `[0, 360)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(FULL_TURN);
    // rem_euclid can round up to exactly FULL_TURN for tiny negative inputs
    if wrapped >= FULL_TURN {
        0.0
    } else {
        wrapped
    }
}

/// Integer cumulative weight bounds, one `(start, end)` pair per entry, and the total.
pub(crate) fn cumulative_weights(entries: &[Entry]) -> Result<(Vec<(u64, u64)>, u64), SpinError> {
    if entries.is_empty() {
        return Err(SpinError::EmptyWheel);
    }

    let mut bounds = Vec::with_capacity(entries.len());
    let mut total: u64 = 0;
    for (index, entry) in entries.iter().enumerate() {
        if entry.weight == 0 {
            return Err(SpinError::InvalidWeight { index });
        }
        let start = total;
        total += u64::from(entry.weight);
        bounds.push((start, total));
    }
    Ok((bounds, total))
}

fn to_degrees(cumulative: u64, total: u64) -> f64 {
    if cumulative == total {
        FULL_TURN
    } else {
        cumulative as f64 / total as f64 * FULL_TURN
    }
}

/// Partitions the circle proportionally to weight, in list order.
pub fn arcs(entries: &[Entry]) -> Result<Vec<ArcSpan>, SpinError> {
    let (bounds, total) = cumulative_weights(entries)?;
    Ok(bounds
        .into_iter()
        .map(|(start, end)| ArcSpan {
            start: to_degrees(start, total),
            end: to_degrees(end, total),
        })
        .collect())
}

pub(crate) fn arc_for(bounds: (u64, u64), total: u64) -> ArcSpan {
    ArcSpan {
        start: to_degrees(bounds.0, total),
        end: to_degrees(bounds.1, total),
    }
}

/// Index of the entry whose arc sits under the pointer when the wheel is at `angle`.
pub fn entry_at_angle(entries: &[Entry], angle: f64) -> Option<usize> {
    if !angle.is_finite() {
        return None;
    }
    let angle = normalize_angle(angle);
    let arcs = arcs(entries).ok()?;
    arcs.iter()
        .position(|arc| arc.contains(angle))
        .or_else(|| arcs.len().checked_sub(1))
}
