use thiserror::Error;
use validator::ValidationError;

use crate::entry::EntryId;

/// Failures of the selector, the animator and the spin state machine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpinError {
    #[error("The wheel has no entries to spin")]
    EmptyWheel,

    #[error("Spin outcome for index {index} no longer matches the wheel ({len} entries)")]
    StaleOutcome { index: usize, len: usize },

    #[error("A spin is already in progress")]
    SpinInProgress,

    #[error("Entry {index} has a weight of zero")]
    InvalidWeight { index: usize },

    #[error("Wheel angle must be finite, got {0}")]
    InvalidAngle(f64),
}

/// Failures when editing the entry list.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntryError {
    #[error("Invalid entry: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Entry not found: {0}")]
    NotFound(EntryId),

    #[error("The wheel is full ({max} entries)")]
    TooManyEntries { max: usize },

    #[error("Position {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Entries cannot be changed while the wheel is spinning")]
    SpinInProgress,
}

/// Why a share token was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unsupported share link version: {0:?}")]
    UnsupportedVersion(char),

    #[error("Share link is truncated")]
    Truncated,

    #[error("Invalid character {ch:?} at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    #[error("Share link {what} is too large: {len} (limit {max})")]
    SizeExceeded { what: &'static str, len: usize, max: usize },

    #[error("Share link is malformed: {0}")]
    Malformed(&'static str),
}

/// Why a snapshot cannot be turned into a share token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Too many entries to share: {count} (limit {max})")]
    TooManyEntries { count: usize, max: usize },

    #[error("Too many history items to share: {count} (limit {max})")]
    TooManyHistoryItems { count: usize, max: usize },

    #[error("Entry {index} has an empty label")]
    EmptyLabel { index: usize },

    #[error("Entry {index} has a label longer than {max} characters")]
    LabelTooLong { index: usize, max: usize },

    #[error("Entry {index} has an invalid color")]
    InvalidColor { index: usize },

    #[error("Entry {index} has a weight outside 1..={max}")]
    InvalidWeight { index: usize, max: u32 },

    #[error("Wheel name is longer than {max} characters")]
    NameTooLong { max: usize },

    #[error("A {what} is too long to share: {len} bytes (limit {max})")]
    StringTooLong { what: &'static str, len: usize, max: usize },

    #[error("Share link would be {len} characters (limit {max})")]
    SizeExceeded { len: usize, max: usize },
}
