pub mod animator;
pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod random;
pub mod selector;
pub mod share_codec;
pub mod validation;
pub mod wheel;

pub use animator::{build_timeline, RotationSchedule};
pub use config::SpinConfig;
pub use entry::{ArcSpan, Entry, EntryId};
pub use error::{DecodeError, EncodeError, EntryError, SpinError};
pub use random::{OsRandom, SecureRandom, SeededRandom};
pub use selector::{select_winner, select_winner_with, SpinOutcome};
pub use share_codec::{decode, decode_or_default, encode, ShareToken, SharedEntry, WheelSnapshot};
pub use wheel::{Frame, SpinResult, SpinState, Wheel};
