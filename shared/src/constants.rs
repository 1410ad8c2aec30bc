pub const FULL_TURN: f64 = 360.0;
pub const ANGLE_EPSILON: f64 = 1e-6;

// Animation defaults
pub const SPIN_DURATION_MS: f64 = 6000.0;
pub const MIN_SPIN_DURATION_MS: f64 = 250.0;
pub const MAX_SPIN_DURATION_MS: f64 = 30_000.0;
pub const MIN_SPINS: u32 = 5;  // Minimum number of full rotations
pub const MAX_SPINS: u32 = 8;  // Maximum number of full rotations
pub const MAX_TURNS: u32 = 100;  // Upper bound for configured rotations
pub const EDGE_MARGIN: f64 = 0.02;  // Fraction of an arc kept clear at each boundary
pub const MAX_EDGE_MARGIN: f64 = 0.45;

// Wheel limits
pub const MAX_ENTRIES: usize = 200;
pub const MAX_HISTORY: usize = 100;
pub const MAX_LABEL_CHARS: usize = 100;
pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_COLOR_CHARS: usize = 32;
pub const MAX_WEIGHT: u32 = 1_000_000;
pub const DEFAULT_WEIGHT: u32 = 1;

// Share links
pub const VERSION_TAG: char = '1';
pub const MAX_TOKEN_LEN: usize = 2048;
pub const MAX_STRING_BYTES: usize = 400;
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;
pub const COMPRESS_MIN_BYTES: usize = 64;

pub const DEFAULT_PALETTE: [&str; 8] = [
    "#ef4444", // Red
    "#f59e0b", // Amber
    "#10b981", // Emerald
    "#3b82f6", // Blue
    "#8b5cf6", // Violet
    "#ec4899", // Pink
    "#06b6d4", // Cyan
    "#f97316", // Orange
];

pub const EMPTY_LABEL_ERROR: &str = "Entry text cannot be empty";
pub const LABEL_TOO_LONG_ERROR: &str = "Entry text must be at most 100 characters";
pub const INVALID_COLOR_ERROR: &str = "Please enter a valid color";
pub const INVALID_WEIGHT_ERROR: &str = "Weight must be between 1 and 1000000";
pub const NAME_TOO_LONG_ERROR: &str = "Wheel name must be at most 100 characters";
