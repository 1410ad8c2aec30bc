use std::str::FromStr;

use fairwheel_shared::SpinConfig;
use tracing::{debug, warn};

pub const DURATION_VAR: &str = "FAIRWHEEL_DURATION_MS";
pub const MIN_TURNS_VAR: &str = "FAIRWHEEL_MIN_TURNS";
pub const MAX_TURNS_VAR: &str = "FAIRWHEEL_MAX_TURNS";
pub const EDGE_MARGIN_VAR: &str = "FAIRWHEEL_EDGE_MARGIN";
pub const REMOVE_WINNER_VAR: &str = "FAIRWHEEL_REMOVE_WINNER";
pub const HISTORY_LIMIT_VAR: &str = "FAIRWHEEL_HISTORY_LIMIT";

/// Loads `.env` (if any) and overlays `FAIRWHEEL_*` variables on the defaults.
pub fn load() -> SpinConfig {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }
    from_lookup(|name| std::env::var(name).ok())
}

/// Builds a config from any variable source. Unparsable values keep their default.
pub fn from_lookup<F>(lookup: F) -> SpinConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = SpinConfig::default();
    override_with(&lookup, DURATION_VAR, &mut config.duration_ms);
    override_with(&lookup, MIN_TURNS_VAR, &mut config.min_turns);
    override_with(&lookup, MAX_TURNS_VAR, &mut config.max_turns);
    override_with(&lookup, EDGE_MARGIN_VAR, &mut config.edge_margin);
    override_with(&lookup, REMOVE_WINNER_VAR, &mut config.remove_winner);
    override_with(&lookup, HISTORY_LIMIT_VAR, &mut config.history_limit);
    config.sanitized()
}

fn override_with<F, T>(lookup: &F, name: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(name) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => warn!("Ignoring {}={:?}: not a valid value", name, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        assert_eq!(from_lookup(lookup(&[])), SpinConfig::default());
    }

    #[test]
    fn test_variables_override_defaults() {
        let config = from_lookup(lookup(&[
            (DURATION_VAR, "2500"),
            (MIN_TURNS_VAR, "2"),
            (MAX_TURNS_VAR, " 3 "),
            (EDGE_MARGIN_VAR, "0.1"),
            (REMOVE_WINNER_VAR, "true"),
            (HISTORY_LIMIT_VAR, "10"),
        ]));
        assert_eq!(config.duration_ms, 2500.0);
        assert_eq!(config.min_turns, 2);
        assert_eq!(config.max_turns, 3);
        assert_eq!(config.edge_margin, 0.1);
        assert!(config.remove_winner);
        assert_eq!(config.history_limit, 10);
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let config = from_lookup(lookup(&[(MIN_TURNS_VAR, "lots"), (REMOVE_WINNER_VAR, "yes")]));
        assert_eq!(config.min_turns, SpinConfig::default().min_turns);
        assert!(!config.remove_winner);
    }

    #[test]
    fn test_result_is_sanitized() {
        let config = from_lookup(lookup(&[(MIN_TURNS_VAR, "9"), (MAX_TURNS_VAR, "1"), (EDGE_MARGIN_VAR, "0.9")]));
        assert_eq!(config.max_turns, 9);
        assert!(config.edge_margin <= 0.45);
    }
}
