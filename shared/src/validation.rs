use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

use crate::constants::*;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());

// Named colors, rgb()/hsl() and friends. Kept loose; the renderer has the final say.
static CSS_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[a-zA-Z]+|(?:rgb|rgba|hsl|hsla)\([0-9.,%\s/]+\))$").unwrap());

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

pub fn validate_label(label: &str) -> Result<(), ValidationError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(error_with_message("empty_label", EMPTY_LABEL_ERROR));
    }
    if trimmed.chars().count() > MAX_LABEL_CHARS {
        return Err(error_with_message("label_too_long", LABEL_TOO_LONG_ERROR));
    }
    Ok(())
}

pub fn validate_color(color: &str) -> Result<(), ValidationError> {
    let color = color.trim();
    if color.is_empty()
        || color.chars().count() > MAX_COLOR_CHARS
        || !(HEX_COLOR.is_match(color) || CSS_COLOR.is_match(color))
    {
        return Err(error_with_message("invalid_color", INVALID_COLOR_ERROR));
    }
    Ok(())
}

pub fn validate_weight(weight: u32) -> Result<(), ValidationError> {
    if weight == 0 || weight > MAX_WEIGHT {
        return Err(error_with_message("invalid_weight", INVALID_WEIGHT_ERROR));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() > MAX_NAME_CHARS {
        return Err(error_with_message("name_too_long", NAME_TOO_LONG_ERROR));
    }
    Ok(())
}
