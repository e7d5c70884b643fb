//! crates/reading_list_core/src/tags.rs
//!
//! Rules for user-owned tags: name normalization and the badge color palette.

use rand::seq::SliceRandom;
use regex::Regex;
use std::sync::OnceLock;

use crate::validation::{strip_html, ValidationError};

pub const MAX_TAG_NAME_LEN: usize = 32;

/// A badge color a tag can be displayed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagColor {
    pub name: &'static str,
    pub color: &'static str,
    pub contrast_color: &'static str,
}

const fn badge(name: &'static str, color: &'static str, contrast_color: &'static str) -> TagColor {
    TagColor {
        name,
        color,
        contrast_color,
    }
}

pub const TAG_COLORS: &[TagColor] = &[
    badge("dark-purple", "#413344", "#bdbbbd"),
    badge("eggplant", "#614c65", "#bebabf"),
    badge("mountbatten-pink", "#806485", "#f6e3f9"),
    badge("plum", "#936397", "#ffebff"),
    badge("purpureus", "#a662a8", "#fff4ff"),
    badge("eminence", "#664972", "#c1b9c4"),
    badge("english-violet", "#463c57", "#bdbbc0"),
    badge("air-force-blue", "#6e8da9", "#ffffff"),
    badge("light-sky-blue", "#91bcdd", "#445a6b"),
    badge("lapis", "#567d99", "#f1ffff"),
    badge("indigo-dye", "#395e77", "#adbfce"),
    badge("midnight-green", "#305662", "#b7bcbe"),
    badge("dark-slate-gray", "#264d4d", "#b8bdbc"),
    badge("hunter-green", "#315c45", "#b4beb8"),
    badge("sage", "#8a9a65", "#ffffff"),
    badge("citron", "#b6b975", "#57592c"),
    badge("redwood", "#b65d54", "#ffebdf"),
    badge("crimson", "#b60033", "#e1afb7"),
    badge("claret", "#98062d", "#d8b2b8"),
    badge("burgundy", "#800022", "#d3b4b9"),
];

pub fn find_color(name: &str) -> Option<&'static TagColor> {
    TAG_COLORS.iter().find(|c| c.name == name)
}

/// Checks `name` against the palette and returns its canonical palette name.
pub fn validate_color(name: &str) -> Result<&'static str, ValidationError> {
    find_color(name)
        .map(|c| c.name)
        .ok_or_else(|| ValidationError::UnknownColor(name.to_string()))
}

/// Picks a palette color for a freshly created tag.
pub fn random_color() -> &'static str {
    TAG_COLORS
        .choose(&mut rand::thread_rng())
        .map(|c| c.name)
        .unwrap_or(TAG_COLORS[0].name)
}

fn tag_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9\s\-]+$").expect("static regex is valid"))
}

/// Sanitizes and validates a tag name, returning the stored (lowercase) form.
pub fn normalize_tag_name(raw: &str) -> Result<String, ValidationError> {
    let cleaned = strip_html(raw);
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().count() > MAX_TAG_NAME_LEN {
        return Err(ValidationError::InvalidTagName(
            "Tag name must be between 1 and 32 characters",
        ));
    }
    if !tag_name_pattern().is_match(cleaned) {
        return Err(ValidationError::InvalidTagName(
            "Tag names can only contain letters, numbers, spaces, and hyphens",
        ));
    }
    Ok(cleaned.to_lowercase())
}
