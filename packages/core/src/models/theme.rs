//! Color theme preference.

use serde::{Deserialize, Serialize};

/// User-selected color theme. Persisted alongside the notes in the
/// key-value store; unknown stored values fall back to [`Theme::Light`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parse a stored theme string, defaulting on anything unknown.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_values_fall_back_to_light() {
        assert_eq!(Theme::from_stored("dark"), Theme::Dark);
        assert_eq!(Theme::from_stored("light"), Theme::Light);
        assert_eq!(Theme::from_stored("solarized"), Theme::Light);
        assert_eq!(Theme::from_stored(""), Theme::Light);
    }

    #[test]
    fn round_trips_through_string_form() {
        for theme in [Theme::Light, Theme::Dark] {
            assert_eq!(Theme::from_stored(theme.as_str()), theme);
        }
    }
}
