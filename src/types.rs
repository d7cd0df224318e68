//! Core data types shared across the application.

use std::fmt;

use crate::error::ToggleError;

/// Appearance names reported by NSAppearance that count as dark.
const DARK_APPEARANCE_NAMES: &[&str] = &[
    "NSAppearanceNameDarkAqua",
    "NSAppearanceNameVibrantDark",
    "NSAppearanceNameAccessibilityHighContrastDarkAqua",
    "NSAppearanceNameAccessibilityHighContrastVibrantDark",
];

/// OS-wide light/dark appearance. Always derived from the OS, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Map an NSAppearance name to a theme. Unknown names are Light.
    pub fn from_appearance_name(name: &str) -> Self {
        if DARK_APPEARANCE_NAMES.contains(&name) {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    /// Parse `defaults read -g AppleInterfaceStyle` output.
    /// Only the exact (trimmed) string "Dark" means dark.
    pub fn from_interface_style(output: &str) -> Self {
        if output.trim() == "Dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, Theme::Dark)
    }

    /// Label with a glyph, used by the window and the REPL.
    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "☀ Light",
            Theme::Dark => "🌙 Dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// Outcome of one toggle attempt.
pub type ToggleResult = Result<(), ToggleError>;

/// Whether a toggle is currently running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleState {
    Idle,
    Toggling,
}

/// Message sent from background work to the UI-affine loop.
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
    /// Exactly one per accepted toggle request, sent after the command exited.
    ToggleFinished(ToggleResult),
    /// The OS appearance may have changed. Carries no value; re-query.
    AppearanceChanged,
    /// Result of a permission probe run off the UI thread.
    PermissionChecked(bool),
}
