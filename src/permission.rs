//! Structured help for granting the automation permission.
//!
//! The controller hands this to presentation code as data; the window and the
//! REPL each render it their own way.

use std::fmt;

/// Privacy & Security pane the user has to visit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrivacyCategory {
    Automation,
}

impl PrivacyCategory {
    /// `x-apple.systempreferences` anchor for the pane.
    pub fn settings_anchor(self) -> &'static str {
        match self {
            PrivacyCategory::Automation => "Privacy_Automation",
        }
    }

    /// TCC service name understood by `tccutil reset`.
    pub fn tcc_service(self) -> &'static str {
        match self {
            PrivacyCategory::Automation => "AppleEvents",
        }
    }
}

impl fmt::Display for PrivacyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivacyCategory::Automation => write!(f, "Automation"),
        }
    }
}

/// Application the permission must be granted for.
pub const AUTOMATION_TARGET: &str = "System Events";

/// Bundle identifier used in the reset command.
pub const BUNDLE_ID: &str = "day.nhanh.themeswitcher";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionHelp {
    pub category: PrivacyCategory,
    /// Application being scripted.
    pub target: String,
    /// Application that needs the grant (this program).
    pub requesting_app: String,
    pub settings_url: String,
    /// Shell command that clears the grant so macOS prompts again.
    pub reset_command: String,
}

impl PermissionHelp {
    pub fn for_app(requesting_app: &str) -> Self {
        let category = PrivacyCategory::Automation;
        Self {
            category,
            target: AUTOMATION_TARGET.to_string(),
            requesting_app: requesting_app.to_string(),
            settings_url: format!(
                "x-apple.systempreferences:com.apple.preference.security?{}",
                category.settings_anchor()
            ),
            reset_command: format!("tccutil reset {} {}", category.tcc_service(), BUNDLE_ID),
        }
    }

    /// Ordered remediation steps.
    pub fn steps(&self) -> Vec<String> {
        vec![
            "Open System Settings".to_string(),
            format!("Go to Privacy & Security → {}", self.category),
            format!(
                "Find {} and allow access to \"{}\"",
                self.requesting_app, self.target
            ),
            format!("Or run in Terminal: {}", self.reset_command),
            format!("Then restart {}", self.requesting_app),
        ]
    }
}

impl Default for PermissionHelp {
    fn default() -> Self {
        Self::for_app("Theme Switcher")
    }
}
