//! Theme detection and toggling.
//!
//! `ThemeController` is the only place that talks to the OS about the
//! appearance. It never caches the theme: every `current_theme` call asks the
//! OS, and a successful toggle only reports success, leaving the next read to
//! observe the new value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::core::{
    classify_failure, is_permission_error, set_script, Invocation, SystemBridge, PROBE_SCRIPT,
    TOGGLE_SCRIPT,
};
use crate::error::{CommandError, ToggleError, ToggleRejected};
use crate::permission::PermissionHelp;
use crate::settings::Settings;
use crate::types::{ControllerEvent, Theme, ToggleResult, ToggleState};

/// Upper bound for reading the interface-style default.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct ControllerOptions {
    pub preflight_permission_check: bool,
    pub toggle_timeout: Duration,
    pub app_name: String,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl ControllerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            preflight_permission_check: settings.preflight_permission_check,
            toggle_timeout: settings.toggle_timeout(),
            app_name: "Theme Switcher".to_string(),
        }
    }
}

/// What a toggle request asks the OS to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    /// Negate the current flag inside System Events.
    Flip,
    Set(Theme),
}

impl Change {
    fn script(self) -> String {
        match self {
            Change::Flip => TOGGLE_SCRIPT.to_string(),
            Change::Set(theme) => set_script(theme),
        }
    }
}

pub struct ThemeController<B: SystemBridge> {
    bridge: Arc<B>,
    busy: Arc<AtomicBool>,
    options: ControllerOptions,
    help: PermissionHelp,
}

impl<B: SystemBridge> Clone for ThemeController<B> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            busy: self.busy.clone(),
            options: self.options.clone(),
            help: self.help.clone(),
        }
    }
}

/// Marks a toggle as in flight; cleared on drop, including during unwinding.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag.clone()))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<B: SystemBridge> ThemeController<B> {
    pub fn new(bridge: Arc<B>, options: ControllerOptions) -> Self {
        let help = PermissionHelp::for_app(&options.app_name);
        Self {
            bridge,
            busy: Arc::new(AtomicBool::new(false)),
            options,
            help,
        }
    }

    pub fn permission_help(&self) -> &PermissionHelp {
        &self.help
    }

    pub fn state(&self) -> ToggleState {
        if self.busy.load(Ordering::Acquire) {
            ToggleState::Toggling
        } else {
            ToggleState::Idle
        }
    }

    /// Ask the OS for the current appearance. Never fails; unknown means Light.
    pub fn current_theme(&self) -> Theme {
        if let Some(name) = self.bridge.native_appearance() {
            return Theme::from_appearance_name(&name);
        }

        match self.bridge.run(&Invocation::interface_style(), READ_TIMEOUT) {
            // exit 1 means the key is unset, i.e. light
            Ok(out) if out.status == Some(0) => Theme::from_interface_style(&out.stdout),
            Ok(_) => Theme::Light,
            Err(e) => {
                log::debug!("appearance fallback failed: {e}");
                Theme::Light
            }
        }
    }

    /// Read-only probe of System Events. False only when the probe reports a
    /// missing automation grant; macOS may still deny the real toggle later.
    pub fn check_permission(&self) -> bool {
        match self.probe_permission() {
            Ok(denied) => denied.is_none(),
            Err(e) => {
                log::debug!("permission probe did not run: {e}");
                true
            }
        }
    }

    /// Diagnostic text when the probe hit a permission error.
    ///
    /// The first probe may sit behind the system consent prompt, so it gets
    /// the same deadline as the toggle itself.
    fn probe_permission(&self) -> Result<Option<String>, CommandError> {
        let out = self
            .bridge
            .run(&Invocation::osascript(PROBE_SCRIPT), self.options.toggle_timeout)?;
        if out.success() {
            return Ok(None);
        }
        let text = format!("{}{}", out.stderr, out.stdout);
        if is_permission_error(&text) {
            Ok(Some(text.trim().to_string()))
        } else {
            log::debug!("permission probe failed without a permission error: {}", text.trim());
            Ok(None)
        }
    }

    /// Flip the appearance on a worker thread. Exactly one
    /// `ControllerEvent::ToggleFinished` is sent on `events` once the command
    /// has exited. A request made while another is in flight is refused.
    pub fn toggle_theme(&self, events: mpsc::Sender<ControllerEvent>) -> Result<(), ToggleRejected> {
        self.spawn_change(Change::Flip, events)
    }

    /// Like `toggle_theme`, with an explicit target appearance.
    pub fn set_theme(&self, target: Theme, events: mpsc::Sender<ControllerEvent>) -> Result<(), ToggleRejected> {
        self.spawn_change(Change::Set(target), events)
    }

    /// Run a change on the calling thread. Still honours the busy guard.
    pub fn change_blocking(&self, change: Change) -> Result<ToggleResult, ToggleRejected> {
        let guard = self.acquire()?;
        let result = self.execute(change);
        drop(guard);
        Ok(result)
    }

    pub fn toggle_theme_blocking(&self) -> Result<ToggleResult, ToggleRejected> {
        self.change_blocking(Change::Flip)
    }

    fn acquire(&self) -> Result<BusyGuard, ToggleRejected> {
        BusyGuard::acquire(&self.busy).ok_or_else(|| {
            log::warn!("theme change rejected: another one is in flight");
            ToggleRejected::Busy
        })
    }

    fn spawn_change(&self, change: Change, events: mpsc::Sender<ControllerEvent>) -> Result<(), ToggleRejected> {
        let guard = self.acquire()?;
        let this = self.clone();
        thread::spawn(move || {
            let result = this.execute(change);
            // the guard is free before the event is observed
            drop(guard);
            let _ = events.send(ControllerEvent::ToggleFinished(result));
        });
        Ok(())
    }

    fn execute(&self, change: Change) -> ToggleResult {
        log::info!("changing appearance: {:?}", change);

        if self.options.preflight_permission_check {
            // an unanswered consent prompt or a missing osascript ends the change here
            if let Some(detail) = self.probe_permission()? {
                log::warn!("no automation permission for {}", self.help.target);
                return Err(ToggleError::PermissionDenied {
                    help: self.help.clone(),
                    detail: Some(detail),
                });
            }
        }

        let invocation = Invocation::osascript(&change.script());
        log::debug!("running {} {:?}", invocation.program, invocation.args);
        let out = self.bridge.run(&invocation, self.options.toggle_timeout)?;

        if out.success() {
            log::info!("appearance change accepted");
            Ok(())
        } else {
            let err = classify_failure(&out, &self.help);
            log::warn!("appearance change failed ({:?}): {err}", err.kind());
            Err(err)
        }
    }
}
