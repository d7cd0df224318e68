//! Background work started by the window: theme toggles and permission probes.
//! Results come back as `ControllerEvent`s on the state's channel.

use std::thread;

use crate::controller::ThemeController;
use crate::core::SystemBridge;
use crate::types::{ControllerEvent, Theme};

use super::GuiState;

/// Ask the controller to toggle; a refused request is logged to the status line.
pub fn spawn_toggle<B: SystemBridge>(controller: &ThemeController<B>, state: &mut GuiState) {
    match controller.toggle_theme(state.events_tx.clone()) {
        Ok(()) => {
            state.toggling = true;
            state.push_status("Switching theme...");
        }
        Err(e) => state.push_status(format!("Ignored: {e}")),
    }
}

/// Ask the controller for an explicit appearance.
pub fn spawn_set_theme<B: SystemBridge>(controller: &ThemeController<B>, state: &mut GuiState, target: Theme) {
    match controller.set_theme(target, state.events_tx.clone()) {
        Ok(()) => {
            state.toggling = true;
            state.push_status(format!("Switching to {target}..."));
        }
        Err(e) => state.push_status(format!("Ignored: {e}")),
    }
}

/// Run the permission probe off the UI thread; it may sit behind a system prompt.
pub fn spawn_permission_check<B: SystemBridge>(controller: &ThemeController<B>, state: &mut GuiState) {
    if state.checking_permission {
        return;
    }
    state.checking_permission = true;
    let tx = state.events_tx.clone();
    let controller = controller.clone();
    thread::spawn(move || {
        let granted = controller.check_permission();
        let _ = tx.send(ControllerEvent::PermissionChecked(granted));
    });
}
