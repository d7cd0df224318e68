//! Egui-based window for the Theme Switcher.
//!
//! This module defines the presentation state, the eframe App implementation,
//! and wires UI actions to the controller through ui::tasks. Background work
//! reports back over an mpsc channel that `update` drains every frame, so all
//! state changes happen on the UI thread.

use std::sync::mpsc;
use std::time::Duration;

use eframe::{egui, App};

use crate::autostart::LaunchAgent;
use crate::controller::ThemeController;
use crate::core::{MacBridge, SystemBridge};
use crate::permission::PermissionHelp;
use crate::style::set_appkit_style;
use crate::types::{ControllerEvent, Theme, ToggleState};

/// How many status lines are kept.
const STATUS_HISTORY: usize = 50;

/// Presentation state. Owned by the UI thread; workers only send events.
pub struct GuiState {
    /// Last theme read from the OS. Refreshed, never set optimistically.
    pub theme: Theme,
    pub toggling: bool,
    pub checking_permission: bool,
    pub autostart_enabled: bool,

    /// Permission help panel currently on screen.
    pub permission_help: Option<PermissionHelp>,
    help_shown: bool,

    pub events_tx: mpsc::Sender<ControllerEvent>,
    pub events_rx: mpsc::Receiver<ControllerEvent>,

    // status log
    pub status_msgs: Vec<String>,
}

impl GuiState {
    pub fn new(
        theme: Theme,
        events_tx: mpsc::Sender<ControllerEvent>,
        events_rx: mpsc::Receiver<ControllerEvent>,
    ) -> Self {
        Self {
            theme,
            toggling: false,
            checking_permission: false,
            autostart_enabled: false,
            permission_help: None,
            help_shown: false,
            events_tx,
            events_rx,
            status_msgs: Vec::new(),
        }
    }

    pub fn push_status(&mut self, msg: impl Into<String>) {
        self.status_msgs.push(msg.into());
        if self.status_msgs.len() > STATUS_HISTORY {
            let excess = self.status_msgs.len() - STATUS_HISTORY;
            self.status_msgs.drain(..excess);
        }
    }

    /// Drain pending events without blocking.
    pub fn pump<B: SystemBridge>(&mut self, controller: &ThemeController<B>) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event, controller);
        }
    }

    pub fn apply_event<B: SystemBridge>(&mut self, event: ControllerEvent, controller: &ThemeController<B>) {
        match event {
            ControllerEvent::ToggleFinished(Ok(())) => {
                self.toggling = false;
                self.theme = controller.current_theme();
                self.push_status(format!("Theme switched ({})", self.theme));
            }
            ControllerEvent::ToggleFinished(Err(err)) => {
                self.toggling = false;
                self.push_status(format!("Error: {err}"));
                if let Some(help) = err.permission_help() {
                    self.show_permission_help(help.clone());
                }
            }
            ControllerEvent::AppearanceChanged => {
                self.theme = controller.current_theme();
                self.push_status(format!("System appearance is now {}", self.theme));
            }
            ControllerEvent::PermissionChecked(granted) => {
                self.checking_permission = false;
                if granted {
                    self.push_status("Automation permission looks fine");
                } else {
                    self.push_status("Automation permission missing");
                    self.show_permission_help(controller.permission_help().clone());
                }
            }
        }
    }

    /// The explanatory panel opens at most once per session.
    fn show_permission_help(&mut self, help: PermissionHelp) {
        if !self.help_shown {
            self.help_shown = true;
            self.permission_help = Some(help);
        }
    }

    /// Explicit request from the user; not subject to the once-per-session rule.
    pub fn open_permission_help(&mut self, help: PermissionHelp) {
        self.help_shown = true;
        self.permission_help = Some(help);
    }

    pub fn dismiss_permission_help(&mut self) {
        self.permission_help = None;
    }
}

/// Main eframe application that renders and controls the window.
pub struct ThemeSwitcherApp {
    pub state: GuiState,
    pub controller: ThemeController<MacBridge>,
    pub agent: Option<LaunchAgent>,
}

impl ThemeSwitcherApp {
    pub fn new(
        controller: ThemeController<MacBridge>,
        agent: Option<LaunchAgent>,
        events_tx: mpsc::Sender<ControllerEvent>,
        events_rx: mpsc::Receiver<ControllerEvent>,
    ) -> Self {
        let mut state = GuiState::new(controller.current_theme(), events_tx, events_rx);
        state.autostart_enabled = agent.as_ref().is_some_and(|a| a.is_enabled());
        Self {
            state,
            controller,
            agent,
        }
    }
}

impl App for ThemeSwitcherApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.pump(&self.controller);

        set_appkit_style(ctx, self.state.theme);

        panels::top::show(ctx, &self.state);
        panels::bottom::show(ctx, &self.state);
        panels::central::show(ctx, self);

        // poll the event channel; faster while a toggle is in flight
        let poll = match self.controller.state() {
            ToggleState::Toggling => Duration::from_millis(50),
            ToggleState::Idle => Duration::from_millis(250),
        };
        ctx.request_repaint_after(poll);
    }
}

pub mod icon;
pub mod panels;
pub mod tasks;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerOptions;
    use crate::test_support::{StubBridge, StubReply};
    use std::sync::Arc;

    fn setup(theme: Theme) -> (Arc<StubBridge>, ThemeController<StubBridge>, GuiState) {
        let bridge = Arc::new(StubBridge::gui(theme));
        let controller = ThemeController::new(bridge.clone(), ControllerOptions::default());
        let (tx, rx) = mpsc::channel();
        let state = GuiState::new(controller.current_theme(), tx, rx);
        (bridge, controller, state)
    }

    #[test]
    fn notification_triggers_exactly_one_fresh_read() {
        let (bridge, controller, mut state) = setup(Theme::Light);
        // OS changed behind our back; displayed value is stale
        bridge.set_theme(Theme::Dark);
        assert_eq!(state.theme, Theme::Light);
        let reads = bridge.native_reads();

        state.events_tx.send(ControllerEvent::AppearanceChanged).unwrap();
        state.pump(&controller);

        assert_eq!(bridge.native_reads(), reads + 1);
        assert_eq!(state.theme, Theme::Dark);
    }

    #[test]
    fn successful_toggle_rederives_from_os() {
        let (bridge, controller, mut state) = setup(Theme::Light);
        tasks::spawn_toggle(&controller, &mut state);
        assert!(state.toggling);

        let event = state.events_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        state.apply_event(event, &controller);
        assert!(!state.toggling);
        assert_eq!(state.theme, Theme::Dark);
        assert_eq!(bridge.theme(), Theme::Dark);
    }

    #[test]
    fn failed_toggle_keeps_displayed_theme() {
        let (bridge, controller, mut state) = setup(Theme::Light);
        bridge.set_mutation_reply(StubReply::Output {
            status: Some(1),
            stdout: String::new(),
            stderr: "boom".into(),
        });
        tasks::spawn_toggle(&controller, &mut state);
        let event = state.events_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        state.apply_event(event, &controller);
        assert_eq!(state.theme, Theme::Light);
        assert!(state.permission_help.is_none());
        assert!(state.status_msgs.last().unwrap().contains("boom"));
    }

    #[test]
    fn permission_help_is_shown_once() {
        let (bridge, controller, mut state) = setup(Theme::Light);
        bridge.set_probe_reply(StubReply::not_authorized());

        for _ in 0..2 {
            tasks::spawn_toggle(&controller, &mut state);
            let event = state.events_rx.recv_timeout(Duration::from_secs(5)).unwrap();
            state.apply_event(event, &controller);
            if state.permission_help.is_some() {
                state.dismiss_permission_help();
            } else {
                break;
            }
        }
        assert!(state.permission_help.is_none());
        assert_eq!(bridge.mutation_count(), 0);
        assert_eq!(
            state.status_msgs.iter().filter(|m| m.starts_with("Error")).count(),
            2
        );
    }

    #[test]
    fn help_can_be_reopened_after_dismiss() {
        let (bridge, controller, mut state) = setup(Theme::Light);
        bridge.set_probe_reply(StubReply::not_authorized());
        tasks::spawn_toggle(&controller, &mut state);
        let event = state.events_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        state.apply_event(event, &controller);
        state.dismiss_permission_help();
        assert!(state.permission_help.is_none());

        state.open_permission_help(controller.permission_help().clone());
        assert_eq!(state.permission_help.as_ref(), Some(controller.permission_help()));
    }

    #[test]
    fn help_is_available_without_any_failure() {
        let (bridge, controller, mut state) = setup(Theme::Light);
        state.open_permission_help(controller.permission_help().clone());
        assert!(state.permission_help.is_some());
        assert_eq!(bridge.probe_count(), 0);
    }

    #[test]
    fn busy_toggle_is_reported_not_queued() {
        let (bridge, controller, mut state) = setup(Theme::Light);
        let release = bridge.hold_mutations();
        tasks::spawn_toggle(&controller, &mut state);
        tasks::spawn_toggle(&controller, &mut state);
        assert!(state.status_msgs.last().unwrap().contains("already in progress"));

        release.send(()).unwrap();
        let event = state.events_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        state.apply_event(event, &controller);
        assert_eq!(bridge.mutation_count(), 1);
        assert!(!state.toggling);
    }

    #[test]
    fn status_history_is_bounded() {
        let (_bridge, _controller, mut state) = setup(Theme::Light);
        for i in 0..(STATUS_HISTORY + 10) {
            state.push_status(format!("msg {i}"));
        }
        assert_eq!(state.status_msgs.len(), STATUS_HISTORY);
        assert_eq!(state.status_msgs[0], "msg 10");
    }
}
