mod autostart;
mod controller;
mod core;
mod error;
mod osx;
mod permission;
mod repl;
mod settings;
mod style;
mod types;
mod ui;
mod watcher;

#[cfg(test)]
mod test_support;

use std::io;
use std::process;
use std::sync::{mpsc, Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use eframe::egui;

use crate::autostart::LaunchAgent;
use crate::controller::{Change, ControllerOptions, ThemeController};
use crate::core::MacBridge;
use crate::error::ToggleRejected;
use crate::settings::Settings;
use crate::types::{Theme, ToggleResult};
use crate::watcher::AppearanceWatcher;

/// Toggle the macOS light/dark appearance.
#[derive(Parser)]
#[command(name = "theme-switcher", version)]
struct Cli {
    /// Skip the System Events permission probe before switching.
    #[arg(long)]
    no_preflight: bool,

    /// Seconds to wait for osascript before giving up.
    #[arg(long)]
    timeout: Option<u64>,

    /// Store the options above as the new defaults.
    #[arg(long)]
    save: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Open the window (default).
    Gui,
    /// Interactive prompt: t/s/h/q.
    Repl,
    /// Print the current theme.
    Status,
    /// Flip the theme once.
    Toggle,
    /// Switch to dark.
    Dark,
    /// Switch to light.
    Light,
    /// Probe the automation permission.
    Check,
    /// Manage launch at login.
    Autostart {
        #[arg(value_enum)]
        action: AutostartAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AutostartAction {
    On,
    Off,
    Status,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load();
    if cli.no_preflight {
        settings.preflight_permission_check = false;
    }
    if let Some(secs) = cli.timeout {
        settings.toggle_timeout_secs = secs;
    }
    if cli.save {
        settings.save().context("Save settings")?;
        log::info!("settings saved");
    }
    let options = ControllerOptions::from_settings(&settings);

    match cli.command.unwrap_or(Cmd::Gui) {
        Cmd::Gui => run_gui(options, &settings),
        Cmd::Repl => {
            let controller = ThemeController::new(Arc::new(MacBridge::headless()), options);
            let stdin = io::stdin();
            repl::run(&controller, stdin.lock(), &mut io::stdout())
        }
        Cmd::Status => {
            let controller = ThemeController::new(Arc::new(MacBridge::headless()), options);
            println!("{}", controller.current_theme());
            Ok(())
        }
        Cmd::Toggle => change_once(options, |c| c.toggle_theme_blocking()),
        Cmd::Dark => change_once(options, |c| c.change_blocking(Change::Set(Theme::Dark))),
        Cmd::Light => change_once(options, |c| c.change_blocking(Change::Set(Theme::Light))),
        Cmd::Check => {
            let controller = ThemeController::new(Arc::new(MacBridge::headless()), options);
            if controller.check_permission() {
                println!("Automation permission for System Events: granted");
                Ok(())
            } else {
                repl::write_permission_help(&mut io::stdout(), controller.permission_help())?;
                bail!("automation permission for System Events is missing")
            }
        }
        Cmd::Autostart { action } => {
            let agent = LaunchAgent::for_current_exe()?;
            match action {
                AutostartAction::On => agent.enable()?,
                AutostartAction::Off => agent.disable()?,
                AutostartAction::Status => {}
            }
            match agent.read_program()? {
                Some(program) => println!(
                    "Autostart: on ({} -> {})",
                    agent.path().display(),
                    program.display()
                ),
                None => println!("Autostart: off"),
            }
            Ok(())
        }
    }
}

fn change_once<F>(options: ControllerOptions, change: F) -> Result<()>
where
    F: FnOnce(&ThemeController<MacBridge>) -> Result<ToggleResult, ToggleRejected>,
{
    let controller = ThemeController::new(Arc::new(MacBridge::headless()), options);
    let result = change(&controller)?;
    repl::report(&mut io::stdout(), &result)?;
    result.context("Theme switch failed")?;
    println!("{}", controller.current_theme());
    Ok(())
}

fn run_gui(options: ControllerOptions, settings: &Settings) -> Result<()> {
    let bridge = Arc::new(MacBridge::gui());
    let controller = ThemeController::new(bridge.clone(), options);
    let agent = match LaunchAgent::for_current_exe() {
        Ok(agent) => Some(agent),
        Err(e) => {
            log::warn!("autostart unavailable: {e}");
            None
        }
    };

    let (tx, rx) = mpsc::channel();
    let subscription = AppearanceWatcher::start(bridge, settings.watch_interval(), tx.clone());
    log::debug!(
        "appearance watcher active: {} (notification: {})",
        subscription.is_active(),
        subscription.is_notification()
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 460.0])
            .with_min_inner_size([360.0, 380.0]),
        ..Default::default()
    };
    let result = eframe::run_native(
        "Theme Switcher",
        native_options,
        Box::new(move |_cc| Ok(Box::new(ui::ThemeSwitcherApp::new(controller, agent, tx, rx)))),
    );

    subscription.unsubscribe();
    result.map_err(|e| anyhow::anyhow!("window failed: {e}"))
}
