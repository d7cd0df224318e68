//! Interactive terminal front-end: `t` toggle, `s` status, `h` help, `q` quit.

use std::io::{BufRead, Write};
use std::sync::mpsc;

use anyhow::{Context, Result};

use crate::controller::ThemeController;
use crate::core::SystemBridge;
use crate::permission::PermissionHelp;
use crate::types::{ControllerEvent, ToggleResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Toggle,
    Status,
    Help,
    Quit,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "t" | "toggle" => Some(ReplCommand::Toggle),
            "s" | "status" => Some(ReplCommand::Status),
            "h" | "help" => Some(ReplCommand::Help),
            "q" | "quit" | "exit" => Some(ReplCommand::Quit),
            _ => None,
        }
    }
}

const COMMANDS: &str = "  t - toggle theme\n  s - show current theme\n  h - help and permission steps\n  q - quit";

/// Run until `q` or end of input.
pub fn run<B, R, W>(controller: &ThemeController<B>, input: R, out: &mut W) -> Result<()>
where
    B: SystemBridge,
    R: BufRead,
    W: Write,
{
    writeln!(out, "🎨 Theme Switcher v{}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "Commands:\n{COMMANDS}\n")?;
    writeln!(out, "Current theme: {}", controller.current_theme().label())?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line.context("Read command")?;
        if line.trim().is_empty() {
            continue;
        }

        match ReplCommand::parse(&line) {
            Some(ReplCommand::Toggle) => {
                let result = toggle_and_wait(controller)?;
                report(out, &result)?;
                if result.is_ok() {
                    writeln!(out, "Current theme: {}", controller.current_theme().label())?;
                }
            }
            Some(ReplCommand::Status) => {
                writeln!(out, "Current theme: {}", controller.current_theme().label())?;
            }
            Some(ReplCommand::Help) => {
                writeln!(out, "Commands:\n{COMMANDS}\n")?;
                writeln!(out, "If switching fails with a permission error:")?;
                write_permission_help(out, controller.permission_help())?;
            }
            Some(ReplCommand::Quit) => {
                writeln!(out, "👋 Bye!")?;
                break;
            }
            None => writeln!(out, "Unknown command. Type 'h' for help.")?,
        }
        writeln!(out)?;
    }
    Ok(())
}

/// The REPL loop is the UI-affine thread here: start the toggle and wait for
/// its completion message.
fn toggle_and_wait<B: SystemBridge>(controller: &ThemeController<B>) -> Result<ToggleResult> {
    let (tx, rx) = mpsc::channel();
    controller.toggle_theme(tx)?;
    loop {
        match rx.recv().context("Toggle worker vanished")? {
            ControllerEvent::ToggleFinished(result) => return Ok(result),
            _ => continue,
        }
    }
}

pub fn report<W: Write>(out: &mut W, result: &ToggleResult) -> Result<()> {
    match result {
        Ok(()) => writeln!(out, "✅ Theme switched.")?,
        Err(e) => match e.permission_help() {
            Some(help) => {
                writeln!(out, "❌ No permission to switch the theme.")?;
                if let Some(detail) = e.detail() {
                    writeln!(out, "   {detail}")?;
                }
                write_permission_help(out, help)?;
            }
            None => writeln!(out, "❌ Theme switch failed: {e}")?,
        },
    }
    Ok(())
}

pub fn write_permission_help<W: Write>(out: &mut W, help: &PermissionHelp) -> Result<()> {
    writeln!(out, "🔧 To fix:")?;
    for (i, step) in help.steps().iter().enumerate() {
        writeln!(out, "   {}. {}", i + 1, step)?;
    }
    Ok(())
}
