//! Scriptable stand-in for the OS, shared by unit tests.

use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

use crate::core::{CommandOutput, Invocation, SystemBridge, DEFAULTS, PROBE_SCRIPT};
use crate::error::CommandError;
use crate::types::Theme;

#[derive(Clone, Debug)]
pub enum StubReply {
    /// Behave like the real command against the simulated OS state.
    Simulate,
    Output {
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },
    LaunchFails,
    TimesOut,
}

impl StubReply {
    pub fn not_authorized() -> Self {
        StubReply::Output {
            status: Some(1),
            stdout: String::new(),
            stderr: "execution error: Not authorized to send Apple events to System Events. (-1743)".into(),
        }
    }
}

struct StubState {
    theme: Theme,
    gui: bool,
    interface: StubReply,
    probe: StubReply,
    mutation: StubReply,
    hold: Option<mpsc::Receiver<()>>,
    calls: Vec<Invocation>,
    native_reads: usize,
}

pub struct StubBridge {
    state: Mutex<StubState>,
}

impl StubBridge {
    fn with(theme: Theme, gui: bool) -> Self {
        Self {
            state: Mutex::new(StubState {
                theme,
                gui,
                interface: StubReply::Simulate,
                probe: StubReply::Simulate,
                mutation: StubReply::Simulate,
                hold: None,
                calls: Vec::new(),
                native_reads: 0,
            }),
        }
    }

    pub fn gui(theme: Theme) -> Self {
        Self::with(theme, true)
    }

    pub fn headless(theme: Theme) -> Self {
        Self::with(theme, false)
    }

    /// Change the simulated OS appearance, as System Settings would.
    pub fn set_theme(&self, theme: Theme) {
        self.state.lock().unwrap().theme = theme;
    }

    pub fn theme(&self) -> Theme {
        self.state.lock().unwrap().theme
    }

    pub fn set_interface_reply(&self, reply: StubReply) {
        self.state.lock().unwrap().interface = reply;
    }

    pub fn set_probe_reply(&self, reply: StubReply) {
        self.state.lock().unwrap().probe = reply;
    }

    pub fn set_mutation_reply(&self, reply: StubReply) {
        self.state.lock().unwrap().mutation = reply;
    }

    /// Block the next mutating command until a value is sent (or the sender dropped).
    pub fn hold_mutations(&self) -> mpsc::Sender<()> {
        let (tx, rx) = mpsc::channel();
        self.state.lock().unwrap().hold = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls().iter().filter(|c| c.mutates_appearance()).count()
    }

    pub fn probe_count(&self) -> usize {
        self.calls().iter().filter(|c| c.script() == Some(PROBE_SCRIPT)).count()
    }

    pub fn interface_reads(&self) -> usize {
        self.calls().iter().filter(|c| c.program == DEFAULTS).count()
    }

    pub fn native_reads(&self) -> usize {
        self.state.lock().unwrap().native_reads
    }
}

fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        status: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn reply(
    reply: StubReply,
    invocation: &Invocation,
    timeout: Duration,
    simulate: impl FnOnce() -> CommandOutput,
) -> Result<CommandOutput, CommandError> {
    match reply {
        StubReply::Simulate => Ok(simulate()),
        StubReply::Output { status, stdout, stderr } => Ok(CommandOutput { status, stdout, stderr }),
        StubReply::LaunchFails => Err(CommandError::Launch {
            program: invocation.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        }),
        StubReply::TimesOut => Err(CommandError::TimedOut {
            program: invocation.program.clone(),
            after: timeout,
        }),
    }
}

impl SystemBridge for StubBridge {
    fn native_appearance(&self) -> Option<String> {
        let mut s = self.state.lock().unwrap();
        if !s.gui {
            return None;
        }
        s.native_reads += 1;
        Some(match s.theme {
            Theme::Dark => "NSAppearanceNameDarkAqua".to_string(),
            Theme::Light => "NSAppearanceNameAqua".to_string(),
        })
    }

    fn run(&self, invocation: &Invocation, timeout: Duration) -> Result<CommandOutput, CommandError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(invocation.clone());
        if invocation.mutates_appearance() {
            if let Some(rx) = s.hold.take() {
                drop(s);
                let _ = rx.recv();
                s = self.state.lock().unwrap();
            }
        }

        if invocation.program == DEFAULTS {
            let theme = s.theme;
            return reply(s.interface.clone(), invocation, timeout, || match theme {
                Theme::Dark => ok("Dark\n"),
                Theme::Light => CommandOutput {
                    status: Some(1),
                    stdout: String::new(),
                    stderr: "The domain/default pair of (kCFPreferencesAnyApplication, AppleInterfaceStyle) does not exist\n".into(),
                },
            });
        }

        if invocation.script() == Some(PROBE_SCRIPT) {
            let theme = s.theme;
            return reply(s.probe.clone(), invocation, timeout, || ok(&format!("{}\n", theme.is_dark())));
        }

        if invocation.mutates_appearance() {
            let script = invocation.script().unwrap_or_default().to_string();
            let out = reply(s.mutation.clone(), invocation, timeout, || ok(""))?;
            if out.success() {
                s.theme = if script.ends_with("not dark mode") {
                    match s.theme {
                        Theme::Light => Theme::Dark,
                        Theme::Dark => Theme::Light,
                    }
                } else if script.ends_with("true") {
                    Theme::Dark
                } else {
                    Theme::Light
                };
            }
            return Ok(out);
        }

        Ok(CommandOutput {
            status: Some(1),
            stdout: String::new(),
            stderr: format!("unexpected command {:?}", invocation),
        })
    }
}
