use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{CommandError, ToggleError};
use crate::permission::PermissionHelp;
use crate::types::Theme;

// Process plumbing: the system bridge seam, out-of-process command execution
// with a deadline, and classification of scripting failures.

pub const OSASCRIPT: &str = "/usr/bin/osascript";
pub const DEFAULTS: &str = "/usr/bin/defaults";

/// Read-only query used to find out whether automation is permitted.
pub const PROBE_SCRIPT: &str =
    "tell application \"System Events\" to get dark mode of appearance preferences";

/// Flips the flag inside System Events, so the read-modify-write happens there.
pub const TOGGLE_SCRIPT: &str =
    "tell application \"System Events\" to tell appearance preferences to set dark mode to not dark mode";

/// Fragments osascript prints when Apple Events are not allowed.
const PERMISSION_MARKERS: &[&str] = &[
    "not authorized",
    "Not authorized",
    "not authorised",
    "Not authorised",
    "(-1743)",
    "(-10004)",
];

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Script that sets an explicit appearance.
pub fn set_script(target: Theme) -> String {
    format!(
        "tell application \"System Events\" to tell appearance preferences to set dark mode to {}",
        target.is_dark()
    )
}

/// One external command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn osascript(script: &str) -> Self {
        Self::new(OSASCRIPT, &["-e", script])
    }

    pub fn interface_style() -> Self {
        Self::new(DEFAULTS, &["read", "-g", "AppleInterfaceStyle"])
    }

    /// The script passed with `-e`, if this is an osascript call.
    #[cfg(test)]
    pub fn script(&self) -> Option<&str> {
        if self.program != OSASCRIPT {
            return None;
        }
        self.args
            .iter()
            .position(|a| a == "-e")
            .and_then(|i| self.args.get(i + 1))
            .map(|s| s.as_str())
    }

    /// True when running this would change the system appearance.
    #[cfg(test)]
    pub fn mutates_appearance(&self) -> bool {
        self.script().is_some_and(|s| s.contains("set dark mode"))
    }
}

/// Captured result of a finished command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// None when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0) && self.stderr.trim().is_empty()
    }
}

/// Everything the controller needs from the host OS.
pub trait SystemBridge: Send + Sync + 'static {
    /// NSAppearance name of the running application, when a GUI context exists.
    fn native_appearance(&self) -> Option<String>;

    /// Run a command to completion or until `timeout` passes.
    fn run(&self, invocation: &Invocation, timeout: Duration) -> Result<CommandOutput, CommandError>;
}

/// The real bridge: AppKit for reads inside the window, child processes otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacBridge {
    gui_attached: bool,
}

impl MacBridge {
    /// Bridge for a process that owns an NSApplication.
    pub fn gui() -> Self {
        Self { gui_attached: true }
    }

    /// Bridge for CLI and REPL use; never touches AppKit.
    pub fn headless() -> Self {
        Self { gui_attached: false }
    }
}

impl SystemBridge for MacBridge {
    fn native_appearance(&self) -> Option<String> {
        if !self.gui_attached {
            return None;
        }
        crate::osx::effective_appearance_name()
    }

    fn run(&self, invocation: &Invocation, timeout: Duration) -> Result<CommandOutput, CommandError> {
        run_with_timeout(invocation, timeout)
    }
}

/// Spawn `invocation`, capture its output and kill it if it outlives `timeout`.
pub fn run_with_timeout(invocation: &Invocation, timeout: Duration) -> Result<CommandOutput, CommandError> {
    let launch_err = |source| CommandError::Launch {
        program: invocation.program.clone(),
        source,
    };

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(launch_err)?;

    // pipes are drained concurrently with the wait
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                reap(&mut child);
                log::warn!("{} killed after {:?}", invocation.program, timeout);
                return Err(CommandError::TimedOut {
                    program: invocation.program.clone(),
                    after: timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                reap(&mut child);
                return Err(launch_err(source));
            }
        }
    };

    let collect = |h: Option<thread::JoinHandle<String>>| h.and_then(|h| h.join().ok()).unwrap_or_default();
    Ok(CommandOutput {
        status: status.code(),
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

/// Kill a child we are giving up on and collect its exit status.
fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::debug!("kill {}: {e}", child.id());
    }
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Does this scripting host output describe a missing automation grant?
pub fn is_permission_error(text: &str) -> bool {
    PERMISSION_MARKERS.iter().any(|m| text.contains(m))
}

/// Turn a failed osascript run into a toggle error.
pub fn classify_failure(output: &CommandOutput, help: &PermissionHelp) -> ToggleError {
    let detail = if output.stderr.trim().is_empty() {
        output.stdout.trim().to_string()
    } else {
        output.stderr.trim().to_string()
    };

    if is_permission_error(&output.stderr) || is_permission_error(&output.stdout) {
        return ToggleError::PermissionDenied {
            help: help.clone(),
            detail: Some(detail),
        };
    }

    match output.status {
        Some(_) => ToggleError::ScriptExecutionFailed {
            status: output.status,
            detail,
        },
        None if detail.is_empty() => {
            ToggleError::Unclassified("scripting host terminated by a signal".to_string())
        }
        None => ToggleError::Unclassified(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(status: Option<i32>, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            status,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn success_requires_zero_exit_and_no_error_payload() {
        assert!(output(Some(0), "true\n", "").success());
        assert!(!output(Some(0), "", "execution error").success());
        assert!(!output(Some(1), "", "").success());
        assert!(!output(None, "", "").success());
    }

    #[test]
    fn not_authorized_is_permission_denied() {
        let help = PermissionHelp::default();
        let out = output(
            Some(1),
            "",
            "execution error: Not authorized to send Apple events to System Events. (-1743)\n",
        );
        let err = classify_failure(&out, &help);
        assert_eq!(err.permission_help(), Some(&help));
        assert_eq!(
            err.detail(),
            Some("execution error: Not authorized to send Apple events to System Events. (-1743)")
        );
    }

    #[test]
    fn other_script_errors_keep_their_text() {
        let err = classify_failure(&output(Some(1), "", "syntax error\n"), &PermissionHelp::default());
        assert_eq!(
            err,
            ToggleError::ScriptExecutionFailed {
                status: Some(1),
                detail: "syntax error".into()
            }
        );
    }

    #[test]
    fn signal_without_text_is_unclassified() {
        let err = classify_failure(&output(None, "", ""), &PermissionHelp::default());
        assert!(matches!(err, ToggleError::Unclassified(_)));
    }

    #[test]
    fn invocation_reports_its_script() {
        let toggle = Invocation::osascript(TOGGLE_SCRIPT);
        assert_eq!(toggle.script(), Some(TOGGLE_SCRIPT));
        assert!(toggle.mutates_appearance());
        assert!(!Invocation::osascript(PROBE_SCRIPT).mutates_appearance());
        assert!(!Invocation::interface_style().mutates_appearance());
        assert!(Invocation::interface_style().script().is_none());
    }

    #[test]
    fn set_script_uses_literal_booleans() {
        assert!(set_script(Theme::Dark).ends_with("set dark mode to true"));
        assert!(set_script(Theme::Light).ends_with("set dark mode to false"));
    }

    #[test]
    fn missing_program_is_launch_error() {
        let inv = Invocation::new("/nonexistent/theme-switcher-test-binary", &[]);
        let err = run_with_timeout(&inv, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CommandError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn captures_status_and_streams() {
        let inv = Invocation::new("/bin/sh", &["-c", "echo out; echo err >&2; exit 3"]);
        let out = run_with_timeout(&inv, Duration::from_secs(5)).unwrap();
        assert_eq!(out.status, Some(3));
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
    }

    #[cfg(unix)]
    #[test]
    fn hung_command_times_out() {
        let inv = Invocation::new("/bin/sh", &["-c", "sleep 5"]);
        let started = Instant::now();
        let err = run_with_timeout(&inv, Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn abandoned_child_is_killed_and_reaped() {
        let mut child = Command::new("/bin/sh").args(["-c", "sleep 5"]).spawn().unwrap();
        let started = Instant::now();
        reap(&mut child);
        assert!(started.elapsed() < Duration::from_secs(4));
        // already collected: nothing left running
        assert!(child.try_wait().unwrap().is_some());
    }
}
