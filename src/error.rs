//! Error types for theme detection, toggling and autostart.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::permission::PermissionHelp;

/// Failure of a single external command, before classification.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} did not finish within {after:?}")]
    TimedOut { program: String, after: Duration },
}

/// Coarse failure classification, for callers that only need to branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    PermissionDenied,
    ScriptExecutionFailed,
    ProcessLaunchFailed,
    TimedOut,
    Unclassified,
}

/// Why a toggle failed. Never fatal; surfaced to the caller as data.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ToggleError {
    #[error("no automation permission for {}", .help.target)]
    PermissionDenied {
        help: PermissionHelp,
        /// Raw diagnostic from the scripting host, when the failure came from it.
        detail: Option<String>,
    },
    #[error("script failed{}: {detail}", .status.map(|s| format!(" (exit {s})")).unwrap_or_default())]
    ScriptExecutionFailed { status: Option<i32>, detail: String },
    #[error("could not launch {program}: {detail}")]
    ProcessLaunchFailed { program: String, detail: String },
    #[error("timed out after {after:?}")]
    TimedOut { after: Duration },
    #[error("{0}")]
    Unclassified(String),
}

impl ToggleError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ToggleError::PermissionDenied { .. } => FailureKind::PermissionDenied,
            ToggleError::ScriptExecutionFailed { .. } => FailureKind::ScriptExecutionFailed,
            ToggleError::ProcessLaunchFailed { .. } => FailureKind::ProcessLaunchFailed,
            ToggleError::TimedOut { .. } => FailureKind::TimedOut,
            ToggleError::Unclassified(_) => FailureKind::Unclassified,
        }
    }

    /// Diagnostic text captured from the failing command, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ToggleError::PermissionDenied { detail, .. } => detail.as_deref(),
            ToggleError::ScriptExecutionFailed { detail, .. } => Some(detail),
            ToggleError::ProcessLaunchFailed { detail, .. } => Some(detail),
            ToggleError::TimedOut { .. } => None,
            ToggleError::Unclassified(detail) => Some(detail),
        }
    }

    pub fn permission_help(&self) -> Option<&PermissionHelp> {
        match self {
            ToggleError::PermissionDenied { help, .. } => Some(help),
            _ => None,
        }
    }
}

impl From<CommandError> for ToggleError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Launch { program, source } => ToggleError::ProcessLaunchFailed {
                program,
                detail: source.to_string(),
            },
            CommandError::TimedOut { after, .. } => ToggleError::TimedOut { after },
        }
    }
}

/// A toggle request refused before any work started.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ToggleRejected {
    #[error("a theme change is already in progress")]
    Busy,
}

#[derive(Debug, Error)]
pub enum AutostartError {
    #[error("home directory not found")]
    NoHome,
    #[error("launch agent program must be an absolute path, got {:?}", .program)]
    InvalidProgram { program: PathBuf },
    #[error("cannot locate the running executable: {source}")]
    CurrentExe {
        #[source]
        source: std::io::Error,
    },
    #[error("cannot create {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write launch agent {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: plist::Error,
    },
    #[error("cannot read launch agent {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: plist::Error,
    },
    #[error("cannot remove launch agent {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
