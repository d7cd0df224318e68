//! Login autostart through a per-user LaunchAgent plist.

use std::fs;
use std::path::{Path, PathBuf};

use home::home_dir;
use plist::{Dictionary, Value};

use crate::error::AutostartError;

pub const LABEL: &str = "day.nhanh.themeswitcher";

/// The LaunchAgent file that starts the program at login.
#[derive(Clone, Debug)]
pub struct LaunchAgent {
    dir: PathBuf,
    label: String,
    program: PathBuf,
}

impl LaunchAgent {
    /// Agent in `~/Library/LaunchAgents` pointing at the running executable.
    pub fn for_current_exe() -> Result<Self, AutostartError> {
        let home = home_dir().ok_or(AutostartError::NoHome)?;
        let program = std::env::current_exe().map_err(|source| AutostartError::CurrentExe { source })?;
        Ok(Self::new(home.join("Library").join("LaunchAgents"), LABEL, program))
    }

    pub fn new(dir: impl Into<PathBuf>, label: &str, program: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            label: label.to_string(),
            program: program.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.plist", self.label))
    }

    pub fn is_enabled(&self) -> bool {
        self.path().exists()
    }

    pub fn enable(&self) -> Result<(), AutostartError> {
        if !self.program.is_absolute() {
            return Err(AutostartError::InvalidProgram {
                program: self.program.clone(),
            });
        }
        fs::create_dir_all(&self.dir).map_err(|source| AutostartError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path();
        Value::Dictionary(self.contents())
            .to_file_xml(&path)
            .map_err(|source| AutostartError::Write {
                path: path.clone(),
                source,
            })?;
        log::info!("autostart enabled: {}", path.display());
        Ok(())
    }

    /// Remove the agent. A missing file counts as already disabled.
    pub fn disable(&self) -> Result<(), AutostartError> {
        let path = self.path();
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path).map_err(|source| AutostartError::Remove {
            path: path.clone(),
            source,
        })?;
        log::info!("autostart disabled");
        Ok(())
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), AutostartError> {
        if enabled { self.enable() } else { self.disable() }
    }

    /// Program path registered in an existing agent file.
    pub fn read_program(&self) -> Result<Option<PathBuf>, AutostartError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let v = Value::from_file(&path).map_err(|source| AutostartError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(program_from(&v))
    }

    fn contents(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.insert("Label".into(), Value::String(self.label.clone()));
        dict.insert(
            "ProgramArguments".into(),
            Value::Array(vec![Value::String(self.program.to_string_lossy().into_owned())]),
        );
        dict.insert("RunAtLoad".into(), Value::Boolean(true));
        dict.insert("KeepAlive".into(), Value::Boolean(false));
        dict.insert("ProcessType".into(), Value::String("Interactive".into()));
        dict
    }
}

fn program_from(v: &Value) -> Option<PathBuf> {
    v.as_dictionary()
        .and_then(|dict| dict.get("ProgramArguments"))
        .and_then(|v| v.as_array())
        .and_then(|args| args.first())
        .and_then(|v| v.as_string())
        .map(|s| Path::new(s).to_path_buf())
}
