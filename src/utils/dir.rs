use std::{
    env, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};

pub const LOG_FILE_NAME: &str = "TickerLog.csv";

/// Every location the agent touches. Resolved once at startup and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerPaths {
    /// The CSV task log.
    pub log_file: PathBuf,
    /// Folder the OS launches entries from at logon.
    pub startup_dir: PathBuf,
    /// Rolling diagnostics written through tracing.
    pub diagnostics_dir: PathBuf,
}

impl TickerPaths {
    pub fn resolve() -> Result<Self> {
        let documents = documents_dir()?;
        Ok(Self {
            log_file: documents.join(LOG_FILE_NAME),
            startup_dir: startup_dir()?,
            diagnostics_dir: create_application_default_path()?.join("logs"),
        })
    }

    /// Folder holding the task log, shown by "Open Logs Folder".
    pub fn logs_dir(&self) -> &Path {
        self.log_file.parent().unwrap_or(Path::new("."))
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .or_else(|| env::var_os("HOME").map(PathBuf::from))
        .ok_or_else(|| anyhow!("Couldn't determine the home directory"))
}

fn documents_dir() -> Result<PathBuf> {
    match dirs::document_dir() {
        Some(path) => Ok(path),
        None => Ok(home_dir()?.join("Documents")),
    }
}

fn startup_dir() -> Result<PathBuf> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "win")] {
            known_startup_dir()
        } else if #[cfg(windows)] {
            Ok(config_dir()?.join(r"Microsoft\Windows\Start Menu\Programs\Startup"))
        } else {
            Ok(config_dir()?.join("autostart"))
        }
    }
}

#[cfg(not(feature = "win"))]
fn config_dir() -> Result<PathBuf> {
    match dirs::config_dir() {
        Some(path) => Ok(path),
        None => Ok(home_dir()?.join(".config")),
    }
}

/// Asks the shell for the Startup known folder, which follows folder redirection.
#[cfg(feature = "win")]
fn known_startup_dir() -> Result<PathBuf> {
    use windows::Win32::{
        System::Com::CoTaskMemFree,
        UI::Shell::{FOLDERID_Startup, SHGetKnownFolderPath, KF_FLAG_DEFAULT},
    };

    unsafe {
        let raw = SHGetKnownFolderPath(&FOLDERID_Startup, KF_FLAG_DEFAULT, None)?;
        let path = raw.to_string();
        CoTaskMemFree(Some(raw.0 as *const _));
        Ok(PathBuf::from(path?))
    }
}

pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = match dirs::data_local_dir() {
        Some(path) => path,
        None => home_dir()?.join(".local/state"),
    };
    path.push("ticker");

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
