//! Makes the OS start the agent at logon. Registration is a single artifact in the user's startup
//! location; its presence is the only state that is checked.

#[cfg(not(feature = "win"))]
pub mod desktop_entry;
#[cfg(feature = "win")]
pub mod shortcut;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::info;

pub const MISSING_PROCESS_PATH: &str =
    "Could not determine the process path. Not creating self-start link on startup";

#[cfg_attr(test, mockall::automock)]
pub trait AutoLaunch {
    /// Location of the registration artifact, whether it exists or not.
    fn artifact(&self) -> PathBuf;

    /// Creates the artifact so that it launches `executable`.
    fn create(&self, executable: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoLaunchOutcome {
    Created(PathBuf),
    AlreadyPresent,
}

/// Creates the registration if it's missing. An existing artifact is never touched, even if it
/// points at a different executable.
pub fn ensure_auto_launch(
    registrar: &dyn AutoLaunch,
    executable: Option<&Path>,
) -> Result<AutoLaunchOutcome> {
    let artifact = registrar.artifact();
    if artifact.exists() {
        return Ok(AutoLaunchOutcome::AlreadyPresent);
    }

    let Some(executable) = executable else {
        bail!(MISSING_PROCESS_PATH);
    };

    if let Some(parent) = artifact.parent() {
        std::fs::create_dir_all(parent)?;
    }
    registrar.create(executable)?;
    info!("Registered {executable:?} to start at logon through {artifact:?}");
    Ok(AutoLaunchOutcome::Created(artifact))
}

/// Registrar for the platform the crate was built for.
pub fn default_registrar(startup_dir: &Path) -> Box<dyn AutoLaunch> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "win")] {
            Box::new(shortcut::StartupShortcut::new(startup_dir.to_path_buf()))
        } else {
            Box::new(desktop_entry::DesktopEntry::new(startup_dir.to_path_buf()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use tempfile::tempdir;

    use super::{ensure_auto_launch, AutoLaunchOutcome, MockAutoLaunch, MISSING_PROCESS_PATH};

    #[test]
    fn existing_artifact_is_left_alone() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("Ticker.lnk");
        fs::write(&artifact, "").unwrap();

        let mut registrar = MockAutoLaunch::new();
        registrar
            .expect_artifact()
            .return_const(artifact.clone());
        registrar.expect_create().never();

        let outcome = ensure_auto_launch(&registrar, Some(Path::new("/opt/ticker"))).unwrap();

        assert_eq!(outcome, AutoLaunchOutcome::AlreadyPresent);
    }

    #[test]
    fn missing_artifact_is_created() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("nested").join("Ticker.lnk");

        let mut registrar = MockAutoLaunch::new();
        registrar
            .expect_artifact()
            .return_const(artifact.clone());
        registrar
            .expect_create()
            .withf(|exe| exe == Path::new("/opt/ticker"))
            .times(1)
            .returning(|_| Ok(()));

        let outcome = ensure_auto_launch(&registrar, Some(Path::new("/opt/ticker"))).unwrap();

        assert_eq!(outcome, AutoLaunchOutcome::Created(artifact));
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn missing_executable_is_reported() {
        let dir = tempdir().unwrap();

        let mut registrar = MockAutoLaunch::new();
        registrar
            .expect_artifact()
            .return_const(dir.path().join("Ticker.lnk"));
        registrar.expect_create().never();

        let error = ensure_auto_launch(&registrar, None).unwrap_err();

        assert_eq!(error.to_string(), MISSING_PROCESS_PATH);
    }
}
