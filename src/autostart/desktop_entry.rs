use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;

use super::AutoLaunch;

/// XDG autostart entry, `$XDG_CONFIG_HOME/autostart/ticker.desktop`.
pub struct DesktopEntry {
    dir: PathBuf,
}

impl DesktopEntry {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl AutoLaunch for DesktopEntry {
    fn artifact(&self) -> PathBuf {
        self.dir.join("ticker.desktop")
    }

    fn create(&self, executable: &Path) -> Result<()> {
        // Terminal=false keeps the start silent.
        let contents = format!(
            "[Desktop Entry]
Type=Application
Name=Ticker
Comment=Logs session lock/unlock events
Exec=\"{exe}\"
Path={dir}
Hidden=false
NoDisplay=false
Terminal=false
X-GNOME-Autostart-enabled=true
",
            exe = executable.display(),
            dir = executable
                .parent()
                .map(|v| v.display().to_string())
                .unwrap_or_default(),
        );
        fs::write(self.artifact(), contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use tempfile::tempdir;

    use crate::autostart::{ensure_auto_launch, AutoLaunch, AutoLaunchOutcome};

    use super::DesktopEntry;

    #[test]
    fn entry_points_at_the_executable() {
        let dir = tempdir().unwrap();
        let entry = DesktopEntry::new(dir.path().join("autostart"));

        let outcome = ensure_auto_launch(&entry, Some(Path::new("/opt/ticker/ticker"))).unwrap();

        assert_eq!(outcome, AutoLaunchOutcome::Created(entry.artifact()));
        let contents = fs::read_to_string(entry.artifact()).unwrap();
        assert!(contents.contains("Exec=\"/opt/ticker/ticker\""));
        assert!(contents.contains("Path=/opt/ticker"));
    }

    #[test]
    fn second_run_keeps_the_first_entry() {
        let dir = tempdir().unwrap();
        let entry = DesktopEntry::new(dir.path().to_path_buf());

        ensure_auto_launch(&entry, Some(Path::new("/opt/first"))).unwrap();
        let outcome = ensure_auto_launch(&entry, Some(Path::new("/opt/second"))).unwrap();

        assert_eq!(outcome, AutoLaunchOutcome::AlreadyPresent);
        assert!(fs::read_to_string(entry.artifact())
            .unwrap()
            .contains("/opt/first"));
    }
}
