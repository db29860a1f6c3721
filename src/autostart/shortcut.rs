use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::instrument;
use windows::{
    core::{Interface, HSTRING},
    Win32::{
        System::Com::{
            CoCreateInstance, CoInitializeEx, CoUninitialize, IPersistFile, CLSCTX_INPROC_SERVER,
            COINIT_APARTMENTTHREADED,
        },
        UI::Shell::{IShellLinkW, ShellLink},
    },
};

use super::AutoLaunch;

/// `Ticker.lnk` shell link inside the user's Startup folder.
pub struct StartupShortcut {
    dir: PathBuf,
}

impl StartupShortcut {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl AutoLaunch for StartupShortcut {
    fn artifact(&self) -> PathBuf {
        self.dir.join("Ticker.lnk")
    }

    #[instrument(skip(self))]
    fn create(&self, executable: &Path) -> Result<()> {
        let initialized = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
        let result = unsafe { save_link(executable, &self.artifact()) };
        // Only balance our own initialization, COM may already be up in another mode.
        if initialized.is_ok() {
            unsafe { CoUninitialize() };
        }
        result
    }
}

unsafe fn save_link(executable: &Path, destination: &Path) -> Result<()> {
    unsafe {
        let link: IShellLinkW = CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER)?;
        link.SetPath(&HSTRING::from(executable))?;
        if let Some(dir) = executable.parent() {
            link.SetWorkingDirectory(&HSTRING::from(dir))?;
        }
        link.SetDescription(&HSTRING::from("Ticker"))?;

        let file: IPersistFile = link.cast()?;
        file.Save(&HSTRING::from(destination), true)?;
    }
    Ok(())
}
