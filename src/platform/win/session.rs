use anyhow::Result;
use windows::Win32::System::RemoteDesktop::{
    WTSRegisterSessionNotification, WTSUnRegisterSessionNotification, NOTIFY_FOR_THIS_SESSION,
};

use crate::agent::session::SessionNotifier;

use super::from_raw;

/// Routes `WM_WTSSESSION_CHANGE` for the current session to the host window.
pub struct WtsNotifier {
    pub(super) window: isize,
}

impl SessionNotifier for WtsNotifier {
    fn register(&mut self) -> Result<()> {
        unsafe { WTSRegisterSessionNotification(from_raw(self.window), NOTIFY_FOR_THIS_SESSION) }?;
        Ok(())
    }

    fn unregister(&mut self) -> Result<()> {
        unsafe { WTSUnRegisterSessionNotification(from_raw(self.window)) }?;
        Ok(())
    }
}
