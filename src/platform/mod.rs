//! Contains everything that talks to the desktop: tray presence, the prompt window, alerts and
//! session notifications. [start_host] picks the implementation the crate was built with.

#[cfg(not(feature = "win"))]
pub mod headless;
#[cfg(feature = "win")]
pub mod win;

#[cfg(feature = "win")]
extern crate windows;

use std::path::Path;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;

use crate::agent::{events::AgentEvent, prompt::PromptId, session::SessionNotifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Commands the controller issues to the desktop. Implementations must not block on the user:
/// anything modal runs on the host's own thread.
#[cfg_attr(test, mockall::automock)]
pub trait Shell {
    /// Shows a new prompt window that reports back through [AgentEvent::PromptSubmitted] and
    /// [AgentEvent::PromptClosed].
    fn open_prompt(&mut self, id: PromptId) -> Result<()>;

    /// Brings an open prompt to the foreground, restoring it when minimized, and focuses its
    /// text field.
    fn focus_prompt(&mut self, id: PromptId);

    fn close_prompt(&mut self, id: PromptId);

    fn notify(&mut self, severity: Severity, title: &str, message: &str);

    fn open_folder(&mut self, path: &Path) -> Result<()>;

    /// Removes the tray presence and lets the host loop finish.
    fn dismiss(&mut self);
}

/// A running desktop integration.
pub trait Host {
    fn shell(&self) -> Box<dyn Shell>;

    fn session_notifier(&self) -> Box<dyn SessionNotifier>;

    /// Waits for the host loop to finish after [Shell::dismiss].
    fn join(self: Box<Self>);
}

/// Starts the host the crate was built for. Every user or session action ends up in `events`.
pub fn start_host(events: UnboundedSender<AgentEvent>) -> Result<Box<dyn Host>> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "win")] {
            Ok(Box::new(win::WinHost::start(events)?))
        } else {
            Ok(Box::new(headless::HeadlessHost::new(events)))
        }
    }
}

/// Opens a folder in the system file browser.
pub(crate) fn spawn_file_browser(path: &Path) -> Result<()> {
    use std::process::{Command, Stdio};

    let program = if cfg!(windows) {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };

    #[allow(clippy::zombie_processes)]
    Command::new(program)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}
