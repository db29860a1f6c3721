use std::path::Path;

use anyhow::{bail, Result};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::agent::{events::AgentEvent, prompt::PromptId, session::SessionNotifier};

use super::{spawn_file_browser, Host, Severity, Shell};

/// Used when the crate is built without a desktop integration. There is no tray and no prompt;
/// the agent only records its own start and stop and exits on Ctrl-C.
pub struct HeadlessHost {
    _events: UnboundedSender<AgentEvent>,
}

impl HeadlessHost {
    pub fn new(events: UnboundedSender<AgentEvent>) -> Self {
        warn!("Running without a desktop host, build with the `win` feature for the tray");
        Self { _events: events }
    }
}

impl Host for HeadlessHost {
    fn shell(&self) -> Box<dyn Shell> {
        Box::new(HeadlessShell)
    }

    fn session_notifier(&self) -> Box<dyn SessionNotifier> {
        Box::new(HeadlessNotifier)
    }

    fn join(self: Box<Self>) {}
}

pub struct HeadlessShell;

impl Shell for HeadlessShell {
    fn open_prompt(&mut self, id: PromptId) -> Result<()> {
        bail!("Can't show {id} without a desktop host")
    }

    fn focus_prompt(&mut self, id: PromptId) {
        debug!("Ignoring focus request for {id}");
    }

    fn close_prompt(&mut self, id: PromptId) {
        debug!("Ignoring close request for {id}");
    }

    fn notify(&mut self, severity: Severity, title: &str, message: &str) {
        match severity {
            Severity::Info => info!("{title}: {message}"),
            Severity::Warning => warn!("{title}: {message}"),
            Severity::Error => error!("{title}: {message}"),
        }
        eprintln!("{title}\n{message}");
    }

    fn open_folder(&mut self, path: &Path) -> Result<()> {
        spawn_file_browser(path)
    }

    fn dismiss(&mut self) {
        info!("Headless host dismissed");
    }
}

pub struct HeadlessNotifier;

impl SessionNotifier for HeadlessNotifier {
    fn register(&mut self) -> Result<()> {
        warn!("Session notifications are not available without a desktop host");
        Ok(())
    }

    fn unregister(&mut self) -> Result<()> {
        Ok(())
    }
}
