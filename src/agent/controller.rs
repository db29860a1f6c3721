use std::path::{Path, PathBuf};

use anyhow::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    autostart::{ensure_auto_launch, AutoLaunch, AutoLaunchOutcome},
    platform::{Severity, Shell},
    utils::{clock::Clock, dir::TickerPaths},
};

use super::{
    events::AgentEvent,
    prompt::{validate, PromptId},
    session::{classify, SessionNotifier, SessionReason, SessionSubscription},
    storage::{
        appender::LogAppender,
        record::{LogRecord, SessionEvent},
    },
};

pub const INFO_TITLE: &str = "Ticker Information";
const ERROR_TITLE: &str = "Error";

enum Flow {
    Continue,
    Stop,
}

/// Owns everything that lives as long as the process: the log location, the single live prompt
/// and the session subscription. Events are handled strictly one after another.
pub struct TrayController {
    events: mpsc::UnboundedReceiver<AgentEvent>,
    shell: Box<dyn Shell>,
    appender: LogAppender,
    paths: TickerPaths,
    clock: Box<dyn Clock>,
    shutdown: CancellationToken,
    prompt: Option<PromptId>,
    next_prompt: u64,
}

impl TrayController {
    pub fn new(
        events: mpsc::UnboundedReceiver<AgentEvent>,
        shell: Box<dyn Shell>,
        paths: TickerPaths,
        clock: Box<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            events,
            shell,
            appender: LogAppender::new(paths.log_file.clone()),
            paths,
            clock,
            shutdown,
            prompt: None,
            next_prompt: 0,
        }
    }

    /// Executes the controller event loop. Returns once an exit was requested, the shutdown token
    /// was cancelled, or every event producer is gone.
    pub async fn run(
        mut self,
        notifier: Box<dyn SessionNotifier>,
        registrar: &dyn AutoLaunch,
        executable: Option<PathBuf>,
    ) {
        let subscription = self
            .start(notifier, registrar, executable.as_deref())
            .await;

        loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = self.events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            if let Flow::Stop = self.handle(event).await {
                break;
            }
        }

        self.stop(subscription).await;
    }

    async fn start(
        &mut self,
        notifier: Box<dyn SessionNotifier>,
        registrar: &dyn AutoLaunch,
        executable: Option<&Path>,
    ) -> Option<SessionSubscription> {
        info!("Starting, task log is {:?}", self.appender.path());

        let record = LogRecord::session(self.clock.now(), SessionEvent::In);
        if let Err(e) = self.appender.append(&record).await {
            self.report_write_failure(e);
        }

        match ensure_auto_launch(registrar, executable) {
            Ok(AutoLaunchOutcome::Created(artifact)) => info!("Created {artifact:?}"),
            Ok(AutoLaunchOutcome::AlreadyPresent) => debug!("Auto launch is already registered"),
            Err(e) => {
                error!("Failed to register auto launch {e:?}");
                self.shell.notify(Severity::Error, ERROR_TITLE, &e.to_string());
            }
        }

        let subscription = match SessionSubscription::acquire(notifier) {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                error!("Failed to subscribe to session notifications {e:?}");
                self.shell.notify(
                    Severity::Error,
                    ERROR_TITLE,
                    &format!("Session changes won't be logged:\n{e:#}"),
                );
                None
            }
        };

        self.shell.notify(
            Severity::Info,
            INFO_TITLE,
            "Ticker App Started and minimized into tray icon.",
        );
        subscription
    }

    async fn handle(&mut self, event: AgentEvent) -> Flow {
        debug!("Handling {event:?}");
        match event {
            AgentEvent::SessionChanged(reason) => self.on_session_changed(reason).await,
            AgentEvent::OpenPrompt => self.open_prompt(),
            AgentEvent::PromptSubmitted { id, text } => self.submit_prompt(id, &text).await,
            AgentEvent::PromptClosed(id) => self.on_prompt_closed(id),
            AgentEvent::OpenLogsFolder => {
                let dir = self.paths.logs_dir().to_path_buf();
                self.open_folder(&dir)
            }
            AgentEvent::OpenStartupFolder => {
                let dir = self.paths.startup_dir.clone();
                self.open_folder(&dir)
            }
            AgentEvent::ShowInformation => {
                let information = self.information();
                self.shell.notify(Severity::Info, INFO_TITLE, &information)
            }
            AgentEvent::Exit => return Flow::Stop,
        }
        Flow::Continue
    }

    #[instrument(skip(self))]
    async fn on_session_changed(&mut self, reason: SessionReason) {
        let Some(event) = classify(reason) else {
            debug!("Ignoring session change");
            return;
        };

        let record = LogRecord::session(self.clock.now(), event);
        match self.appender.append(&record).await {
            Ok(()) => info!("Logged {record}"),
            Err(e) => self.report_write_failure(e),
        }
    }

    fn open_prompt(&mut self) {
        if let Some(id) = self.prompt {
            debug!("{id} is already open, bringing it forward");
            self.shell.focus_prompt(id);
            return;
        }

        let id = PromptId(self.next_prompt);
        self.next_prompt += 1;
        match self.shell.open_prompt(id) {
            Ok(()) => {
                info!("Opened {id}");
                self.prompt = Some(id);
            }
            Err(e) => {
                error!("Failed to open {id} {e:?}");
                self.shell.notify(
                    Severity::Error,
                    ERROR_TITLE,
                    &format!("Couldn't open the task prompt:\n{e:#}"),
                );
            }
        }
    }

    async fn submit_prompt(&mut self, id: PromptId, text: &str) {
        if self.prompt != Some(id) {
            warn!("Ignoring submission from {id}, it is no longer the live prompt");
            return;
        }

        let task = match validate(text) {
            Ok(task) => task,
            Err(rejection) => {
                debug!("Rejected input {text:?}: {rejection}");
                self.shell
                    .notify(Severity::Warning, rejection.title(), &rejection.to_string());
                self.shell.focus_prompt(id);
                return;
            }
        };

        let record = LogRecord::task(self.clock.now(), task);
        match self.appender.append(&record).await {
            Ok(()) => {
                info!("Logged {record}");
                self.close_prompt(id);
            }
            // The prompt stays open so the text isn't lost.
            Err(e) => self.report_write_failure(e),
        }
    }

    fn close_prompt(&mut self, id: PromptId) {
        self.shell.close_prompt(id);
        if self.prompt == Some(id) {
            self.prompt = None;
        }
    }

    fn on_prompt_closed(&mut self, id: PromptId) {
        if self.prompt == Some(id) {
            info!("{id} was closed");
            self.prompt = None;
        }
    }

    fn open_folder(&mut self, dir: &Path) {
        if !dir.is_dir() {
            debug!("Not opening {dir:?}, it doesn't exist");
            return;
        }
        if let Err(e) = self.shell.open_folder(dir) {
            warn!("Failed to open {dir:?} {e:?}");
        }
    }

    fn information(&self) -> String {
        format!(
            "Ticker - Session Tracking Application\n\n\
             Purpose: Tracks session lock/unlock events\n\
             Log File Path: {}\n\
             Startup: Auto-starts at logon\n\
             Version: {}",
            self.appender.path().display(),
            env!("CARGO_PKG_VERSION"),
        )
    }

    fn report_write_failure(&mut self, e: Error) {
        error!("Failed to write to the task log {e:?}");
        self.shell.notify(
            Severity::Error,
            ERROR_TITLE,
            &format!("Error writing to log file:\n{e:#}"),
        );
    }

    async fn stop(mut self, subscription: Option<SessionSubscription>) {
        info!("Stopping");
        if let Some(id) = self.prompt.take() {
            self.shell.close_prompt(id);
        }

        // Best effort, there is nobody left to tell about a failure.
        let record = LogRecord::session(self.clock.now(), SessionEvent::Out);
        match self.appender.append(&record).await {
            Ok(()) => info!("Logged {record}"),
            Err(e) => error!("Shutdown record is lost {e:?}"),
        }

        if let Some(subscription) = subscription {
            if let Err(e) = subscription.release() {
                error!("Failed to unsubscribe from session notifications {e:?}");
            }
        }

        self.shell.dismiss();
        self.shutdown.cancel();
    }
}
