use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    autostart::default_registrar,
    platform::{start_host, Shell},
    utils::{
        clock::{Clock, DefaultClock},
        dir::TickerPaths,
        runtime::single_thread_runtime,
    },
};

use controller::TrayController;
use events::AgentEvent;

pub mod args;
pub mod controller;
pub mod events;
pub mod prompt;
pub mod session;
pub mod shutdown;
pub mod storage;

/// Represents the starting point for the agent. Blocks until the agent is asked to exit.
pub fn start_agent(paths: TickerPaths) -> Result<()> {
    let (sender, receiver) = mpsc::unbounded_channel::<AgentEvent>();

    let host = start_host(sender)?;
    let shutdown_token = CancellationToken::new();
    let controller = create_controller(
        receiver,
        host.shell(),
        paths.clone(),
        &shutdown_token,
        DefaultClock,
    );
    let registrar = default_registrar(&paths.startup_dir);

    let executable = std::env::current_exe()
        .inspect_err(|e| error!("Failed to resolve the executable path {e:?}"))
        .ok();

    single_thread_runtime()?.block_on(async {
        tokio::spawn(shutdown::detect_shutdown(shutdown_token.clone()));
        controller
            .run(host.session_notifier(), registrar.as_ref(), executable)
            .await;
    });

    host.join();
    info!("Agent finished");
    Ok(())
}

fn create_controller(
    receiver: mpsc::UnboundedReceiver<AgentEvent>,
    shell: Box<dyn Shell>,
    paths: TickerPaths,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
) -> TrayController {
    TrayController::new(receiver, shell, paths, Box::new(clock), shutdown_token.clone())
}

#[cfg(test)]
mod agent_tests {
    use std::{
        collections::HashSet,
        fs,
        path::Path,
        sync::{Arc, Mutex},
        thread,
    };

    use anyhow::Result;
    use chrono::NaiveDateTime;
    use tempfile::tempdir;
    use tokio::sync::mpsc::{self, UnboundedSender};
    use tokio_util::sync::CancellationToken;

    use crate::{
        agent::{
            create_controller,
            events::AgentEvent,
            prompt::PromptId,
            session::{MockSessionNotifier, SessionReason},
            storage::record::LOG_HEADER,
        },
        autostart::MockAutoLaunch,
        platform::{Severity, Shell},
        utils::{
            clock::DefaultClock, dir::TickerPaths, logging::TEST_LOGGING, time::TIMESTAMP_FORMAT,
        },
    };

    /// Behaves like a desktop host: prompts live until closed and report their closing back.
    struct FakeDesktop {
        live_prompts: Arc<Mutex<HashSet<PromptId>>>,
        events: UnboundedSender<AgentEvent>,
    }

    impl Shell for FakeDesktop {
        fn open_prompt(&mut self, id: PromptId) -> Result<()> {
            self.live_prompts.lock().unwrap().insert(id);
            Ok(())
        }

        fn focus_prompt(&mut self, _id: PromptId) {}

        fn close_prompt(&mut self, id: PromptId) {
            if self.live_prompts.lock().unwrap().remove(&id) {
                let _ = self.events.send(AgentEvent::PromptClosed(id));
            }
        }

        fn notify(&mut self, _severity: Severity, _title: &str, _message: &str) {}

        fn open_folder(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn dismiss(&mut self) {}
    }

    fn parse_line(line: &str) -> (NaiveDateTime, Vec<&str>) {
        let mut fields = line.split(',');
        let timestamp =
            NaiveDateTime::parse_from_str(fields.next().unwrap(), TIMESTAMP_FORMAT).unwrap();
        (timestamp, fields.collect())
    }

    /// Runs the agent against a fake desktop whose "UI thread" produces events concurrently, the
    /// way a real host does.
    #[tokio::test]
    async fn smoke_test_agent() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let paths = TickerPaths {
            log_file: dir.path().join("TickerLog.csv"),
            startup_dir: dir.path().join("startup"),
            diagnostics_dir: dir.path().join("logs"),
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        let live_prompts = Arc::new(Mutex::new(HashSet::new()));
        let shell = FakeDesktop {
            live_prompts: live_prompts.clone(),
            events: sender.clone(),
        };

        let mut notifier = MockSessionNotifier::new();
        notifier.expect_register().times(1).returning(|| Ok(()));
        notifier.expect_unregister().times(1).returning(|| Ok(()));
        let mut registrar = MockAutoLaunch::new();
        registrar
            .expect_artifact()
            .return_const(paths.startup_dir.join("ticker.desktop"));
        registrar.expect_create().times(1).returning(|_| Ok(()));

        let ui_thread = thread::spawn(move || {
            for event in [
                AgentEvent::SessionChanged(SessionReason::Lock),
                AgentEvent::SessionChanged(SessionReason::ConsoleConnect),
                AgentEvent::SessionChanged(SessionReason::Unlock),
                AgentEvent::OpenPrompt,
                AgentEvent::OpenPrompt,
                AgentEvent::PromptSubmitted {
                    id: PromptId(0),
                    text: "Reviewed budget".into(),
                },
                AgentEvent::Exit,
            ] {
                sender.send(event).unwrap();
            }
        });

        let shutdown_token = CancellationToken::new();
        let controller = create_controller(
            receiver,
            Box::new(shell),
            paths.clone(),
            &shutdown_token,
            DefaultClock,
        );
        controller
            .run(
                Box::new(notifier),
                &registrar,
                Some("/opt/ticker/ticker".into()),
            )
            .await;
        ui_thread.join().unwrap();

        assert!(live_prompts.lock().unwrap().is_empty());
        assert!(shutdown_token.is_cancelled());

        let content = fs::read_to_string(&paths.log_file)?;
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], LOG_HEADER);
        let events = lines[1..]
            .iter()
            .map(|line| parse_line(line).1.join(","))
            .collect::<Vec<_>>();
        assert_eq!(
            events,
            vec!["in", "out", "in", "in,Reviewed budget", "out"]
        );

        let now = chrono::Local::now().naive_local();
        for line in &lines[1..] {
            assert!((now - parse_line(line).0).num_seconds().abs() <= 2);
        }

        Ok(())
    }
}
