use super::{prompt::PromptId, session::SessionReason};

/// Everything the controller reacts to. Produced by the host and by shutdown detection, consumed
/// one at a time by [TrayController](super::controller::TrayController).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    SessionChanged(SessionReason),
    OpenPrompt,
    PromptSubmitted { id: PromptId, text: String },
    /// Lifecycle notification sent when a prompt window is gone, whoever closed it.
    PromptClosed(PromptId),
    OpenLogsFolder,
    OpenStartupFolder,
    ShowInformation,
    Exit,
}
