//! Win32 host. A dedicated UI thread owns a hidden window that receives tray callbacks, session
//! notifications and commands posted by [WinShell]. Nothing on that thread waits for the
//! controller; everything it learns is forwarded as an [AgentEvent].

mod host;
mod prompt;
mod session;
mod tray;

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    ffi::c_void,
    path::Path,
};

use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;
use tracing::error;
use windows::{
    core::HSTRING,
    Win32::{
        Foundation::{HINSTANCE, HWND, LPARAM, WPARAM},
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{PostMessageW, WM_APP},
    },
};

use crate::agent::{events::AgentEvent, prompt::PromptId};

use super::{spawn_file_browser, Severity, Shell};

pub use host::WinHost;

/// Carries a boxed [HostCommand] in its LPARAM.
const WM_HOST_COMMAND: u32 = WM_APP + 1;
const WM_TRAY_CALLBACK: u32 = WM_APP + 2;

enum HostCommand {
    OpenPrompt(PromptId),
    FocusPrompt(PromptId),
    ClosePrompt(PromptId),
    Notify {
        severity: Severity,
        title: String,
        message: String,
    },
    Dismiss,
}

/// State of the UI thread. Only touched from that thread and never borrowed across a Win32 call
/// that can dispatch messages.
struct HostState {
    window: HWND,
    events: UnboundedSender<AgentEvent>,
    /// Prompt window handle to the prompt it shows.
    prompts: HashMap<isize, PromptId>,
    /// A message box is up; commands wait until it's dismissed.
    modal: bool,
    deferred: VecDeque<HostCommand>,
}

impl HostState {
    fn defer(&mut self, command: HostCommand) -> Option<HostCommand> {
        if self.modal {
            self.deferred.push_back(command);
            None
        } else {
            Some(command)
        }
    }

    fn prompt_window(&self, id: PromptId) -> Option<HWND> {
        self.prompts
            .iter()
            .find(|(_, prompt)| **prompt == id)
            .map(|(window, _)| from_raw(*window))
    }
}

thread_local! {
    static HOST: RefCell<Option<HostState>> = const { RefCell::new(None) };
}

/// Runs `f` against the UI thread state. Returns [None] when there is no state yet or when it is
/// already borrowed further up the stack.
fn with_host<R>(f: impl FnOnce(&mut HostState) -> R) -> Option<R> {
    HOST.with(|host| {
        let mut host = host.try_borrow_mut().ok()?;
        host.as_mut().map(f)
    })
}

fn send_event(event: AgentEvent) {
    let sent = with_host(|host| host.events.send(event));
    match sent {
        Some(Ok(())) => {}
        Some(Err(e)) => error!("Controller is gone, dropping {:?}", e.0),
        None => error!("Host state is unavailable, dropping event"),
    }
}

fn to_raw(window: HWND) -> isize {
    window.0 as isize
}

fn from_raw(window: isize) -> HWND {
    HWND(window as *mut c_void)
}

fn loword(value: usize) -> u32 {
    (value & 0xFFFF) as u32
}

fn hiword(value: usize) -> u32 {
    ((value >> 16) & 0xFFFF) as u32
}

fn module_instance() -> Result<HINSTANCE> {
    Ok(unsafe { GetModuleHandleW(None) }?.into())
}

fn wide(value: &str) -> HSTRING {
    HSTRING::from(value)
}

/// Hands a command to the UI thread. The box is reclaimed there, or here if posting fails.
fn post_command(window: isize, command: HostCommand) -> Result<()> {
    let payload = Box::into_raw(Box::new(command));
    let posted = unsafe {
        PostMessageW(
            from_raw(window),
            WM_HOST_COMMAND,
            WPARAM(0),
            LPARAM(payload as isize),
        )
    };
    if let Err(e) = posted {
        drop(unsafe { Box::from_raw(payload) });
        return Err(e.into());
    }
    Ok(())
}

/// [Shell] that forwards everything to the UI thread.
pub struct WinShell {
    window: isize,
}

impl WinShell {
    fn post(&self, command: HostCommand) {
        if let Err(e) = post_command(self.window, command) {
            error!("Failed to reach the UI thread {e:?}");
        }
    }
}

impl Shell for WinShell {
    fn open_prompt(&mut self, id: PromptId) -> Result<()> {
        post_command(self.window, HostCommand::OpenPrompt(id))
    }

    fn focus_prompt(&mut self, id: PromptId) {
        self.post(HostCommand::FocusPrompt(id));
    }

    fn close_prompt(&mut self, id: PromptId) {
        self.post(HostCommand::ClosePrompt(id));
    }

    fn notify(&mut self, severity: Severity, title: &str, message: &str) {
        self.post(HostCommand::Notify {
            severity,
            title: title.to_owned(),
            message: message.to_owned(),
        });
    }

    fn open_folder(&mut self, path: &Path) -> Result<()> {
        spawn_file_browser(path)
    }

    fn dismiss(&mut self) {
        self.post(HostCommand::Dismiss);
    }
}
