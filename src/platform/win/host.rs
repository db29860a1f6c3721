use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicU32, Ordering},
        mpsc as std_mpsc,
    },
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Result};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{HWND, LPARAM, LRESULT, WPARAM},
        UI::WindowsAndMessaging::{
            CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
            MessageBoxW, PostQuitMessage, RegisterClassW, RegisterWindowMessageW,
            TranslateMessage, MB_ICONERROR, MB_ICONINFORMATION, MB_ICONWARNING, MB_OK,
            MB_SETFOREGROUND, MSG, WINDOW_EX_STYLE, WM_CLOSE, WM_DESTROY, WM_WTSSESSION_CHANGE,
            WNDCLASSW, WS_OVERLAPPED,
        },
    },
};

use crate::{
    agent::{
        events::AgentEvent,
        session::{SessionNotifier, SessionReason},
    },
    platform::{Host, Severity, Shell},
};

use super::{
    from_raw, loword, module_instance, prompt, send_event, session::WtsNotifier, to_raw, tray,
    wide, with_host, HostCommand, HostState, WinShell, HOST, WM_HOST_COMMAND, WM_TRAY_CALLBACK,
};

const HOST_CLASS: PCWSTR = w!("TickerHost");

/// Broadcast by Explorer after it restarts; the tray icon has to be added again.
static TASKBAR_CREATED: AtomicU32 = AtomicU32::new(0);

/// UI thread with a hidden message window and a tray icon.
pub struct WinHost {
    window: isize,
    thread: JoinHandle<()>,
}

impl WinHost {
    /// Spawns the UI thread and waits until its window and tray icon exist.
    pub fn start(events: UnboundedSender<AgentEvent>) -> Result<Self> {
        let (ready_sender, ready_receiver) = std_mpsc::channel::<Result<isize>>();

        let thread = thread::Builder::new()
            .name("ticker-ui".to_owned())
            .spawn(move || {
                let window = match unsafe { create_host_window() } {
                    Ok(window) => window,
                    Err(e) => {
                        let _ = ready_sender.send(Err(e));
                        return;
                    }
                };
                HOST.with(|host| {
                    *host.borrow_mut() = Some(HostState {
                        window,
                        events,
                        prompts: HashMap::new(),
                        modal: false,
                        deferred: VecDeque::new(),
                    })
                });
                // Explorer may not be up yet right after logon, TaskbarCreated retries.
                if let Err(e) = unsafe { tray::add_icon(window) } {
                    warn!("Tray icon not added yet {e:?}");
                }
                let _ = ready_sender.send(Ok(to_raw(window)));

                unsafe { run_message_loop() };
                HOST.with(|host| host.borrow_mut().take());
                info!("UI thread finished");
            })?;

        let window = ready_receiver
            .recv()
            .map_err(|_| anyhow!("UI thread exited before creating its window"))??;
        Ok(Self { window, thread })
    }
}

impl Host for WinHost {
    fn shell(&self) -> Box<dyn Shell> {
        Box::new(WinShell {
            window: self.window,
        })
    }

    fn session_notifier(&self) -> Box<dyn SessionNotifier> {
        Box::new(WtsNotifier {
            window: self.window,
        })
    }

    fn join(self: Box<Self>) {
        if self.thread.join().is_err() {
            error!("UI thread panicked");
        }
    }
}

unsafe fn create_host_window() -> Result<HWND> {
    let instance = module_instance()?;
    let class = WNDCLASSW {
        lpfnWndProc: Some(host_proc),
        hInstance: instance,
        lpszClassName: HOST_CLASS,
        ..Default::default()
    };
    unsafe {
        if RegisterClassW(&class) == 0 {
            return Err(windows::core::Error::from_win32().into());
        }
        TASKBAR_CREATED.store(
            RegisterWindowMessageW(w!("TaskbarCreated")),
            Ordering::Relaxed,
        );
        let window = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            HOST_CLASS,
            w!("Ticker"),
            WS_OVERLAPPED,
            0,
            0,
            0,
            0,
            None,
            None,
            instance,
            None,
        )?;
        Ok(window)
    }
}

unsafe fn run_message_loop() {
    let mut message = MSG::default();
    // GetMessageW reports errors as -1.
    while unsafe { GetMessageW(&mut message, None, 0, 0) }.0 > 0 {
        unsafe {
            let _ = TranslateMessage(&message);
            DispatchMessageW(&message);
        }
    }
}

unsafe extern "system" fn host_proc(
    window: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match message {
        WM_HOST_COMMAND => {
            let command = unsafe { Box::from_raw(lparam.0 as *mut HostCommand) };
            unsafe { dispatch(*command) };
            LRESULT(0)
        }
        WM_TRAY_CALLBACK => {
            unsafe { tray::on_callback(window, loword(lparam.0 as usize)) };
            LRESULT(0)
        }
        WM_WTSSESSION_CHANGE => {
            send_event(AgentEvent::SessionChanged(SessionReason::from_code(
                wparam.0 as u32,
            )));
            LRESULT(0)
        }
        // Closing the hidden window from outside is treated like the Exit menu item.
        WM_CLOSE => {
            send_event(AgentEvent::Exit);
            LRESULT(0)
        }
        WM_DESTROY => {
            unsafe {
                tray::remove_icon(window);
                PostQuitMessage(0);
            }
            LRESULT(0)
        }
        _ if message != 0 && message == TASKBAR_CREATED.load(Ordering::Relaxed) => {
            if let Err(e) = unsafe { tray::add_icon(window) } {
                error!("Failed to restore the tray icon {e:?}");
            }
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(window, message, wparam, lparam) },
    }
}

/// Runs a command unless a message box is up, in which case it's queued behind it.
unsafe fn dispatch(command: HostCommand) {
    let Some(Some(command)) = with_host(|host| host.defer(command)) else {
        return;
    };

    match command {
        HostCommand::OpenPrompt(id) => {
            if let Err(e) = unsafe { prompt::open(id) } {
                error!("Failed to create {id} {e:?}");
                send_event(AgentEvent::PromptClosed(id));
            }
        }
        HostCommand::FocusPrompt(id) => {
            if let Some(Some(window)) = with_host(|host| host.prompt_window(id)) {
                unsafe { prompt::focus(window) };
            }
        }
        HostCommand::ClosePrompt(id) => {
            if let Some(Some(window)) = with_host(|host| host.prompt_window(id)) {
                unsafe { prompt::close(window) };
            }
        }
        HostCommand::Notify {
            severity,
            title,
            message,
        } => unsafe { show_alert(severity, &title, &message) },
        HostCommand::Dismiss => unsafe { dismiss() },
    }
}

unsafe fn show_alert(severity: Severity, title: &str, message: &str) {
    debug!("Showing {severity:?} alert {title}");
    let icon = match severity {
        Severity::Info => MB_ICONINFORMATION,
        Severity::Warning => MB_ICONWARNING,
        Severity::Error => MB_ICONERROR,
    };
    // Owned by the live prompt, if any, so focus returns to it afterwards.
    let owner = with_host(|host| host.prompts.keys().next().copied())
        .flatten()
        .map(from_raw)
        .unwrap_or_default();

    with_host(|host| host.modal = true);
    unsafe {
        MessageBoxW(
            owner,
            &wide(message),
            &wide(title),
            MB_OK | icon | MB_SETFOREGROUND,
        )
    };
    with_host(|host| host.modal = false);

    while let Some(Some(next)) = with_host(|host| host.deferred.pop_front()) {
        unsafe { dispatch(next) };
    }
}

unsafe fn dismiss() {
    let Some((window, prompts)) = with_host(|host| {
        let prompts = host.prompts.keys().copied().collect::<Vec<_>>();
        (host.window, prompts)
    }) else {
        return;
    };
    for prompt in prompts {
        unsafe { prompt::close(from_raw(prompt)) };
    }
    if let Err(e) = unsafe { DestroyWindow(window) } {
        error!("Failed to destroy the host window {e:?}");
        unsafe { PostQuitMessage(0) };
    }
}
