use anyhow::{bail, Result};
use tracing::error;
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{HWND, LPARAM, POINT, WPARAM},
        UI::{
            Shell::{
                Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE,
                NOTIFYICONDATAW,
            },
            WindowsAndMessaging::{
                AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, LoadIconW, PostMessageW,
                SetForegroundWindow, TrackPopupMenu, IDI_INFORMATION, MF_SEPARATOR, MF_STRING,
                TPM_NONOTIFY, TPM_RETURNCMD, TPM_RIGHTBUTTON, WM_NULL,
            },
        },
    },
};

use crate::agent::events::AgentEvent;

use super::{send_event, WM_TRAY_CALLBACK};

const TRAY_ID: u32 = 1;
const TOOLTIP: &str = "Ticker";

const MENU_LOG_TASK: usize = 1;
const MENU_OPEN_LOGS: usize = 2;
const MENU_OPEN_STARTUP: usize = 3;
const MENU_INFORMATION: usize = 4;
const MENU_EXIT: usize = 5;

fn icon_data(window: HWND) -> NOTIFYICONDATAW {
    NOTIFYICONDATAW {
        cbSize: size_of::<NOTIFYICONDATAW>() as u32,
        hWnd: window,
        uID: TRAY_ID,
        ..Default::default()
    }
}

pub(super) unsafe fn add_icon(window: HWND) -> Result<()> {
    let mut data = icon_data(window);
    data.uFlags = NIF_MESSAGE | NIF_ICON | NIF_TIP;
    data.uCallbackMessage = WM_TRAY_CALLBACK;
    data.hIcon = unsafe { LoadIconW(None, IDI_INFORMATION) }?;
    for (slot, unit) in data.szTip.iter_mut().zip(TOOLTIP.encode_utf16()) {
        *slot = unit;
    }

    if !unsafe { Shell_NotifyIconW(NIM_ADD, &data) }.as_bool() {
        bail!("Failed to add the tray icon");
    }
    Ok(())
}

pub(super) unsafe fn remove_icon(window: HWND) {
    let data = icon_data(window);
    if !unsafe { Shell_NotifyIconW(NIM_DELETE, &data) }.as_bool() {
        error!("Failed to remove the tray icon");
    }
}

/// Handles the tray callback; the mouse message sits in the low word of `lparam`.
pub(super) unsafe fn on_callback(window: HWND, mouse_message: u32) {
    use windows::Win32::UI::WindowsAndMessaging::{WM_CONTEXTMENU, WM_LBUTTONDBLCLK, WM_RBUTTONUP};

    match mouse_message {
        WM_LBUTTONDBLCLK => send_event(AgentEvent::OpenPrompt),
        WM_RBUTTONUP | WM_CONTEXTMENU => {
            if let Err(e) = unsafe { show_menu(window) } {
                error!("Failed to show the tray menu {e:?}");
            }
        }
        _ => {}
    }
}

unsafe fn show_menu(window: HWND) -> Result<()> {
    let selected = unsafe {
        let menu = CreatePopupMenu()?;
        AppendMenuW(menu, MF_STRING, MENU_LOG_TASK, w!("Log a task"))?;
        AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null())?;
        AppendMenuW(menu, MF_STRING, MENU_OPEN_LOGS, w!("Open Logs Folder"))?;
        AppendMenuW(menu, MF_STRING, MENU_OPEN_STARTUP, w!("Open Startup Folder"))?;
        AppendMenuW(menu, MF_STRING, MENU_INFORMATION, w!("Information"))?;
        AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null())?;
        AppendMenuW(menu, MF_STRING, MENU_EXIT, w!("Exit"))?;

        let mut cursor = POINT::default();
        GetCursorPos(&mut cursor)?;

        // The menu only closes on outside clicks when its owner is in the foreground.
        let _ = SetForegroundWindow(window);
        let selected = TrackPopupMenu(
            menu,
            TPM_RETURNCMD | TPM_NONOTIFY | TPM_RIGHTBUTTON,
            cursor.x,
            cursor.y,
            0,
            window,
            None,
        );
        let _ = PostMessageW(window, WM_NULL, WPARAM(0), LPARAM(0));
        DestroyMenu(menu)?;
        selected.0 as usize
    };

    let event = match selected {
        MENU_LOG_TASK => AgentEvent::OpenPrompt,
        MENU_OPEN_LOGS => AgentEvent::OpenLogsFolder,
        MENU_OPEN_STARTUP => AgentEvent::OpenStartupFolder,
        MENU_INFORMATION => AgentEvent::ShowInformation,
        MENU_EXIT => AgentEvent::Exit,
        _ => return Ok(()),
    };
    send_event(event);
    Ok(())
}
