//! The "Log a task" window: one edit field and a Log button. Commas never reach the field and
//! Enter submits instead of beeping.

use std::sync::Once;

use anyhow::Result;
use tracing::{error, warn};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{HWND, LPARAM, LRESULT, WPARAM},
        Graphics::Gdi::{GetStockObject, COLOR_BTNFACE, DEFAULT_GUI_FONT, HBRUSH},
        UI::{
            Input::KeyboardAndMouse::SetFocus,
            Shell::{DefSubclassProc, RemoveWindowSubclass, SetWindowSubclass},
            WindowsAndMessaging::{
                CreateWindowExW, DefWindowProcW, DestroyWindow, GetDlgItem, GetParent,
                GetWindowTextLengthW, GetWindowTextW, IsIconic, LoadCursorW, RegisterClassW,
                SendMessageW, SetForegroundWindow, ShowWindow, BN_CLICKED, BS_DEFPUSHBUTTON,
                CW_USEDEFAULT, EM_SETSEL, ES_AUTOHSCROLL, HMENU, IDC_ARROW, SW_RESTORE,
                SW_SHOWNORMAL, WINDOW_EX_STYLE, WINDOW_STYLE, WM_CHAR, WM_CLOSE, WM_COMMAND,
                WM_DESTROY, WM_NCDESTROY, WM_SETFONT, WNDCLASSW, WS_CAPTION, WS_CHILD,
                WS_EX_CLIENTEDGE, WS_EX_TOPMOST, WS_MINIMIZEBOX, WS_OVERLAPPED, WS_SYSMENU,
                WS_TABSTOP, WS_VISIBLE,
            },
        },
    },
};

use crate::agent::{
    events::AgentEvent,
    prompt::{classify_char, Keystroke, PromptId},
};

use super::{hiword, loword, module_instance, send_event, to_raw, with_host};

const PROMPT_CLASS: PCWSTR = w!("TickerPrompt");
const EDIT_ID: usize = 101;
const LOG_BUTTON_ID: usize = 102;
const EDIT_SUBCLASS_ID: usize = 1;

static REGISTER_CLASS: Once = Once::new();

/// Creates and shows the prompt window for `id`.
pub(super) unsafe fn open(id: PromptId) -> Result<()> {
    let instance = module_instance()?;
    REGISTER_CLASS.call_once(|| {
        let class = WNDCLASSW {
            lpfnWndProc: Some(prompt_proc),
            hInstance: instance,
            hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }.unwrap_or_default(),
            hbrBackground: HBRUSH((COLOR_BTNFACE.0 + 1) as usize as *mut _),
            lpszClassName: PROMPT_CLASS,
            ..Default::default()
        };
        if unsafe { RegisterClassW(&class) } == 0 {
            error!("Failed to register the prompt window class");
        }
    });

    unsafe {
        let window = CreateWindowExW(
            WS_EX_TOPMOST,
            PROMPT_CLASS,
            w!("Log a task"),
            WS_OVERLAPPED | WS_CAPTION | WS_SYSMENU | WS_MINIMIZEBOX,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            360,
            130,
            None,
            None,
            instance,
            None,
        )?;
        // Registered before the children exist so a failure below still reports the close.
        with_host(|host| host.prompts.insert(to_raw(window), id));

        let edit = CreateWindowExW(
            WS_EX_CLIENTEDGE,
            w!("EDIT"),
            w!(""),
            WS_CHILD | WS_VISIBLE | WS_TABSTOP | WINDOW_STYLE(ES_AUTOHSCROLL as u32),
            12,
            12,
            320,
            24,
            window,
            HMENU(EDIT_ID as *mut _),
            instance,
            None,
        );
        let button = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            w!("BUTTON"),
            w!("Log"),
            WS_CHILD | WS_VISIBLE | WS_TABSTOP | WINDOW_STYLE(BS_DEFPUSHBUTTON as u32),
            252,
            48,
            80,
            28,
            window,
            HMENU(LOG_BUTTON_ID as *mut _),
            instance,
            None,
        );
        let (edit, button) = match (edit, button) {
            (Ok(edit), Ok(button)) => (edit, button),
            (Err(e), _) | (_, Err(e)) => {
                let _ = DestroyWindow(window);
                return Err(e.into());
            }
        };

        let font = GetStockObject(DEFAULT_GUI_FONT);
        for child in [edit, button] {
            SendMessageW(child, WM_SETFONT, WPARAM(font.0 as usize), LPARAM(1));
        }
        let _ = SetWindowSubclass(edit, Some(edit_proc), EDIT_SUBCLASS_ID, 0);

        let _ = ShowWindow(window, SW_SHOWNORMAL);
        let _ = SetForegroundWindow(window);
        let _ = SetFocus(edit);
    }
    Ok(())
}

/// Restores and raises the prompt, then puts the caret back in the field.
pub(super) unsafe fn focus(window: HWND) {
    unsafe {
        if IsIconic(window).as_bool() {
            let _ = ShowWindow(window, SW_RESTORE);
        }
        let _ = SetForegroundWindow(window);
        match GetDlgItem(window, EDIT_ID as i32) {
            Ok(edit) => {
                let _ = SetFocus(edit);
                SendMessageW(edit, EM_SETSEL, WPARAM(0), LPARAM(-1));
            }
            Err(e) => warn!("Prompt has no text field {e:?}"),
        }
    }
}

pub(super) unsafe fn close(window: HWND) {
    if let Err(e) = unsafe { DestroyWindow(window) } {
        error!("Failed to close the prompt {e:?}");
    }
}

unsafe fn submit(window: HWND) {
    let Some(Some(id)) = with_host(|host| host.prompts.get(&to_raw(window)).copied()) else {
        return;
    };
    let text = match unsafe { GetDlgItem(window, EDIT_ID as i32) } {
        Ok(edit) => unsafe { window_text(edit) },
        Err(e) => {
            error!("Prompt has no text field {e:?}");
            return;
        }
    };
    send_event(AgentEvent::PromptSubmitted { id, text });
}

unsafe fn window_text(window: HWND) -> String {
    let length = unsafe { GetWindowTextLengthW(window) }.max(0) as usize;
    let mut buffer = vec![0u16; length + 1];
    let copied = unsafe { GetWindowTextW(window, &mut buffer) }.max(0) as usize;
    String::from_utf16_lossy(&buffer[..copied])
}

unsafe extern "system" fn prompt_proc(
    window: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match message {
        WM_COMMAND => {
            if loword(wparam.0) as usize == LOG_BUTTON_ID && hiword(wparam.0) == BN_CLICKED {
                unsafe { submit(window) };
            }
            LRESULT(0)
        }
        WM_CLOSE => {
            unsafe { close(window) };
            LRESULT(0)
        }
        WM_DESTROY => {
            if let Some(Some(id)) = with_host(|host| host.prompts.remove(&to_raw(window))) {
                send_event(AgentEvent::PromptClosed(id));
            }
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(window, message, wparam, lparam) },
    }
}

unsafe extern "system" fn edit_proc(
    window: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
    _subclass: usize,
    _data: usize,
) -> LRESULT {
    match message {
        WM_CHAR => {
            let keystroke = char::from_u32(wparam.0 as u32)
                .map(classify_char)
                .unwrap_or(Keystroke::Insert);
            match keystroke {
                Keystroke::Reject => return LRESULT(0),
                Keystroke::Submit => {
                    if let Ok(parent) = unsafe { GetParent(window) } {
                        unsafe { submit(parent) };
                    }
                    return LRESULT(0);
                }
                Keystroke::Insert => {}
            }
        }
        WM_NCDESTROY => {
            let _ = unsafe { RemoveWindowSubclass(window, Some(edit_proc), EDIT_SUBCLASS_ID) };
        }
        _ => {}
    }
    unsafe { DefSubclassProc(window, message, wparam, lparam) }
}
