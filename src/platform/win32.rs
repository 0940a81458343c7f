use crate::error::{DeskpinError, Result};
use crate::events::{MonitorInfo, WindowHandle, WindowInfo, WindowState};
use tracing::{debug, info, warn};
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetForegroundWindow, GetWindowRect, GetWindowTextW,
    GetWindowThreadProcessId, IsIconic, IsWindow, IsWindowVisible, IsZoomed, SetForegroundWindow,
    SetWindowPos, ShowWindow, SHOW_WINDOW_CMD, SWP_NOZORDER, SW_HIDE, SW_MAXIMIZE, SW_MINIMIZE,
    SW_RESTORE, SW_SHOW,
};

use super::r#trait::{ShowCommand, WindowApi};

const MONITORINFOF_PRIMARY: u32 = 1;

/// Реальный бэкенд поверх Win32 API
pub struct Win32WindowApi;

impl Win32WindowApi {
    pub fn new() -> Result<Self> {
        let api = Self;

        // Проверка доступности возможности при старте: пустой список мониторов
        // означает полуинициализированную среду, в которой запускаться нельзя
        let monitors = api.monitors()?;
        if monitors.is_empty() {
            return Err(DeskpinError::CapabilityUnavailable(
                "Перечисление мониторов вернуло пустой список".to_string(),
            ));
        }

        info!("Win32 бэкенд инициализирован, мониторов: {}", monitors.len());
        Ok(api)
    }

    fn hwnd(handle: WindowHandle) -> HWND {
        HWND(handle.0 as usize as *mut core::ffi::c_void)
    }

    fn handle_of(hwnd: HWND) -> WindowHandle {
        WindowHandle(hwnd.0 as usize as u64)
    }

    fn show_command(command: ShowCommand) -> SHOW_WINDOW_CMD {
        match command {
            ShowCommand::Hide => SW_HIDE,
            ShowCommand::Show => SW_SHOW,
            ShowCommand::Restore => SW_RESTORE,
            ShowCommand::Minimize => SW_MINIMIZE,
            ShowCommand::Maximize => SW_MAXIMIZE,
        }
    }
}

unsafe extern "system" fn enum_windows_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let handles = &mut *(lparam.0 as *mut Vec<WindowHandle>);
    handles.push(Win32WindowApi::handle_of(hwnd));
    true.into()
}

unsafe extern "system" fn enum_monitors_proc(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _rect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let monitors = &mut *(lparam.0 as *mut Vec<MonitorInfo>);

    let mut info = MONITORINFO {
        cbSize: std::mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };

    if GetMonitorInfoW(hmonitor, &mut info).as_bool() {
        let rect = info.rcMonitor;
        monitors.push(MonitorInfo {
            handle: hmonitor.0 as usize as u64,
            x: rect.left,
            y: rect.top,
            width: rect.right - rect.left,
            height: rect.bottom - rect.top,
            is_primary: info.dwFlags & MONITORINFOF_PRIMARY != 0,
        });
    } else {
        warn!("Не удалось получить информацию о мониторе {:?}", hmonitor);
    }

    true.into()
}

impl WindowApi for Win32WindowApi {
    fn enum_windows(&self) -> Result<Vec<WindowHandle>> {
        let mut handles: Vec<WindowHandle> = Vec::new();
        unsafe {
            EnumWindows(
                Some(enum_windows_proc),
                LPARAM(&mut handles as *mut Vec<WindowHandle> as isize),
            )
            .map_err(|e| {
                DeskpinError::CapabilityUnavailable(format!("EnumWindows не удался: {}", e))
            })?;
        }
        Ok(handles)
    }

    fn window_info(&self, handle: WindowHandle) -> Option<WindowInfo> {
        let hwnd = Self::hwnd(handle);
        unsafe {
            if !IsWindow(hwnd).as_bool() {
                return None;
            }

            let mut title_buf = [0u16; 512];
            let title_len = GetWindowTextW(hwnd, &mut title_buf) as usize;
            let title = String::from_utf16_lossy(&title_buf[..title_len]);

            let mut class_buf = [0u16; 256];
            let class_len = GetClassNameW(hwnd, &mut class_buf) as usize;
            let class_name = String::from_utf16_lossy(&class_buf[..class_len]);

            let mut process_id = 0u32;
            GetWindowThreadProcessId(hwnd, Some(&mut process_id));

            let mut rect = RECT::default();
            if GetWindowRect(hwnd, &mut rect).is_err() {
                debug!("GetWindowRect не удался для {}", handle);
                return None;
            }

            let state = if IsIconic(hwnd).as_bool() {
                WindowState::Minimized
            } else if IsZoomed(hwnd).as_bool() {
                WindowState::Maximized
            } else {
                WindowState::Normal
            };

            Some(WindowInfo {
                handle,
                title,
                class_name,
                process_id,
                x: rect.left,
                y: rect.top,
                width: rect.right - rect.left,
                height: rect.bottom - rect.top,
                state,
                is_visible: IsWindowVisible(hwnd).as_bool(),
            })
        }
    }

    fn is_window_valid(&self, handle: WindowHandle) -> bool {
        unsafe { IsWindow(Self::hwnd(handle)).as_bool() }
    }

    fn show_window(&self, handle: WindowHandle, command: ShowCommand) -> bool {
        // ShowWindow возвращает прежнее состояние видимости, а не успех,
        // поэтому успехом считаем сохранившуюся действительность дескриптора
        unsafe {
            let _ = ShowWindow(Self::hwnd(handle), Self::show_command(command));
            IsWindow(Self::hwnd(handle)).as_bool()
        }
    }

    fn set_foreground(&self, handle: WindowHandle) -> bool {
        unsafe { SetForegroundWindow(Self::hwnd(handle)).as_bool() }
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            None
        } else {
            Some(Self::handle_of(hwnd))
        }
    }

    fn set_window_pos(
        &self,
        handle: WindowHandle,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> bool {
        unsafe {
            SetWindowPos(Self::hwnd(handle), HWND::default(), x, y, width, height, SWP_NOZORDER)
                .is_ok()
        }
    }

    fn monitors(&self) -> Result<Vec<MonitorInfo>> {
        let mut monitors: Vec<MonitorInfo> = Vec::new();
        let ok = unsafe {
            EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(enum_monitors_proc),
                LPARAM(&mut monitors as *mut Vec<MonitorInfo> as isize),
            )
        };

        if !ok.as_bool() {
            return Err(DeskpinError::CapabilityUnavailable(
                "EnumDisplayMonitors не удался".to_string(),
            ));
        }
        Ok(monitors)
    }
}
