use crate::error::Result;
use crate::events::{MonitorInfo, WindowHandle, WindowInfo, WindowState};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use super::r#trait::{ApiCall, ShowCommand, WindowApi};

/// Бэкенд-эмуляция: окна и мониторы живут в памяти, все обращения
/// журналируются. Используется в режиме --dry-run и в тестах сервисов.
pub struct DryRunWindowApi {
    windows: RwLock<Vec<WindowInfo>>,
    monitors: RwLock<Vec<MonitorInfo>>,
    foreground: RwLock<Option<WindowHandle>>,
    calls: RwLock<Vec<ApiCall>>,
    deny_foreground: AtomicBool,
}

impl DryRunWindowApi {
    pub fn new() -> Self {
        Self {
            windows: RwLock::new(Vec::new()),
            monitors: RwLock::new(vec![MonitorInfo {
                handle: 1,
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
                is_primary: true,
            }]),
            foreground: RwLock::new(None),
            calls: RwLock::new(Vec::new()),
            deny_foreground: AtomicBool::new(false),
        }
    }

    /// Эмуляция с набором правдоподобных окон для режима --dry-run
    pub fn with_demo_windows() -> Self {
        let api = Self::new();
        let demo = [
            (101, "Terminal - dry_run", "ConsoleWindowClass"),
            (102, "Browser - dry_run", "Chrome_WidgetWin_1"),
            (103, "Editor - dry_run", "Notepad"),
        ];
        for (handle, title, class_name) in demo {
            api.add_window(WindowInfo {
                handle: WindowHandle(handle),
                title: title.to_string(),
                class_name: class_name.to_string(),
                process_id: handle as u32,
                x: 100,
                y: 100,
                width: 800,
                height: 600,
                state: WindowState::Normal,
                is_visible: true,
            });
        }
        api
    }

    pub fn add_window(&self, info: WindowInfo) {
        self.windows.write().push(info);
    }

    pub fn remove_window(&self, handle: WindowHandle) {
        self.windows.write().retain(|w| w.handle != handle);
    }

    pub fn add_monitor(&self, monitor: MonitorInfo) {
        self.monitors.write().push(monitor);
    }

    pub fn set_monitors(&self, monitors: Vec<MonitorInfo>) {
        *self.monitors.write() = monitors;
    }

    pub fn focus(&self, handle: WindowHandle) {
        *self.foreground.write() = Some(handle);
    }

    /// Эмулировать запрет активации политикой фокуса
    pub fn set_deny_foreground(&self, deny: bool) {
        self.deny_foreground.store(deny, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.read().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.write().clear();
    }

    fn record(&self, call: ApiCall) {
        debug!("Dry-run: обращение к API: {:?}", call);
        self.calls.write().push(call);
    }
}

impl Default for DryRunWindowApi {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowApi for DryRunWindowApi {
    fn enum_windows(&self) -> Result<Vec<WindowHandle>> {
        Ok(self.windows.read().iter().map(|w| w.handle).collect())
    }

    fn window_info(&self, handle: WindowHandle) -> Option<WindowInfo> {
        self.windows.read().iter().find(|w| w.handle == handle).cloned()
    }

    fn is_window_valid(&self, handle: WindowHandle) -> bool {
        self.windows.read().iter().any(|w| w.handle == handle)
    }

    fn show_window(&self, handle: WindowHandle, command: ShowCommand) -> bool {
        self.record(ApiCall::Show(handle, command));

        let mut windows = self.windows.write();
        let Some(window) = windows.iter_mut().find(|w| w.handle == handle) else {
            return false;
        };

        match command {
            ShowCommand::Hide => window.is_visible = false,
            ShowCommand::Show => window.is_visible = true,
            ShowCommand::Restore => {
                window.is_visible = true;
                window.state = WindowState::Normal;
            }
            ShowCommand::Minimize => window.state = WindowState::Minimized,
            ShowCommand::Maximize => {
                window.is_visible = true;
                window.state = WindowState::Maximized;
            }
        }
        true
    }

    fn set_foreground(&self, handle: WindowHandle) -> bool {
        self.record(ApiCall::Foreground(handle));

        if self.deny_foreground.load(Ordering::SeqCst) {
            return false;
        }
        if !self.is_window_valid(handle) {
            return false;
        }
        *self.foreground.write() = Some(handle);
        true
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        *self.foreground.read()
    }

    fn set_window_pos(
        &self,
        handle: WindowHandle,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> bool {
        self.record(ApiCall::SetPos(handle, x, y, width, height));

        let mut windows = self.windows.write();
        let Some(window) = windows.iter_mut().find(|w| w.handle == handle) else {
            return false;
        };
        window.x = x;
        window.y = y;
        window.width = width;
        window.height = height;
        true
    }

    fn monitors(&self) -> Result<Vec<MonitorInfo>> {
        Ok(self.monitors.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(handle: u64, title: &str) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle(handle),
            title: title.to_string(),
            class_name: "Test".to_string(),
            process_id: 1,
            x: 0,
            y: 0,
            width: 100,
            height: 100,
            state: WindowState::Normal,
            is_visible: true,
        }
    }

    #[test]
    fn test_show_commands_mutate_state() {
        let api = DryRunWindowApi::new();
        api.add_window(window(1, "a"));

        assert!(api.show_window(WindowHandle(1), ShowCommand::Hide));
        assert!(!api.window_info(WindowHandle(1)).unwrap().is_visible);

        assert!(api.show_window(WindowHandle(1), ShowCommand::Maximize));
        let info = api.window_info(WindowHandle(1)).unwrap();
        assert!(info.is_visible);
        assert_eq!(info.state, WindowState::Maximized);
    }

    #[test]
    fn test_invalid_handle_reports_failure() {
        let api = DryRunWindowApi::new();
        assert!(!api.show_window(WindowHandle(42), ShowCommand::Show));
        assert!(!api.set_foreground(WindowHandle(42)));
        assert!(api.window_info(WindowHandle(42)).is_none());
    }

    #[test]
    fn test_foreground_denial() {
        let api = DryRunWindowApi::new();
        api.add_window(window(1, "a"));
        api.set_deny_foreground(true);

        assert!(!api.set_foreground(WindowHandle(1)));
        assert_eq!(api.foreground_window(), None);
    }

    #[test]
    fn test_calls_are_recorded() {
        let api = DryRunWindowApi::new();
        api.add_window(window(1, "a"));
        api.show_window(WindowHandle(1), ShowCommand::Hide);
        api.set_foreground(WindowHandle(1));

        assert_eq!(
            api.calls(),
            vec![
                ApiCall::Show(WindowHandle(1), ShowCommand::Hide),
                ApiCall::Foreground(WindowHandle(1)),
            ]
        );
    }
}
