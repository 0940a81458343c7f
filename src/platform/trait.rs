use crate::error::Result;
use crate::events::{MonitorInfo, WindowHandle, WindowInfo};
use std::fmt;
use std::sync::Arc;

/// Команда изменения состояния показа окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowCommand {
    Hide,
    Show,
    Restore,
    Minimize,
    Maximize,
}

impl fmt::Display for ShowCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Запись об обращении к API (используется dry-run бэкендом и тестами)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCall {
    Show(WindowHandle, ShowCommand),
    Foreground(WindowHandle),
    SetPos(WindowHandle, i32, i32, i32, i32),
}

/// Trait for the window/monitor capability backends
pub trait WindowApi: Send + Sync {
    /// Дескрипторы всех верхнеуровневых окон в порядке перечисления системы
    fn enum_windows(&self) -> Result<Vec<WindowHandle>>;

    /// Информация об окне; None если дескриптор уже недействителен
    fn window_info(&self, handle: WindowHandle) -> Option<WindowInfo>;

    fn is_window_valid(&self, handle: WindowHandle) -> bool;

    /// false означает отказ системы; не повторяется в рамках эпизода
    fn show_window(&self, handle: WindowHandle, command: ShowCommand) -> bool;

    /// Активация может быть запрещена политикой фокуса - это не ошибка
    fn set_foreground(&self, handle: WindowHandle) -> bool;

    fn foreground_window(&self) -> Option<WindowHandle>;

    fn set_window_pos(&self, handle: WindowHandle, x: i32, y: i32, width: i32, height: i32)
        -> bool;

    fn monitors(&self) -> Result<Vec<MonitorInfo>>;
}

/// Factory function to create an appropriate backend based on the dry_run flag
pub fn create_window_api(dry_run: bool) -> Result<Arc<dyn WindowApi>> {
    if dry_run {
        return Ok(Arc::new(super::dry_run::DryRunWindowApi::with_demo_windows()));
    }

    #[cfg(windows)]
    {
        Ok(Arc::new(super::win32::Win32WindowApi::new()?))
    }

    #[cfg(not(windows))]
    {
        Err(crate::error::DeskpinError::CapabilityUnavailable(
            "Win32 бэкенд окон доступен только под Windows; используйте --dry-run".to_string(),
        ))
    }
}
