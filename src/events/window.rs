use serde::{Deserialize, Serialize};
use std::fmt;

/// Непрозрачный дескриптор окна. Может стать недействительным в любой момент
/// (окно закрыто), поэтому перед действиями всегда выполняется ревалидация.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowHandle(pub u64);

impl WindowHandle {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hwnd:{}", self.0)
    }
}

/// Состояние окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
}

/// Координаты-сентинел, которыми система отмечает свёрнутые/полноэкранные окна
pub const ICONIC_SENTINEL: (i32, i32) = (-32000, -32000);

/// Информация об окне
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub handle: WindowHandle,
    pub title: String,
    pub class_name: String,
    pub process_id: u32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub state: WindowState,
    pub is_visible: bool,
}

impl WindowInfo {
    /// Окно в «полноэкранном» стиле: позиция совпадает с сентинелом системы
    pub fn is_fullscreen_style(&self) -> bool {
        (self.x, self.y) == ICONIC_SENTINEL
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.handle, self.title)
    }
}

/// Информация о мониторе
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorInfo {
    pub handle: u64,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub is_primary: bool,
}

impl MonitorInfo {
    /// Границы монитора (x, y, right, bottom)
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        (self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        let (left, top, right, bottom) = self.bounds();
        left <= x && x < right && top <= y && y < bottom
    }
}
