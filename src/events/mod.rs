pub mod keyboard;
pub mod window;

pub use keyboard::{GestureEvent, GestureKind, KeyState, RawKeyEvent};
pub use window::{MonitorInfo, WindowHandle, WindowInfo, WindowState, ICONIC_SENTINEL};
