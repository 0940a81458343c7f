mod dry_run;
#[cfg(windows)]
mod listener;
mod r#trait;

pub use self::r#trait::{create_hotkey_listener, HotkeyListenerTrait};
