//! Platform capability layer: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for talking to the
//! operating system: enumerating top-level windows and monitors, reading
//! window state, changing show-state/position/foreground, and delivering raw
//! keyboard events from the low-level hook. It MUST NOT contain any business
//! logic related to gestures, fingerprints or pinned windows. All decisions
//! are made by the services layer through the `WindowApi` trait.
//!
//! Hard dependency documented here: the keyboard hook delivers callbacks on a
//! single dedicated thread, so raw key events arrive strictly serialized.

mod dry_run;
mod r#trait;
pub mod vk_keys;

#[cfg(windows)]
mod input;
#[cfg(windows)]
mod win32;

pub use self::dry_run::DryRunWindowApi;
pub use self::r#trait::{create_window_api, ApiCall, ShowCommand, WindowApi};

#[cfg(windows)]
pub use self::input::KeyboardHook;
