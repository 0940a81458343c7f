pub mod controller;
pub mod desktop_identity;
pub mod gesture;
pub mod hotkey_listener;
pub mod key_state;
pub mod monitor_watch;
pub mod pin_registry;
pub mod reassert;

pub use controller::{ControllerStatus, DesktopSwitchController};
pub use desktop_identity::{DesktopFingerprint, DesktopIdentityTracker};
pub use gesture::GestureRecognizer;
pub use hotkey_listener::create_hotkey_listener;
pub use key_state::KeyStateTracker;
pub use monitor_watch::MonitorWatcher;
pub use pin_registry::{PinRegistry, PinnedWindowEntry, SelectionCandidate};
pub use reassert::ReassertEngine;
