use crate::config::Config;
use crate::error::Result;
use crate::services::DesktopSwitchController;
use std::sync::Arc;

/// Trait for hotkey listeners that can run in different modes
#[async_trait::async_trait]
pub trait HotkeyListenerTrait {
    /// Run the hotkey listener
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function to create an appropriate hotkey listener based on the dry_run flag
pub fn create_hotkey_listener(
    config: Arc<Config>,
    controller: Arc<DesktopSwitchController>,
    dry_run: bool,
) -> Result<Box<dyn HotkeyListenerTrait + Send>> {
    if dry_run {
        return Ok(Box::new(super::dry_run::DryRunHotkeyListener::new(
            config, controller,
        )?));
    }

    #[cfg(windows)]
    {
        Ok(Box::new(super::listener::RealHotkeyListener::new(
            config, controller,
        )?))
    }
    #[cfg(not(windows))]
    {
        Err(crate::error::DeskpinError::CapabilityUnavailable(
            "Низкоуровневый хук клавиатуры доступен только в Windows; используйте --dry-run"
                .to_string(),
        ))
    }
}
