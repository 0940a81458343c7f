use crate::config::Config;
use crate::error::Result;
use crate::services::{DesktopSwitchController, GestureRecognizer};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::r#trait::HotkeyListenerTrait;

// Сценарий эмуляции: полные хорды в разном порядке нажатия
const SCRIPTED_CHORDS: &[&[&str]] = &[
    &["win_l", "ctrl_l", "right"],
    &["ctrl_l", "win_l", "left"],
    &["win_l", "ctrl_l", "down"],
    &["win_l", "ctrl_l", "alt_l", "down"],
];

pub struct DryRunHotkeyListener {
    config: Arc<Config>,
    controller: Arc<DesktopSwitchController>,
}

impl DryRunHotkeyListener {
    pub fn new(config: Arc<Config>, controller: Arc<DesktopSwitchController>) -> Result<Self> {
        info!("Инициализация DryRunHotkeyListener");
        Ok(Self { config, controller })
    }

    async fn run_impl(self) -> Result<()> {
        info!("Dry-run режим - HotkeyListener работает в режиме эмуляции");

        let mut recognizer =
            GestureRecognizer::new(self.config.repeat_suppress(), self.config.cooldown());

        for chord in SCRIPTED_CHORDS.iter().cycle() {
            // Пауза больше кулдауна, чтобы сценарий не глотался дедупликацией
            tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

            debug!("Эмуляция хорды: {:?}", chord);
            for key in *chord {
                if let Some(event) = recognizer.on_press(key, Instant::now()) {
                    self.controller.dispatch(event);
                }
            }
            for key in *chord {
                recognizer.on_release(key);
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl HotkeyListenerTrait for DryRunHotkeyListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_chords_are_recognizable() {
        let config = Config::default();
        let mut recognizer = GestureRecognizer::new(config.repeat_suppress(), config.cooldown());

        // Каждая хорда сценария даёт ровно один жест
        for chord in SCRIPTED_CHORDS {
            let mut fired = 0;
            for key in *chord {
                if recognizer.on_press(key, Instant::now()).is_some() {
                    fired += 1;
                }
            }
            for key in *chord {
                recognizer.on_release(key);
            }
            recognizer.reset();
            assert_eq!(fired, 1, "хорда {:?}", chord);
        }
    }
}
