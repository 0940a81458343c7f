use crate::config::Config;
use crate::error::Result;
use crate::events::KeyState;
use crate::platform::KeyboardHook;
use crate::services::{DesktopSwitchController, GestureRecognizer};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::r#trait::HotkeyListenerTrait;

pub struct RealHotkeyListener {
    config: Arc<Config>,
    controller: Arc<DesktopSwitchController>,
}

impl RealHotkeyListener {
    pub fn new(config: Arc<Config>, controller: Arc<DesktopSwitchController>) -> Result<Self> {
        info!("Инициализация RealHotkeyListener");
        Ok(Self { config, controller })
    }

    async fn run_impl(self) -> Result<()> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let hook = KeyboardHook::install(tx)?;
        info!("RealHotkeyListener запущен, читаем события хука");

        let mut recognizer =
            GestureRecognizer::new(self.config.repeat_suppress(), self.config.cooldown());

        // Колбэки хука сериализованы его потоком сообщений, поэтому
        // распознаватель живёт без блокировок прямо в этом цикле
        while let Some(event) = rx.recv().await {
            match event.state {
                KeyState::Pressed => {
                    debug!("Нажатие: {}", event.key);
                    if let Some(gesture) = recognizer.on_press(&event.key, event.timestamp) {
                        self.controller.dispatch(gesture);
                    }
                }
                KeyState::Released => {
                    recognizer.on_release(&event.key);
                }
            }
        }

        // Отправитель жив, пока жив поток хука: закрытие канала означает
        // его завершение
        warn!("Канал событий хука закрыт, слушатель завершается");
        recognizer.reset();
        hook.stop();
        Ok(())
    }
}

#[async_trait::async_trait]
impl HotkeyListenerTrait for RealHotkeyListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
