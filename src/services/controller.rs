use crate::config::Config;
use crate::error::{DeskpinError, Result};
use crate::events::{GestureEvent, GestureKind};
use crate::platform::WindowApi;
use crate::services::{DesktopIdentityTracker, MonitorWatcher, PinRegistry, ReassertEngine};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Снимок состояния для команд статуса
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    pub enabled: bool,
    pub hotkey_enabled: bool,
    pub pinned_count: usize,
    pub target_monitor: usize,
    pub watched_windows: usize,
}

/// Контроллер переключения столов.
///
/// Единственная точка, где жесты превращаются в действия над окнами.
/// Эпизод обработки не реентерабелен: жест, пришедший во время активного
/// эпизода, отбрасывается (не ставится в очередь). Флаг enabled гасит
/// обработку целиком, не останавливая слушатель ввода.
pub struct DesktopSwitchController {
    config: Arc<Config>,
    api: Arc<dyn WindowApi>,
    identity: Arc<DesktopIdentityTracker>,
    engine: Arc<ReassertEngine>,
    registry: Arc<PinRegistry>,
    watcher: Option<Arc<MonitorWatcher>>,
    enabled: AtomicBool,
    // Отдельный переключатель реакции на горячие клавиши: выключенные хоткеи
    // не трогают остальной движок (наблюдатель, статус, реестр)
    hotkey_enabled: AtomicBool,
    target_monitor: Arc<AtomicUsize>,
    // Консультативный замок эпизода: try_lock, без ожидания
    episode: Mutex<()>,
}

impl DesktopSwitchController {
    pub fn new(
        config: Arc<Config>,
        api: Arc<dyn WindowApi>,
        identity: Arc<DesktopIdentityTracker>,
        engine: Arc<ReassertEngine>,
        registry: Arc<PinRegistry>,
        watcher: Option<Arc<MonitorWatcher>>,
        target_monitor: Arc<AtomicUsize>,
    ) -> Self {
        let enabled = config.app.enabled;
        let hotkey_enabled = config.hotkey.enabled;
        Self {
            config,
            api,
            identity,
            engine,
            registry,
            watcher,
            enabled: AtomicBool::new(enabled),
            hotkey_enabled: AtomicBool::new(hotkey_enabled),
            target_monitor,
            episode: Mutex::new(()),
        }
    }

    /// Запустить обработку жеста в отдельной задаче, не блокируя слушатель
    pub fn dispatch(self: &Arc<Self>, event: GestureEvent) {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.handle(event.kind).await;
        });
    }

    /// Обработать жест. Выключенное состояние и занятый эпизод - тихие no-op.
    pub async fn handle(&self, kind: GestureKind) {
        if !self.enabled.load(Ordering::SeqCst) {
            debug!("Обработка выключена, жест {} пропущен", kind);
            return;
        }

        if !self.hotkey_enabled.load(Ordering::SeqCst) {
            debug!("Горячие клавиши выключены, жест {} пропущен", kind);
            return;
        }

        let Ok(_guard) = self.episode.try_lock() else {
            debug!("Эпизод уже идёт, жест {} отброшен", kind);
            return;
        };

        match kind {
            GestureKind::SwitchLeft | GestureKind::SwitchRight => {
                self.handle_switch(kind).await;
            }
            GestureKind::SwitchDown => {
                // Немедленное утверждение без паузы и без сверки отпечатка
                let moved = self.engine.reassert_pinned().await;
                info!("Немедленное утверждение по {}: окон {}", kind, moved);
                self.identity.refresh();
            }
            GestureKind::CenterFocused => {
                if !self.engine.center_focused().await {
                    warn!("Центрирование активного окна не выполнено");
                }
            }
        }
    }

    /// Эпизод переключения: дождаться окончания анимации, подтвердить смену
    /// стола отпечатком и только тогда утверждать закреплённые окна
    async fn handle_switch(&self, kind: GestureKind) {
        tokio::time::sleep(self.config.settle_delay()).await;

        if !self.identity.confirm_switch() {
            debug!("Отпечаток не изменился, жест {} без последствий", kind);
            return;
        }

        let moved = self.engine.reassert_pinned().await;
        info!("Переключение {} подтверждено, утверждено окон: {}", kind, moved);
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
        info!("Обработка жестов включена");
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        info!("Обработка жестов выключена");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Переключить реакцию на горячие клавиши, не трогая движок целиком
    pub fn set_hotkey_enabled(&self, enabled: bool) {
        self.hotkey_enabled.store(enabled, Ordering::SeqCst);
        info!(
            "Реакция на горячие клавиши {}",
            if enabled { "включена" } else { "выключена" }
        );
    }

    /// Сменить целевой монитор; индекс проверяется по текущему списку
    pub fn set_target_monitor(&self, index: usize) -> Result<()> {
        let monitors = self.api.monitors()?;
        if index >= monitors.len() {
            return Err(DeskpinError::Internal(format!(
                "монитор {} не существует (всего {})",
                index,
                monitors.len()
            )));
        }
        self.target_monitor.store(index, Ordering::SeqCst);
        info!("Целевой монитор: {}", index);
        Ok(())
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            enabled: self.is_enabled(),
            hotkey_enabled: self.hotkey_enabled.load(Ordering::SeqCst),
            pinned_count: self.registry.len(),
            target_monitor: self.target_monitor.load(Ordering::SeqCst),
            watched_windows: self.watcher.as_ref().map_or(0, |w| w.snapshot_len()),
        }
    }
}
