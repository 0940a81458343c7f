use crate::config::Config;
use crate::events::{WindowInfo, WindowState, ICONIC_SENTINEL};
use crate::platform::WindowApi;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::desktop_identity::is_shell_window;

/// Фоновый наблюдатель за целевым (дополнительным) монитором.
///
/// Периодически перечисляет окна и поддерживает снимок тех, что отнесены к
/// целевому монитору. Снимок - консультативные данные для статуса и выбора
/// окон; никаких действий над окнами наблюдатель не совершает. Остановка
/// прерывает ожидание между опросами, а не дожидается его конца.
pub struct MonitorWatcher {
    config: Arc<Config>,
    api: Arc<dyn WindowApi>,
    target_monitor: Arc<AtomicUsize>,
    snapshot: DashMap<u64, WindowInfo>,
    stop_tx: watch::Sender<bool>,
}

impl MonitorWatcher {
    pub fn new(
        config: Arc<Config>,
        api: Arc<dyn WindowApi>,
        target_monitor: Arc<AtomicUsize>,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            config,
            api,
            target_monitor,
            snapshot: DashMap::new(),
            stop_tx,
        }
    }

    /// Запустить цикл опроса в отдельной задаче
    pub fn run(self: &Arc<Self>) -> JoinHandle<()> {
        let watcher = Arc::clone(self);
        let mut stop_rx = self.stop_tx.subscribe();
        let interval = self.config.poll_interval();

        tokio::spawn(async move {
            info!(
                "Наблюдатель монитора запущен, интервал {} мс",
                interval.as_millis()
            );
            loop {
                // Новый подписчик считает текущее значение уже увиденным,
                // поэтому остановка до запуска проверяется здесь, а не
                // через changed()
                if *stop_rx.borrow() {
                    break;
                }

                watcher.poll_once();

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop_rx.changed() => {}
                }
            }
            info!("Наблюдатель монитора остановлен");
        })
    }

    /// Остановить цикл; повторные вызовы безвредны
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Один проход опроса: пересобрать снимок окон целевого монитора
    pub fn poll_once(&self) {
        let monitors = match self.api.monitors() {
            Ok(monitors) => monitors,
            Err(e) => {
                warn!("Перечисление мониторов не удалось: {}", e);
                return;
            }
        };

        let index = self.target_monitor.load(Ordering::SeqCst);
        let Some(target) = monitors.get(index) else {
            debug!("Целевой монитор {} отсутствует (всего {})", index, monitors.len());
            self.snapshot.clear();
            return;
        };

        let handles = match self.api.enum_windows() {
            Ok(handles) => handles,
            Err(e) => {
                warn!("Перечисление окон не удалось: {}", e);
                return;
            }
        };

        let current: Vec<WindowInfo> = handles
            .into_iter()
            .filter_map(|h| self.api.window_info(h))
            .filter(|info| self.config.matches_window_filters(&info.title))
            .filter(|info| Self::belongs_to_monitor(info, target))
            .collect();

        let keep: std::collections::HashSet<u64> =
            current.iter().map(|info| info.handle.value()).collect();
        self.snapshot.retain(|k, _| keep.contains(k));
        for info in current {
            self.snapshot.insert(info.handle.value(), info);
        }

        debug!("Окон на целевом мониторе: {}", self.snapshot.len());
    }

    /// Окно относится к монитору, если его центр внутри границ монитора.
    /// Окно в служебной позиции свёрнутости, не будучи свёрнутым, считается
    /// временно вытесненным с целевого монитора и тоже учитывается.
    fn belongs_to_monitor(info: &WindowInfo, monitor: &crate::events::MonitorInfo) -> bool {
        if !info.is_visible || info.title.trim().is_empty() || is_shell_window(&info.title) {
            return false;
        }

        if (info.x, info.y) == ICONIC_SENTINEL {
            return info.state != WindowState::Minimized;
        }

        monitor.contains_point(info.x + info.width / 2, info.y + info.height / 2)
    }

    pub fn snapshot_len(&self) -> usize {
        self.snapshot.len()
    }

    /// Копия текущего снимка
    pub fn snapshot(&self) -> Vec<WindowInfo> {
        let mut windows: Vec<WindowInfo> =
            self.snapshot.iter().map(|e| e.value().clone()).collect();
        windows.sort_by_key(|w| w.handle);
        windows
    }
}
