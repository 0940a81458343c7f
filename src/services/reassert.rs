use crate::config::Config;
use crate::events::{WindowHandle, WindowState};
use crate::platform::{ShowCommand, WindowApi};
use crate::services::PinRegistry;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

// Паузы между шагами - эмпирически необходимые точки успокоения композитора.
// Это жёсткий контракт стратегии, а не предмет настройки.
const FULLSCREEN_STEP_PAUSE: Duration = Duration::from_millis(200);
const NORMAL_STEP_PAUSE: Duration = Duration::from_millis(100);

/// Движок повторного утверждения окон.
///
/// Перемещение окна между рабочими столами системой не предоставляется,
/// поэтому окно "перетаскивается" на текущий стол операциями, доступными на
/// нём: показать/скрыть/восстановить и активация. Все отказы по отдельным
/// окнам локализуются здесь и сводятся в счётчик успехов; наружу не уходит
/// ни одного исключения из-за единичного окна.
pub struct ReassertEngine {
    config: Arc<Config>,
    api: Arc<dyn WindowApi>,
    registry: Arc<PinRegistry>,
}

impl ReassertEngine {
    pub fn new(config: Arc<Config>, api: Arc<dyn WindowApi>, registry: Arc<PinRegistry>) -> Self {
        Self {
            config,
            api,
            registry,
        }
    }

    /// Повторно утвердить все закреплённые окна на текущем столе.
    /// Возвращает число окон, чья стратегия завершилась без отказов системы.
    pub async fn reassert_pinned(&self) -> usize {
        let handles = self.registry.handles();
        if handles.is_empty() {
            debug!("Закреплённых окон нет, утверждать нечего");
            return 0;
        }

        info!("Повторное утверждение {} закреплённых окон", handles.len());
        self.reassert(&handles).await
    }

    /// Повторно утвердить перечисленные окна; протухшие дескрипторы
    /// вычищаются из реестра и не считаются ошибками
    pub async fn reassert(&self, handles: &[WindowHandle]) -> usize {
        let mut moved = 0usize;
        let mut stale: Vec<WindowHandle> = Vec::new();

        for &handle in handles {
            if !self.api.is_window_valid(handle) {
                debug!("Дескриптор недействителен, пропуск: {}", handle);
                stale.push(handle);
                continue;
            }

            let Some(info) = self.api.window_info(handle) else {
                stale.push(handle);
                continue;
            };

            let ok = if info.is_fullscreen_style() {
                debug!("Утверждение полноэкранного окна: {}", info);
                self.reassert_fullscreen(handle).await
            } else {
                debug!("Утверждение обычного окна: {}", info);
                self.reassert_normal(handle).await
            };

            if ok {
                moved += 1;
            } else {
                warn!("Окно не утверждено (отказ системы): {}", handle);
            }
        }

        self.registry.prune(&stale);

        info!("Утверждено окон: {} из {}", moved, handles.len());
        moved
    }

    /// Полноэкранная стратегия: восстановить, активировать, снова развернуть
    async fn reassert_fullscreen(&self, handle: WindowHandle) -> bool {
        let mut ok = self.api.show_window(handle, ShowCommand::Restore);
        sleep(FULLSCREEN_STEP_PAUSE).await;

        // Активация может быть запрещена политикой фокуса - не ошибка
        if !self.api.set_foreground(handle) {
            debug!("Активация отклонена системой: {}", handle);
        }
        sleep(FULLSCREEN_STEP_PAUSE).await;

        ok &= self.api.show_window(handle, ShowCommand::Maximize);
        ok
    }

    /// Обычная стратегия: скрыть-показать заставляет менеджер окон заново
    /// оценить принадлежность столу, затем активация
    async fn reassert_normal(&self, handle: WindowHandle) -> bool {
        let mut ok = self.api.show_window(handle, ShowCommand::Hide);
        sleep(NORMAL_STEP_PAUSE).await;

        ok &= self.api.show_window(handle, ShowCommand::Show);

        if !self.api.set_foreground(handle) {
            debug!("Активация отклонена системой: {}", handle);
        }
        sleep(NORMAL_STEP_PAUSE).await;

        ok
    }

    /// Центрировать текущее активное окно на основном мониторе.
    /// Отрицательные координаты принимаются как есть, без подрезки.
    pub async fn center_focused(&self) -> bool {
        let Some(handle) = self.api.foreground_window() else {
            debug!("Активного окна нет, центрировать нечего");
            return false;
        };

        let Some(info) = self.api.window_info(handle) else {
            return false;
        };

        let monitors = match self.api.monitors() {
            Ok(monitors) => monitors,
            Err(e) => {
                warn!("Перечисление мониторов не удалось: {}", e);
                return false;
            }
        };
        let Some(primary) = monitors.iter().find(|m| m.is_primary).or(monitors.first()) else {
            warn!("Основной монитор не найден");
            return false;
        };

        if info.state == WindowState::Minimized {
            self.api.show_window(handle, ShowCommand::Restore);
            sleep(NORMAL_STEP_PAUSE).await;
        }

        let width = self.config.center.width;
        let height = self.config.center.height;
        let x = primary.x + (primary.width - width) / 2;
        let y = primary.y + (primary.height - height) / 2;

        info!("Центрирование окна {} в ({}, {}) {}x{}", handle, x, y, width, height);
        self.api.set_window_pos(handle, x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{WindowInfo, WindowState};
    use crate::platform::{ApiCall, DryRunWindowApi};

    fn window(handle: u64, title: &str, x: i32, y: i32) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle(handle),
            title: title.to_string(),
            class_name: "Test".to_string(),
            process_id: 1,
            x,
            y,
            width: 800,
            height: 600,
            state: WindowState::Normal,
            is_visible: true,
        }
    }

    fn engine_with(api: Arc<DryRunWindowApi>) -> ReassertEngine {
        let path = std::env::temp_dir().join(format!(
            "deskpin-reassert-{}-{:?}.json",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_file(&path);
        let registry = Arc::new(PinRegistry::load(path));
        ReassertEngine::new(Arc::new(Config::default()), api, registry)
    }

    #[tokio::test(start_paused = true)]
    async fn test_normal_strategy_hide_show_foreground() {
        let api = Arc::new(DryRunWindowApi::new());
        api.add_window(window(1, "normal", 100, 100));
        let engine = engine_with(api.clone());

        let moved = engine.reassert(&[WindowHandle(1)]).await;
        assert_eq!(moved, 1);
        assert_eq!(
            api.calls(),
            vec![
                ApiCall::Show(WindowHandle(1), ShowCommand::Hide),
                ApiCall::Show(WindowHandle(1), ShowCommand::Show),
                ApiCall::Foreground(WindowHandle(1)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fullscreen_strategy_restore_foreground_maximize() {
        let api = Arc::new(DryRunWindowApi::new());
        api.add_window(window(2, "full", -32000, -32000));
        let engine = engine_with(api.clone());

        let moved = engine.reassert(&[WindowHandle(2)]).await;
        assert_eq!(moved, 1);
        assert_eq!(
            api.calls(),
            vec![
                ApiCall::Show(WindowHandle(2), ShowCommand::Restore),
                ApiCall::Foreground(WindowHandle(2)),
                ApiCall::Show(WindowHandle(2), ShowCommand::Maximize),
            ]
        );
        assert_eq!(
            api.window_info(WindowHandle(2)).unwrap().state,
            WindowState::Maximized
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_handle_pruned_and_not_counted() {
        let api = Arc::new(DryRunWindowApi::new());
        api.add_window(window(1, "alive", 0, 0));
        let engine = engine_with(api.clone());

        engine.registry.pin(api.as_ref(), WindowHandle(1));
        // Второй дескриптор уже закрыт
        api.add_window(window(2, "doomed", 0, 0));
        engine.registry.pin(api.as_ref(), WindowHandle(2));
        api.remove_window(WindowHandle(2));

        let moved = engine.reassert_pinned().await;
        assert_eq!(moved, 1);
        assert_eq!(engine.registry.handles(), vec![WindowHandle(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_denial_still_counts() {
        let api = Arc::new(DryRunWindowApi::new());
        api.add_window(window(1, "normal", 0, 0));
        api.set_deny_foreground(true);
        let engine = engine_with(api.clone());

        // Отказ в активации не делает стратегию неуспешной
        assert_eq!(engine.reassert(&[WindowHandle(1)]).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_registry_is_noop() {
        let api = Arc::new(DryRunWindowApi::new());
        let engine = engine_with(api.clone());

        assert_eq!(engine.reassert_pinned().await, 0);
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_center_focused_math_no_clamp() {
        let api = Arc::new(DryRunWindowApi::new());
        api.add_window(window(5, "target", 50, 50));
        api.focus(WindowHandle(5));
        let engine = engine_with(api.clone());

        // (1920-1500)/2 = 210; (1080-1392)/2 = -156, принимается без подрезки
        assert!(engine.center_focused().await);
        assert!(api
            .calls()
            .contains(&ApiCall::SetPos(WindowHandle(5), 210, -156, 1500, 1392)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_center_restores_minimized_first() {
        let api = Arc::new(DryRunWindowApi::new());
        let mut w = window(6, "min", -32000, -32000);
        w.state = WindowState::Minimized;
        api.add_window(w);
        api.focus(WindowHandle(6));
        let engine = engine_with(api.clone());

        assert!(engine.center_focused().await);
        assert_eq!(
            api.calls()[0],
            ApiCall::Show(WindowHandle(6), ShowCommand::Restore)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_center_without_foreground_window() {
        let api = Arc::new(DryRunWindowApi::new());
        let engine = engine_with(api.clone());

        assert!(!engine.center_focused().await);
        assert!(api.calls().is_empty());
    }
}
