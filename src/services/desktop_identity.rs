use crate::events::WindowHandle;
use crate::platform::WindowApi;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Известные оконные заголовки оболочки, исключаемые из отпечатка
static SHELL_DENY_LIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "Program Manager",
        "Windows 입력 환경",
        "Desktop Window Manager",
    ])
});

pub fn is_shell_window(title: &str) -> bool {
    SHELL_DENY_LIST.contains(title)
}

/// Эвристический отпечаток "какие окна видны сейчас".
///
/// Два отпечатка равны только если совпало ограниченное подмножество видимых
/// окон. Это прокси идентичности рабочего стола, а не гарантированный ключ:
/// ложные совпадения и ложные отличия допустимы и обходятся без последствий.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DesktopFingerprint(u64);

impl fmt::Display for DesktopFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fp:{:016x}", self.0)
    }
}

/// Трекер идентичности рабочего стола.
///
/// Протокол: "до" жеста - это последний сохранённый отпечаток; после паузы
/// успокоения контроллер вызывает confirm_switch(), и только отличие нового
/// отпечатка от сохранённого объявляется реальным переключением. Никогда не
/// блокирует распознаватель: снятие отпечатка идёт после эмиссии жеста.
pub struct DesktopIdentityTracker {
    api: Arc<dyn WindowApi>,
    prefix: usize,
    last: Mutex<Option<DesktopFingerprint>>,
}

impl DesktopIdentityTracker {
    pub fn new(api: Arc<dyn WindowApi>, prefix: usize) -> Self {
        Self {
            api,
            prefix,
            last: Mutex::new(None),
        }
    }

    /// Снять отпечаток текущего набора видимых окон
    pub fn sample(&self) -> DesktopFingerprint {
        let handles = match self.api.enum_windows() {
            Ok(handles) => handles,
            Err(e) => {
                warn!("Перечисление окон для отпечатка не удалось: {}", e);
                return DesktopFingerprint(0);
            }
        };

        // Ограниченный префикс в порядке перечисления системы
        let mut prefix: SmallVec<[WindowHandle; 10]> = SmallVec::new();
        for handle in handles {
            if prefix.len() >= self.prefix {
                break;
            }
            let Some(info) = self.api.window_info(handle) else {
                continue;
            };
            if !info.is_visible || info.title.trim().is_empty() || is_shell_window(&info.title) {
                continue;
            }
            prefix.push(handle);
        }

        // Сортировка делает отпечаток независимым от порядка перечисления
        // для одного и того же подмножества
        prefix.sort_unstable();

        let mut acc: u64 = 0xcbf2_9ce4_8422_2325;
        for handle in &prefix {
            acc ^= handle.value();
            acc = acc.wrapping_mul(0x0000_0100_0000_01b3);
        }
        DesktopFingerprint(acc)
    }

    /// Снять новый отпечаток, сравнить с сохранённым и сохранить новый.
    /// true - отпечаток изменился, переключение стола считается реальным.
    pub fn confirm_switch(&self) -> bool {
        let current = self.sample();
        let mut last = self.last.lock();
        let changed = match *last {
            Some(previous) => previous != current,
            // Первый замер: базовая линия, переключение не объявляется
            None => false,
        };
        debug!(
            "Отпечаток стола: {} -> {} (изменился: {})",
            last.map(|f| f.to_string()).unwrap_or_else(|| "none".to_string()),
            current,
            changed
        );
        *last = Some(current);
        changed
    }

    /// Обновить базовую линию без сравнения (после немедленных повторных
    /// утверждений, чтобы следующий confirm_switch сравнивал с актуальной)
    pub fn refresh(&self) {
        *self.last.lock() = Some(self.sample());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{WindowInfo, WindowState};
    use crate::platform::DryRunWindowApi;

    fn window(handle: u64, title: &str, visible: bool) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle(handle),
            title: title.to_string(),
            class_name: "Test".to_string(),
            process_id: 1,
            x: 0,
            y: 0,
            width: 100,
            height: 100,
            state: WindowState::Normal,
            is_visible: visible,
        }
    }

    fn tracker_with(windows: &[(u64, &str, bool)]) -> (Arc<DryRunWindowApi>, DesktopIdentityTracker) {
        let api = Arc::new(DryRunWindowApi::new());
        for (h, title, visible) in windows {
            api.add_window(window(*h, title, *visible));
        }
        let tracker = DesktopIdentityTracker::new(api.clone(), 10);
        (api, tracker)
    }

    #[test]
    fn test_same_set_order_independent() {
        let (_, a) = tracker_with(&[(1, "a", true), (2, "b", true), (3, "c", true)]);
        let (_, b) = tracker_with(&[(3, "c", true), (1, "a", true), (2, "b", true)]);
        assert_eq!(a.sample(), b.sample());
    }

    #[test]
    fn test_different_prefix_differs() {
        let (_, a) = tracker_with(&[(1, "a", true), (2, "b", true)]);
        let (_, b) = tracker_with(&[(1, "a", true), (4, "d", true)]);
        assert_ne!(a.sample(), b.sample());
    }

    #[test]
    fn test_filters_invisible_untitled_and_shell() {
        let (_, filtered) = tracker_with(&[
            (1, "a", true),
            (2, "", true),
            (3, "   ", true),
            (4, "Program Manager", true),
            (5, "hidden", false),
        ]);
        let (_, clean) = tracker_with(&[(1, "a", true)]);
        assert_eq!(filtered.sample(), clean.sample());
    }

    #[test]
    fn test_bounded_prefix() {
        // Отличие за пределами префикса не меняет отпечаток
        let many: Vec<(u64, String)> = (1..=12).map(|i| (i, format!("w{}", i))).collect();
        let api_a = Arc::new(DryRunWindowApi::new());
        let api_b = Arc::new(DryRunWindowApi::new());
        for (h, title) in &many {
            api_a.add_window(window(*h, title, true));
            api_b.add_window(window(*h, title, true));
        }
        api_a.add_window(window(100, "extra-a", true));
        api_b.add_window(window(200, "extra-b", true));

        let a = DesktopIdentityTracker::new(api_a, 10);
        let b = DesktopIdentityTracker::new(api_b, 10);
        assert_eq!(a.sample(), b.sample());
    }

    #[test]
    fn test_confirm_switch_protocol() {
        let (api, tracker) = tracker_with(&[(1, "a", true)]);

        // Первый замер - базовая линия, не переключение
        assert!(!tracker.confirm_switch());
        // Без изменений набора - не переключение
        assert!(!tracker.confirm_switch());

        api.add_window(window(2, "b", true));
        assert!(tracker.confirm_switch());
        // Новая база сохранена
        assert!(!tracker.confirm_switch());
    }

    #[test]
    fn test_refresh_updates_baseline() {
        let (api, tracker) = tracker_with(&[(1, "a", true)]);
        tracker.confirm_switch();

        api.add_window(window(2, "b", true));
        tracker.refresh();
        // refresh уже учёл новое окно: отличий нет
        assert!(!tracker.confirm_switch());
    }
}
