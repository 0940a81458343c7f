use crate::events::keyboard::{is_alt_key, is_ctrl_key, is_direction_key, is_win_key};
use crate::events::{GestureEvent, GestureKind};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::key_state::{KeyStateTracker, PressOutcome};

/// Распознаватель жестов: сопоставляет множество нажатых клавиш с таблицей
/// комбинаций и гарантирует не более одного события на физическое нажатие.
///
/// Выполняется синхронно в обработчике нажатия и не блокируется: никакого
/// ожидания и ввода-вывода. Вторая линия дедупликации работает ПОСЛЕ
/// сопоставления: та же комбинация внутри кулдауна подавляется, другая
/// комбинация проходит независимо от кулдауна.
pub struct GestureRecognizer {
    tracker: KeyStateTracker,
    cooldown: Duration,
    last_fired: Option<(GestureKind, Instant)>,
}

impl GestureRecognizer {
    pub fn new(repeat_suppress: Duration, cooldown: Duration) -> Self {
        Self {
            tracker: KeyStateTracker::new(repeat_suppress),
            cooldown,
            last_fired: None,
        }
    }

    /// Обработать нажатие; Some только при распознанном новом жесте
    pub fn on_press(&mut self, key: &str, now: Instant) -> Option<GestureEvent> {
        if self.tracker.on_press(key, now) == PressOutcome::Repeat {
            return None;
        }

        let kind = self.match_combination()?;

        // Дедупликация после сопоставления: та же комбинация в кулдауне
        // поглощает и автоповтор ОС, и повторный запуск той же хорды
        if let Some((last_kind, last_time)) = self.last_fired {
            if last_kind == kind && now.duration_since(last_time) < self.cooldown {
                debug!("Жест {} подавлен кулдауном", kind);
                return None;
            }
        }

        self.last_fired = Some((kind, now));
        info!("Распознан жест: {}", kind);
        Some(GestureEvent { kind, timestamp: now })
    }

    pub fn on_release(&mut self, key: &str) {
        self.tracker.on_release(key);
    }

    /// Сброс переходного состояния при остановке слушателя
    pub fn reset(&mut self) {
        self.tracker.clear();
        self.last_fired = None;
    }

    /// Сопоставление тотально по множеству клавиш: любые наборы допустимы,
    /// несопоставимые просто не дают жеста
    fn match_combination(&self) -> Option<GestureKind> {
        if !self.tracker.any_pressed(is_win_key) || !self.tracker.any_pressed(is_ctrl_key) {
            return None;
        }

        // Ровно одна клавиша-направление: Left+Down одновременно - не жест
        if self.tracker.count_pressed(is_direction_key) != 1 {
            return None;
        }

        if self.tracker.is_pressed("left") {
            return Some(GestureKind::SwitchLeft);
        }
        if self.tracker.is_pressed("right") {
            return Some(GestureKind::SwitchRight);
        }
        if self.tracker.is_pressed("down") {
            // Alt меняет значение Down; для Left/Right он безразличен
            return if self.tracker.any_pressed(is_alt_key) {
                Some(GestureKind::CenterFocused)
            } else {
                Some(GestureKind::SwitchDown)
            };
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> GestureRecognizer {
        GestureRecognizer::new(Duration::from_millis(100), Duration::from_millis(1200))
    }

    fn press_chord(r: &mut GestureRecognizer, keys: &[&str], now: Instant) -> Vec<GestureKind> {
        keys.iter()
            .filter_map(|k| r.on_press(k, now).map(|e| e.kind))
            .collect()
    }

    #[test]
    fn test_win_ctrl_left_any_interleaving() {
        // Любой порядок нажатия даёт ровно один switch-left
        for order in [
            ["win_l", "ctrl_l", "left"],
            ["ctrl_l", "win_l", "left"],
            ["left", "win_l", "ctrl_l"],
            ["win_l", "left", "ctrl_l"],
        ] {
            let mut r = recognizer();
            let now = Instant::now();
            let mut fired = Vec::new();
            for (i, key) in order.iter().enumerate() {
                if let Some(e) = r.on_press(key, now + Duration::from_millis(i as u64 * 10)) {
                    fired.push(e.kind);
                }
            }
            assert_eq!(fired, vec![GestureKind::SwitchLeft], "порядок {:?}", order);
        }
    }

    #[test]
    fn test_holding_chord_emits_once() {
        let mut r = recognizer();
        let now = Instant::now();
        let fired = press_chord(&mut r, &["win_l", "ctrl_l", "left"], now);
        assert_eq!(fired, vec![GestureKind::SwitchLeft]);

        // Автоповтор ОС шлёт нажатия дальше - новых событий нет
        for ms in [150u64, 300, 450, 2000] {
            assert!(r.on_press("left", now + Duration::from_millis(ms)).is_none());
        }
    }

    #[test]
    fn test_no_gesture_without_full_chord() {
        let mut r = recognizer();
        let now = Instant::now();

        assert!(press_chord(&mut r, &["ctrl_l", "left"], now).is_empty());
        r.reset();
        assert!(press_chord(&mut r, &["win_l", "left"], now).is_empty());
        r.reset();
        assert!(press_chord(&mut r, &["win_l", "ctrl_l", "a"], now).is_empty());
    }

    #[test]
    fn test_two_directions_is_not_a_match() {
        let mut r = recognizer();
        let now = Instant::now();
        assert!(press_chord(&mut r, &["win_l", "ctrl_l", "left"], now).len() == 1);

        // Второе направление при зажатом первом - не жест
        assert!(r.on_press("down", now + Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_same_kind_cooldown_different_kind_bypass() {
        let mut r = recognizer();
        let now = Instant::now();

        assert_eq!(
            press_chord(&mut r, &["win_l", "ctrl_l", "left"], now),
            vec![GestureKind::SwitchLeft]
        );

        // Отпустили и повторили ту же хорду внутри кулдауна - подавлено
        r.on_release("left");
        assert!(r.on_press("left", now + Duration::from_millis(300)).is_none());

        // Другая комбинация проходит сразу, кулдаун не мешает
        r.on_release("left");
        assert_eq!(
            r.on_press("right", now + Duration::from_millis(400)).map(|e| e.kind),
            Some(GestureKind::SwitchRight)
        );

        // Та же хорда после кулдауна срабатывает снова
        r.on_release("right");
        assert_eq!(
            r.on_press("left", now + Duration::from_millis(2000)).map(|e| e.kind),
            Some(GestureKind::SwitchLeft)
        );
    }

    #[test]
    fn test_alt_changes_down_meaning() {
        let mut r = recognizer();
        let now = Instant::now();
        assert_eq!(
            press_chord(&mut r, &["win_l", "ctrl_l", "down"], now),
            vec![GestureKind::SwitchDown]
        );

        let mut r = recognizer();
        assert_eq!(
            press_chord(&mut r, &["win_l", "ctrl_l", "alt_l", "down"], now),
            vec![GestureKind::CenterFocused]
        );
    }

    #[test]
    fn test_alt_irrelevant_for_left_right() {
        let mut r = recognizer();
        let now = Instant::now();
        assert_eq!(
            press_chord(&mut r, &["win_l", "ctrl_l", "alt_l", "right"], now),
            vec![GestureKind::SwitchRight]
        );
    }

    #[test]
    fn test_right_modifier_variants_match() {
        let mut r = recognizer();
        let now = Instant::now();
        assert_eq!(
            press_chord(&mut r, &["win_r", "ctrl_r", "left"], now),
            vec![GestureKind::SwitchLeft]
        );
    }

    #[test]
    fn test_unparseable_keys_are_harmless() {
        let mut r = recognizer();
        let now = Instant::now();
        assert!(press_chord(&mut r, &["vk_255", "vk_254"], now).is_empty());
        assert_eq!(
            press_chord(&mut r, &["win_l", "ctrl_l", "vk_255", "left"], now),
            vec![GestureKind::SwitchLeft]
        );
    }
}
