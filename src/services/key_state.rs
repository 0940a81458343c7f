use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::trace;

/// Результат регистрации нажатия
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// Новое физическое нажатие
    New,
    /// Аппаратный автоповтор; состояние не изменилось
    Repeat,
}

/// Множество нажатых в данный момент клавиш.
///
/// Мутируется только из потока колбэков хука (доставка сериализована внешним
/// источником ввода), поэтому блокировок не требуется. Варианты модификаторов
/// (win_l/win_r и т.п.) хранятся по отдельности; сведение к общей
/// идентичности выполняет распознаватель жестов при сопоставлении.
#[derive(Debug)]
pub struct KeyStateTracker {
    pressed: HashMap<String, Instant>,
    repeat_suppress: Duration,
}

impl KeyStateTracker {
    pub fn new(repeat_suppress: Duration) -> Self {
        Self {
            pressed: HashMap::new(),
            repeat_suppress,
        }
    }

    /// Зарегистрировать нажатие. Нажатие клавиши, которая всё ещё числится
    /// нажатой и была нажата внутри окна подавления, считается автоповтором.
    pub fn on_press(&mut self, key: &str, now: Instant) -> PressOutcome {
        if let Some(last_press) = self.pressed.get(key) {
            if now.duration_since(*last_press) < self.repeat_suppress {
                trace!("Подавлен автоповтор клавиши {}", key);
                return PressOutcome::Repeat;
            }
            // Клавиша удерживается дольше окна подавления: автоповтор ОС
            // продолжает слать нажатия, но новым событием они не являются
            return PressOutcome::Repeat;
        }

        self.pressed.insert(key.to_string(), now);
        PressOutcome::New
    }

    pub fn on_release(&mut self, key: &str) {
        self.pressed.remove(key);
    }

    pub fn is_pressed(&self, key: &str) -> bool {
        self.pressed.contains_key(key)
    }

    /// Нажата ли хоть одна клавиша, удовлетворяющая предикату
    pub fn any_pressed(&self, predicate: impl Fn(&str) -> bool) -> bool {
        self.pressed.keys().any(|k| predicate(k))
    }

    /// Сколько нажатых клавиш удовлетворяют предикату
    pub fn count_pressed(&self, predicate: impl Fn(&str) -> bool) -> usize {
        self.pressed.keys().filter(|k| predicate(k)).count()
    }

    /// Полный сброс переходного состояния; рестарт начинается с чистого листа
    pub fn clear(&mut self) {
        self.pressed.clear();
    }

    pub fn len(&self) -> usize {
        self.pressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }
}
