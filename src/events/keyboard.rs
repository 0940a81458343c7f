use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Сырое событие клавиши от хука клавиатуры
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub key: String,
    pub state: KeyState,
    pub timestamp: Instant,
}

impl fmt::Display for RawKeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.key, self.state)
    }
}

/// Вид распознанного жеста
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureKind {
    SwitchLeft,
    SwitchRight,
    SwitchDown,
    CenterFocused,
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GestureKind::SwitchLeft => "switch-left",
            GestureKind::SwitchRight => "switch-right",
            GestureKind::SwitchDown => "switch-down",
            GestureKind::CenterFocused => "center-focused",
        };
        write!(f, "{}", name)
    }
}

/// Распознанный жест: не более одного события на физическое нажатие комбинации
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub timestamp: Instant,
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}ms ago)", self.kind, self.timestamp.elapsed().as_millis())
    }
}

/// Левые/правые варианты модификаторов сводятся к общей идентичности при
/// сопоставлении, но в нажатом множестве хранятся по отдельности.
pub fn is_win_key(key: &str) -> bool {
    matches!(key, "win" | "win_l" | "win_r" | "cmd" | "cmd_l" | "cmd_r")
}

pub fn is_ctrl_key(key: &str) -> bool {
    matches!(key, "ctrl" | "ctrl_l" | "ctrl_r")
}

pub fn is_alt_key(key: &str) -> bool {
    matches!(key, "alt" | "alt_l" | "alt_r" | "alt_gr")
}

pub fn is_direction_key(key: &str) -> bool {
    matches!(key, "left" | "right" | "down")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gesture_kind_display() {
        assert_eq!(GestureKind::SwitchLeft.to_string(), "switch-left");
        assert_eq!(GestureKind::CenterFocused.to_string(), "center-focused");
    }

    #[test]
    fn test_modifier_variants_collapse() {
        for key in ["win", "win_l", "win_r", "cmd_l"] {
            assert!(is_win_key(key), "{} должен считаться Win", key);
        }
        assert!(is_ctrl_key("ctrl_r"));
        assert!(is_alt_key("alt_gr"));
        assert!(!is_win_key("left"));
        assert!(is_direction_key("down"));
        assert!(!is_direction_key("up"));
    }
}
