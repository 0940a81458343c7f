//! Преобразование виртуальных кодов клавиш в логические имена.
//! Неизвестные коды получают имя "vk_<код>" и отслеживаются наравне с остальными.

pub fn vk_to_key_name(vk: u32) -> String {
    match vk {
        0x25 => "left".to_string(),
        0x26 => "up".to_string(),
        0x27 => "right".to_string(),
        0x28 => "down".to_string(),
        0x5B => "win_l".to_string(),
        0x5C => "win_r".to_string(),
        0x11 => "ctrl".to_string(),
        0xA2 => "ctrl_l".to_string(),
        0xA3 => "ctrl_r".to_string(),
        0x12 => "alt".to_string(),
        0xA4 => "alt_l".to_string(),
        0xA5 => "alt_r".to_string(),
        0x10 => "shift".to_string(),
        0xA0 => "shift_l".to_string(),
        0xA1 => "shift_r".to_string(),
        0x1B => "esc".to_string(),
        0x0D => "enter".to_string(),
        0x20 => "space".to_string(),
        0x09 => "tab".to_string(),
        // Буквы и цифры
        0x30..=0x39 | 0x41..=0x5A => {
            char::from_u32(vk).map(|c| c.to_ascii_lowercase().to_string()).unwrap_or_else(|| format!("vk_{}", vk))
        }
        other => format!("vk_{}", other),
    }
}
