use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    #[serde(default)]
    pub desktop: DesktopConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub center: CenterConfig,
    #[serde(default)]
    pub pins: PinsConfig,
    // Оптимизационный индекс - не сериализуется, строится после загрузки
    #[serde(skip)]
    filter_set_lower: HashSet<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotkeyConfig {
    pub enabled: bool,
    /// Окно подавления аппаратного автоповтора клавиши
    pub repeat_suppress_ms: u64,
    /// Кулдаун повторного срабатывания той же комбинации
    pub cooldown_ms: u64,
    /// Пауза после жеста, пока система доигрывает анимацию переключения стола
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DesktopConfig {
    /// Размер ограниченного префикса дескрипторов для отпечатка стола
    pub fingerprint_prefix: usize,
    pub window_filters: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// 0 - основной монитор, 1+ - дополнительные
    pub target_index: usize,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CenterConfig {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PinsConfig {
    pub file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            filter: "deskpin=info".to_string(),
        }
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repeat_suppress_ms: 100,
            cooldown_ms: 1200,
            settle_delay_ms: 800,
        }
    }
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            fingerprint_prefix: 10,
            window_filters: Vec::new(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target_index: 1,
            poll_interval_ms: 2000,
        }
    }
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 1392,
        }
    }
}

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            file: "pinned_windows.json".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            app: AppConfig::default(),
            logging: LoggingConfig::default(),
            hotkey: HotkeyConfig::default(),
            desktop: DesktopConfig::default(),
            monitor: MonitorConfig::default(),
            center: CenterConfig::default(),
            pins: PinsConfig::default(),
            filter_set_lower: HashSet::new(),
        };
        config.build_optimization_indexes();
        config
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        // Отсутствующие или нечитаемые поля откатываются к значениям по умолчанию
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("DESKPIN_").split("__"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        config.build_optimization_indexes();

        Ok(config)
    }

    /// Строит оптимизационные индексы для быстрого поиска
    pub fn build_optimization_indexes(&mut self) {
        self.filter_set_lower = self
            .desktop
            .window_filters
            .iter()
            .map(|pattern| pattern.to_lowercase())
            .collect();
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек хоткеев
        if self.hotkey.repeat_suppress_ms == 0 {
            anyhow::bail!("repeat_suppress_ms должно быть больше 0");
        }

        if self.hotkey.cooldown_ms < 500 {
            anyhow::bail!("cooldown_ms должно быть минимум 500");
        }

        if self.hotkey.settle_delay_ms > 5000 {
            anyhow::bail!("settle_delay_ms должно быть не больше 5000");
        }

        // Валидация отпечатка стола
        if self.desktop.fingerprint_prefix == 0 {
            anyhow::bail!("fingerprint_prefix должно быть больше 0");
        }

        // Валидация настроек мониторинга
        if self.monitor.poll_interval_ms < 100 {
            anyhow::bail!("poll_interval_ms должно быть минимум 100");
        }

        // Валидация центрирования
        if self.center.width <= 0 || self.center.height <= 0 {
            anyhow::bail!("Размер центрируемого окна должен быть положительным");
        }

        if self.pins.file.is_empty() {
            anyhow::bail!("Не указан файл списка закреплённых окон");
        }

        Ok(())
    }

    pub fn repeat_suppress(&self) -> Duration {
        Duration::from_millis(self.hotkey.repeat_suppress_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.hotkey.cooldown_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.hotkey.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.monitor.poll_interval_ms)
    }

    /// Проверить заголовок окна по пользовательским фильтрам.
    /// Пустой список фильтров означает "любое окно".
    pub fn matches_window_filters(&self, window_title: &str) -> bool {
        if self.filter_set_lower.is_empty() {
            return true;
        }

        let title_lower = window_title.to_lowercase();
        self.filter_set_lower
            .iter()
            .any(|pattern| title_lower.contains(pattern))
    }
}
