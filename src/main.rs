use anyhow::Result;
use clap::Parser;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod platform;
mod services;

use config::Config;
use platform::create_window_api;
use services::{
    create_hotkey_listener, DesktopIdentityTracker, DesktopSwitchController, MonitorWatcher,
    PinRegistry, ReassertEngine,
};

#[derive(Parser, Debug)]
#[command(name = "deskpin")]
#[command(about = "Утилита закрепления окон при переключении виртуальных столов")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "deskpin.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Инициализация системы логирования
    init_tracing(&args.log_level)?;

    info!("Запуск Deskpin v{}", env!("CARGO_PKG_VERSION"));

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    // Инициализация компонентов (единый оконный API передаётся всем сервисам)
    let api = create_window_api(args.dry_run)?;
    let registry = Arc::new(PinRegistry::load(&config.pins.file));
    let identity = Arc::new(DesktopIdentityTracker::new(
        api.clone(),
        config.desktop.fingerprint_prefix,
    ));
    let engine = Arc::new(ReassertEngine::new(
        config.clone(),
        api.clone(),
        registry.clone(),
    ));

    let target_monitor = Arc::new(AtomicUsize::new(config.monitor.target_index));
    let watcher = Arc::new(MonitorWatcher::new(
        config.clone(),
        api.clone(),
        target_monitor.clone(),
    ));

    let controller = Arc::new(DesktopSwitchController::new(
        config.clone(),
        api,
        identity.clone(),
        engine,
        registry,
        Some(watcher.clone()),
        target_monitor,
    ));

    info!("Все компоненты инициализированы");

    // Базовая линия отпечатка стола снимается до первого жеста
    identity.refresh();

    // Запуск всех сервисов параллельно
    let hotkey_handle = if config.hotkey.enabled {
        let hotkey_listener =
            create_hotkey_listener(config.clone(), controller.clone(), args.dry_run)?;
        Some(tokio::spawn(async move {
            if let Err(e) = hotkey_listener.run().await {
                error!("Ошибка в HotkeyListener: {}", e);
            }
        }))
    } else {
        warn!("Горячие клавиши выключены конфигурацией, слушатель не запускается");
        None
    };
    let watcher_handle = watcher.run();

    info!("Все сервисы запущены");
    info!("Статус: {:?}", controller.status());

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    // Останавливаем наблюдатель штатно, слушатель прерываем: хук снимается в Drop
    watcher.stop();
    if let Some(handle) = &hotkey_handle {
        handle.abort();
    }

    // Ожидаем завершения задач (с таймаутом)
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        if let Some(handle) = hotkey_handle {
            let _ = handle.await;
        }
        let _ = watcher_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("Deskpin завершил работу");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
