use crate::error::Result;
use crate::events::{WindowHandle, WindowInfo};
use crate::platform::WindowApi;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use super::desktop_identity::is_shell_window;

/// Запись о закреплённом окне; метаданные снимаются в момент закрепления
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedWindowEntry {
    pub title: String,
    pub class_name: String,
    pub process_id: u32,
    pub pinned_at: u64,
}

/// Кандидат для диалога выбора окон
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCandidate {
    pub info: WindowInfo,
    pub is_pinned: bool,
}

/// Реестр закреплённых окон.
///
/// Хранится как JSON-документ "строковый дескриптор -> запись"; загружается
/// при старте и целиком перезаписывается при каждом изменении. Дескрипторы
/// непрозрачны и могут протухнуть в любой момент, поэтому все операции
/// чтения ревалидируют их и вычищают мёртвые записи.
pub struct PinRegistry {
    path: PathBuf,
    entries: RwLock<HashMap<u64, PinnedWindowEntry>>,
}

impl PinRegistry {
    /// Загрузить реестр; отсутствие файла - пустой список, битый файл -
    /// предупреждение и пустой список (не ошибка запуска)
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let entries = match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<BTreeMap<String, PinnedWindowEntry>>(&data) {
                Ok(parsed) => {
                    let entries: HashMap<u64, PinnedWindowEntry> = parsed
                        .into_iter()
                        .filter_map(|(k, v)| match k.parse::<u64>() {
                            Ok(handle) => Some((handle, v)),
                            Err(_) => {
                                warn!("Пропущен нечисловой ключ дескриптора: {}", k);
                                None
                            }
                        })
                        .collect();
                    info!("Загружено закреплённых окон: {}", entries.len());
                    entries
                }
                Err(e) => {
                    warn!("Файл закреплённых окон повреждён ({}), начинаем с пустого списка", e);
                    HashMap::new()
                }
            },
            Err(_) => {
                info!("Файла закреплённых окон нет, начинаем с пустого списка");
                HashMap::new()
            }
        };

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// Полная перезапись документа при каждом изменении
    fn save_locked(&self, entries: &HashMap<u64, PinnedWindowEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Строковые ключи и стабильный порядок записей
        let data: BTreeMap<String, &PinnedWindowEntry> =
            entries.iter().map(|(k, v)| (k.to_string(), v)).collect();
        let json = serde_json::to_string_pretty(&data)?;
        std::fs::write(&self.path, json)?;
        debug!("Сохранено закреплённых окон: {}", entries.len());
        Ok(())
    }

    /// Закрепить окно; метаданные берутся из актуальной информации об окне
    pub fn pin(&self, api: &dyn WindowApi, handle: WindowHandle) -> bool {
        let Some(info) = api.window_info(handle) else {
            warn!("Не удалось получить информацию об окне: {}", handle);
            return false;
        };

        let entry = PinnedWindowEntry {
            title: info.title.clone(),
            class_name: info.class_name,
            process_id: info.process_id,
            pinned_at: unix_now(),
        };

        let mut entries = self.entries.write();
        entries.insert(handle.value(), entry);
        if let Err(e) = self.save_locked(&entries) {
            warn!("Не удалось сохранить список закреплённых окон: {}", e);
        }
        info!("Окно закреплено: {} \"{}\"", handle, info.title);
        true
    }

    pub fn unpin(&self, handle: WindowHandle) -> bool {
        let mut entries = self.entries.write();
        match entries.remove(&handle.value()) {
            Some(entry) => {
                if let Err(e) = self.save_locked(&entries) {
                    warn!("Не удалось сохранить список закреплённых окон: {}", e);
                }
                info!("Окно откреплено: {} \"{}\"", handle, entry.title);
                true
            }
            None => {
                warn!("Окно не было закреплено: {}", handle);
                false
            }
        }
    }

    pub fn is_pinned(&self, handle: WindowHandle) -> bool {
        self.entries.read().contains_key(&handle.value())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Снимок дескрипторов (copy-on-read: итерация не держит блокировку)
    pub fn handles(&self) -> Vec<WindowHandle> {
        let mut handles: Vec<WindowHandle> = self
            .entries
            .read()
            .keys()
            .map(|k| WindowHandle(*k))
            .collect();
        handles.sort_unstable();
        handles
    }

    /// Удалить протухшие записи; перезаписывает документ при изменениях
    pub fn prune(&self, stale: &[WindowHandle]) {
        if stale.is_empty() {
            return;
        }

        let mut entries = self.entries.write();
        let mut removed = 0usize;
        for handle in stale {
            if entries.remove(&handle.value()).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            if let Err(e) = self.save_locked(&entries) {
                warn!("Не удалось сохранить список закреплённых окон: {}", e);
            }
            info!("Удалено недействительных закреплённых окон: {}", removed);
        }
    }

    /// Действительные закреплённые окна с актуальной информацией;
    /// недействительные попутно вычищаются
    pub fn valid_windows(&self, api: &dyn WindowApi) -> Vec<WindowInfo> {
        let handles = self.handles();
        let mut valid = Vec::new();
        let mut stale = Vec::new();

        for handle in handles {
            if !api.is_window_valid(handle) {
                stale.push(handle);
                continue;
            }
            match api.window_info(handle) {
                Some(info) => valid.push(info),
                None => stale.push(handle),
            }
        }

        self.prune(&stale);
        valid
    }

    /// Текущие окна для диалога выбора: видимые, с заголовком, не-системные,
    /// отсортированы по заголовку и помечены флагом закрепления
    pub fn selection_candidates(&self, api: &dyn WindowApi) -> Vec<SelectionCandidate> {
        let handles = match api.enum_windows() {
            Ok(handles) => handles,
            Err(e) => {
                warn!("Сбор списка окон не удался: {}", e);
                return Vec::new();
            }
        };

        let mut candidates: Vec<SelectionCandidate> = handles
            .into_iter()
            .filter_map(|h| api.window_info(h))
            .filter(|info| {
                info.is_visible && !info.title.trim().is_empty() && !is_shell_window(&info.title)
            })
            .map(|info| SelectionCandidate {
                is_pinned: self.is_pinned(info.handle),
                info,
            })
            .collect();

        candidates.sort_by_key(|c| c.info.title.to_lowercase());
        candidates
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
