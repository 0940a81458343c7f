use crate::error::{DeskpinError, Result};
use crate::events::{KeyState, RawKeyEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use super::vk_keys::vk_to_key_name;

// Хук-процедура не принимает пользовательских данных, поэтому отправитель
// событий живёт в глобальном слоте. Слот заполняется только после успешной
// установки хука и очищается при остановке, так что цикл stop/install
// работает сколько угодно раз.
static HOOK_SENDER: Mutex<Option<UnboundedSender<RawKeyEvent>>> = Mutex::new(None);

/// Низкоуровневый хук клавиатуры (WH_KEYBOARD_LL).
///
/// Колбэки доставляются на выделенном потоке с собственным циклом сообщений,
/// поэтому события приходят строго сериализованно. Хук только наблюдает и
/// никогда не поглощает события.
pub struct KeyboardHook {
    stop_flag: Arc<AtomicBool>,
    thread_id: Arc<AtomicU32>,
    running: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl KeyboardHook {
    pub fn install(sender: UnboundedSender<RawKeyEvent>) -> Result<Self> {
        // Слот держится заблокированным до конца установки: параллельный
        // install либо увидит живой хук, либо дождётся исхода этого
        let mut slot = HOOK_SENDER.lock();
        if slot.is_some() {
            return Err(DeskpinError::Internal(
                "Хук клавиатуры уже установлен".to_string(),
            ));
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_id = Arc::new(AtomicU32::new(0));

        // Поток сообщает об успехе установки хука до входа в цикл сообщений,
        // чтобы вызывающая сторона могла отказаться от запуска (а не работать
        // в полуинициализированном состоянии)
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<bool>();

        let stop_flag_worker = Arc::clone(&stop_flag);
        let thread_id_worker = Arc::clone(&thread_id);
        let handle = std::thread::spawn(move || {
            use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
            use windows::Win32::UI::WindowsAndMessaging::{
                DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
                TranslateMessage, UnhookWindowsHookEx, MSG, WH_KEYBOARD_LL, WM_QUIT,
            };

            unsafe extern "system" fn hook_proc(
                code: i32,
                wparam: WPARAM,
                lparam: LPARAM,
            ) -> LRESULT {
                use windows::Win32::UI::WindowsAndMessaging::{
                    CallNextHookEx, HC_ACTION, KBDLLHOOKSTRUCT, WM_KEYDOWN, WM_KEYUP,
                    WM_SYSKEYDOWN, WM_SYSKEYUP,
                };

                if code == HC_ACTION as i32 {
                    let data = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
                    let state = match wparam.0 as u32 {
                        WM_KEYDOWN | WM_SYSKEYDOWN => Some(KeyState::Pressed),
                        WM_KEYUP | WM_SYSKEYUP => Some(KeyState::Released),
                        _ => None,
                    };

                    if let Some(state) = state {
                        // Пустой слот (установка ещё не завершена или хук
                        // уже останавливается) - событие просто теряется
                        if let Some(sender) = HOOK_SENDER.lock().as_ref() {
                            let event = RawKeyEvent {
                                key: vk_to_key_name(data.vkCode),
                                state,
                                timestamp: std::time::Instant::now(),
                            };
                            let _ = sender.send(event);
                        }
                    }
                }

                CallNextHookEx(None, code, wparam, lparam)
            }

            let hook = unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_proc), None, 0) };
            let hook = match hook {
                Ok(hook) => {
                    let _ = ready_tx.send(true);
                    hook
                }
                Err(e) => {
                    error!("Не удалось установить хук клавиатуры: {}", e);
                    let _ = ready_tx.send(false);
                    return;
                }
            };

            let thread = unsafe { windows::Win32::System::Threading::GetCurrentThreadId() };
            thread_id_worker.store(thread, Ordering::SeqCst);
            info!("Хук клавиатуры установлен, поток сообщений запущен");

            let mut msg = MSG::default();
            loop {
                let result = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
                if result.0 <= 0 || msg.message == WM_QUIT {
                    break;
                }
                unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
                if stop_flag_worker.load(Ordering::SeqCst) {
                    unsafe {
                        let _ = PostThreadMessageW(thread, WM_QUIT, WPARAM(0), LPARAM(0));
                    }
                }
            }

            unsafe {
                if let Err(e) = UnhookWindowsHookEx(hook) {
                    warn!("Не удалось снять хук клавиатуры: {}", e);
                }
            }
            debug!("Поток хука клавиатуры завершён");
        });

        match ready_rx.recv() {
            Ok(true) => {}
            _ => {
                let _ = handle.join();
                // Слот не занимался - повторная попытка установки возможна
                return Err(DeskpinError::CapabilityUnavailable(
                    "Установка хука клавиатуры не удалась".to_string(),
                ));
            }
        }

        *slot = Some(sender);

        Ok(Self {
            stop_flag,
            thread_id,
            running: AtomicBool::new(true),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Остановка идемпотентна; повторный вызов ничего не делает
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.stop_flag.store(true, Ordering::SeqCst);
        let thread = self.thread_id.load(Ordering::SeqCst);
        if thread != 0 {
            use windows::Win32::Foundation::{LPARAM, WPARAM};
            use windows::Win32::UI::WindowsAndMessaging::{PostThreadMessageW, WM_QUIT};
            unsafe {
                let _ = PostThreadMessageW(thread, WM_QUIT, WPARAM(0), LPARAM(0));
            }
        }

        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }

        // Освободить слот: следующий install начинает с чистого листа
        *HOOK_SENDER.lock() = None;
        info!("Хук клавиатуры остановлен");
    }
}

impl Drop for KeyboardHook {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Жизненный цикл слота отправителя без реальной установки хука:
    // занят -> блокирует, освобождён -> установка возможна снова
    #[test]
    fn test_sender_slot_reusable_after_clear() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<RawKeyEvent>();

        {
            let mut slot = HOOK_SENDER.lock();
            assert!(slot.is_none(), "слот должен начинаться пустым");
            *slot = Some(tx);
        }
        assert!(HOOK_SENDER.lock().is_some());

        // Остановка освобождает слот; повторное занятие проходит
        *HOOK_SENDER.lock() = None;
        let (tx2, _rx2) = tokio::sync::mpsc::unbounded_channel::<RawKeyEvent>();
        {
            let mut slot = HOOK_SENDER.lock();
            assert!(slot.is_none(), "после очистки слот снова пуст");
            *slot = Some(tx2);
        }
        *HOOK_SENDER.lock() = None;
    }
}
