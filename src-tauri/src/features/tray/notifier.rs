use log::{info, warn};
use tauri::{AppHandle, Runtime};
use tauri_plugin_notification::NotificationExt;

/// 通知の表示先
///
/// 表示は投げっぱなしで、失敗しても呼び出し側には伝えない。
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// OSの通知機能で表示する
pub struct TauriNotifier<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriNotifier<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> Notifier for TauriNotifier<R> {
    fn notify(&self, title: &str, body: &str) {
        match self
            .app
            .notification()
            .builder()
            .title(title)
            .body(body)
            .show()
        {
            Ok(()) => info!("通知を表示しました: {body}"),
            Err(e) => warn!("通知の表示に失敗しました: {e}"),
        }
    }
}
