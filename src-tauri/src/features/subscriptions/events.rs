use super::models::{to_views, Subscription};
use super::store::StoreObserver;
use crate::shared::clock::LocalZone;
use log::warn;
use tauri::{AppHandle, Emitter, Runtime};

/// 一覧が差し替えられたときのイベント（ペイロード: 表示モデルの配列）
pub const SUBSCRIPTIONS_UPDATED_EVENT: &str = "subscriptions-updated";

/// ステータスメッセージが変わったときのイベント（ペイロード: 文字列）
pub const STATUS_CHANGED_EVENT: &str = "status-changed";

/// 一覧・ステータスの変更を画面にイベントで通知する
pub struct TauriStoreObserver<R: Runtime> {
    app: AppHandle<R>,
    zone: LocalZone,
}

impl<R: Runtime> TauriStoreObserver<R> {
    pub fn new(app: AppHandle<R>, zone: LocalZone) -> Self {
        Self { app, zone }
    }
}

impl<R: Runtime> StoreObserver for TauriStoreObserver<R> {
    fn records_changed(&self, records: &[Subscription]) {
        let views = to_views(records, &self.zone);
        if let Err(e) = self.app.emit(SUBSCRIPTIONS_UPDATED_EVENT, views) {
            warn!("一覧更新イベントの送信に失敗しました: {e}");
        }
    }

    fn status_changed(&self, message: &str) {
        if let Err(e) = self.app.emit(STATUS_CHANGED_EVENT, message) {
            warn!("ステータスイベントの送信に失敗しました: {e}");
        }
    }
}
