use super::models::Subscription;
use super::source::SubscriptionSource;
use crate::shared::errors::{AppError, AppResult};
use log::{info, warn};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// 読み込み中のステータスメッセージ
pub const STATUS_LOADING: &str = "正在載入訂閱資料...";

/// 一覧の変更通知を受け取るオブザーバー
pub trait StoreObserver: Send + Sync {
    fn records_changed(&self, records: &[Subscription]);
    fn status_changed(&self, message: &str);
}

/// メモリ上のサブスクリプション一覧
///
/// 更新は`refresh_lock`で直列化され、一覧の差し替えは1回の代入で行う。
/// 取得に失敗した場合は既存の一覧をそのまま残す。
pub struct SubscriptionStore {
    records: RwLock<Vec<Subscription>>,
    status: RwLock<String>,
    refresh_lock: Mutex<()>,
    observer: Option<Arc<dyn StoreObserver>>,
}

impl Default for SubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            status: RwLock::new(String::new()),
            refresh_lock: Mutex::new(()),
            observer: None,
        }
    }

    pub fn with_observer(observer: Arc<dyn StoreObserver>) -> Self {
        Self {
            observer: Some(observer),
            ..Self::new()
        }
    }

    /// 現在の一覧のコピーを取得する
    pub fn snapshot(&self) -> AppResult<Vec<Subscription>> {
        self.records
            .read()
            .map(|records| records.clone())
            .map_err(|e| AppError::concurrency(format!("一覧ロックエラー: {e}")))
    }

    /// 現在のステータスメッセージ
    pub fn status_message(&self) -> String {
        self.status
            .read()
            .map(|status| status.clone())
            .unwrap_or_default()
    }

    /// 取得元から一覧を再取得して差し替える
    ///
    /// # 戻り値
    /// 取得した一覧、または失敗時はエラー（既存の一覧は変更されない）
    pub async fn refresh(&self, source: &dyn SubscriptionSource) -> AppResult<Vec<Subscription>> {
        let _guard = self.refresh_lock.lock().await;

        let records = source.fetch_all().await?;
        self.replace(records.clone())?;
        Ok(records)
    }

    /// ステータスメッセージを更新しながら一覧を再取得する（画面からの更新用）
    pub async fn refresh_with_status(
        &self,
        source: &dyn SubscriptionSource,
    ) -> AppResult<Vec<Subscription>> {
        self.set_status(STATUS_LOADING);

        match self.refresh(source).await {
            Ok(records) => {
                self.set_status(&format!("已載入 {} 筆訂閱資料。", records.len()));
                Ok(records)
            }
            Err(e) => {
                warn!(
                    "サブスクリプション一覧の取得に失敗しました: {} (severity={:?})",
                    e.details(),
                    e.severity()
                );
                self.set_status(&status_for_error(&e));
                Err(e)
            }
        }
    }

    fn replace(&self, records: Vec<Subscription>) -> AppResult<()> {
        {
            let mut guard = self
                .records
                .write()
                .map_err(|e| AppError::concurrency(format!("一覧ロックエラー: {e}")))?;
            *guard = records;
            info!("サブスクリプション一覧を更新しました: count={}", guard.len());

            if let Some(observer) = &self.observer {
                observer.records_changed(&guard);
            }
        }
        Ok(())
    }

    fn set_status(&self, message: &str) {
        match self.status.write() {
            Ok(mut status) => *status = message.to_string(),
            Err(e) => {
                warn!("ステータスロックエラー: {e}");
                return;
            }
        }

        if let Some(observer) = &self.observer {
            observer.status_changed(message);
        }
    }
}

/// エラーに対応する画面表示用ステータスメッセージ
pub fn status_for_error(error: &AppError) -> String {
    match error {
        AppError::Configuration(_) => error.user_message().to_string(),
        AppError::Backend(message) => format!("載入失敗：{message}"),
        other => format!("發生錯誤：{}", other.user_message()),
    }
}
