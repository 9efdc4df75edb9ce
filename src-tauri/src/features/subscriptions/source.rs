use super::models::Subscription;
use crate::shared::api_client::ApiClient;
use crate::shared::clock::LocalZone;
use crate::shared::config::environment::AppwriteSettings;
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use log::{debug, warn};

/// サブスクリプション一覧の取得元
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    /// 全件を取得する。失敗時は呼び出し側の状態を変更してはならない
    async fn fetch_all(&self) -> AppResult<Vec<Subscription>>;
}

/// Appwrite設定の読み込み元
#[derive(Debug, Clone)]
pub enum SettingsSource {
    /// 取得のたびに環境変数から読み込む
    Environment,
    /// 固定値
    Fixed(AppwriteSettings),
}

impl SettingsSource {
    fn load(&self) -> AppwriteSettings {
        match self {
            SettingsSource::Environment => AppwriteSettings::from_env(),
            SettingsSource::Fixed(settings) => settings.clone(),
        }
    }
}

/// Appwriteコレクションからサブスクリプションを取得する
pub struct AppwriteSubscriptionSource {
    client: ApiClient,
    settings: SettingsSource,
    zone: LocalZone,
}

impl AppwriteSubscriptionSource {
    pub fn new(client: ApiClient, settings: SettingsSource, zone: LocalZone) -> Self {
        Self {
            client,
            settings,
            zone,
        }
    }
}

#[async_trait]
impl SubscriptionSource for AppwriteSubscriptionSource {
    async fn fetch_all(&self) -> AppResult<Vec<Subscription>> {
        // 設定は取得のたびに読み直す
        let settings = self.settings.load();
        if let Err(e) = settings.validate() {
            warn!("Appwrite設定が不完全なため取得を中止します: {e}");
            return Err(e);
        }

        let documents = self.client.list_documents(&settings).await?;
        let subscriptions: Vec<Subscription> = documents
            .into_iter()
            .map(|document| Subscription::from_document(document, &self.zone))
            .collect();

        debug!("サブスクリプションに変換しました: count={}", subscriptions.len());
        Ok(subscriptions)
    }
}
