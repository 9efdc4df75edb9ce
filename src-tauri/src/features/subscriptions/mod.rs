/// サブスクリプション機能モジュール
///
/// このモジュールは、サブスクリプション一覧に関連するすべての機能を提供します：
/// - Appwriteドキュメントからのサブスクリプション変換
/// - 一覧の取得と、単一書き込みでの差し替え
/// - 画面向けのコマンドと変更イベント
pub mod commands;
pub mod events;
pub mod models;
pub mod source;
pub mod store;

mod integration_tests;

// 公開インターフェース
pub use commands::{
    get_status_message, get_subscriptions, open_subscription_site, refresh_subscriptions,
};

pub use events::{TauriStoreObserver, STATUS_CHANGED_EVENT, SUBSCRIPTIONS_UPDATED_EVENT};

pub use models::{Subscription, SubscriptionView};

pub use source::{AppwriteSubscriptionSource, SettingsSource, SubscriptionSource};

pub use store::{StoreObserver, SubscriptionStore};
