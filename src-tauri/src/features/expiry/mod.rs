/// 期限チェック機能モジュール
///
/// - 3日以内に次回請求日を迎えるサブスクリプションの抽出
/// - 通知メッセージの組み立て
/// - 1日1回、設定時刻以降に実行する定期チェック
pub mod filter;
pub mod message;
pub mod scheduler;

pub use filter::{filter_expiring, ExpiringSubscription, ExpiryWindow, EXPIRY_WINDOW_DAYS};
pub use message::{compose_expiry_message, NOTIFICATION_TITLE};
pub use scheduler::{ExpiryScheduler, ScanOutcome};
