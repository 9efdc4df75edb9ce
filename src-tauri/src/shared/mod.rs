/// 共有エラー型とエラーハンドリング
pub mod errors;

/// 共有設定管理
pub mod config;

/// Appwrite REST APIクライアント
pub mod api_client;

/// 時計とローカルタイムゾーン
pub mod clock;

// 便利な再エクスポート
pub use config::{
    initialize_logging_system, load_environment_variables, AppwriteSettings, EnvironmentConfig,
    SchedulerConfig,
};
pub use clock::{LocalZone, SystemClock};
