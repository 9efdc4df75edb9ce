// 機能モジュール構造
pub mod features;
pub mod shared;

use features::expiry::ExpiryScheduler;
use features::startup::{ensure_run_on_startup, LaunchOptions};
use features::subscriptions::{
    self, AppwriteSubscriptionSource, SettingsSource, SubscriptionSource, SubscriptionStore,
    TauriStoreObserver,
};
use features::tray::{self, TauriNotifier};
use log::{error, info, warn};
use shared::api_client::ApiClient;
use shared::{
    initialize_logging_system, load_environment_variables, AppwriteSettings, EnvironmentConfig,
    LocalZone, SchedulerConfig, SystemClock,
};
use std::sync::Arc;
use tauri::Manager;

/// アプリケーション状態（サブスクリプション一覧と取得元を保持）
pub struct AppState {
    pub store: Arc<SubscriptionStore>,
    pub source: Arc<dyn SubscriptionSource>,
    pub zone: LocalZone,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_notification::init())
        .setup(|app| {
            // 環境に応じた.envファイルを読み込み（ログシステム初期化前に実行）
            load_environment_variables();
            initialize_logging_system();

            info!("アプリケーション初期化を開始します...");

            let launch = LaunchOptions::from_env();
            info!("起動オプション: run_hidden={}", launch.run_hidden);

            ensure_run_on_startup();

            // 設定不足でも起動は続け、一覧画面にステータスとして表示する
            let missing = AppwriteSettings::from_env().missing_keys();
            if !missing.is_empty() {
                if EnvironmentConfig::from_env().is_production() {
                    error!("Appwrite設定が不足しています: {}", missing.join(", "));
                } else {
                    warn!("Appwrite設定が不足しています（.envを確認してください）: {}", missing.join(", "));
                }
            }

            let scheduler_config = SchedulerConfig::from_env();
            let zone = LocalZone::from_option(scheduler_config.timezone);

            let client = ApiClient::new().map_err(|e| {
                error!("APIクライアントの初期化に失敗しました: {e}");
                e
            })?;

            // Appwrite設定は取得のたびに環境変数から読み直す
            let source: Arc<dyn SubscriptionSource> = Arc::new(AppwriteSubscriptionSource::new(
                client,
                SettingsSource::Environment,
                zone,
            ));
            let observer = Arc::new(TauriStoreObserver::new(app.handle().clone(), zone));
            let store = Arc::new(SubscriptionStore::with_observer(observer));

            app.manage(AppState {
                store: Arc::clone(&store),
                source: Arc::clone(&source),
                zone,
            });

            tray::build_tray(app.handle())?;

            if launch.run_hidden {
                tray::hide_main_window(app.handle());
            } else {
                tray::restore_main_window(app.handle());
            }

            // 起動時チェックの後、一定間隔で期限チェックを行う
            let scheduler = ExpiryScheduler::new(
                &scheduler_config,
                Arc::new(SystemClock::new(zone)),
                source,
                store,
                Arc::new(TauriNotifier::new(app.handle().clone())),
            );
            tauri::async_runtime::spawn(scheduler.run());

            info!("アプリケーション初期化が完了しました");
            Ok(())
        })
        .on_window_event(|window, event| tray::handle_window_event(window, event))
        .invoke_handler(tauri::generate_handler![
            // サブスクリプションコマンド
            subscriptions::commands::get_subscriptions,
            subscriptions::commands::refresh_subscriptions,
            subscriptions::commands::get_status_message,
            subscriptions::commands::open_subscription_site,
        ])
        .run(tauri::generate_context!())
        .expect("Tauriアプリケーションの実行中にエラーが発生しました");
}
