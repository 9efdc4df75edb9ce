use crate::shared::errors::{AppError, AppResult};
use chrono_tz::Tz;

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境変数取得エラー
#[derive(Debug, Clone)]
pub struct EnvVarError {
    /// 変数名
    pub var_name: String,
    /// エラーメッセージ
    pub message: String,
}

impl std::fmt::Display for EnvVarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "環境変数 {} が見つかりません: {}",
            self.var_name, self.message
        )
    }
}

impl std::error::Error for EnvVarError {}

/// 環境変数を取得する（優先順位: 起動時 > コンパイル時 > エラー）
///
/// # 取得順序
/// 1. 起動時の環境変数（`std::env::var`）
/// 2. コンパイル時の環境変数（`option_env!`マクロ、build.rsで埋め込み）
/// 3. どちらも見つからない場合はエラー
#[macro_export]
macro_rules! get_env_var {
    ($var_name:expr) => {{
        if let Ok(value) = std::env::var($var_name) {
            log::debug!("環境変数 {} を起動時の環境変数から取得しました", $var_name);
            Ok(value)
        } else if let Some(value) = option_env!($var_name) {
            log::debug!("環境変数 {} をコンパイル時の環境変数から取得しました", $var_name);
            Ok(value.to_string())
        } else {
            Err($crate::shared::config::environment::EnvVarError {
                var_name: $var_name.to_string(),
                message: format!(
                    "起動時の環境変数 {} もコンパイル時の環境変数も見つかりませんでした",
                    $var_name
                ),
            })
        }
    }};
}

/// 環境変数を取得する（オプション版）
#[macro_export]
macro_rules! get_env_var_optional {
    ($var_name:expr) => {{
        $crate::get_env_var!($var_name).ok()
    }};
}

/// 環境変数を取得する（デフォルト値付き）
#[macro_export]
macro_rules! get_env_var_or_default {
    ($var_name:expr, $default_value:expr) => {{
        $crate::get_env_var!($var_name).unwrap_or_else(|_| {
            log::debug!(
                "環境変数 {} が見つからないため、デフォルト値を使用します: {}",
                $var_name,
                $default_value
            );
            $default_value.to_string()
        })
    }};
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// デバッグモードの有効/無効
    pub debug_mode: bool,
    /// ログレベル
    pub log_level: String,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        let environment = get_environment();
        let debug_mode = environment == Environment::Development;
        let default_level = if debug_mode { "debug" } else { "info" };
        let log_level = crate::get_env_var_or_default!("LOG_LEVEL", default_level);

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            debug_mode,
            log_level,
        }
    }

    /// プロダクション環境かどうかを判定
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// ログレベル文字列をフィルタに変換する（不明な値はInfo）
    pub fn level_filter(&self) -> log::LevelFilter {
        match self.log_level.to_lowercase().as_str() {
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

/// 現在の実行環境を判定する
///
/// # 判定ロジック
/// 1. 環境変数 ENVIRONMENT を確認（起動時 > コンパイル時）
/// 2. デバッグビルドの場合は Development
/// 3. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    if let Some(env_var) = crate::get_env_var_optional!("ENVIRONMENT") {
        let env = environment_from_name(&env_var);
        log::debug!("環境判定: 環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    // フォールバック: ビルド設定に基づく判定
    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

/// 環境名を変換する（"production"以外は開発環境）
fn environment_from_name(name: &str) -> Environment {
    match name.trim() {
        "production" => Environment::Production,
        _ => Environment::Development,
    }
}

/// 環境変数の読み込みを行う
///
/// # 注意
/// - 開発環境（デバッグビルド）の場合のみ.envファイルを読み込む
/// - 本番環境では環境変数を設定してからアプリケーションを起動すること
pub fn load_environment_variables() {
    if cfg!(debug_assertions) {
        eprintln!("開発環境: .envファイルを読み込みます");

        match dotenv::dotenv() {
            Ok(path) => {
                eprintln!("環境ファイルを読み込みました: {}", path.display());
            }
            Err(e) => {
                eprintln!("環境ファイルの読み込みに失敗: {e}");
                eprintln!("環境変数が設定されていることを確認してください");
            }
        }
    } else {
        eprintln!("本番環境: 環境変数は実行時に設定されます");
    }
}

/// ログシステムを初期化する
///
/// # 処理内容
/// 1. 環境設定を取得
/// 2. ログレベルを設定
/// 3. env_loggerを初期化
pub fn initialize_logging_system() {
    let env_config = EnvironmentConfig::from_env();

    let result = env_logger::Builder::from_default_env()
        .filter_level(env_config.level_filter())
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();

    if let Err(e) = result {
        eprintln!("ログシステムは既に初期化されています: {e}");
        return;
    }

    log::info!(
        "ログシステムを初期化しました: level={}, environment={}",
        env_config.log_level,
        env_config.environment
    );
}

/// Appwrite設定のキー名
pub const APPWRITE_ENDPOINT: &str = "APPWRITE_ENDPOINT";
pub const APPWRITE_PROJECT_ID: &str = "APPWRITE_PROJECT_ID";
pub const APPWRITE_DATABASE_ID: &str = "APPWRITE_DATABASE_ID";
pub const APPWRITE_COLLECTION_ID: &str = "APPWRITE_COLLECTION_ID";
pub const APPWRITE_API_KEY: &str = "APPWRITE_API_KEY";

/// Appwrite接続設定
///
/// 4つの必須値（エンドポイント、プロジェクトID、データベースID、コレクションID）と
/// 任意のAPIキーを保持する。値は前後の空白を除去して保持し、空白のみの値は未設定扱い。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    pub api_key: Option<String>,
}

impl AppwriteSettings {
    /// 環境変数（起動時 > コンパイル時）から設定を読み込む
    pub fn from_env() -> Self {
        Self::from_lookup(|key| match key {
            APPWRITE_ENDPOINT => crate::get_env_var_optional!("APPWRITE_ENDPOINT"),
            APPWRITE_PROJECT_ID => crate::get_env_var_optional!("APPWRITE_PROJECT_ID"),
            APPWRITE_DATABASE_ID => crate::get_env_var_optional!("APPWRITE_DATABASE_ID"),
            APPWRITE_COLLECTION_ID => crate::get_env_var_optional!("APPWRITE_COLLECTION_ID"),
            // APIキーはバイナリに埋め込まないため起動時の環境変数のみ参照する
            APPWRITE_API_KEY => std::env::var(APPWRITE_API_KEY).ok(),
            _ => None,
        })
    }

    /// 任意のキー検索関数から設定を読み込む
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            endpoint: normalize(lookup(APPWRITE_ENDPOINT)),
            project_id: normalize(lookup(APPWRITE_PROJECT_ID)),
            database_id: normalize(lookup(APPWRITE_DATABASE_ID)),
            collection_id: normalize(lookup(APPWRITE_COLLECTION_ID)),
            api_key: non_blank(lookup(APPWRITE_API_KEY)),
        }
    }

    /// 未設定の必須キー名を返す
    pub fn missing_keys(&self) -> Vec<&'static str> {
        [
            (APPWRITE_ENDPOINT, &self.endpoint),
            (APPWRITE_PROJECT_ID, &self.project_id),
            (APPWRITE_DATABASE_ID, &self.database_id),
            (APPWRITE_COLLECTION_ID, &self.collection_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| key)
        .collect()
    }

    /// 必須キーがすべて設定されているかを検証する
    ///
    /// # 戻り値
    /// 設定が揃っている場合はOk(())、不足がある場合は設定エラー
    pub fn validate(&self) -> AppResult<()> {
        let missing = self.missing_keys();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::configuration(format!(
                "Appwrite設定が不足しています: {}",
                missing.join(", ")
            )))
        }
    }
}

fn normalize(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// API通信設定を管理する構造体
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// APIリクエストのタイムアウト（秒）
    pub timeout_seconds: u64,
    /// 接続失敗時の最大リトライ回数
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 3,
        }
    }
}

impl ApiConfig {
    /// 環境変数からAPI設定を読み込む
    pub fn from_env() -> Self {
        let timeout_seconds = crate::get_env_var_or_default!("API_TIMEOUT_SECONDS", "30")
            .parse()
            .unwrap_or_else(|_| {
                log::warn!(
                    "API_TIMEOUT_SECONDSのパースに失敗しました。デフォルト値30秒を使用します"
                );
                30
            });

        let max_retries =
            parse_max_retries(&crate::get_env_var_or_default!("API_MAX_RETRIES", "3"));

        log::info!("API設定: timeout={timeout_seconds}s, max_retries={max_retries}");

        Self {
            timeout_seconds,
            max_retries,
        }
    }

    /// 設定を検証する
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_seconds == 0 {
            return Err("APIタイムアウトは0より大きい値である必要があります".to_string());
        }
        if self.max_retries > MAX_API_RETRIES {
            return Err(format!(
                "APIリトライ回数は{MAX_API_RETRIES}回以下である必要があります: {}",
                self.max_retries
            ));
        }
        Ok(())
    }
}

/// リトライ回数の上限
pub const MAX_API_RETRIES: u32 = 10;

/// API_MAX_RETRIESの値を解析する（不正値はデフォルト、上限超過は上限に丸める）
fn parse_max_retries(value: &str) -> u32 {
    match value.trim().parse::<u32>() {
        Ok(retries) if retries > MAX_API_RETRIES => {
            log::warn!("API_MAX_RETRIES={retries} は上限を超えています。{MAX_API_RETRIES}回を使用します");
            MAX_API_RETRIES
        }
        Ok(retries) => retries,
        Err(_) => {
            log::warn!("API_MAX_RETRIESのパースに失敗しました。デフォルト値3回を使用します");
            3
        }
    }
}

/// 期限チェックスケジューラの設定
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// チェック間隔（分）
    pub interval_minutes: u64,
    /// 通知を開始する時刻（時、0-23）
    pub notify_hour: u32,
    /// 日付判定に使うタイムゾーン（未設定の場合はOSのローカル時刻）
    pub timezone: Option<Tz>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 5,
            notify_hour: 18,
            timezone: None,
        }
    }
}

impl SchedulerConfig {
    /// 環境変数からスケジューラ設定を読み込む
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let interval_minutes = crate::get_env_var_or_default!("EXPIRY_CHECK_INTERVAL_MINUTES", "5")
            .parse::<u64>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .unwrap_or_else(|| {
                log::warn!("EXPIRY_CHECK_INTERVAL_MINUTESが不正です。デフォルト値5分を使用します");
                defaults.interval_minutes
            });

        let notify_hour = crate::get_env_var_or_default!("EXPIRY_NOTIFY_HOUR", "18")
            .parse::<u32>()
            .ok()
            .filter(|hour| *hour < 24)
            .unwrap_or_else(|| {
                log::warn!("EXPIRY_NOTIFY_HOURが不正です。デフォルト値18時を使用します");
                defaults.notify_hour
            });

        let timezone = timezone_from_setting(crate::get_env_var_optional!("EXPIRY_TIMEZONE"));

        log::info!(
            "スケジューラ設定: interval={interval_minutes}分, notify_hour={notify_hour}, timezone={timezone:?}"
        );

        Self {
            interval_minutes,
            notify_hour,
            timezone,
        }
    }
}

/// EXPIRY_TIMEZONEの値を解析する
///
/// 未設定・空白のみはOSのローカル時刻を使う。不明な名前の場合のみ警告する。
fn timezone_from_setting(value: Option<String>) -> Option<Tz> {
    let name = value.filter(|name| !name.trim().is_empty())?;
    parse_timezone(&name).or_else(|| {
        log::warn!("EXPIRY_TIMEZONE={name} は不明なタイムゾーンです。OSのローカル時刻を使用します");
        None
    })
}

/// IANAタイムゾーン名を解析する（空文字はNone）
pub fn parse_timezone(name: &str) -> Option<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    name.parse::<Tz>().ok()
}
