use std::env;

/// コンパイル時に埋め込む環境変数
const EMBEDDED_VARS: &[&str] = &[
    "ENVIRONMENT",
    "APPWRITE_ENDPOINT",
    "APPWRITE_PROJECT_ID",
    "APPWRITE_DATABASE_ID",
    "APPWRITE_COLLECTION_ID",
    "API_TIMEOUT_SECONDS",
    "API_MAX_RETRIES",
    "EXPIRY_CHECK_INTERVAL_MINUTES",
    "EXPIRY_NOTIFY_HOUR",
    "EXPIRY_TIMEZONE",
    "LOG_LEVEL",
];

fn main() {
    // Tauriのビルドスクリプトを実行
    tauri_build::build();

    // ENVIRONMENT環境変数に基づいて適切な.envファイルを読み込み
    let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let env_file = match environment.as_str() {
        "production" => ".env.production",
        _ => ".env",
    };

    println!("cargo:rerun-if-changed={env_file}");

    if dotenv::from_filename(env_file).is_ok() {
        println!("cargo:warning={env_file}ファイルを読み込みました");
    } else {
        println!("cargo:warning={env_file}ファイルが見つかりません");
    }

    // 設定値をコンパイル時定数として埋め込み（起動時の環境変数が優先される）
    // 注意: APPWRITE_API_KEY は埋め込まない
    for name in EMBEDDED_VARS {
        println!("cargo:rerun-if-env-changed={name}");
        if let Ok(value) = env::var(name) {
            println!("cargo:rustc-env={name}={value}");
        }
    }
}
