/// ログイン時の自動起動登録
///
/// Windowsでは `HKCU\...\Run` に `"<exe>" /background` を登録する。
/// 既に同じ値が登録されている場合は書き込まない。
use super::launch::BACKGROUND_FLAG;
use log::{debug, info, warn};
use std::path::Path;

/// Runキーに登録する値の名前
pub const APP_NAME: &str = "AppwriteSubscriptionViewer";

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
const RUN_KEY_PATH: &str = r"HKCU\Software\Microsoft\Windows\CurrentVersion\Run";

/// 自動起動時に実行するコマンド
pub fn startup_command(exe_path: &Path) -> String {
    format!("\"{}\" {BACKGROUND_FLAG}", exe_path.display())
}

/// 登録値の更新が必要かを判定する（大文字小文字は区別しない）
pub fn needs_update(current: Option<&str>, desired: &str) -> bool {
    match current {
        Some(current) => current.to_uppercase() != desired.to_uppercase(),
        None => true,
    }
}

/// `reg query` の出力から値を取り出す
///
/// 出力例: `    AppwriteSubscriptionViewer    REG_SZ    "C:\app.exe" /background`
pub fn parse_reg_query_output(output: &str, value_name: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix(value_name)?;
        let (_, value) = rest.split_once("REG_SZ")?;
        Some(value.trim().to_string())
    })
}

/// 自動起動を登録する
///
/// 失敗はログに記録するのみで、起動処理は継続する。
pub fn ensure_run_on_startup() {
    match register_run_entry() {
        Ok(true) => info!("自動起動を登録しました: {APP_NAME}"),
        Ok(false) => debug!("自動起動は登録済みです: {APP_NAME}"),
        Err(e) => warn!("自動起動の登録に失敗しました: {e}"),
    }
}

#[cfg(target_os = "windows")]
fn register_run_entry() -> Result<bool, String> {
    use std::os::windows::process::CommandExt;
    use std::process::Command;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    let exe = std::env::current_exe().map_err(|e| format!("実行ファイルのパス取得に失敗: {e}"))?;
    let desired = startup_command(&exe);

    let query = Command::new("reg")
        .args(["query", RUN_KEY_PATH, "/v", APP_NAME])
        .creation_flags(CREATE_NO_WINDOW)
        .output()
        .map_err(|e| format!("reg query の実行に失敗: {e}"))?;

    let current = if query.status.success() {
        parse_reg_query_output(&String::from_utf8_lossy(&query.stdout), APP_NAME)
    } else {
        None
    };

    if !needs_update(current.as_deref(), &desired) {
        return Ok(false);
    }

    let status = Command::new("reg")
        .args([
            "add",
            RUN_KEY_PATH,
            "/v",
            APP_NAME,
            "/t",
            "REG_SZ",
            "/d",
            &desired,
            "/f",
        ])
        .creation_flags(CREATE_NO_WINDOW)
        .status()
        .map_err(|e| format!("reg add の実行に失敗: {e}"))?;

    if status.success() {
        Ok(true)
    } else {
        Err(format!(
            "reg add が失敗しました (exit code {})",
            status.code().unwrap_or(-1)
        ))
    }
}

#[cfg(not(target_os = "windows"))]
fn register_run_entry() -> Result<bool, String> {
    debug!("Windows以外のため自動起動の登録をスキップします");
    Ok(false)
}
