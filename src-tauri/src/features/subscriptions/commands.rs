use super::models::{to_views, SubscriptionView};
use super::store::status_for_error;
use crate::shared::errors::{AppError, AppResult};
use crate::AppState;
use log::info;
use tauri::{AppHandle, State};
use tauri_plugin_opener::OpenerExt;
use url::Url;

/// 現在のサブスクリプション一覧を取得する
///
/// # 引数
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 表示用の一覧（バックエンドの順序のまま）、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn get_subscriptions(
    state: State<'_, AppState>,
) -> Result<Vec<SubscriptionView>, String> {
    let records = state.store.snapshot()?;
    Ok(to_views(&records, &state.zone))
}

/// バックエンドから一覧を再取得する
///
/// 取得中・完了・失敗のステータスメッセージを更新する。
/// 失敗した場合は既存の一覧を残し、ステータスメッセージをエラーとして返す。
#[tauri::command]
pub async fn refresh_subscriptions(
    state: State<'_, AppState>,
) -> Result<Vec<SubscriptionView>, String> {
    let records = state
        .store
        .refresh_with_status(&*state.source)
        .await
        .map_err(|e| status_for_error(&e))?;

    Ok(to_views(&records, &state.zone))
}

/// 現在のステータスメッセージを取得する
#[tauri::command]
pub fn get_status_message(state: State<'_, AppState>) -> String {
    state.store.status_message()
}

/// サブスクリプションのサイトを既定のブラウザで開く
#[tauri::command]
pub async fn open_subscription_site(app: AppHandle, site: String) -> Result<(), String> {
    let url = validate_site_url(&site)?;

    info!("サイトを開きます: {url}");
    app.opener()
        .open_url(url.as_str(), None::<&str>)
        .map_err(|e| format!("無法開啟網站：{e}"))
}

/// サイトURLのバリデーション（http/httpsのみ許可）
fn validate_site_url(site: &str) -> AppResult<Url> {
    let site = site.trim();
    if site.is_empty() {
        return Err(AppError::validation("網站網址為空"));
    }

    let url = Url::parse(site).map_err(|e| AppError::validation(format!("網址格式不正確：{e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AppError::validation(format!("不支援的網址類型：{scheme}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_site_url_accepts_web_urls() {
        let url = validate_site_url(" https://www.netflix.com/account ").unwrap();
        assert_eq!(url.host_str(), Some("www.netflix.com"));
        assert!(validate_site_url("http://example.com").is_ok());
    }

    #[test]
    fn test_validate_site_url_rejects_other_values() {
        assert!(validate_site_url("").is_err());
        assert!(validate_site_url("netflix.com").is_err());
        assert!(validate_site_url("file:///C:/Windows/system32/calc.exe").is_err());
        assert!(matches!(
            validate_site_url("javascript:alert(1)"),
            Err(AppError::Validation(_))
        ));
    }
}
