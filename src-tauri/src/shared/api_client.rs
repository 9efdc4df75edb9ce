/// Appwrite REST APIクライアント
///
/// Appwriteのドキュメント一覧取得エンドポイントとの通信を行う。
/// タイムアウトと接続失敗時のリトライはこの層で扱う。
use crate::shared::config::environment::{ApiConfig, AppwriteSettings};
use crate::shared::errors::{AppError, AppResult};
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

/// Appwriteからのエラーレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppwriteErrorResponse {
    pub message: String,
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

/// ドキュメント一覧レスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub documents: Vec<Map<String, Value>>,
}

/// Appwriteのドキュメント1件
///
/// `$`で始まるメタデータと、それ以外の属性（`data`）に分けて保持する。
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub data: Map<String, Value>,
}

impl RawDocument {
    /// JSONオブジェクトからドキュメントを構築する
    ///
    /// # 戻り値
    /// `$id`が文字列として存在しない場合はNone
    pub fn from_map(mut map: Map<String, Value>) -> Option<Self> {
        let id = match map.remove("$id") {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => return None,
        };
        let created_at = take_string(&mut map, "$createdAt");
        let updated_at = take_string(&mut map, "$updatedAt");
        map.retain(|key, _| !key.starts_with('$'));

        Some(Self {
            id,
            created_at,
            updated_at,
            data: map,
        })
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(value)) => Some(value),
        _ => None,
    }
}

/// Appwrite REST APIクライアント
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// 環境設定からAPIクライアントを作成
    pub fn new() -> AppResult<Self> {
        Self::new_with_config(ApiConfig::from_env())
    }

    /// 設定を指定してAPIクライアントを作成
    pub fn new_with_config(config: ApiConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::configuration)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        Ok(Self { client, config })
    }

    /// ドキュメント一覧エンドポイントのURLを組み立てる
    ///
    /// IDはパスセグメントとしてパーセントエンコードする。
    pub fn documents_url(settings: &AppwriteSettings) -> AppResult<String> {
        settings.validate()?;

        let endpoint = settings.endpoint.trim_end_matches('/');
        let parsed = Url::parse(endpoint).map_err(|e| {
            AppError::configuration(format!("APPWRITE_ENDPOINTが不正です: {endpoint}: {e}"))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::configuration(format!(
                "APPWRITE_ENDPOINTのスキームが不正です: {}",
                parsed.scheme()
            )));
        }

        Ok(format!(
            "{endpoint}/databases/{}/collections/{}/documents",
            urlencoding::encode(&settings.database_id),
            urlencoding::encode(&settings.collection_id)
        ))
    }

    /// コレクション内の全ドキュメントを取得する
    ///
    /// ページングやクエリは指定しない。
    pub async fn list_documents(&self, settings: &AppwriteSettings) -> AppResult<Vec<RawDocument>> {
        let url = Self::documents_url(settings)?;
        info!(
            "ドキュメント一覧を取得します: database={}, collection={}",
            settings.database_id, settings.collection_id
        );

        let mut request = self
            .client
            .get(&url)
            .header("X-Appwrite-Project", &settings.project_id);

        if let Some(api_key) = &settings.api_key {
            request = request.header("X-Appwrite-Key", api_key);
        }

        let list: DocumentList = self.send_request_with_retry(request, &url).await?;

        let fetched = list.documents.len();
        let documents: Vec<RawDocument> = list
            .documents
            .into_iter()
            .filter_map(|map| {
                let document = RawDocument::from_map(map);
                if document.is_none() {
                    warn!("$idを持たないドキュメントを読み飛ばしました");
                }
                document
            })
            .collect();

        info!(
            "ドキュメント一覧取得成功: total={}, received={fetched}, mapped={}",
            list.total,
            documents.len()
        );
        Ok(documents)
    }

    /// リトライ機能付きでリクエストを送信
    ///
    /// 接続レベルの失敗のみ指数バックオフでリトライし、HTTPエラーはそのまま返す。
    async fn send_request_with_retry<T>(&self, request: RequestBuilder, url: &str) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let mut attempts = 0;
        loop {
            let Some(cloned_request) = request.try_clone() else {
                return Err(AppError::backend("リクエストのクローンに失敗しました"));
            };

            match cloned_request.send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        let result: T = response
                            .json()
                            .await
                            .map_err(|e| AppError::backend(format!("回應格式錯誤：{e}")))?;
                        debug!("GETリクエスト成功: url={url}");
                        return Ok(result);
                    }

                    let error_response = Self::handle_error_response(response).await;
                    return Err(AppError::backend(error_response.message));
                }
                Err(e) => {
                    if attempts < self.config.max_retries {
                        attempts += 1;
                        let delay = Duration::from_secs(2_u64.pow(attempts));
                        warn!(
                            "APIリクエスト失敗、リトライします: attempt={attempts}/{}, delay={delay:?}, error={e}",
                            self.config.max_retries
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(AppError::backend(format!("無法連線至 Appwrite：{e}")));
                }
            }
        }
    }

    /// エラーレスポンスを解析する
    ///
    /// Appwriteの構造化エラー（message/code/type）があればそれを使い、
    /// なければHTTPステータスから汎用メッセージを作る。
    async fn handle_error_response(response: Response) -> AppwriteErrorResponse {
        let status_code = response.status().as_u16();
        let response_text = response
            .text()
            .await
            .unwrap_or_else(|_| "レスポンス読み取り失敗".to_string());

        if let Ok(error_response) = serde_json::from_str::<AppwriteErrorResponse>(&response_text) {
            debug!(
                "Appwriteから構造化エラーレスポンスを受信: code={:?}, type={:?}, message={}",
                error_response.code, error_response.error_type, error_response.message
            );
            return error_response;
        }

        warn!("Appwriteから非構造化エラーレスポンス: status={status_code}, body={response_text}");

        AppwriteErrorResponse {
            message: status_message(status_code).to_string(),
            code: Some(status_code),
            error_type: None,
        }
    }
}

/// HTTPステータスに対応するユーザー向けメッセージ
fn status_message(status_code: u16) -> &'static str {
    match status_code {
        400 => "請求格式不正確",
        401 => "驗證失敗，請確認專案 ID 與 API 金鑰",
        403 => "沒有存取此資料的權限",
        404 => "找不到指定的資料庫或集合",
        429 => "請求過於頻繁，請稍後再試",
        500 => "伺服器內部錯誤",
        502 => "與伺服器通訊時發生錯誤",
        503 => "伺服器暫時無法使用",
        504 => "伺服器回應逾時",
        _ => "發生未知錯誤",
    }
}
