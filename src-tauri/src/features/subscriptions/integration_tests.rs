//! Appwriteサブスクリプション取得の統合テスト
//!
//! ループバックのHTTPサーバーをAppwriteの代わりに立て、
//! 取得から`Subscription`への変換、エラー応答の扱いまでを確認する。

#[cfg(test)]
mod integration_tests {
    use crate::features::subscriptions::source::{
        AppwriteSubscriptionSource, SettingsSource, SubscriptionSource,
    };
    use crate::features::subscriptions::store::{SubscriptionStore, STATUS_LOADING};
    use crate::shared::api_client::ApiClient;
    use crate::shared::clock::LocalZone;
    use crate::shared::config::environment::{ApiConfig, AppwriteSettings};
    use crate::shared::errors::AppError;
    use chrono::NaiveDate;
    use hyper::body::Incoming;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use serde_json::json;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    /// 受信したリクエストの記録
    #[derive(Debug, Clone)]
    struct ReceivedRequest {
        path: String,
        project: Option<String>,
        api_key: Option<String>,
    }

    /// 固定レスポンスを返すループバックサーバー
    struct StubAppwrite {
        endpoint: String,
        received: Arc<Mutex<Vec<ReceivedRequest>>>,
    }

    impl StubAppwrite {
        async fn start(status: StatusCode, body: String) -> Self {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            let received = Arc::new(Mutex::new(Vec::new()));

            let log = Arc::clone(&received);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let log = Arc::clone(&log);
                    let body = body.clone();
                    tokio::spawn(async move {
                        let service = service_fn(move |req: Request<Incoming>| {
                            log.lock().unwrap().push(ReceivedRequest {
                                path: req.uri().path().to_string(),
                                project: header(&req, "x-appwrite-project"),
                                api_key: header(&req, "x-appwrite-key"),
                            });
                            let response = Response::builder()
                                .status(status)
                                .header("Content-Type", "application/json")
                                .body(body.clone())
                                .unwrap();
                            async move { Ok::<_, Infallible>(response) }
                        });
                        let _ = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await;
                    });
                }
            });

            Self {
                endpoint: format!("http://127.0.0.1:{port}/v1"),
                received,
            }
        }

        fn settings(&self, api_key: Option<&str>) -> AppwriteSettings {
            AppwriteSettings {
                endpoint: self.endpoint.clone(),
                project_id: "proj".to_string(),
                database_id: "db main".to_string(),
                collection_id: "subs".to_string(),
                api_key: api_key.map(str::to_string),
            }
        }

        fn requests(&self) -> Vec<ReceivedRequest> {
            self.received.lock().unwrap().clone()
        }
    }

    fn header(req: &Request<Incoming>, name: &str) -> Option<String> {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    fn source(settings: AppwriteSettings) -> AppwriteSubscriptionSource {
        let client = ApiClient::new_with_config(ApiConfig {
            timeout_seconds: 5,
            max_retries: 0,
        })
        .unwrap();
        AppwriteSubscriptionSource::new(
            client,
            SettingsSource::Fixed(settings),
            LocalZone::Named(chrono_tz::UTC),
        )
    }

    #[tokio::test]
    async fn test_fetch_maps_documents() {
        let body = json!({
            "total": 3,
            "documents": [
                {
                    "$id": "a1",
                    "$createdAt": "2024-05-01T08:30:00.000+00:00",
                    "$updatedAt": "2024-05-02T09:00:00.000+00:00",
                    "name": "Netflix",
                    "site": "https://netflix.com",
                    "price": 390,
                    "nextdate": "2024-06-10T00:00:00.000+00:00",
                    "note": null,
                    "account": "family"
                },
                {
                    "$id": "b2",
                    "name": "Spotify",
                    "price": "abc",
                    "nextdate": "not a date"
                },
                {
                    "name": "IDなし"
                }
            ]
        })
        .to_string();
        let server = StubAppwrite::start(StatusCode::OK, body).await;

        let records = source(server.settings(Some("secret")))
            .fetch_all()
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a1");
        assert_eq!(records[0].name.as_deref(), Some("Netflix"));
        assert_eq!(records[0].price, Some(390));
        assert_eq!(records[0].note, None);
        assert_eq!(
            records[0].next_billing_date(),
            NaiveDate::from_ymd_opt(2024, 6, 10)
        );
        assert_eq!(records[1].id, "b2");
        assert_eq!(records[1].price, None);
        assert_eq!(records[1].next_date, None);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].path,
            "/v1/databases/db%20main/collections/subs/documents"
        );
        assert_eq!(requests[0].project.as_deref(), Some("proj"));
        assert_eq!(requests[0].api_key.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_fetch_without_api_key_omits_header() {
        let body = json!({ "total": 0, "documents": [] }).to_string();
        let server = StubAppwrite::start(StatusCode::OK, body).await;

        let records = source(server.settings(None)).fetch_all().await.unwrap();

        assert!(records.is_empty());
        assert_eq!(server.requests()[0].api_key, None);
    }

    #[tokio::test]
    async fn test_fetch_uses_appwrite_error_message() {
        let body = json!({
            "message": "Collection with the requested ID could not be found.",
            "code": 404,
            "type": "collection_not_found"
        })
        .to_string();
        let server = StubAppwrite::start(StatusCode::NOT_FOUND, body).await;

        let err = source(server.settings(None)).fetch_all().await.unwrap_err();

        match err {
            AppError::Backend(message) => {
                assert_eq!(message, "Collection with the requested ID could not be found.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_status_message() {
        let server =
            StubAppwrite::start(StatusCode::UNAUTHORIZED, "<html>denied</html>".to_string()).await;

        let err = source(server.settings(None)).fetch_all().await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Backend(ref message) if message == "驗證失敗，請確認專案 ID 與 API 金鑰"
        ));
    }

    #[tokio::test]
    async fn test_incomplete_settings_skip_request() {
        let server = StubAppwrite::start(StatusCode::OK, "{}".to_string()).await;
        let mut settings = server.settings(None);
        settings.collection_id.clear();

        let err = source(settings).fetch_all().await.unwrap_err();

        assert!(matches!(err, AppError::Configuration(_)));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_store_keeps_list_when_backend_fails() {
        let ok_body = json!({
            "total": 1,
            "documents": [{ "$id": "a1", "name": "Netflix" }]
        })
        .to_string();
        let ok_server = StubAppwrite::start(StatusCode::OK, ok_body).await;
        let failing_server = StubAppwrite::start(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "message": "Server Error", "code": 500, "type": "general_unknown" })
                .to_string(),
        )
        .await;

        let store = SubscriptionStore::new();
        store
            .refresh_with_status(&source(ok_server.settings(None)))
            .await
            .unwrap();
        assert_eq!(store.status_message(), "已載入 1 筆訂閱資料。");

        let result = store
            .refresh_with_status(&source(failing_server.settings(None)))
            .await;

        assert!(result.is_err());
        assert_eq!(store.snapshot().unwrap().len(), 1);
        assert_eq!(store.status_message(), "載入失敗：Server Error");
        assert_ne!(store.status_message(), STATUS_LOADING);
    }
}
