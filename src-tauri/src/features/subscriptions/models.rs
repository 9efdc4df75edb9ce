use crate::shared::api_client::RawDocument;
use crate::shared::clock::LocalZone;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 次回請求日の属性キー
pub const NEXT_DATE_KEY: &str = "nextdate";

/// サブスクリプションデータモデル
///
/// Appwriteのドキュメント1件に対応する。`id`以外は緩く型付けされた属性からの
/// ベストエフォート解析で、欠落・不正な値はNoneになる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: Option<String>,
    pub site: Option<String>,
    pub price: Option<i64>,
    /// 次回請求日時（ローカル時刻）。判定には日付部分のみ使用する
    pub next_date: Option<NaiveDateTime>,
    pub note: Option<String>,
    pub account: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Subscription {
    /// IDのみを持つサブスクリプションを作成
    pub fn with_id<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            name: None,
            site: None,
            price: None,
            next_date: None,
            note: None,
            account: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Appwriteドキュメントからサブスクリプションを構築する
    ///
    /// 各フィールドの解析失敗は他のフィールドに影響しない。
    pub fn from_document(document: RawDocument, zone: &LocalZone) -> Self {
        let data = &document.data;
        Self {
            name: get_string(data, "name"),
            site: get_string(data, "site"),
            price: get_int(data, "price"),
            next_date: get_date_time(data, NEXT_DATE_KEY, zone),
            note: get_string(data, "note"),
            account: get_string(data, "account"),
            created_at: document.created_at,
            updated_at: document.updated_at,
            id: document.id,
        }
    }

    /// 次回請求日（日付部分）
    pub fn next_billing_date(&self) -> Option<NaiveDate> {
        self.next_date.map(|value| value.date())
    }

    /// 画面表示用に変換する
    pub fn to_view(&self, zone: &LocalZone) -> SubscriptionView {
        SubscriptionView {
            id: self.id.clone(),
            name: self.name.clone().unwrap_or_default(),
            site: self.site.clone(),
            price: self.price,
            next_date: format_date(self.next_date),
            note: self.note.clone(),
            account: self.account.clone(),
            created_at: format_timestamp(self.created_at.as_deref(), zone),
            updated_at: format_timestamp(self.updated_at.as_deref(), zone),
        }
    }
}

/// 一覧を画面表示用に変換する（順序は維持する）
pub fn to_views(records: &[Subscription], zone: &LocalZone) -> Vec<SubscriptionView> {
    records.iter().map(|record| record.to_view(zone)).collect()
}

/// 一覧画面用の表示モデル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionView {
    pub id: String,
    pub name: String,
    pub site: Option<String>,
    pub price: Option<i64>,
    /// `YYYY-MM-DD`、未設定なら空文字
    pub next_date: String,
    pub note: Option<String>,
    pub account: Option<String>,
    /// `YYYY-MM-DD HH:MM`、解析できなければ元の文字列
    pub created_at: String,
    pub updated_at: String,
}

/// 文字列属性を取得する
///
/// 文字列以外の値はJSON表現の文字列に変換する。nullや欠落はNone。
pub fn get_string(data: &Map<String, Value>, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::Null => None,
        Value::String(value) => Some(value.clone()),
        other => Some(other.to_string()),
    }
}

/// 整数属性を取得する
///
/// 整数値、または整数として解析できる文字列のみ受け付ける。
pub fn get_int(data: &Map<String, Value>, key: &str) -> Option<i64> {
    match data.get(key)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// 日時属性を取得する
pub fn get_date_time(
    data: &Map<String, Value>,
    key: &str,
    zone: &LocalZone,
) -> Option<NaiveDateTime> {
    match data.get(key)? {
        Value::String(text) => parse_date_time(text, zone),
        _ => None,
    }
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// 日時文字列を解析する
///
/// オフセット付き（RFC 3339）の場合は指定ゾーンのローカル時刻に変換する。
/// オフセットなしの場合はそのままローカル時刻として扱う。
pub fn parse_date_time(text: &str, zone: &LocalZone) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(zone.to_local(&value));
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// 日付を`YYYY-MM-DD`形式に整形する（未設定なら空文字）
pub fn format_date(value: Option<NaiveDateTime>) -> String {
    value
        .map(|value| value.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// バックエンドのタイムスタンプ文字列を表示用に整形する
pub fn format_timestamp(value: Option<&str>, zone: &LocalZone) -> String {
    let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
        return String::new();
    };

    match parse_date_time(value, zone) {
        Some(parsed) => parsed.format("%Y-%m-%d %H:%M").to_string(),
        None => value.to_string(),
    }
}
