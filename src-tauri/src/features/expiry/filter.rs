use crate::features::subscriptions::models::Subscription;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// 期限が近いと判定する日数（今日を含めて today..=today+3）
pub const EXPIRY_WINDOW_DAYS: i64 = 3;

/// 期限が近いサブスクリプション
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiringSubscription {
    pub id: String,
    pub name: Option<String>,
    pub next_date: NaiveDateTime,
}

/// 期限判定の対象期間 `[today, today + 3日]`（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ExpiryWindow {
    pub fn starting(today: NaiveDate) -> Self {
        Self {
            start: today,
            end: today + Duration::days(EXPIRY_WINDOW_DAYS),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// 期限が近いサブスクリプションを抽出する
///
/// 次回請求日が未設定のものは除外する。並び順は入力順のまま。
pub fn filter_expiring(records: &[Subscription], today: NaiveDate) -> Vec<ExpiringSubscription> {
    let window = ExpiryWindow::starting(today);

    records
        .iter()
        .filter_map(|record| {
            let next_date = record.next_date?;
            record
                .next_billing_date()
                .is_some_and(|date| window.contains(date))
                .then(|| ExpiringSubscription {
                    id: record.id.clone(),
                    name: record.name.clone(),
                    next_date,
                })
        })
        .collect()
}
