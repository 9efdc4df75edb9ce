use super::filter::ExpiringSubscription;

/// 通知のタイトル
pub const NOTIFICATION_TITLE: &str = "訂閱到期提醒";

/// 期限が近いサブスクリプションの通知本文を作成する
///
/// 複数件の場合は先頭の要素を「最も近いもの」として扱う（入力順のまま、並べ替えない）。
/// 空の入力は呼び出し側で除外すること。空文字を返す。
pub fn compose_expiry_message(expiring: &[ExpiringSubscription]) -> String {
    match expiring {
        [] => String::new(),
        [only] => format!(
            "「{}」將在 {} 到期。",
            display_name(only),
            only.next_date.format("%Y-%m-%d")
        ),
        [first, ..] => format!(
            "有 {} 個訂閱在 3 天內到期，最近的是「{}」({})。",
            expiring.len(),
            display_name(first),
            first.next_date.format("%Y-%m-%d")
        ),
    }
}

fn display_name(item: &ExpiringSubscription) -> &str {
    item.name.as_deref().unwrap_or("")
}
