use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// 日付判定に使うローカルタイムゾーン
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LocalZone {
    /// OSのローカル時刻
    #[default]
    System,
    /// IANAタイムゾーン
    Named(Tz),
}

impl LocalZone {
    pub fn from_option(timezone: Option<Tz>) -> Self {
        timezone.map(LocalZone::Named).unwrap_or_default()
    }

    /// オフセット付き日時をこのゾーンの壁時計時刻に変換する
    pub fn to_local(&self, value: &DateTime<FixedOffset>) -> NaiveDateTime {
        match self {
            LocalZone::System => value.with_timezone(&Local).naive_local(),
            LocalZone::Named(tz) => value.with_timezone(tz).naive_local(),
        }
    }

    /// 現在の壁時計時刻
    pub fn now(&self) -> NaiveDateTime {
        match self {
            LocalZone::System => Local::now().naive_local(),
            LocalZone::Named(tz) => Utc::now().with_timezone(tz).naive_local(),
        }
    }
}

/// 現在時刻の取得元
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// 実時間の時計
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    zone: LocalZone,
}

impl SystemClock {
    pub fn new(zone: LocalZone) -> Self {
        Self { zone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        self.zone.now()
    }
}
