use super::filter::filter_expiring;
use super::message::{compose_expiry_message, NOTIFICATION_TITLE};
use crate::features::subscriptions::source::SubscriptionSource;
use crate::features::subscriptions::store::SubscriptionStore;
use crate::features::tray::Notifier;
use crate::shared::clock::Clock;
use crate::shared::config::environment::SchedulerConfig;
use crate::shared::errors::{AppError, AppResult};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// 1回のチェック（tick）の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// 条件を満たさないためスキャンしなかった
    Skipped,
    /// 期限が近いサブスクリプションを通知した（件数）
    Notified(usize),
    /// スキャンしたが該当なし
    NothingExpiring,
    /// 取得に失敗した（ゲートは進めない）
    Failed,
    /// Appwrite設定が不完全なため取得しなかった（当日分は消化する）
    Unconfigured,
}

/// 期限チェックの定期実行スケジューラ
///
/// 通知ゲート（最後にスキャンが成功した日付）を保持し、
/// 1日に1回だけ、設定時刻以降にスキャンを行う。
pub struct ExpiryScheduler {
    interval: Duration,
    notify_hour: u32,
    gate: Option<NaiveDate>,
    clock: Arc<dyn Clock>,
    source: Arc<dyn SubscriptionSource>,
    store: Arc<SubscriptionStore>,
    notifier: Arc<dyn Notifier>,
}

impl ExpiryScheduler {
    pub fn new(
        config: &SchedulerConfig,
        clock: Arc<dyn Clock>,
        source: Arc<dyn SubscriptionSource>,
        store: Arc<SubscriptionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_minutes.max(1) * 60),
            notify_hour: config.notify_hour,
            gate: None,
            clock,
            source,
            store,
            notifier,
        }
    }

    /// 通知ゲートを指定して作成する
    pub fn with_gate(mut self, gate: Option<NaiveDate>) -> Self {
        self.gate = gate;
        self
    }

    /// 最後にスキャンが完了した日付
    pub fn gate(&self) -> Option<NaiveDate> {
        self.gate
    }

    /// この時刻にスキャンすべきかを判定する
    pub fn should_scan(&self, now: NaiveDateTime) -> bool {
        now.hour() >= self.notify_hour && self.gate != Some(now.date())
    }

    /// 現在時刻で1回チェックする
    pub async fn tick(&mut self) -> ScanOutcome {
        let now = self.clock.now();
        self.tick_at(now).await
    }

    /// 指定時刻で1回チェックする
    ///
    /// 通信・応答エラーの場合はゲートを進めず、次回のtickで再試行する。
    /// 設定不足の場合は再試行しても結果が変わらないため、当日分を消化する。
    pub async fn tick_at(&mut self, now: NaiveDateTime) -> ScanOutcome {
        if !self.should_scan(now) {
            debug!("期限チェックをスキップしました: now={now}, gate={:?}", self.gate);
            return ScanOutcome::Skipped;
        }

        let today = now.date();
        match self.scan(today, false).await {
            Ok(count) => {
                self.gate = Some(today);
                outcome_for(count)
            }
            Err(AppError::Configuration(message)) => {
                warn!("Appwrite設定が不完全なため本日の期限チェックを行いません: {message}");
                self.gate = Some(today);
                ScanOutcome::Unconfigured
            }
            Err(e) => {
                warn!("定期の期限チェックに失敗しました（次回再試行）: {e}");
                ScanOutcome::Failed
            }
        }
    }

    /// 起動時の処理
    ///
    /// 時刻やゲートに関係なく1回スキャンし、結果に関わらずゲートを今日に設定する。
    pub async fn boot(&mut self) -> ScanOutcome {
        let today = self.clock.today();
        info!("起動時の期限チェックを実行します: today={today}");

        let outcome = match self.scan(today, true).await {
            Ok(count) => outcome_for(count),
            Err(AppError::Configuration(message)) => {
                warn!("Appwrite設定が不完全なため起動時の期限チェックを行いません: {message}");
                ScanOutcome::Unconfigured
            }
            Err(e) => {
                warn!("起動時の期限チェックに失敗しました: {e}");
                ScanOutcome::Failed
            }
        };

        self.gate = Some(today);
        outcome
    }

    /// 起動処理の後、一定間隔でチェックを繰り返す
    ///
    /// 各tickは完了するまで待つため、スキャンが重なることはない。
    pub async fn run(mut self) {
        self.boot().await;

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "期限チェックの定期実行を開始しました: interval={:?}, notify_hour={}",
            self.interval, self.notify_hour
        );

        loop {
            ticker.tick().await;
            let outcome = self.tick().await;
            debug!("期限チェック結果: {outcome:?}");
        }
    }

    /// 取得→抽出→通知を1回実行する
    ///
    /// # 戻り値
    /// 通知対象の件数
    async fn scan(&self, today: NaiveDate, with_status: bool) -> AppResult<usize> {
        let source = self.source.as_ref();
        let records = if with_status {
            self.store.refresh_with_status(source).await?
        } else {
            self.store.refresh(source).await?
        };

        let expiring = filter_expiring(&records, today);
        if expiring.is_empty() {
            info!("期限が近いサブスクリプションはありません: today={today}");
            return Ok(0);
        }

        let message = compose_expiry_message(&expiring);
        info!("期限通知を表示します: count={}", expiring.len());
        self.notifier.notify(NOTIFICATION_TITLE, &message);
        Ok(expiring.len())
    }
}

fn outcome_for(count: usize) -> ScanOutcome {
    if count == 0 {
        ScanOutcome::NothingExpiring
    } else {
        ScanOutcome::Notified(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::subscriptions::models::Subscription;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedClock(NaiveDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            self.0
        }
    }

    /// 結果を切り替えられるテスト用の取得元
    struct FakeSource {
        records: Mutex<AppResult<Vec<Subscription>>>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(records: Vec<Subscription>) -> Self {
            Self {
                records: Mutex::new(Ok(records)),
                calls: AtomicUsize::new(0),
            }
        }

        fn fail_with(&self, message: &str) {
            *self.records.lock().unwrap() = Err(AppError::backend(message));
        }

        fn fail_with_configuration(&self, message: &str) {
            *self.records.lock().unwrap() = Err(AppError::configuration(message));
        }

        fn succeed_with(&self, records: Vec<Subscription>) {
            *self.records.lock().unwrap() = Ok(records);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SubscriptionSource for FakeSource {
        async fn fetch_all(&self) -> AppResult<Vec<Subscription>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &*self.records.lock().unwrap() {
                Ok(records) => Ok(records.clone()),
                Err(AppError::Configuration(message)) => Err(AppError::configuration(message)),
                Err(e) => Err(AppError::backend(e.user_message())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn bodies(&self) -> Vec<String> {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .map(|(_, body)| body.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, body: &str) {
            self.messages
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
        }
    }

    struct Fixture {
        source: Arc<FakeSource>,
        store: Arc<SubscriptionStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, minute, 0).unwrap()
    }

    fn due(id: &str, name: &str, days: i64) -> Subscription {
        let mut record = Subscription::with_id(id);
        record.name = Some(name.to_string());
        record.next_date = (today() + ChronoDuration::days(days)).and_hms_opt(0, 0, 0);
        record
    }

    fn build_scheduler(records: Vec<Subscription>, now: NaiveDateTime) -> (ExpiryScheduler, Fixture) {
        let fixture = Fixture {
            source: Arc::new(FakeSource::new(records)),
            store: Arc::new(SubscriptionStore::new()),
            notifier: Arc::new(RecordingNotifier::default()),
        };
        let scheduler = ExpiryScheduler::new(
            &SchedulerConfig::default(),
            Arc::new(FixedClock(now)),
            fixture.source.clone(),
            fixture.store.clone(),
            fixture.notifier.clone(),
        );
        (scheduler, fixture)
    }

    #[test]
    fn test_should_scan_rules() {
        let (scheduler, _) = build_scheduler(Vec::new(), at(today(), 19, 0));
        let yesterday = today().pred_opt().unwrap();

        let gated = scheduler.with_gate(Some(today()));
        assert!(!gated.should_scan(at(today(), 19, 0)));

        let open = gated.with_gate(Some(yesterday));
        assert!(open.should_scan(at(today(), 18, 0)));
        assert!(!open.should_scan(at(today(), 17, 59)));
    }

    #[tokio::test]
    async fn test_tick_with_gate_today_does_not_scan() {
        let (scheduler, fixture) = build_scheduler(vec![due("1", "Netflix", 0)], at(today(), 19, 0));
        let mut scheduler = scheduler.with_gate(Some(today()));

        assert_eq!(scheduler.tick().await, ScanOutcome::Skipped);
        assert_eq!(fixture.source.calls(), 0);
        assert!(fixture.notifier.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_tick_after_cutoff_scans_exactly_once() {
        let yesterday = today().pred_opt().unwrap();
        let (scheduler, fixture) = build_scheduler(vec![due("1", "Netflix", 0)], at(today(), 18, 0));
        let mut scheduler = scheduler.with_gate(Some(yesterday));

        assert_eq!(scheduler.tick().await, ScanOutcome::Notified(1));
        assert_eq!(scheduler.gate(), Some(today()));
        assert_eq!(
            scheduler.tick_at(at(today(), 18, 5)).await,
            ScanOutcome::Skipped
        );

        assert_eq!(fixture.source.calls(), 1);
        assert_eq!(
            fixture.notifier.bodies(),
            vec!["「Netflix」將在 2025-01-10 到期。".to_string()]
        );
        let titles = fixture.notifier.messages.lock().unwrap();
        assert_eq!(titles[0].0, NOTIFICATION_TITLE);
    }

    #[tokio::test]
    async fn test_tick_before_cutoff_is_skipped() {
        let (mut scheduler, fixture) = build_scheduler(vec![due("1", "Netflix", 0)], at(today(), 17, 55));

        assert_eq!(scheduler.tick().await, ScanOutcome::Skipped);
        assert_eq!(fixture.source.calls(), 0);
        assert_eq!(scheduler.gate(), None);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_gate_and_list() {
        let yesterday = today().pred_opt().unwrap();
        let (scheduler, fixture) = build_scheduler(vec![due("1", "Netflix", 1)], at(today(), 18, 0));
        let mut scheduler = scheduler.with_gate(Some(yesterday));

        // 事前に一覧を読み込んでおく
        fixture.store.refresh(&*fixture.source).await.unwrap();
        let before = fixture.store.snapshot().unwrap();

        fixture.source.fail_with("network down");
        assert_eq!(scheduler.tick().await, ScanOutcome::Failed);
        assert_eq!(scheduler.gate(), Some(yesterday));
        assert_eq!(fixture.store.snapshot().unwrap(), before);
        assert!(fixture.notifier.bodies().is_empty());

        // 次のtickで再試行する
        fixture.source.succeed_with(vec![due("1", "Netflix", 1)]);
        assert_eq!(
            scheduler.tick_at(at(today(), 18, 5)).await,
            ScanOutcome::Notified(1)
        );
        assert_eq!(scheduler.gate(), Some(today()));
    }

    #[tokio::test]
    async fn test_empty_scan_consumes_the_day() {
        let (mut scheduler, fixture) = build_scheduler(vec![due("1", "Netflix", 10)], at(today(), 20, 0));

        assert_eq!(scheduler.tick().await, ScanOutcome::NothingExpiring);
        assert_eq!(scheduler.gate(), Some(today()));

        // 同日に新しいデータが現れても再通知しない
        fixture.source.succeed_with(vec![due("2", "Spotify", 0)]);
        assert_eq!(
            scheduler.tick_at(at(today(), 21, 0)).await,
            ScanOutcome::Skipped
        );
        assert!(fixture.notifier.bodies().is_empty());

        // 翌日は再びスキャンする
        let tomorrow = today().succ_opt().unwrap();
        assert_eq!(
            scheduler.tick_at(at(tomorrow, 18, 0)).await,
            ScanOutcome::Notified(1)
        );
    }

    #[tokio::test]
    async fn test_boot_scans_regardless_of_hour() {
        let (mut scheduler, fixture) = build_scheduler(
            vec![
                due("1", "Spotify", 1),
                due("2", "Netflix", 0),
                due("3", "Disney+", 0),
            ],
            at(today(), 9, 0),
        );

        assert_eq!(scheduler.boot().await, ScanOutcome::Notified(3));
        assert_eq!(scheduler.gate(), Some(today()));
        assert_eq!(
            fixture.notifier.bodies(),
            vec!["有 3 個訂閱在 3 天內到期，最近的是「Spotify」(2025-01-11)。".to_string()]
        );
        assert_eq!(fixture.store.status_message(), "已載入 3 筆訂閱資料。");

        // 起動後は当日の18時以降もスキャンしない
        assert_eq!(
            scheduler.tick_at(at(today(), 19, 0)).await,
            ScanOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_boot_failure_still_sets_gate() {
        let (mut scheduler, fixture) = build_scheduler(Vec::new(), at(today(), 19, 0));
        fixture.source.fail_with("unauthorized");

        assert_eq!(scheduler.boot().await, ScanOutcome::Failed);
        assert_eq!(scheduler.gate(), Some(today()));
        assert_eq!(fixture.store.status_message(), "載入失敗：unauthorized");
        assert!(fixture.notifier.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_configuration_consumes_the_day() {
        let yesterday = today().pred_opt().unwrap();
        let (scheduler, fixture) = build_scheduler(vec![due("1", "Netflix", 0)], at(today(), 18, 0));
        let mut scheduler = scheduler.with_gate(Some(yesterday));
        fixture
            .source
            .fail_with_configuration("Appwrite設定が不足しています: APPWRITE_PROJECT_ID");

        assert_eq!(scheduler.tick().await, ScanOutcome::Unconfigured);
        assert_eq!(scheduler.gate(), Some(today()));

        for minute in [5, 10, 15] {
            assert_eq!(
                scheduler.tick_at(at(today(), 18, minute)).await,
                ScanOutcome::Skipped
            );
        }
        assert_eq!(fixture.source.calls(), 1);
        assert!(fixture.notifier.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_records_without_dates_never_notify() {
        let mut record = Subscription::with_id("1");
        record.name = Some("Broken".to_string());
        let (mut scheduler, fixture) = build_scheduler(vec![record], at(today(), 18, 30));

        assert_eq!(scheduler.tick().await, ScanOutcome::NothingExpiring);
        assert!(fixture.notifier.bodies().is_empty());
    }
}
