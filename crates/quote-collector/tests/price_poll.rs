//! 수집 주기 및 스케줄러 통합 테스트.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use quote_collector::modules::PricePoll;
use quote_collector::{CycleOutcome, PollScheduler};
use quote_core::{
    DataPoint, FieldValue, MetricsSink, ProviderError, Quote, QuoteProvider, SinkConnection,
    SinkError, StoreError, Symbol, SymbolSource,
};
use quote_exchange::{MarketClock, MarketStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// =============================================================================
// Fakes
// =============================================================================

struct FakeSymbols {
    symbols: Result<Vec<Symbol>, String>,
}

impl FakeSymbols {
    fn of(codes: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            symbols: Ok(codes
                .iter()
                .map(|code| Symbol::new(*code, format!("종목{}", code)))
                .collect()),
        })
    }

    fn broken() -> Arc<Self> {
        Arc::new(Self {
            symbols: Err("stocks.json 손상".to_string()),
        })
    }
}

#[async_trait]
impl SymbolSource for FakeSymbols {
    async fn load(&self) -> Result<Vec<Symbol>, StoreError> {
        self.symbols.clone().map_err(StoreError::Corrupt)
    }
}

#[derive(Clone, Copy)]
enum Behavior {
    Quote,
    Empty,
    Fail,
    Panic,
}

#[derive(Default)]
struct FakeProvider {
    behaviors: HashMap<String, Behavior>,
    calls: Mutex<Vec<String>>,
    /// 설정되면 첫 조회에서 `started`를 알리고 `release`를 기다린다
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl FakeProvider {
    fn with(behaviors: &[(&str, Behavior)]) -> Self {
        Self {
            behaviors: behaviors
                .iter()
                .map(|(code, b)| (code.to_string(), *b))
                .collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn quote_for(symbol: &Symbol) -> Quote {
    Quote {
        code: symbol.code.clone(),
        name: symbol.name.clone(),
        current_price: 70000,
        price_diff: 1000,
        change_rate: 1.45,
        volume: 1_000_000,
        trading_value: 70_000_000_000,
        open_price: 69000,
        high_price: 71000,
        low_price: 68000,
    }
}

#[async_trait]
impl QuoteProvider for FakeProvider {
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, ProviderError> {
        self.calls.lock().unwrap().push(symbol.code.clone());

        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }

        match self.behaviors.get(&symbol.code).copied().unwrap_or(Behavior::Quote) {
            Behavior::Quote => Ok(Some(quote_for(symbol))),
            Behavior::Empty => Ok(None),
            Behavior::Fail => Err(ProviderError::Network("connection reset".to_string())),
            Behavior::Panic => panic!("unexpected payload for {}", symbol.code),
        }
    }
}

#[derive(Default)]
struct SinkLog {
    opens: AtomicUsize,
    closes: AtomicUsize,
    points: Mutex<Vec<DataPoint>>,
}

struct FakeSink {
    log: Arc<SinkLog>,
    fail_open: bool,
    reject_code: Option<String>,
}

impl FakeSink {
    fn new(log: Arc<SinkLog>) -> Self {
        Self {
            log,
            fail_open: false,
            reject_code: None,
        }
    }
}

struct FakeConnection {
    log: Arc<SinkLog>,
    reject_code: Option<String>,
}

#[async_trait]
impl MetricsSink for FakeSink {
    async fn open(&self) -> Result<Box<dyn SinkConnection>, SinkError> {
        if self.fail_open {
            return Err(SinkError::Connection("refused".to_string()));
        }
        self.log.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            log: self.log.clone(),
            reject_code: self.reject_code.clone(),
        }))
    }
}

#[async_trait]
impl SinkConnection for FakeConnection {
    async fn write(&mut self, point: &DataPoint) -> Result<(), SinkError> {
        let code = point
            .tags
            .iter()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.clone());
        if code.is_some() && code == self.reject_code {
            return Err(SinkError::Rejected {
                status: 400,
                body: "bad point".to_string(),
            });
        }
        self.log.points.lock().unwrap().push(point.clone());
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), SinkError> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn written_codes(log: &SinkLog) -> Vec<String> {
    log.points
        .lock()
        .unwrap()
        .iter()
        .map(|p| p.tags[0].1.clone())
        .collect()
}

fn tuesday_10am() -> DateTime<Utc> {
    // 2025-03-04 10:00 KST
    Utc.with_ymd_and_hms(2025, 3, 4, 1, 0, 0).unwrap()
}

// =============================================================================
// PricePoll
// =============================================================================

#[tokio::test]
async fn test_failed_symbol_does_not_stop_cycle() {
    let log = Arc::new(SinkLog::default());
    let provider = Arc::new(FakeProvider::with(&[("000660", Behavior::Fail)]));
    let poll = PricePoll::new(
        FakeSymbols::of(&["005930", "000660", "035420"]),
        provider.clone(),
        Arc::new(FakeSink::new(log.clone())),
    );

    let stats = poll.run_cycle().await.unwrap();

    assert_eq!(provider.calls(), vec!["005930", "000660", "035420"]);
    assert_eq!(written_codes(&log), vec!["005930", "035420"]);
    assert_eq!((stats.total, stats.success, stats.errors), (3, 2, 1));
    assert_eq!(log.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_written_point_shape() {
    let log = Arc::new(SinkLog::default());
    let poll = PricePoll::new(
        FakeSymbols::of(&["005930"]),
        Arc::new(FakeProvider::default()),
        Arc::new(FakeSink::new(log.clone())),
    );

    poll.run_cycle().await.unwrap();

    let points = log.points.lock().unwrap();
    let point = &points[0];
    assert_eq!(point.measurement, "stock_price");
    assert_eq!(point.tags[1], ("name".to_string(), "종목005930".to_string()));
    assert!(point
        .fields
        .contains(&("current_price".to_string(), FieldValue::Integer(70000))));
    assert!(point.timestamp.is_some());
}

#[tokio::test]
async fn test_panicking_symbol_is_isolated() {
    let log = Arc::new(SinkLog::default());
    let poll = PricePoll::new(
        FakeSymbols::of(&["005930", "000660", "035420"]),
        Arc::new(FakeProvider::with(&[("005930", Behavior::Panic)])),
        Arc::new(FakeSink::new(log.clone())),
    );

    let stats = poll.run_cycle().await.unwrap();

    assert_eq!(written_codes(&log), vec!["000660", "035420"]);
    assert_eq!(stats.errors, 1);
    assert_eq!(log.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sink_rejection_is_isolated() {
    let log = Arc::new(SinkLog::default());
    let mut sink = FakeSink::new(log.clone());
    sink.reject_code = Some("000660".to_string());

    let poll = PricePoll::new(
        FakeSymbols::of(&["005930", "000660", "035420"]),
        Arc::new(FakeProvider::default()),
        Arc::new(sink),
    );

    let stats = poll.run_cycle().await.unwrap();
    assert_eq!(written_codes(&log), vec!["005930", "035420"]);
    assert_eq!(stats.errors, 1);
}

#[tokio::test]
async fn test_connection_closed_once_whatever_happens() {
    let cases: Vec<(&[&str], Vec<(&str, Behavior)>)> = vec![
        (&[], vec![]),
        (
            &["005930", "000660"],
            vec![("005930", Behavior::Fail), ("000660", Behavior::Panic)],
        ),
        (
            &["005930", "000660", "035420"],
            vec![("000660", Behavior::Empty), ("035420", Behavior::Fail)],
        ),
    ];

    for (codes, behaviors) in cases {
        let log = Arc::new(SinkLog::default());
        let poll = PricePoll::new(
            FakeSymbols::of(codes),
            Arc::new(FakeProvider::with(&behaviors)),
            Arc::new(FakeSink::new(log.clone())),
        );

        let stats = poll.run_cycle().await.unwrap();

        assert_eq!(stats.total, codes.len());
        assert_eq!(log.opens.load(Ordering::SeqCst), 1);
        assert_eq!(log.closes.load(Ordering::SeqCst), 1, "codes: {:?}", codes);
    }
}

#[tokio::test]
async fn test_empty_quote_is_counted_not_written() {
    let log = Arc::new(SinkLog::default());
    let poll = PricePoll::new(
        FakeSymbols::of(&["005930", "000660"]),
        Arc::new(FakeProvider::with(&[("005930", Behavior::Empty)])),
        Arc::new(FakeSink::new(log.clone())),
    );

    let stats = poll.run_cycle().await.unwrap();
    assert_eq!((stats.success, stats.empty, stats.errors), (1, 1, 0));
    assert_eq!(written_codes(&log), vec!["000660"]);
}

#[tokio::test]
async fn test_symbol_load_failure_aborts_cycle_without_opening_sink() {
    let log = Arc::new(SinkLog::default());
    let provider = Arc::new(FakeProvider::default());
    let poll = PricePoll::new(
        FakeSymbols::broken(),
        provider.clone(),
        Arc::new(FakeSink::new(log.clone())),
    );

    assert!(poll.run_cycle().await.is_err());
    assert_eq!(log.opens.load(Ordering::SeqCst), 0);
    assert!(provider.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_request_delay_paces_each_symbol() {
    let log = Arc::new(SinkLog::default());
    let poll = PricePoll::new(
        FakeSymbols::of(&["005930", "000660", "035420"]),
        Arc::new(FakeProvider::default()),
        Arc::new(FakeSink::new(log.clone())),
    )
    .with_request_delay(std::time::Duration::from_millis(200));

    let start = tokio::time::Instant::now();
    poll.run_cycle().await.unwrap();

    assert!(start.elapsed() >= std::time::Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn test_request_delay_cannot_be_disabled() {
    let log = Arc::new(SinkLog::default());
    let poll = PricePoll::new(
        FakeSymbols::of(&["005930", "000660"]),
        Arc::new(FakeProvider::default()),
        Arc::new(FakeSink::new(log.clone())),
    )
    .with_request_delay(std::time::Duration::ZERO);

    let start = tokio::time::Instant::now();
    poll.run_cycle().await.unwrap();

    assert!(start.elapsed() >= std::time::Duration::from_millis(400));
}

// =============================================================================
// PollScheduler
// =============================================================================

fn scheduler_with(log: Arc<SinkLog>, provider: Arc<FakeProvider>) -> PollScheduler {
    let poll = PricePoll::new(
        FakeSymbols::of(&["005930", "000660"]),
        provider,
        Arc::new(FakeSink::new(log)),
    );
    PollScheduler::new(poll, MarketClock::krx())
}

#[tokio::test]
async fn test_closed_market_skips_cycle() {
    let log = Arc::new(SinkLog::default());
    let provider = Arc::new(FakeProvider::default());
    let scheduler = scheduler_with(log.clone(), provider.clone());

    // 2025-03-08 토요일 10:00 KST
    let saturday = Utc.with_ymd_and_hms(2025, 3, 8, 1, 0, 0).unwrap();
    assert_eq!(
        scheduler.fire_at(saturday).await,
        CycleOutcome::MarketClosed(MarketStatus::Closed)
    );

    // 화요일 15:30:01 KST
    let after_close = Utc.with_ymd_and_hms(2025, 3, 4, 6, 30, 1).unwrap();
    assert_eq!(
        scheduler.fire_at(after_close).await,
        CycleOutcome::MarketClosed(MarketStatus::AfterHours)
    );

    assert!(provider.calls().is_empty());
    assert_eq!(log.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_open_market_runs_cycle() {
    let log = Arc::new(SinkLog::default());
    let scheduler = scheduler_with(log.clone(), Arc::new(FakeProvider::default()));

    match scheduler.fire_at(tuesday_10am()).await {
        CycleOutcome::Completed(stats) => assert_eq!(stats.success, 2),
        other => panic!("expected completed cycle, got {:?}", other),
    }
    assert_eq!(log.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_forced_run_ignores_market_hours() {
    let log = Arc::new(SinkLog::default());
    let scheduler = scheduler_with(log.clone(), Arc::new(FakeProvider::default()));

    assert!(matches!(
        scheduler.run_now().await,
        CycleOutcome::Completed(_)
    ));
}

#[tokio::test]
async fn test_cycle_failure_is_reported_not_raised() {
    let log = Arc::new(SinkLog::default());
    let mut sink = FakeSink::new(log.clone());
    sink.fail_open = true;

    let poll = PricePoll::new(
        FakeSymbols::of(&["005930"]),
        Arc::new(FakeProvider::default()),
        Arc::new(sink),
    );
    let scheduler = PollScheduler::new(poll, MarketClock::krx());

    assert!(matches!(
        scheduler.fire_at(tuesday_10am()).await,
        CycleOutcome::Failed(reason) if reason.contains("refused")
    ));

    // 다음 발화는 정상적으로 다시 시도된다
    assert!(matches!(
        scheduler.fire_at(tuesday_10am()).await,
        CycleOutcome::Failed(_)
    ));
}

#[tokio::test]
async fn test_overlapping_firing_is_skipped() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let mut provider = FakeProvider::default();
    provider.gate = Some((started.clone(), release.clone()));
    let provider = Arc::new(provider);

    let log = Arc::new(SinkLog::default());
    let poll = PricePoll::new(
        FakeSymbols::of(&["005930"]),
        provider.clone(),
        Arc::new(FakeSink::new(log.clone())),
    );
    let scheduler = Arc::new(PollScheduler::new(poll, MarketClock::krx()));

    let first = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.fire_at(tuesday_10am()).await }
    });

    started.notified().await;
    assert_eq!(
        scheduler.fire_at(tuesday_10am()).await,
        CycleOutcome::Overlapped
    );

    release.notify_one();
    assert!(matches!(first.await.unwrap(), CycleOutcome::Completed(_)));
    assert_eq!(provider.calls(), vec!["005930"]);
    assert_eq!(log.opens.load(Ordering::SeqCst), 1);
}
