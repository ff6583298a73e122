//! Shared fixtures for scheduler integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use baccarat_engine::deck::Deck;
use baccarat_engine::engine::{Engine, RoundResult};
use baccarat_engine::errors::EngineError;
use baccarat_engine::hand::Side;
use baccarat_rooms::{
    CancelReason, ChannelNotifier, MemoryLedger, MessageHandle, Notifier, NotifyError,
    ParticipantId, RoomConfig, RoomEvent, RoomId, RoomSubscription, RoundResolver, RoundScheduler,
    SettlementError, SettlementGateway, SettlementRequest, WagerRejection,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const STARTING_BALANCE: u64 = 10_000;

/// Engine wrapper counting `play_round` calls; fails the first `fail_first`
/// rounds.
pub struct CountingResolver {
    engine: Engine,
    calls: Arc<AtomicUsize>,
    fail_first: usize,
}

impl CountingResolver {
    pub fn new(seed: u64, calls: Arc<AtomicUsize>) -> Self {
        Self {
            engine: Engine::new(Some(seed)),
            calls,
            fail_first: 0,
        }
    }

    pub fn with_deck(deck: Deck, calls: Arc<AtomicUsize>) -> Self {
        Self {
            engine: Engine::with_deck(deck),
            calls,
            fail_first: 0,
        }
    }

    pub fn failing_first(mut self, rounds: usize) -> Self {
        self.fail_first = rounds;
        self
    }
}

impl RoundResolver for CountingResolver {
    fn play_round(&mut self) -> Result<RoundResult, EngineError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            return Err(EngineError::IncompleteHand {
                side: Side::Banker,
                held: 1,
            });
        }
        self.engine.play_round()
    }
}

/// Ledger double that counts settlements, can fail chosen participants and
/// can hold settlements until released.
#[derive(Default)]
pub struct RecordingGateway {
    pub ledger: MemoryLedger,
    settle_calls: AtomicUsize,
    check_calls: AtomicUsize,
    failing: Mutex<HashSet<ParticipantId>>,
    hold: Mutex<Option<Arc<Notify>>>,
    hold_checks: Mutex<Option<Arc<Notify>>>,
}

impl RecordingGateway {
    pub fn with_accounts(participants: &[&str]) -> Self {
        let gateway = Self::default();
        for p in participants {
            gateway.ledger.open_account(*p, STARTING_BALANCE);
        }
        gateway
    }

    pub fn settle_calls(&self) -> usize {
        self.settle_calls.load(Ordering::SeqCst)
    }

    pub fn fail_for(&self, participant: &str) {
        self.failing.lock().unwrap().insert(participant.to_string());
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    /// Balance checks block until the returned handle is notified.
    pub fn hold_checks(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold_checks.lock().unwrap() = Some(notify.clone());
        notify
    }

    /// Settlements block until the returned handle is notified.
    pub fn hold_settlements(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(notify.clone());
        notify
    }
}

#[async_trait]
impl SettlementGateway for RecordingGateway {
    async fn check_wager_allowed(
        &self,
        participant: &ParticipantId,
        amount: u64,
    ) -> Result<(), WagerRejection> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let hold = self.hold_checks.lock().unwrap().clone();
        if let Some(notify) = hold {
            notify.notified().await;
        }
        self.ledger.check_wager_allowed(participant, amount).await
    }

    async fn settle(&self, request: SettlementRequest<'_>) -> Result<u64, SettlementError> {
        self.settle_calls.fetch_add(1, Ordering::SeqCst);
        let hold = self.hold.lock().unwrap().clone();
        if let Some(notify) = hold {
            notify.notified().await;
        }
        if self.failing.lock().unwrap().contains(request.participant) {
            return Err(SettlementError::Unavailable("ledger offline".into()));
        }
        self.ledger.settle(request).await
    }
}

/// Notifier whose every delivery fails.
#[derive(Default)]
pub struct FailingNotifier {
    pub calls: AtomicUsize,
}

impl FailingNotifier {
    fn fail(&self) -> NotifyError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        NotifyError::Delivery("transport down".into())
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn announce_open(
        &self,
        _room: &RoomId,
        _remaining_seconds: u64,
        _summary: &str,
    ) -> Result<Option<MessageHandle>, NotifyError> {
        Err(self.fail())
    }

    async fn update_countdown(
        &self,
        _room: &RoomId,
        _handle: Option<&MessageHandle>,
        _remaining_seconds: u64,
        _summary: &str,
    ) -> Result<(), NotifyError> {
        Err(self.fail())
    }

    async fn announce_result(&self, _room: &RoomId, _text: &str) -> Result<(), NotifyError> {
        Err(self.fail())
    }

    async fn announce_cancelled(
        &self,
        _room: &RoomId,
        _reason: CancelReason,
    ) -> Result<(), NotifyError> {
        Err(self.fail())
    }
}

pub struct Table {
    pub scheduler: RoundScheduler,
    pub gateway: Arc<RecordingGateway>,
    pub notifier: ChannelNotifier,
    pub engine_calls: Arc<AtomicUsize>,
}

impl Table {
    pub fn engine_calls(&self) -> usize {
        self.engine_calls.load(Ordering::SeqCst)
    }
}

pub fn config(window_seconds: u64) -> RoomConfig {
    RoomConfig {
        window_length_seconds: window_seconds,
        ..RoomConfig::default()
    }
}

pub fn table(config: RoomConfig, participants: &[&str]) -> Table {
    table_with_resolver(config, participants, |calls| CountingResolver::new(42, calls))
}

pub fn table_with_resolver(
    config: RoomConfig,
    participants: &[&str],
    resolver: impl FnOnce(Arc<AtomicUsize>) -> CountingResolver,
) -> Table {
    let engine_calls = Arc::new(AtomicUsize::new(0));
    let gateway = Arc::new(RecordingGateway::with_accounts(participants));
    let notifier = ChannelNotifier::new();
    let scheduler = RoundScheduler::new(
        config,
        Box::new(resolver(engine_calls.clone())),
        gateway.clone(),
        Arc::new(notifier.clone()),
    )
    .expect("valid config");
    Table {
        scheduler,
        gateway,
        notifier,
        engine_calls,
    }
}

/// Collect room events up to and including the round's result or
/// cancellation notice.
pub async fn events_until_close(subscription: &mut RoomSubscription) -> Vec<RoomEvent> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(600), subscription.receiver.recv())
            .await
            .expect("round closed in time")
            .expect("notifier alive");
        let done = matches!(
            event,
            RoomEvent::RoundResult { .. } | RoomEvent::RoundCancelled { .. }
        );
        events.push(event);
        if done {
            return events;
        }
    }
}

pub fn countdown_marks(events: &[RoomEvent]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|e| match e {
            RoomEvent::Countdown {
                remaining_seconds, ..
            } => Some(*remaining_seconds),
            _ => None,
        })
        .collect()
}
