use baccarat_engine::engine::RoundResult;
use baccarat_engine::errors::EngineError;
use baccarat_engine::rules::{payout, BetChoice};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep_until;
use uuid::Uuid;

use crate::config::{ConfigError, RoomConfig};
use crate::errors::{ClassifiedError, WagerError};
use crate::gateway::{SettlementGateway, SettlementRequest};
use crate::messages;
use crate::notifier::{CancelReason, Notifier};
use crate::resolver::{create_resolver, RoundResolver};
use crate::session::{ParticipantId, RoomId, RoundId, RoundSession, RoundStatus, Submission, Wager};

/// How an admitted wager landed in its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WagerStatus {
    /// The wager opened a fresh round
    NewRound,
    /// First wager of this participant in an already open round
    Joined,
    /// Replaced the participant's earlier wager in this round
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WagerReceipt {
    pub status: WagerStatus,
    pub round_id: RoundId,
    pub remaining_seconds: u64,
    pub wager: Wager,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledWager {
    pub wager: Wager,
    pub payout: u64,
    pub new_balance: u64,
}

/// What closing a room's round amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReport {
    /// No open round, or another caller already began closing it
    NotOpen,
    /// The round held no wagers
    Cancelled { round_id: RoundId },
    /// The engine failed; nothing was settled
    Aborted { round_id: RoundId, error: EngineError },
    Settled {
        round_id: RoundId,
        result: RoundResult,
        settled: Vec<SettledWager>,
        failed: Vec<ParticipantId>,
    },
}

struct RoomSlot {
    round_id: RoundId,
    session: Mutex<RoundSession>,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl RoomSlot {
    fn lock(&self) -> MutexGuard<'_, RoundSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_countdown(&self) {
        let sender = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = sender {
            let _ = tx.send(());
        }
    }

    /// Open → Resolving. Only the caller that performs the transition gets
    /// `true`.
    fn begin_resolving(&self) -> bool {
        let mut session = self.lock();
        if session.is_open() {
            session.set_status(RoundStatus::Resolving);
            true
        } else {
            false
        }
    }
}

enum Admission {
    Admitted(WagerReceipt),
    Expired,
    Closing,
}

struct SchedulerInner {
    config: RoomConfig,
    rooms: DashMap<RoomId, Arc<RoomSlot>>,
    resolver: Mutex<Box<dyn RoundResolver>>,
    gateway: Arc<dyn SettlementGateway>,
    notifier: Arc<dyn Notifier>,
    accepting: AtomicBool,
}

/// Runs one betting window per room and settles each exactly once.
///
/// Cloning is cheap; every clone drives the same rooms.
#[derive(Clone)]
pub struct RoundScheduler {
    inner: Arc<SchedulerInner>,
}

impl std::fmt::Debug for RoundScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundScheduler")
            .field("config", &self.inner.config)
            .field("active_rooms", &self.inner.rooms.len())
            .finish()
    }
}

impl RoundScheduler {
    pub fn new(
        config: RoomConfig,
        resolver: Box<dyn RoundResolver>,
        gateway: Arc<dyn SettlementGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(SchedulerInner {
                config,
                rooms: DashMap::new(),
                resolver: Mutex::new(resolver),
                gateway,
                notifier,
                accepting: AtomicBool::new(true),
            }),
        })
    }

    /// Scheduler dealing from a baccarat engine keyed by `config.shoe_seed`.
    pub fn with_engine(
        config: RoomConfig,
        gateway: Arc<dyn SettlementGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let resolver = create_resolver(config.shoe_seed);
        Self::new(config, resolver, gateway, notifier)
    }

    pub fn config(&self) -> &RoomConfig {
        &self.inner.config
    }

    /// Admit a wager into the room's open round, opening one if needed.
    ///
    /// Bounds and balance are checked before any room state is touched. An
    /// expired round still present in the room is settled first, then a new
    /// round is opened with this wager.
    pub async fn place_wager(
        &self,
        room: &str,
        participant: &str,
        display_name: &str,
        choice: BetChoice,
        amount: u64,
    ) -> Result<WagerReceipt, WagerError> {
        let room: RoomId = room.to_string();
        let participant: ParticipantId = participant.to_string();

        if let Err(err) = self.check_wager(&participant, amount).await {
            err.log_error(&room);
            return Err(err);
        }

        loop {
            let slot = match self.inner.rooms.entry(room.clone()) {
                Entry::Occupied(entry) => Arc::clone(entry.get()),
                Entry::Vacant(entry) => {
                    // shutdown may have run while the balance check was awaited
                    if !self.inner.accepting.load(Ordering::SeqCst) {
                        let err = WagerError::ShuttingDown;
                        err.log_error(&room);
                        return Err(err);
                    }
                    let (slot, receipt, cancel) =
                        self.open_round(&room, &participant, display_name, choice, amount);
                    drop(entry.insert(Arc::clone(&slot)));
                    tracing::info!(
                        room = %room,
                        round_id = %receipt.round_id,
                        participant = %participant,
                        "round opened"
                    );
                    self.spawn_countdown(room.clone(), slot, cancel);
                    return Ok(receipt);
                }
            };

            let admission = {
                let mut session = slot.lock();
                match session.status() {
                    RoundStatus::Open if !session.is_expired() => {
                        let (submission, wager) =
                            session.submit_wager(&participant, display_name, choice, amount);
                        let status = match submission {
                            Submission::Inserted => WagerStatus::Joined,
                            Submission::Replaced => WagerStatus::Updated,
                        };
                        Admission::Admitted(WagerReceipt {
                            status,
                            round_id: slot.round_id.clone(),
                            remaining_seconds: session.remaining_seconds(),
                            wager,
                        })
                    }
                    RoundStatus::Open => {
                        session.set_status(RoundStatus::Resolving);
                        Admission::Expired
                    }
                    RoundStatus::Resolving | RoundStatus::Closed => Admission::Closing,
                }
            };

            match admission {
                Admission::Admitted(receipt) => {
                    tracing::debug!(
                        room = %room,
                        round_id = %receipt.round_id,
                        participant = %participant,
                        status = ?receipt.status,
                        "wager admitted"
                    );
                    return Ok(receipt);
                }
                Admission::Closing => {
                    let err = WagerError::RoundClosing(room.clone());
                    err.log_error(&room);
                    return Err(err);
                }
                Admission::Expired => {
                    tracing::info!(
                        room = %room,
                        round_id = %slot.round_id,
                        "closing expired round before opening the next"
                    );
                    self.finish_round(&room, &slot).await;
                    // settlement moved the balance; the next round needs a fresh check
                    if let Err(err) = self.check_wager(&participant, amount).await {
                        err.log_error(&room);
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Resolve and settle the room's open round now.
    pub async fn close_session(&self, room: &str) -> CloseReport {
        let Some(slot) = self.slot(room) else {
            return CloseReport::NotOpen;
        };
        if !slot.begin_resolving() {
            return CloseReport::NotOpen;
        }
        self.finish_round(&room.to_string(), &slot).await
    }

    /// Stop every open round's countdown without settling it. Rounds already
    /// resolving are left to finish. Returns the number of rounds stopped.
    pub fn shutdown(&self) -> usize {
        self.inner.accepting.store(false, Ordering::SeqCst);

        let slots: Vec<(RoomId, Arc<RoomSlot>)> = self
            .inner
            .rooms
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut stopped = 0;
        for (room, slot) in slots {
            let discarded = {
                let mut session = slot.lock();
                if !session.is_open() {
                    continue;
                }
                session.set_status(RoundStatus::Closed);
                session.wagers().len()
            };
            slot.cancel_countdown();
            self.inner
                .rooms
                .remove_if(&room, |_, current| Arc::ptr_eq(current, &slot));
            tracing::warn!(
                room = %room,
                round_id = %slot.round_id,
                discarded_wagers = discarded,
                "round stopped by shutdown"
            );
            stopped += 1;
        }
        stopped
    }

    pub fn active_rooms(&self) -> Vec<RoomId> {
        self.inner
            .rooms
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Open and still inside its betting window.
    pub fn is_round_open(&self, room: &str) -> bool {
        self.slot(room)
            .map(|slot| {
                let session = slot.lock();
                session.is_open() && !session.is_expired()
            })
            .unwrap_or(false)
    }

    pub fn round_status(&self, room: &str) -> Option<RoundStatus> {
        self.slot(room).map(|slot| slot.lock().status())
    }

    pub fn bet_summary(&self, room: &str) -> Option<String> {
        self.slot(room).map(|slot| slot.lock().bet_summary())
    }

    pub fn remaining_seconds(&self, room: &str) -> Option<u64> {
        self.slot(room).map(|slot| slot.lock().remaining_seconds())
    }

    pub fn wagers(&self, room: &str) -> Vec<Wager> {
        self.slot(room)
            .map(|slot| slot.lock().wagers().to_vec())
            .unwrap_or_default()
    }

    fn slot(&self, room: &str) -> Option<Arc<RoomSlot>> {
        self.inner
            .rooms
            .get(room)
            .map(|entry| Arc::clone(entry.value()))
    }

    async fn check_wager(
        &self,
        participant: &ParticipantId,
        amount: u64,
    ) -> Result<(), WagerError> {
        if !self.inner.accepting.load(Ordering::SeqCst) {
            return Err(WagerError::ShuttingDown);
        }
        let config = &self.inner.config;
        if amount < config.min_wager || amount > config.max_wager {
            return Err(WagerError::OutOfBounds {
                amount,
                min: config.min_wager,
                max: config.max_wager,
            });
        }
        self.inner
            .gateway
            .check_wager_allowed(participant, amount)
            .await
            .map_err(WagerError::from)
    }

    fn open_round(
        &self,
        room: &RoomId,
        participant: &ParticipantId,
        display_name: &str,
        choice: BetChoice,
        amount: u64,
    ) -> (Arc<RoomSlot>, WagerReceipt, oneshot::Receiver<()>) {
        let round_id = Uuid::new_v4().to_string();
        let mut session =
            RoundSession::new(round_id.clone(), room.clone(), self.inner.config.window());
        let (_, wager) = session.submit_wager(participant, display_name, choice, amount);
        let receipt = WagerReceipt {
            status: WagerStatus::NewRound,
            round_id: round_id.clone(),
            remaining_seconds: session.remaining_seconds(),
            wager,
        };

        let (tx, rx) = oneshot::channel();
        let slot = Arc::new(RoomSlot {
            round_id,
            session: Mutex::new(session),
            cancel: Mutex::new(Some(tx)),
        });
        (slot, receipt, rx)
    }

    fn spawn_countdown(&self, room: RoomId, slot: Arc<RoomSlot>, cancel: oneshot::Receiver<()>) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_countdown(room, slot, cancel).await;
        });
    }

    /// Announce, fire each threshold once, then close at the deadline.
    async fn run_countdown(
        &self,
        room: RoomId,
        slot: Arc<RoomSlot>,
        mut cancel: oneshot::Receiver<()>,
    ) {
        let (remaining, summary, deadline) = {
            let session = slot.lock();
            if !session.is_open() {
                return;
            }
            (
                session.remaining_seconds(),
                session.bet_summary(),
                session.deadline(),
            )
        };

        match self
            .inner
            .notifier
            .announce_open(&room, remaining, &summary)
            .await
        {
            Ok(Some(handle)) => slot.lock().set_message(handle),
            Ok(None) => {}
            Err(err) => err.log_error(&room),
        }

        for mark in self.inner.config.effective_thresholds() {
            let at = deadline - Duration::from_secs(mark);
            tokio::select! {
                _ = &mut cancel => {
                    tracing::debug!(room = %room, round_id = %slot.round_id, "countdown cancelled");
                    return;
                }
                _ = sleep_until(at) => {}
            }

            let (summary, handle) = {
                let session = slot.lock();
                if !session.is_open() {
                    return;
                }
                (session.bet_summary(), session.message().cloned())
            };
            tracing::debug!(room = %room, remaining = mark, "countdown mark");
            if let Err(err) = self
                .inner
                .notifier
                .update_countdown(&room, handle.as_ref(), mark, &summary)
                .await
            {
                err.log_error(&room);
            }
        }

        tokio::select! {
            _ = &mut cancel => {
                tracing::debug!(room = %room, round_id = %slot.round_id, "countdown cancelled");
                return;
            }
            _ = sleep_until(deadline) => {}
        }

        if slot.begin_resolving() {
            self.finish_round(&room, &slot).await;
        }
    }

    /// Settle a round the caller has already moved to Resolving.
    async fn finish_round(&self, room: &RoomId, slot: &Arc<RoomSlot>) -> CloseReport {
        slot.cancel_countdown();
        let round_id = slot.round_id.clone();
        let wagers = slot.lock().take_wagers();

        if wagers.is_empty() {
            tracing::info!(room = %room, round_id = %round_id, "round cancelled without wagers");
            self.announce_cancelled(room, CancelReason::NoWagers).await;
            self.retire(room, slot);
            return CloseReport::Cancelled { round_id };
        }

        let result = match self.resolve() {
            Ok(result) => result,
            Err(error) => {
                error.log_error(room);
                self.announce_cancelled(room, CancelReason::DealFailed).await;
                self.retire(room, slot);
                return CloseReport::Aborted { round_id, error };
            }
        };

        let mut settled = Vec::with_capacity(wagers.len());
        let mut failed = Vec::new();
        let mut lines = Vec::with_capacity(wagers.len());
        for wager in wagers {
            let returned = payout(wager.amount, wager.choice, result.outcome);
            let request = SettlementRequest {
                round_id: &round_id,
                participant: &wager.participant,
                stake: wager.amount,
                choice: wager.choice,
                result: &result,
                payout: returned,
            };
            match self.inner.gateway.settle(request).await {
                Ok(new_balance) => {
                    lines.push(messages::settlement_line(&wager, returned));
                    settled.push(SettledWager {
                        wager,
                        payout: returned,
                        new_balance,
                    });
                }
                Err(err) => {
                    err.log_error(room);
                    failed.push(wager.participant);
                }
            }
        }

        let text = messages::round_result(&result, &lines);
        if let Err(err) = self.inner.notifier.announce_result(room, &text).await {
            err.log_error(room);
        }
        self.retire(room, slot);

        tracing::info!(
            room = %room,
            round_id = %round_id,
            outcome = %result.outcome,
            settled = settled.len(),
            failed = failed.len(),
            "round settled"
        );

        CloseReport::Settled {
            round_id,
            result,
            settled,
            failed,
        }
    }

    fn resolve(&self) -> Result<RoundResult, EngineError> {
        let mut resolver = self
            .inner
            .resolver
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        resolver.play_round()
    }

    async fn announce_cancelled(&self, room: &RoomId, reason: CancelReason) {
        if let Err(err) = self.inner.notifier.announce_cancelled(room, reason).await {
            err.log_error(room);
        }
    }

    fn retire(&self, room: &RoomId, slot: &Arc<RoomSlot>) {
        self.inner
            .rooms
            .remove_if(room, |_, current| Arc::ptr_eq(current, slot));
        slot.lock().set_status(RoundStatus::Closed);
    }
}
