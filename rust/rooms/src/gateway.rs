use async_trait::async_trait;
use baccarat_engine::engine::RoundResult;
use baccarat_engine::rules::{BetChoice, Outcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::errors::{SettlementError, WagerRejection};
use crate::session::{ParticipantId, RoundId};

/// Everything the ledger needs to settle one wager.
#[derive(Debug, Clone, Copy)]
pub struct SettlementRequest<'a> {
    pub round_id: &'a RoundId,
    pub participant: &'a ParticipantId,
    pub stake: u64,
    pub choice: BetChoice,
    pub result: &'a RoundResult,
    /// Gross amount credited back; 0 on a loss
    pub payout: u64,
}

/// Balance ledger boundary used by the scheduler.
#[async_trait]
pub trait SettlementGateway: Send + Sync {
    /// Balance pre-check run before a wager is admitted.
    async fn check_wager_allowed(
        &self,
        participant: &ParticipantId,
        amount: u64,
    ) -> Result<(), WagerRejection>;

    /// Debit the stake, credit the payout and persist a record. Returns the
    /// participant's new balance.
    async fn settle(&self, request: SettlementRequest<'_>) -> Result<u64, SettlementError>;
}

/// One persisted settlement, newest entries are returned first by
/// [`MemoryLedger::history`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub round_id: RoundId,
    pub participant: ParticipantId,
    pub stake: u64,
    pub choice: BetChoice,
    pub player_cards: String,
    pub banker_cards: String,
    pub player_total: u8,
    pub banker_total: u8,
    pub outcome: Outcome,
    pub payout: u64,
    pub balance_before: u64,
    pub balance_after: u64,
    pub settled_at: DateTime<Utc>,
}

impl SettlementRecord {
    pub fn net_change(&self) -> i128 {
        i128::from(self.balance_after) - i128::from(self.balance_before)
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<ParticipantId, u64>,
    records: Vec<SettlementRecord>,
}

/// In-memory ledger with balance checks and settlement history.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_account(&self, participant: impl Into<ParticipantId>, balance: u64) {
        self.write().balances.insert(participant.into(), balance);
    }

    pub fn balance(&self, participant: &str) -> Option<u64> {
        self.read().balances.get(participant).copied()
    }

    /// Most recent records first, up to `limit` (default 10).
    pub fn history(&self, participant: &str, limit: Option<usize>) -> Vec<SettlementRecord> {
        let limit = limit.unwrap_or(10);
        self.read()
            .records
            .iter()
            .rev()
            .filter(|r| r.participant == participant)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn records(&self) -> Vec<SettlementRecord> {
        self.read().records.clone()
    }

    pub fn total_settlements(&self) -> usize {
        self.read().records.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SettlementGateway for MemoryLedger {
    async fn check_wager_allowed(
        &self,
        participant: &ParticipantId,
        amount: u64,
    ) -> Result<(), WagerRejection> {
        let balance = self.balance(participant).unwrap_or(0);
        if balance < amount {
            return Err(WagerRejection::InsufficientBalance { balance });
        }
        Ok(())
    }

    async fn settle(&self, request: SettlementRequest<'_>) -> Result<u64, SettlementError> {
        let mut state = self.write();
        let balance_before = *state
            .balances
            .get(request.participant)
            .ok_or_else(|| SettlementError::UnknownParticipant(request.participant.clone()))?;
        if balance_before < request.stake {
            return Err(SettlementError::InsufficientFunds {
                participant: request.participant.clone(),
                stake: request.stake,
                balance: balance_before,
            });
        }

        let balance_after = balance_before - request.stake + request.payout;
        state
            .balances
            .insert(request.participant.clone(), balance_after);
        state.records.push(SettlementRecord {
            round_id: request.round_id.clone(),
            participant: request.participant.clone(),
            stake: request.stake,
            choice: request.choice,
            player_cards: request.result.player.to_string(),
            banker_cards: request.result.banker.to_string(),
            player_total: request.result.player_total,
            banker_total: request.result.banker_total,
            outcome: request.result.outcome,
            payout: request.payout,
            balance_before,
            balance_after,
            settled_at: Utc::now(),
        });
        Ok(balance_after)
    }
}
