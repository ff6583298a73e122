use baccarat_engine::rules::BetChoice;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::messages;
use crate::notifier::MessageHandle;

pub type RoomId = String;
pub type ParticipantId = String;
pub type RoundId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Open,
    Resolving,
    Closed,
}

/// One participant's stake in the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wager {
    pub participant: ParticipantId,
    pub display_name: String,
    pub choice: BetChoice,
    pub amount: u64,
}

/// Whether a submission created or replaced the participant's wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Inserted,
    Replaced,
}

/// A single betting window for one room.
///
/// Wagers keep first-submission order; resubmitting replaces the stored
/// wager in place. Time is read from the tokio clock so paused-time tests
/// drive it deterministically.
#[derive(Debug)]
pub struct RoundSession {
    round_id: RoundId,
    room: RoomId,
    created_at: Instant,
    window: Duration,
    wagers: Vec<Wager>,
    status: RoundStatus,
    message: Option<MessageHandle>,
}

impl RoundSession {
    pub fn new(round_id: RoundId, room: RoomId, window: Duration) -> Self {
        Self::starting_at(round_id, room, window, Instant::now())
    }

    pub fn starting_at(round_id: RoundId, room: RoomId, window: Duration, now: Instant) -> Self {
        Self {
            round_id,
            room,
            created_at: now,
            window,
            wagers: Vec::new(),
            status: RoundStatus::Open,
            message: None,
        }
    }

    pub fn round_id(&self) -> &RoundId {
        &self.round_id
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn deadline(&self) -> Instant {
        self.created_at + self.window
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn set_status(&mut self, status: RoundStatus) {
        self.status = status;
    }

    pub fn is_open(&self) -> bool {
        self.status == RoundStatus::Open
    }

    pub fn message(&self) -> Option<&MessageHandle> {
        self.message.as_ref()
    }

    pub fn set_message(&mut self, handle: MessageHandle) {
        self.message = Some(handle);
    }

    /// Store the participant's wager, returning a copy of what was stored.
    pub fn submit_wager(
        &mut self,
        participant: &str,
        display_name: &str,
        choice: BetChoice,
        amount: u64,
    ) -> (Submission, Wager) {
        let display_name = if display_name.trim().is_empty() {
            format!("User{participant}")
        } else {
            display_name.to_string()
        };
        let wager = Wager {
            participant: participant.to_string(),
            display_name,
            choice,
            amount,
        };

        match self
            .wagers
            .iter_mut()
            .find(|w| w.participant == participant)
        {
            Some(existing) => {
                *existing = wager.clone();
                (Submission::Replaced, wager)
            }
            None => {
                self.wagers.push(wager.clone());
                (Submission::Inserted, wager)
            }
        }
    }

    pub fn wagers(&self) -> &[Wager] {
        &self.wagers
    }

    pub fn wager(&self, participant: &str) -> Option<&Wager> {
        self.wagers.iter().find(|w| w.participant == participant)
    }

    pub fn take_wagers(&mut self) -> Vec<Wager> {
        std::mem::take(&mut self.wagers)
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds_at(Instant::now())
    }

    /// Whole seconds left in the window, truncated, never below zero.
    pub fn remaining_seconds_at(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.created_at);
        self.window.saturating_sub(elapsed).as_secs()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_seconds() == 0
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.remaining_seconds_at(now) == 0
    }

    pub fn totals_by_choice(&self) -> Vec<(BetChoice, u64)> {
        BetChoice::all()
            .into_iter()
            .map(|choice| {
                let total = self
                    .wagers
                    .iter()
                    .filter(|w| w.choice == choice)
                    .map(|w| w.amount)
                    .sum();
                (choice, total)
            })
            .collect()
    }

    pub fn bet_summary(&self) -> String {
        messages::bet_summary(&self.wagers, &self.totals_by_choice())
    }
}
