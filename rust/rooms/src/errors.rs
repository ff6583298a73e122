/// Error taxonomy for the round scheduler
///
/// This module provides:
/// - Structured error types for wagers, settlement and notification
/// - Severity classification
/// - Severity-aware error logging
use baccarat_engine::errors::EngineError;
use thiserror::Error;

use crate::session::{ParticipantId, RoomId};

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Participant mistakes - expected, normal operation
    Client,
    /// Collaborator failures - unexpected, needs investigation
    Server,
    /// Round integrity at risk
    Critical,
}

/// Trait for classifying errors and logging them at the matching level
pub trait ClassifiedError: std::fmt::Display {
    /// Get the error code string (machine-readable)
    fn error_code(&self) -> &'static str;

    /// Get error severity for logging
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Client
    }

    /// Get the error message (human-readable)
    fn error_message(&self) -> String {
        self.to_string()
    }

    /// Emit the error through tracing according to its severity
    fn log_error(&self, room: &RoomId) {
        let code = self.error_code();
        let message = self.error_message();
        match self.severity() {
            ErrorSeverity::Client => {
                tracing::info!(room = %room, error = code, "{message}");
            }
            ErrorSeverity::Server => {
                tracing::error!(room = %room, error = code, "{message}");
            }
            ErrorSeverity::Critical => {
                tracing::error!(room = %room, error = code, critical = true, "{message}");
            }
        }
    }
}

/// Reasons a wager is refused before it touches any session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WagerError {
    #[error("Bet must be between {min} and {max}, got {amount}")]
    OutOfBounds { amount: u64, min: u64, max: u64 },
    #[error("Insufficient balance: {balance} available")]
    InsufficientBalance { balance: u64 },
    #[error("Bet rejected: {0}")]
    Rejected(String),
    #[error("Round in {0} is closing, wait for the next round")]
    RoundClosing(RoomId),
    #[error("The table is shutting down")]
    ShuttingDown,
}

impl ClassifiedError for WagerError {
    fn error_code(&self) -> &'static str {
        match self {
            WagerError::OutOfBounds { .. } => "wager_out_of_bounds",
            WagerError::InsufficientBalance { .. } => "insufficient_balance",
            WagerError::Rejected(_) => "wager_rejected",
            WagerError::RoundClosing(_) => "round_closing",
            WagerError::ShuttingDown => "shutting_down",
        }
    }
}

/// A gateway refusal from `check_wager_allowed`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WagerRejection {
    #[error("Insufficient balance: {balance} available")]
    InsufficientBalance { balance: u64 },
    #[error("{0}")]
    Other(String),
}

impl From<WagerRejection> for WagerError {
    fn from(rejection: WagerRejection) -> Self {
        match rejection {
            WagerRejection::InsufficientBalance { balance } => {
                WagerError::InsufficientBalance { balance }
            }
            WagerRejection::Other(reason) => WagerError::Rejected(reason),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Unknown participant: {0}")]
    UnknownParticipant(ParticipantId),
    #[error("Participant {participant} cannot cover stake {stake} (balance {balance})")]
    InsufficientFunds {
        participant: ParticipantId,
        stake: u64,
        balance: u64,
    },
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

impl ClassifiedError for SettlementError {
    fn error_code(&self) -> &'static str {
        match self {
            SettlementError::UnknownParticipant(_) => "unknown_participant",
            SettlementError::InsufficientFunds { .. } => "settlement_insufficient_funds",
            SettlementError::Unavailable(_) => "ledger_unavailable",
        }
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Server
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("No delivery channel for room {0}")]
    NoChannel(RoomId),
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl ClassifiedError for NotifyError {
    fn error_code(&self) -> &'static str {
        match self {
            NotifyError::NoChannel(_) => "notify_no_channel",
            NotifyError::Delivery(_) => "notify_delivery_failed",
        }
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Server
    }
}

impl ClassifiedError for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            EngineError::HandFull { .. } => "engine_hand_full",
            EngineError::IncompleteHand { .. } => "engine_incomplete_hand",
        }
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Critical
    }
}
