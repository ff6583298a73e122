pub mod config;
pub mod errors;
pub mod gateway;
pub mod logging;
pub mod messages;
pub mod notifier;
pub mod resolver;
pub mod scheduler;
pub mod session;

pub use config::{ConfigError, ConfigResolved, ConfigSources, RoomConfig, ValueSource};
pub use errors::{
    ClassifiedError, ErrorSeverity, NotifyError, SettlementError, WagerError, WagerRejection,
};
pub use gateway::{MemoryLedger, SettlementGateway, SettlementRecord, SettlementRequest};
pub use logging::{init_logging, LogEntry, TestLogSubscriber};
pub use notifier::{
    CancelReason, ChannelNotifier, MessageHandle, Notifier, RoomEvent, RoomSubscription,
};
pub use resolver::{create_resolver, RoundResolver};
pub use scheduler::{CloseReport, RoundScheduler, SettledWager, WagerReceipt, WagerStatus};
pub use session::{ParticipantId, RoomId, RoundId, RoundSession, RoundStatus, Submission, Wager};
