use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;

use crate::errors::NotifyError;
use crate::session::RoomId;

// Bounded per-subscriber buffer; a full channel drops the subscriber
const EVENT_CHANNEL_BUFFER: usize = 256;

/// Transport-issued reference to an editable status message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle(pub String);

/// Why a round closed without a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The round closed with no wagers
    NoWagers,
    /// The deal failed; no stake was touched
    DealFailed,
}

/// Delivery of round status text to a room.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a newly opened round. The returned handle, if any, is passed
    /// back to later countdown updates so the transport can edit in place.
    async fn announce_open(
        &self,
        room: &RoomId,
        remaining_seconds: u64,
        summary: &str,
    ) -> Result<Option<MessageHandle>, NotifyError>;

    async fn update_countdown(
        &self,
        room: &RoomId,
        handle: Option<&MessageHandle>,
        remaining_seconds: u64,
        summary: &str,
    ) -> Result<(), NotifyError>;

    async fn announce_result(&self, room: &RoomId, text: &str) -> Result<(), NotifyError>;

    async fn announce_cancelled(
        &self,
        room: &RoomId,
        reason: CancelReason,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    RoundOpened {
        room: RoomId,
        handle: MessageHandle,
        remaining_seconds: u64,
        text: String,
    },
    Countdown {
        room: RoomId,
        handle: Option<MessageHandle>,
        remaining_seconds: u64,
        text: String,
    },
    RoundResult {
        room: RoomId,
        text: String,
    },
    RoundCancelled {
        room: RoomId,
        reason: CancelReason,
        text: String,
    },
}

impl RoomEvent {
    pub fn room(&self) -> &RoomId {
        match self {
            RoomEvent::RoundOpened { room, .. }
            | RoomEvent::Countdown { room, .. }
            | RoomEvent::RoundResult { room, .. }
            | RoomEvent::RoundCancelled { room, .. } => room,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            RoomEvent::RoundOpened { text, .. }
            | RoomEvent::Countdown { text, .. }
            | RoomEvent::RoundResult { text, .. }
            | RoomEvent::RoundCancelled { text, .. } => text,
        }
    }
}

pub type EventSender = mpsc::Sender<RoomEvent>;
pub type EventReceiver = mpsc::Receiver<RoomEvent>;

pub struct RoomSubscription {
    notifier: ChannelNotifier,
    room: RoomId,
    subscriber_id: usize,
    pub receiver: EventReceiver,
}

impl RoomSubscription {
    /// Everything delivered so far, without waiting.
    pub fn drain(&mut self) -> Vec<RoomEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.notifier.unsubscribe(&self.room, self.subscriber_id);
    }
}

/// In-process notifier fanning room events out to channel subscribers.
#[derive(Debug, Clone, Default)]
pub struct ChannelNotifier {
    inner: Arc<ChannelNotifierInner>,
}

#[derive(Debug, Default)]
struct ChannelNotifierInner {
    subscribers: RwLock<HashMap<RoomId, Vec<(usize, EventSender)>>>,
    next_id: AtomicUsize,
    next_message: AtomicU64,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, room: impl Into<RoomId>) -> RoomSubscription {
        let room = room.into();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(room.clone())
            .or_default()
            .push((id, tx));

        tracing::debug!(room = %room, subscriber_id = id, "subscribed to room events");

        RoomSubscription {
            notifier: self.clone(),
            room,
            subscriber_id: id,
            receiver: rx,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|list| list.len())
            .sum()
    }

    pub fn unsubscribe(&self, room: &RoomId, subscriber_id: usize) {
        self.remove_subscribers(room, &[subscriber_id]);
    }

    fn publish(&self, room: &RoomId, event: RoomEvent) -> Result<(), NotifyError> {
        let subscribers = {
            let guard = self
                .inner
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            guard.get(room).cloned()
        };

        let Some(list) = subscribers else {
            return Err(NotifyError::NoChannel(room.clone()));
        };

        let mut failed = Vec::new();
        for (id, sender) in &list {
            if let Err(e) = sender.try_send(event.clone()) {
                tracing::warn!(
                    room = %room,
                    subscriber_id = id,
                    error = %e,
                    "dropping room subscriber"
                );
                failed.push(*id);
            }
        }
        let delivered = list.len() - failed.len();
        if !failed.is_empty() {
            self.remove_subscribers(room, &failed);
        }
        if delivered == 0 {
            return Err(NotifyError::Delivery(format!(
                "no live subscribers for room {room}"
            )));
        }
        Ok(())
    }

    fn remove_subscribers(&self, room: &RoomId, ids: &[usize]) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = guard.get_mut(room) {
            list.retain(|(id, _)| !ids.contains(id));
            if list.is_empty() {
                guard.remove(room);
            }
        }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn announce_open(
        &self,
        room: &RoomId,
        remaining_seconds: u64,
        summary: &str,
    ) -> Result<Option<MessageHandle>, NotifyError> {
        let seq = self.inner.next_message.fetch_add(1, Ordering::AcqRel);
        let handle = MessageHandle(format!("{room}#{seq}"));
        self.publish(
            room,
            RoomEvent::RoundOpened {
                room: room.clone(),
                handle: handle.clone(),
                remaining_seconds,
                text: crate::messages::round_opened(remaining_seconds, summary),
            },
        )?;
        Ok(Some(handle))
    }

    async fn update_countdown(
        &self,
        room: &RoomId,
        handle: Option<&MessageHandle>,
        remaining_seconds: u64,
        summary: &str,
    ) -> Result<(), NotifyError> {
        self.publish(
            room,
            RoomEvent::Countdown {
                room: room.clone(),
                handle: handle.cloned(),
                remaining_seconds,
                text: crate::messages::countdown(remaining_seconds, summary),
            },
        )
    }

    async fn announce_result(&self, room: &RoomId, text: &str) -> Result<(), NotifyError> {
        self.publish(
            room,
            RoomEvent::RoundResult {
                room: room.clone(),
                text: text.to_string(),
            },
        )
    }

    async fn announce_cancelled(
        &self,
        room: &RoomId,
        reason: CancelReason,
    ) -> Result<(), NotifyError> {
        self.publish(
            room,
            RoomEvent::RoundCancelled {
                room: room.clone(),
                reason,
                text: crate::messages::cancellation(reason).to_string(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscription_drop_unsubscribes() {
        let notifier = ChannelNotifier::new();
        {
            let _sub = notifier.subscribe("r");
            assert_eq!(notifier.subscriber_count(), 1);
        }
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn events_reach_every_subscriber_of_the_room() {
        let notifier = ChannelNotifier::new();
        let mut sub1 = notifier.subscribe("r");
        let mut sub2 = notifier.subscribe("r");
        let mut other = notifier.subscribe("elsewhere");

        let handle = notifier
            .announce_open(&"r".to_string(), 60, "No bets yet.")
            .await
            .expect("announce");
        assert!(handle.is_some());

        let ev1 = sub1.drain();
        let ev2 = sub2.drain();
        assert_eq!(ev1.len(), 1);
        assert_eq!(ev1, ev2);
        assert!(matches!(
            ev1[0],
            RoomEvent::RoundOpened {
                remaining_seconds: 60,
                ..
            }
        ));
        assert!(other.drain().is_empty());
    }

    #[tokio::test]
    async fn room_without_subscribers_reports_no_channel() {
        let notifier = ChannelNotifier::new();
        let err = notifier
            .announce_cancelled(&"ghost".to_string(), CancelReason::NoWagers)
            .await
            .unwrap_err();
        assert_eq!(err, NotifyError::NoChannel("ghost".into()));
    }

    #[tokio::test]
    async fn closed_receiver_is_pruned() {
        let notifier = ChannelNotifier::new();
        let mut sub = notifier.subscribe("r");
        sub.receiver.close();
        let err = notifier
            .announce_result(&"r".to_string(), "done")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Delivery(_)));
        assert_eq!(notifier.subscriber_count(), 0);
    }
}
