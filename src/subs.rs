//! Replay-capable multicast channels for observation and sync events.

use std::collections::VecDeque;

use tokio::sync::broadcast;

/// One subscriber's view of a per-address channel.
///
/// Delivers a replay buffer captured at subscribe time, then live events.
/// The channel never terminates on its own; [`Subscription::recv`] returns
/// `None` only once the owning store has been dropped.
#[derive(Debug)]
pub struct Subscription<T> {
    replay: VecDeque<T>,
    live: broadcast::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    pub(crate) fn new(replay: Vec<T>, live: broadcast::Receiver<T>) -> Self {
        Self {
            replay: replay.into(),
            live,
        }
    }

    /// Receives the next event, draining the replay buffer first.
    ///
    /// A slow subscriber that falls behind the live buffer skips the
    /// overwritten events and resumes at the oldest retained one.
    pub async fn recv(&mut self) -> Option<T> {
        if let Some(v) = self.replay.pop_front() {
            return Some(v);
        }
        loop {
            match self.live.recv().await {
                Ok(v) => return Some(v),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`Subscription::recv`]; `None` when no event
    /// is currently available.
    pub fn try_recv(&mut self) -> Option<T> {
        if let Some(v) = self.replay.pop_front() {
            return Some(v);
        }
        loop {
            match self.live.try_recv() {
                Ok(v) => return Some(v),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Number of replayed events not yet consumed.
    pub fn replay_len(&self) -> usize {
        self.replay.len()
    }
}

/// Store-owned multicast sender for one address.
#[derive(Debug)]
pub(crate) struct Multicast<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone> Multicast<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Best-effort delivery to current subscribers; a channel with no
    /// subscribers drops the event, which is fine because replay buffers
    /// are rebuilt from store state at subscribe time.
    pub(crate) fn publish(&self, value: T) {
        let _ = self.tx.send(value);
    }

    /// Opens a subscription seeded with `replay`. Caller must hold the
    /// store's single-writer context so no publish can interleave between
    /// capturing the replay buffer and attaching the live receiver.
    pub(crate) fn subscribe_with(&self, replay: Vec<T>) -> Subscription<T> {
        Subscription::new(replay, self.tx.subscribe())
    }
}
