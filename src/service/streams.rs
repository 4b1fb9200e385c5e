//! Session-scoped event channels
//!
//! A [`StreamHub`] fans values out to any number of subscribers. Each open
//! book owns its own hubs; dropping them completes every subscriber stream.

use std::sync::Arc;

use futures::channel::mpsc::{self, UnboundedSender};
use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;

use crate::document::{ReaderSettings, ReadingPosition};

struct HubState<T> {
    subscribers: Vec<UnboundedSender<T>>,
    /// Values replayed to late subscribers
    history: Option<Vec<T>>,
}

/// Ordered broadcast channel
pub struct StreamHub<T> {
    state: Arc<Mutex<HubState<T>>>,
}

impl<T> Clone for StreamHub<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone + Send + 'static> StreamHub<T> {
    /// Live-only hub: subscribers see values emitted after they subscribe
    pub fn new() -> Self {
        Self::with_history(None)
    }

    /// Hub that replays everything emitted so far to each new subscriber
    pub fn replaying() -> Self {
        Self::with_history(Some(Vec::new()))
    }

    fn with_history(history: Option<Vec<T>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                subscribers: Vec::new(),
                history,
            })),
        }
    }

    /// Deliver a value to every live subscriber, in emission order
    pub fn emit(&self, value: T) {
        let mut state = self.state.lock();
        if let Some(history) = state.history.as_mut() {
            history.push(value.clone());
        }
        // Disconnected subscribers are pruned
        state
            .subscribers
            .retain(|tx| tx.unbounded_send(value.clone()).is_ok());
    }

    pub fn subscribe(&self) -> BoxStream<'static, T> {
        let (tx, rx) = mpsc::unbounded();
        let mut state = self.state.lock();
        if let Some(history) = &state.history {
            for value in history {
                let _ = tx.unbounded_send(value.clone());
            }
        }
        state.subscribers.push(tx);
        rx.boxed()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }
}

impl<T: Clone + Send + 'static> Default for StreamHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The three event channels of one open book
pub struct SessionChannels {
    pub position: StreamHub<ReadingPosition>,
    pub settings: StreamHub<ReaderSettings>,
    /// Open progress in `[0.0, 1.0]`
    pub loading: StreamHub<f64>,
}

impl SessionChannels {
    pub fn new() -> Self {
        Self {
            position: StreamHub::new(),
            settings: StreamHub::new(),
            loading: StreamHub::replaying(),
        }
    }
}

impl Default for SessionChannels {
    fn default() -> Self {
        Self::new()
    }
}
