use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::mpsc;

use hawser_core::{
    Config, HawserError, PushReceiver, RawOrderChanged, RawPushEvent, TopicType, TradeBackend,
    TradeConnection,
};

/// Instruction for how a call should behave.
#[derive(Debug, Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(HawserError),
    /// Hang indefinitely (simulate a network stall).
    Hang,
}

impl<T> MockBehavior<T> {
    async fn resolve(self) -> Result<T, HawserError> {
        match self {
            Self::Return(v) => Ok(v),
            Self::Fail(e) => Err(e),
            Self::Hang => std::future::pending().await,
        }
    }
}

struct ConnectionSlot {
    sender: Option<mpsc::UnboundedSender<RawPushEvent>>,
    subscriptions: Vec<TopicType>,
}

#[derive(Default)]
struct InternalState {
    connect_rule: Option<MockBehavior<()>>,
    subscribe_rule: Option<MockBehavior<()>>,
    unsubscribe_rule: Option<MockBehavior<()>>,
    jitter: Option<Duration>,
    connections: Vec<ConnectionSlot>,
    connect_requests: Vec<Arc<Config>>,
    subscribe_requests: Vec<Vec<TopicType>>,
    unsubscribe_requests: Vec<Vec<TopicType>>,
    closes: usize,
}

type SharedState = Arc<Mutex<InternalState>>;

fn lock(state: &SharedState) -> std::sync::MutexGuard<'_, InternalState> {
    state.lock().expect("mutex poisoned")
}

async fn maybe_jitter(state: &SharedState) {
    let jitter = lock(state).jitter;
    if let Some(max) = jitter {
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        let ms = rand::rng().random_range(0..=max_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Controller handle used by tests to drive the mock backend from the outside.
///
/// Unscripted calls succeed.
pub struct MockController {
    state: SharedState,
}

impl MockController {
    /// Set the behavior of `connect`.
    pub fn set_connect_behavior(&self, behavior: MockBehavior<()>) {
        lock(&self.state).connect_rule = Some(behavior);
    }

    /// Set the behavior of `subscribe` on every connection.
    pub fn set_subscribe_behavior(&self, behavior: MockBehavior<()>) {
        lock(&self.state).subscribe_rule = Some(behavior);
    }

    /// Set the behavior of `unsubscribe` on every connection.
    pub fn set_unsubscribe_behavior(&self, behavior: MockBehavior<()>) {
        lock(&self.state).unsubscribe_rule = Some(behavior);
    }

    /// Delay every call by a random duration up to `max`. `None` disables the delay.
    pub fn set_jitter(&self, max: Option<Duration>) {
        lock(&self.state).jitter = max;
    }

    /// Push an event into every open connection subscribed to the event's topic.
    ///
    /// Returns how many connections accepted it.
    pub fn push_event(&self, event: &RawPushEvent) -> usize {
        let topic = event.topic();
        let guard = lock(&self.state);
        guard
            .connections
            .iter()
            .filter(|c| c.subscriptions.contains(&topic))
            .filter_map(|c| c.sender.as_ref())
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count()
    }

    /// Shorthand for pushing an order-changed event.
    pub fn push_order_changed(&self, order: RawOrderChanged) -> usize {
        self.push_event(&RawPushEvent::OrderChanged(order))
    }

    /// Number of successful connects so far.
    pub fn connect_count(&self) -> usize {
        lock(&self.state).connections.len()
    }

    /// Number of connections that are still open.
    pub fn open_connections(&self) -> usize {
        lock(&self.state)
            .connections
            .iter()
            .filter(|c| c.sender.is_some())
            .count()
    }

    /// Number of `close` calls observed.
    pub fn close_count(&self) -> usize {
        lock(&self.state).closes
    }

    /// Topics currently subscribed on the most recent connection.
    pub fn subscriptions(&self) -> Vec<TopicType> {
        lock(&self.state)
            .connections
            .last()
            .map(|c| c.subscriptions.clone())
            .unwrap_or_default()
    }

    /// Configurations passed to `connect`, in order, including failed attempts.
    pub fn connect_requests(&self) -> Vec<Arc<Config>> {
        lock(&self.state).connect_requests.clone()
    }

    /// Topic lists passed to `subscribe`, in order, including failed calls.
    pub fn subscribe_requests(&self) -> Vec<Vec<TopicType>> {
        lock(&self.state).subscribe_requests.clone()
    }

    /// Topic lists passed to `unsubscribe`, in order, including failed calls.
    pub fn unsubscribe_requests(&self) -> Vec<Vec<TopicType>> {
        lock(&self.state).unsubscribe_requests.clone()
    }

    /// Clear all configured behaviors and request logs. Open connections stay open.
    pub fn clear_all_behaviors(&self) {
        let mut guard = lock(&self.state);
        guard.connect_rule = None;
        guard.subscribe_rule = None;
        guard.unsubscribe_rule = None;
        guard.jitter = None;
        guard.connect_requests.clear();
        guard.subscribe_requests.clear();
        guard.unsubscribe_requests.clear();
    }
}

/// A backend that defers all behavior to a [`MockController`].
pub struct DynamicMockBackend {
    state: SharedState,
}

impl DynamicMockBackend {
    /// Create a new mock backend and its controller.
    #[must_use]
    pub fn new_with_controller() -> (Arc<dyn TradeBackend>, MockController) {
        let state: SharedState = Arc::new(Mutex::new(InternalState::default()));
        let controller = MockController {
            state: Arc::clone(&state),
        };
        (Arc::new(Self { state }) as Arc<dyn TradeBackend>, controller)
    }
}

#[async_trait]
impl TradeBackend for DynamicMockBackend {
    async fn connect(
        &self,
        config: Arc<Config>,
    ) -> Result<(Arc<dyn TradeConnection>, PushReceiver), HawserError> {
        let behavior = {
            let mut guard = lock(&self.state);
            guard.connect_requests.push(config);
            guard.connect_rule.clone()
        };
        maybe_jitter(&self.state).await;
        behavior.unwrap_or(MockBehavior::Return(())).resolve().await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let index = {
            let mut guard = lock(&self.state);
            guard.connections.push(ConnectionSlot {
                sender: Some(tx),
                subscriptions: Vec::new(),
            });
            guard.connections.len() - 1
        };
        let conn = MockConnection {
            state: Arc::clone(&self.state),
            index,
        };
        Ok((Arc::new(conn) as Arc<dyn TradeConnection>, rx))
    }
}

struct MockConnection {
    state: SharedState,
    index: usize,
}

impl MockConnection {
    fn ensure_open(&self) -> Result<(), HawserError> {
        if lock(&self.state).connections[self.index].sender.is_some() {
            Ok(())
        } else {
            Err(HawserError::SessionClosed)
        }
    }
}

#[async_trait]
impl TradeConnection for MockConnection {
    async fn subscribe(&self, topics: &[TopicType]) -> Result<(), HawserError> {
        let behavior = {
            let mut guard = lock(&self.state);
            guard.subscribe_requests.push(topics.to_vec());
            guard.subscribe_rule.clone()
        };
        maybe_jitter(&self.state).await;
        self.ensure_open()?;
        behavior.unwrap_or(MockBehavior::Return(())).resolve().await?;

        let mut guard = lock(&self.state);
        let subs = &mut guard.connections[self.index].subscriptions;
        for topic in topics {
            if !subs.contains(topic) {
                subs.push(*topic);
            }
        }
        Ok(())
    }

    async fn unsubscribe(&self, topics: &[TopicType]) -> Result<(), HawserError> {
        let behavior = {
            let mut guard = lock(&self.state);
            guard.unsubscribe_requests.push(topics.to_vec());
            guard.unsubscribe_rule.clone()
        };
        maybe_jitter(&self.state).await;
        self.ensure_open()?;
        behavior.unwrap_or(MockBehavior::Return(())).resolve().await?;

        lock(&self.state).connections[self.index]
            .subscriptions
            .retain(|t| !topics.contains(t));
        Ok(())
    }

    fn close(&self) {
        let mut guard = lock(&self.state);
        guard.closes += 1;
        let slot = &mut guard.connections[self.index];
        slot.sender = None;
        slot.subscriptions.clear();
    }
}
