//! Test context for unified test setup
//!
//! Wires a real controller, engine and in-memory store around a scripted
//! provider and a sink that records everything the bot sends.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use azbuddy::config::{AzureConfig, BotConfig};
use azbuddy::dialogs::{FlowOptions, FlowRegistry, StepEngine, StepServices};
use azbuddy::handlers::{ActivitySink, RootController};
use azbuddy::models::{InboundActivity, OutboundActivity};
use azbuddy::state::{ConversationId, DialogState, DialogStateStore, Frame, MemoryStateStore};
use azbuddy::utils::errors::{AzBuddyError, Result};

use super::{init_test_logging, FakeProvider};

pub const TEST_BOT_ID: &str = "bot";
pub const TEST_USER_ID: &str = "user-1";

/// Sink that keeps every outbound activity in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(ConversationId, OutboundActivity)>>,
    failing: AtomicBool,
}

impl RecordingSink {
    /// Drain what was sent since the last call
    pub fn take(&self) -> Vec<OutboundActivity> {
        self.sent
            .lock()
            .unwrap()
            .drain(..)
            .map(|(_, activity)| activity)
            .collect()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ActivitySink for RecordingSink {
    async fn send(&self, conversation: &ConversationId, activity: &OutboundActivity) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AzBuddyError::InvalidInput("channel closed".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((conversation.clone(), activity.clone()));
        Ok(())
    }
}

/// Memory store whose saves stall, so a turn yields between load and save
#[derive(Debug)]
pub struct SlowSaveStore {
    inner: Arc<MemoryStateStore>,
    delay: Duration,
}

impl SlowSaveStore {
    pub fn new(inner: Arc<MemoryStateStore>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl DialogStateStore for SlowSaveStore {
    async fn load_state(&self, conversation: &ConversationId) -> Result<Option<DialogState>> {
        self.inner.load_state(conversation).await
    }

    async fn save_state(&self, state: &DialogState) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.save_state(state).await
    }

    async fn delete(&self, conversation: &ConversationId) -> Result<()> {
        self.inner.delete(conversation).await
    }
}

/// Unified test context that manages all test components
pub struct TestContext {
    pub controller: RootController,
    pub provider: Arc<FakeProvider>,
    pub store: Arc<MemoryStateStore>,
    pub sink: RecordingSink,
    pub conversation: ConversationId,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_provider(FakeProvider::new())
    }

    pub fn with_provider(provider: FakeProvider) -> Self {
        Self::build(provider, FlowRegistry::azure(), None)
    }

    /// Run custom flows instead of the resource flows
    pub fn with_registry(registry: FlowRegistry) -> Self {
        Self::build(FakeProvider::new(), registry, None)
    }

    /// Every save waits `delay` before it lands in the store
    pub fn with_slow_saves(delay: Duration) -> Self {
        Self::build(FakeProvider::new(), FlowRegistry::azure(), Some(delay))
    }

    fn build(provider: FakeProvider, registry: FlowRegistry, save_delay: Option<Duration>) -> Self {
        init_test_logging();

        let provider = Arc::new(provider);
        let store = Arc::new(MemoryStateStore::new());
        let controller_store: Arc<dyn DialogStateStore> = match save_delay {
            Some(delay) => Arc::new(SlowSaveStore::new(store.clone(), delay)),
            None => store.clone(),
        };

        let options = FlowOptions::from(&AzureConfig::default());
        let services = Arc::new(StepServices::new(provider.clone(), options));
        let engine = StepEngine::new(Arc::new(registry), services);
        let controller = RootController::new(
            engine,
            controller_store,
            &BotConfig::default().welcome_message,
        );

        Self {
            controller,
            provider,
            store,
            sink: RecordingSink::default(),
            conversation: ConversationId::new("test", "conversation-1"),
        }
    }

    pub fn welcome_message() -> String {
        BotConfig::default().welcome_message
    }

    /// Run one activity and return what the bot sent for it
    pub async fn turn(&self, activity: InboundActivity) -> Vec<OutboundActivity> {
        self.controller
            .on_turn(&activity, &self.sink)
            .await
            .expect("turn failed");
        self.sink.take()
    }

    /// A user joins the conversation
    pub async fn join(&self) -> Vec<OutboundActivity> {
        self.turn(InboundActivity::conversation_update(
            self.conversation.clone(),
            TEST_BOT_ID,
            vec![TEST_USER_ID.to_string()],
        ))
        .await
    }

    /// The user sends a text message
    pub async fn say(&self, text: &str) -> Vec<OutboundActivity> {
        self.turn(InboundActivity::message(self.conversation.clone(), TEST_BOT_ID, text))
            .await
    }

    pub async fn stack(&self) -> Vec<Frame> {
        self.store
            .load(&self.conversation)
            .await
            .expect("failed to load stack")
    }
}

/// Texts of a batch of outbound activities
pub fn texts(activities: &[OutboundActivity]) -> Vec<&str> {
    activities.iter().map(|activity| activity.text.as_str()).collect()
}
