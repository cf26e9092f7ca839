//! Event Bus adapter
//!
//! Implements the EventPublisher port by recording events in memory

use crate::events::LuckyBlockEvent;
use crate::ports::EventPublisher;
use async_trait::async_trait;

/// In-memory event bus adapter for testing
pub struct InMemoryEventBus {
    events: parking_lot::RwLock<Vec<LuckyBlockEvent>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            events: parking_lot::RwLock::new(Vec::new()),
        }
    }

    pub fn get_events(&self) -> Vec<LuckyBlockEvent> {
        self.events.read().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    /// Number of `BlockConfirmed` events seen so far
    pub fn confirmation_count(&self) -> usize {
        self.events
            .read()
            .iter()
            .filter(|e| e.is_confirmation())
            .count()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: LuckyBlockEvent) -> Result<(), String> {
        self.events.write().push(event);
        Ok(())
    }
}
