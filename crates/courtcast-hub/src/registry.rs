use std::collections::HashMap;
use std::sync::Arc;

use courtcast_core::events::EventType;

use crate::error::DispatchError;
use crate::handlers::EventHandler;

/// Maps each event-type discriminator to its single handler. Built once
/// at startup; a missing entry at dispatch time is a deployment defect,
/// never a transient condition.
pub struct HandlerRegistry {
    handlers: HashMap<EventType, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under its own event type. A second handler
    /// for the same type replaces the first.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(handler.event_type(), handler);
    }

    /// Look up the handler for an event type. Fails fast on a
    /// discriminator nothing was registered for.
    pub fn get(&self, event_type: EventType) -> Result<Arc<dyn EventHandler>, DispatchError> {
        self.handlers
            .get(&event_type)
            .map(Arc::clone)
            .ok_or(DispatchError::UnregisteredEventType(event_type))
    }

    pub fn contains(&self, event_type: EventType) -> bool {
        self.handlers.contains_key(&event_type)
    }

    pub fn count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::handlers::EventContext;

    struct StubHandler {
        event_type: EventType,
    }

    #[async_trait]
    impl EventHandler for StubHandler {
        fn event_type(&self) -> EventType {
            self.event_type
        }
        async fn handle(&self, _ctx: &EventContext<'_>) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    #[test]
    fn register_and_get() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(StubHandler {
            event_type: EventType::Pause,
        }));

        assert!(registry.contains(EventType::Pause));
        assert!(!registry.contains(EventType::Close));
        assert_eq!(registry.count(), 1);

        let handler = registry.get(EventType::Pause).unwrap();
        assert_eq!(handler.event_type(), EventType::Pause);
    }

    #[test]
    fn get_unregistered_fails_fast() {
        let registry = HandlerRegistry::new();
        let err = registry.get(EventType::Joined).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::UnregisteredEventType(EventType::Joined)
        ));
    }

    #[test]
    fn duplicate_registration_replaces() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(StubHandler {
            event_type: EventType::Help,
        }));
        registry.register(Arc::new(StubHandler {
            event_type: EventType::Help,
        }));
        assert_eq!(registry.count(), 1);
    }
}
