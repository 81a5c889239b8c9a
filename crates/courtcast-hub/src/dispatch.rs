use std::sync::Arc;

use courtcast_core::events::CallbackEvent;

use crate::broadcaster::Broadcaster;
use crate::cache::ConferenceResolver;
use crate::error::DispatchError;
use crate::handlers::EventContext;
use crate::registry::HandlerRegistry;

/// Owns the shared dispatch template: select the handler, resolve the
/// target conference through the cache, locate the source participant,
/// then hand off to the handler's message-and-recipients logic.
///
/// Each dispatch is an independent unit of work; two events for the
/// same conference arriving close together may run in either order.
pub struct EventDispatcher {
    registry: HandlerRegistry,
    resolver: Arc<ConferenceResolver>,
    broadcaster: Arc<Broadcaster>,
}

impl EventDispatcher {
    pub fn new(
        registry: HandlerRegistry,
        resolver: Arc<ConferenceResolver>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            registry,
            resolver,
            broadcaster,
        }
    }

    pub fn officers_group(&self) -> &courtcast_core::domain::GroupName {
        self.broadcaster.officers_group()
    }

    pub async fn dispatch(&self, event: &CallbackEvent) -> Result<(), DispatchError> {
        let handler = self.registry.get(event.event_type)?;

        let conference = match &event.conference_id {
            Some(id) => Some(self.resolver.resolve(id).await?),
            None if event.event_type.requires_conference() => {
                return Err(DispatchError::MissingConferenceId(event.event_type));
            }
            None => None,
        };

        tracing::debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            "Dispatching event"
        );

        let ctx = EventContext {
            event,
            conference,
            resolver: &self.resolver,
            broadcaster: &self.broadcaster,
        };
        handler.handle(&ctx).await
    }
}
