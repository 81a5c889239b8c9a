pub mod conference;
pub mod internal;
pub mod participant;

use std::sync::Arc;

use async_trait::async_trait;

use courtcast_core::domain::{Conference, Participant};
use courtcast_core::events::{CallbackEvent, EventType};

use crate::broadcaster::Broadcaster;
use crate::cache::ConferenceResolver;
use crate::error::DispatchError;
use crate::registry::HandlerRegistry;

/// Everything a handler needs for one dispatch: the event, the resolved
/// state, and the collaborators for re-resolution and delivery. The
/// dispatcher owns the shared resolve steps; handlers only compute the
/// message and recipients.
pub struct EventContext<'a> {
    pub event: &'a CallbackEvent,
    pub conference: Option<Arc<Conference>>,
    pub resolver: &'a ConferenceResolver,
    pub broadcaster: &'a Broadcaster,
}

impl EventContext<'_> {
    /// The resolved conference. Dispatch guarantees presence for event
    /// types that require one; this is the checked accessor for them.
    pub fn conference(&self) -> Result<&Conference, DispatchError> {
        self.conference
            .as_deref()
            .ok_or(DispatchError::MissingConferenceId(self.event.event_type))
    }

    /// The source participant, if the event names one and the
    /// conference knows it. Absence is valid for conference-wide events.
    pub fn participant(&self) -> Option<&Participant> {
        let conference = self.conference.as_deref()?;
        let id = self.event.participant_id.as_ref()?;
        conference.participant(id)
    }
}

/// One handler per event type; the registry enforces the mapping.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> EventType;
    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError>;
}

impl std::fmt::Debug for dyn EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandler")
            .field("event_type", &self.event_type())
            .finish()
    }
}

/// Build the registry with every built-in handler. Called once at
/// startup; the completeness test keeps it honest against
/// `EventType::ALL`.
pub fn builtin_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    // Participant-scoped callbacks
    registry.register(Arc::new(participant::JoinedHandler));
    registry.register(Arc::new(participant::DisconnectedHandler));
    registry.register(Arc::new(participant::TransferHandler));
    registry.register(Arc::new(participant::HelpHandler));
    registry.register(Arc::new(participant::HeartbeatHandler));

    // Hearing-status callbacks
    registry.register(Arc::new(conference::StartHandler));
    registry.register(Arc::new(conference::PauseHandler));
    registry.register(Arc::new(conference::SuspendHandler));
    registry.register(Arc::new(conference::CloseHandler));

    // Internal domain events routed through the same path
    registry.register(Arc::new(internal::NewConferenceAddedHandler));
    registry.register(Arc::new(internal::ParticipantsUpdatedHandler));
    registry.register(Arc::new(internal::AllocationUpdatedHandler));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_is_complete() {
        let registry = builtin_registry();
        for event_type in EventType::ALL {
            let handler = registry
                .get(event_type)
                .unwrap_or_else(|_| panic!("no handler for {event_type}"));
            assert_eq!(handler.event_type(), event_type);
        }
        assert_eq!(registry.count(), EventType::ALL.len());
    }
}
