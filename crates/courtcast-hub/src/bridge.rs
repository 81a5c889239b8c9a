//! Internal domain events (booking edits, CSO allocation changes) enter
//! here, get synthesized into callback events, and flow through the same
//! dispatcher as bridge callbacks. Recipient computation is never
//! duplicated outside the handlers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use courtcast_core::events::{CallbackEvent, EventType, InternalUpdate};
use courtcast_core::ids::{ConferenceId, EventId};
use courtcast_core::messages::ParticipantsUpdate;

use crate::dispatch::EventDispatcher;

/// A domain change published by the booking/allocation side of the
/// system rather than the video bridge.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InternalEvent {
    NewConferenceAdded {
        conference_id: ConferenceId,
    },
    ParticipantsUpdated {
        conference_id: ConferenceId,
        update: ParticipantsUpdate,
    },
    AllocationUpdated {
        cso_username: String,
        conference_ids: Vec<ConferenceId>,
    },
}

impl InternalEvent {
    /// Synthesize the callback event this internal change dispatches as.
    pub fn into_callback(self) -> CallbackEvent {
        match self {
            Self::NewConferenceAdded { conference_id } => {
                let mut event =
                    CallbackEvent::for_conference(EventType::NewConferenceAdded, conference_id);
                event.internal = Some(InternalUpdate::NewConferenceAdded);
                event
            }
            Self::ParticipantsUpdated {
                conference_id,
                update,
            } => {
                let mut event =
                    CallbackEvent::for_conference(EventType::ParticipantsUpdated, conference_id);
                event.internal = Some(InternalUpdate::ParticipantsUpdated { update });
                event
            }
            // Allocation changes address a CSO, not a hearing.
            Self::AllocationUpdated {
                cso_username,
                conference_ids,
            } => CallbackEvent {
                event_id: EventId::new(),
                event_type: EventType::AllocationUpdated,
                conference_id: None,
                participant_id: None,
                timestamp_utc: chrono::Utc::now(),
                reason: None,
                transfer_from: None,
                transfer_to: None,
                heartbeat: None,
                internal: Some(InternalUpdate::AllocationUpdated {
                    cso_username,
                    conference_ids,
                }),
            },
        }
    }
}

/// Subscribes to the internal-event broadcast and feeds each event into
/// the dispatcher.
pub struct EventBridge {
    dispatcher: Arc<EventDispatcher>,
}

impl EventBridge {
    pub fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Start the bridge. Spawns a task that reads from the broadcast
    /// channel and dispatches each event; a failed event is logged and
    /// dropped, never retried.
    pub fn start(&self, mut rx: broadcast::Receiver<InternalEvent>) -> tokio::task::JoinHandle<()> {
        let dispatcher = Arc::clone(&self.dispatcher);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let callback = event.into_callback();
                        if let Err(err) = dispatcher.dispatch(&callback).await {
                            tracing::warn!(
                                event_id = %callback.event_id,
                                event_type = %callback.event_type,
                                error = %err,
                                "Internal event dispatch failed"
                            );
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Internal event bridge lagged, dropped events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Internal event channel closed");
                        break;
                    }
                }
            }
        })
    }
}

/// Create an event bridge wired to a broadcast channel.
pub fn create_bridge(
    dispatcher: Arc<EventDispatcher>,
    rx: broadcast::Receiver<InternalEvent>,
) -> tokio::task::JoinHandle<()> {
    EventBridge::new(dispatcher).start(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use courtcast_core::domain::GroupName;
    use courtcast_core::messages::ServerMessage;

    use crate::broadcaster::Broadcaster;
    use crate::cache::{ConferenceCache, ConferenceResolver};
    use crate::client::ClientRegistry;
    use crate::handlers::builtin_registry;
    use crate::testing::{details, FakeApi};

    #[test]
    fn new_conference_added_synthesizes_conference_scoped_event() {
        let event = InternalEvent::NewConferenceAdded {
            conference_id: ConferenceId::from_raw("conf-1"),
        };
        let callback = event.into_callback();
        assert_eq!(callback.event_type, EventType::NewConferenceAdded);
        assert_eq!(
            callback.conference_id,
            Some(ConferenceId::from_raw("conf-1"))
        );
        assert!(matches!(
            callback.internal,
            Some(InternalUpdate::NewConferenceAdded)
        ));
    }

    #[test]
    fn allocation_updated_synthesizes_unaddressed_event() {
        let event = InternalEvent::AllocationUpdated {
            cso_username: "cso1".into(),
            conference_ids: vec![ConferenceId::from_raw("conf-1")],
        };
        let callback = event.into_callback();
        assert_eq!(callback.event_type, EventType::AllocationUpdated);
        assert!(callback.conference_id.is_none());
        assert!(matches!(
            callback.internal,
            Some(InternalUpdate::AllocationUpdated { .. })
        ));
    }

    #[test]
    fn internal_event_wire_shape() {
        let event = InternalEvent::ParticipantsUpdated {
            conference_id: ConferenceId::from_raw("conf-1"),
            update: ParticipantsUpdate::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "participants_updated");
        assert_eq!(json["conference_id"], "conf-1");
    }

    #[tokio::test]
    async fn bridge_forwards_through_the_dispatcher() {
        let api = Arc::new(FakeApi::new());
        api.insert(details("conf-1"));
        let clients = Arc::new(ClientRegistry::new(32));
        let resolver = Arc::new(ConferenceResolver::new(
            Arc::new(ConferenceCache::new()),
            Arc::clone(&api) as _,
        ));
        let broadcaster = Arc::new(Broadcaster::new(
            Arc::clone(&clients),
            GroupName::new("vh-officers"),
        ));
        let dispatcher = Arc::new(EventDispatcher::new(
            builtin_registry(),
            resolver,
            broadcaster,
        ));

        let groups: HashSet<GroupName> = [GroupName::new("judge.fudge")].into();
        let (_id, mut judge_rx) = clients.register(groups);

        let (tx, rx) = broadcast::channel(16);
        let handle = create_bridge(dispatcher, rx);

        tx.send(InternalEvent::NewConferenceAdded {
            conference_id: ConferenceId::from_raw("conf-1"),
        })
        .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let msg: ServerMessage = serde_json::from_str(&judge_rx.try_recv().unwrap()).unwrap();
        assert!(matches!(msg, ServerMessage::NewConferenceAdded { .. }));

        handle.abort();
    }

    #[tokio::test]
    async fn bridge_drops_failed_events_and_keeps_running() {
        let api = Arc::new(FakeApi::new());
        api.insert(details("conf-1"));
        let clients = Arc::new(ClientRegistry::new(32));
        let resolver = Arc::new(ConferenceResolver::new(
            Arc::new(ConferenceCache::new()),
            Arc::clone(&api) as _,
        ));
        let broadcaster = Arc::new(Broadcaster::new(
            Arc::clone(&clients),
            GroupName::new("vh-officers"),
        ));
        let dispatcher = Arc::new(EventDispatcher::new(
            builtin_registry(),
            resolver,
            broadcaster,
        ));

        let groups: HashSet<GroupName> = [GroupName::new("judge.fudge")].into();
        let (_id, mut judge_rx) = clients.register(groups);

        let (tx, rx) = broadcast::channel(16);
        let handle = create_bridge(dispatcher, rx);

        // Unknown conference: dispatch fails, bridge logs and moves on
        tx.send(InternalEvent::NewConferenceAdded {
            conference_id: ConferenceId::from_raw("conf-ghost"),
        })
        .unwrap();
        tx.send(InternalEvent::NewConferenceAdded {
            conference_id: ConferenceId::from_raw("conf-1"),
        })
        .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        // Only the second event produced a broadcast
        let msg: ServerMessage = serde_json::from_str(&judge_rx.try_recv().unwrap()).unwrap();
        assert!(matches!(msg, ServerMessage::NewConferenceAdded { .. }));
        assert!(judge_rx.try_recv().is_err());

        handle.abort();
    }
}
