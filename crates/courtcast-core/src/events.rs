use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ParticipantState;
use crate::heartbeat::Heartbeat;
use crate::ids::{ConferenceId, EventId, ParticipantId};
use crate::messages::ParticipantsUpdate;

/// Discriminator for inbound events. Also the key the handler registry
/// is indexed by, so every variant must have exactly one handler.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Joined,
    Disconnected,
    Transfer,
    Start,
    Pause,
    Suspend,
    Close,
    Help,
    Heartbeat,
    NewConferenceAdded,
    ParticipantsUpdated,
    AllocationUpdated,
}

impl EventType {
    /// Every variant, for registry completeness checks.
    pub const ALL: [EventType; 12] = [
        Self::Joined,
        Self::Disconnected,
        Self::Transfer,
        Self::Start,
        Self::Pause,
        Self::Suspend,
        Self::Close,
        Self::Help,
        Self::Heartbeat,
        Self::NewConferenceAdded,
        Self::ParticipantsUpdated,
        Self::AllocationUpdated,
    ];

    /// Whether dispatch must resolve a target conference before the
    /// handler runs. Allocation changes address a CSO, not a hearing.
    pub fn requires_conference(&self) -> bool {
        !matches!(self, Self::AllocationUpdated)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{self:?}"));
        f.write_str(&s)
    }
}

/// Payload carried by events synthesized from internal domain changes
/// (booking edits, CSO allocation) rather than the video bridge.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InternalUpdate {
    NewConferenceAdded,
    ParticipantsUpdated {
        update: ParticipantsUpdate,
    },
    AllocationUpdated {
        cso_username: String,
        conference_ids: Vec<ConferenceId>,
    },
}

/// One inbound notification. Transient: lives for the duration of one
/// dispatch and is never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallbackEvent {
    pub event_id: EventId,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference_id: Option<ConferenceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<ParticipantId>,
    pub timestamp_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<Heartbeat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<InternalUpdate>,
}

impl CallbackEvent {
    /// A bare event of the given type for one conference. Used by the
    /// bridge and by tests; optional fields start empty.
    pub fn for_conference(event_type: EventType, conference_id: ConferenceId) -> Self {
        Self {
            event_id: EventId::new(),
            event_type,
            conference_id: Some(conference_id),
            participant_id: None,
            timestamp_utc: Utc::now(),
            reason: None,
            transfer_from: None,
            transfer_to: None,
            heartbeat: None,
            internal: None,
        }
    }
}

/// Room classes a participant can be transferred between. Labels arrive
/// as free-form strings from the bridge ("ConsultationRoom2",
/// "HearingRoom1", "WaitingRoom").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferRoom {
    WaitingRoom,
    HearingRoom,
    ConsultationRoom,
}

impl TransferRoom {
    pub fn parse(label: &str) -> Option<Self> {
        let l = label.to_lowercase();
        if l.contains("consultation") {
            Some(Self::ConsultationRoom)
        } else if l.contains("hearing") {
            Some(Self::HearingRoom)
        } else if l.contains("waiting") {
            Some(Self::WaitingRoom)
        } else {
            None
        }
    }

    /// The participant state implied by arriving in this room.
    pub fn target_state(&self) -> ParticipantState {
        match self {
            Self::WaitingRoom => ParticipantState::Available,
            Self::HearingRoom => ParticipantState::InHearing,
            Self::ConsultationRoom => ParticipantState::InConsultation,
        }
    }
}
