use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ConferenceStatus, Participant, ParticipantState};
use crate::heartbeat::HeartbeatHealth;
use crate::ids::{ConferenceId, ParticipantId};

/// One entry in a CSO's allocated-hearings notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub conference_id: ConferenceId,
    pub case_name: String,
    pub judge_display_name: String,
    pub scheduled_at: DateTime<Utc>,
}

/// Participant-list delta produced by a booking edit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantsUpdate {
    pub updated: Vec<Participant>,
    pub added: Vec<Participant>,
    pub removed: Vec<ParticipantId>,
    pub linked: Vec<Participant>,
}

/// Typed push messages delivered to connected clients.
///
/// Wire format mirrors the inbound event style: externally tagged on
/// `type`, snake_case payload fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ParticipantStatus {
        participant_id: ParticipantId,
        username: String,
        conference_id: ConferenceId,
        status: ParticipantState,
    },
    ConferenceStatus {
        conference_id: ConferenceId,
        status: ConferenceStatus,
    },
    AllocationsUpdated {
        allocations: Vec<AllocationSummary>,
    },
    NewConferenceAdded {
        conference_id: ConferenceId,
    },
    ParticipantsUpdated {
        conference_id: ConferenceId,
        update: ParticipantsUpdate,
    },
    HeartbeatHealth {
        conference_id: ConferenceId,
        participant_id: ParticipantId,
        health: HeartbeatHealth,
    },
    HelpRequested {
        conference_id: ConferenceId,
        participant_id: ParticipantId,
        username: String,
    },
}
