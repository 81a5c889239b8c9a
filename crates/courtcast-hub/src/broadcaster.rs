use std::sync::Arc;

use courtcast_core::domain::{Conference, ConferenceStatus, GroupName, Participant, ParticipantState};
use courtcast_core::messages::ServerMessage;

use crate::client::ClientRegistry;

/// Routes typed messages to named recipient groups.
///
/// The recipient set for conference-scoped messages is recomputed from
/// the aggregate on every broadcast: one group per participant username
/// plus the configured officers group, which sees every conference.
/// Within one call, group sends are issued sequentially in program
/// order; nothing orders sends across calls.
pub struct Broadcaster {
    registry: Arc<ClientRegistry>,
    officers_group: GroupName,
}

impl Broadcaster {
    /// `officers_group` is configuration, not a constant: deployments
    /// name their back-office audience differently.
    pub fn new(registry: Arc<ClientRegistry>, officers_group: GroupName) -> Self {
        Self {
            registry,
            officers_group,
        }
    }

    pub fn officers_group(&self) -> &GroupName {
        &self.officers_group
    }

    /// Announce one participant's state to every participant of the
    /// conference plus the officers group. Returns the number of group
    /// sends issued (N participants + 1).
    pub fn participant_status(
        &self,
        conference: &Conference,
        participant: &Participant,
        state: ParticipantState,
    ) -> usize {
        let message = ServerMessage::ParticipantStatus {
            participant_id: participant.id.clone(),
            username: participant.username.clone(),
            conference_id: conference.id.clone(),
            status: state,
        };
        self.to_conference_groups(conference, &message)
    }

    /// Announce a hearing-level status change to the same recipient set.
    pub fn conference_status(&self, conference: &Conference, status: ConferenceStatus) -> usize {
        let message = ServerMessage::ConferenceStatus {
            conference_id: conference.id.clone(),
            status,
        };
        self.to_conference_groups(conference, &message)
    }

    /// Send one message to every participant group of a conference and
    /// then to the officers group.
    pub fn to_conference_groups(&self, conference: &Conference, message: &ServerMessage) -> usize {
        let Some(payload) = serialize(message) else {
            return 0;
        };

        let mut sends = 0;
        for participant in &conference.participants {
            self.registry.send_to_group(&participant.group(), &payload);
            sends += 1;
        }
        self.registry.send_to_group(&self.officers_group, &payload);
        sends + 1
    }

    /// Send one message to a single group.
    pub fn to_group(&self, group: &GroupName, message: &ServerMessage) -> usize {
        let Some(payload) = serialize(message) else {
            return 0;
        };
        self.registry.send_to_group(group, &payload);
        1
    }

    /// Send one message to the officers group only.
    pub fn to_officers(&self, message: &ServerMessage) -> usize {
        let group = self.officers_group.clone();
        self.to_group(&group, message)
    }
}

fn serialize(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(json) => Some(json),
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize server message");
            None
        }
    }
}
