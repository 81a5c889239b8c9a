//! Handlers for callbacks tied to one participant's connection.

use async_trait::async_trait;

use courtcast_core::domain::ParticipantState;
use courtcast_core::events::{EventType, TransferRoom};
use courtcast_core::heartbeat::{HeartbeatHealth, HeartbeatRequest};
use courtcast_core::messages::ServerMessage;

use crate::error::DispatchError;
use crate::handlers::{EventContext, EventHandler};

/// A participant's client connected to the hearing.
pub struct JoinedHandler;

#[async_trait]
impl EventHandler for JoinedHandler {
    fn event_type(&self) -> EventType {
        EventType::Joined
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        let conference = ctx.conference()?;
        let Some(participant) = ctx.participant() else {
            tracing::warn!(event_id = %ctx.event.event_id, "Joined event names no known participant");
            return Ok(());
        };
        ctx.broadcaster
            .participant_status(conference, participant, ParticipantState::Available);
        Ok(())
    }
}

/// A participant's client dropped off the bridge.
pub struct DisconnectedHandler;

#[async_trait]
impl EventHandler for DisconnectedHandler {
    fn event_type(&self) -> EventType {
        EventType::Disconnected
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        let conference = ctx.conference()?;
        let Some(participant) = ctx.participant() else {
            tracing::warn!(event_id = %ctx.event.event_id, "Disconnected event names no known participant");
            return Ok(());
        };
        if let Some(reason) = &ctx.event.reason {
            tracing::info!(
                conference_id = %conference.id,
                participant_id = %participant.id,
                reason = %reason,
                "Participant disconnected"
            );
        }
        ctx.broadcaster
            .participant_status(conference, participant, ParticipantState::Disconnected);
        Ok(())
    }
}

/// The bridge moved a participant between rooms; the new room implies
/// the new state.
pub struct TransferHandler;

#[async_trait]
impl EventHandler for TransferHandler {
    fn event_type(&self) -> EventType {
        EventType::Transfer
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        let conference = ctx.conference()?;
        let label = ctx.event.transfer_to.clone().unwrap_or_default();
        let room = TransferRoom::parse(&label)
            .ok_or_else(|| DispatchError::UnknownTransferRoom(label.clone()))?;

        let Some(participant) = ctx.participant() else {
            tracing::warn!(event_id = %ctx.event.event_id, "Transfer event names no known participant");
            return Ok(());
        };
        ctx.broadcaster
            .participant_status(conference, participant, room.target_state());
        Ok(())
    }
}

/// A participant pressed the help button. Only the back office needs to
/// see this; the other participants do not.
pub struct HelpHandler;

#[async_trait]
impl EventHandler for HelpHandler {
    fn event_type(&self) -> EventType {
        EventType::Help
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        let conference = ctx.conference()?;
        let Some(participant) = ctx.participant() else {
            tracing::warn!(event_id = %ctx.event.event_id, "Help event names no known participant");
            return Ok(());
        };
        ctx.broadcaster.to_officers(&ServerMessage::HelpRequested {
            conference_id: conference.id.clone(),
            participant_id: participant.id.clone(),
            username: participant.username.clone(),
        });
        Ok(())
    }
}

/// Telemetry beacon: classify call quality and push the indicator to
/// the judge (the in-hearing quality light) and the officers dashboard.
pub struct HeartbeatHandler;

#[async_trait]
impl EventHandler for HeartbeatHandler {
    fn event_type(&self) -> EventType {
        EventType::Heartbeat
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        let conference = ctx.conference()?;
        let beacon = ctx
            .event
            .heartbeat
            .as_ref()
            .ok_or(DispatchError::MissingHeartbeat)?;

        // Malformed beacons surface here rather than defaulting.
        let request = HeartbeatRequest::try_from(beacon)?;
        tracing::trace!(
            conference_id = %conference.id,
            browser = %request.browser_name,
            "Heartbeat mapped for telemetry submission"
        );

        let Some(participant) = ctx.participant() else {
            tracing::warn!(event_id = %ctx.event.event_id, "Heartbeat event names no known participant");
            return Ok(());
        };

        let message = ServerMessage::HeartbeatHealth {
            conference_id: conference.id.clone(),
            participant_id: participant.id.clone(),
            health: HeartbeatHealth::classify(beacon),
        };
        if let Some(judge) = conference.judge() {
            ctx.broadcaster.to_group(&judge.group(), &message);
        }
        ctx.broadcaster.to_officers(&message);
        Ok(())
    }
}
