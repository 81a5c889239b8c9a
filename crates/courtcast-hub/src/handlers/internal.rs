//! Handlers for internal domain events — booking and allocation changes
//! that never touch the video bridge but must reach the same clients.
//! They arrive as synthesized callback events so recipient computation
//! lives in exactly one place.

use async_trait::async_trait;

use courtcast_core::domain::GroupName;
use courtcast_core::events::{EventType, InternalUpdate};
use courtcast_core::messages::{AllocationSummary, ServerMessage};

use crate::error::DispatchError;
use crate::handlers::{EventContext, EventHandler};

/// A hearing was booked. Everyone attached to it (and the back office)
/// learns it exists; dispatch resolving the conference also warms the
/// cache for the joins that follow.
pub struct NewConferenceAddedHandler;

#[async_trait]
impl EventHandler for NewConferenceAddedHandler {
    fn event_type(&self) -> EventType {
        EventType::NewConferenceAdded
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        let conference = ctx.conference()?;
        ctx.broadcaster.to_conference_groups(
            conference,
            &ServerMessage::NewConferenceAdded {
                conference_id: conference.id.clone(),
            },
        );
        Ok(())
    }
}

/// A booking edit changed the participant list. The cached aggregate is
/// stale by definition, so re-fetch before computing recipients: people
/// added by the edit must receive this very update.
pub struct ParticipantsUpdatedHandler;

#[async_trait]
impl EventHandler for ParticipantsUpdatedHandler {
    fn event_type(&self) -> EventType {
        EventType::ParticipantsUpdated
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        let stale = ctx.conference()?;
        let update = match &ctx.event.internal {
            Some(InternalUpdate::ParticipantsUpdated { update }) => update.clone(),
            _ => return Err(DispatchError::MissingPayload(self.event_type())),
        };

        let fresh = ctx.resolver.refresh(&stale.id).await?;
        ctx.broadcaster.to_conference_groups(
            &fresh,
            &ServerMessage::ParticipantsUpdated {
                conference_id: fresh.id.clone(),
                update,
            },
        );
        Ok(())
    }
}

/// A CSO's hearing allocation changed. One message, to that CSO's group
/// only, listing the allocated hearings with their judges.
pub struct AllocationUpdatedHandler;

#[async_trait]
impl EventHandler for AllocationUpdatedHandler {
    fn event_type(&self) -> EventType {
        EventType::AllocationUpdated
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        let (cso_username, conference_ids) = match &ctx.event.internal {
            Some(InternalUpdate::AllocationUpdated {
                cso_username,
                conference_ids,
            }) => (cso_username, conference_ids),
            _ => return Err(DispatchError::MissingPayload(self.event_type())),
        };

        let mut allocations = Vec::with_capacity(conference_ids.len());
        for id in conference_ids {
            let conference = ctx.resolver.resolve(id).await?;
            allocations.push(AllocationSummary {
                conference_id: conference.id.clone(),
                case_name: conference.case_name.clone(),
                judge_display_name: conference
                    .judge()
                    .map(|j| j.display_name.clone())
                    .unwrap_or_default(),
                scheduled_at: conference.scheduled_at,
            });
        }

        ctx.broadcaster.to_group(
            &GroupName::new(cso_username),
            &ServerMessage::AllocationsUpdated { allocations },
        );
        Ok(())
    }
}
