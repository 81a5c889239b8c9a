//! Handlers for hearing-level status callbacks.
//!
//! The handler computes the status value to broadcast; the cached
//! aggregate's own status is then realigned from an authoritative
//! details fetch, not inferred from the event stream, so the cache
//! cannot drift from the upstream system of record.

use async_trait::async_trait;

use courtcast_core::domain::ConferenceStatus;
use courtcast_core::events::EventType;

use crate::error::DispatchError;
use crate::handlers::{EventContext, EventHandler};

async fn broadcast_then_refresh(
    ctx: &EventContext<'_>,
    status: ConferenceStatus,
) -> Result<(), DispatchError> {
    let conference = ctx.conference()?;
    ctx.broadcaster.conference_status(conference, status);

    if let Err(err) = ctx.resolver.refresh(&conference.id).await {
        // The status message is already out; a stale cache entry will
        // self-correct on the next resolve.
        tracing::warn!(
            conference_id = %conference.id,
            error = %err,
            "Post-status cache refresh failed"
        );
    }
    Ok(())
}

pub struct StartHandler;

#[async_trait]
impl EventHandler for StartHandler {
    fn event_type(&self) -> EventType {
        EventType::Start
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        broadcast_then_refresh(ctx, ConferenceStatus::InSession).await
    }
}

pub struct PauseHandler;

#[async_trait]
impl EventHandler for PauseHandler {
    fn event_type(&self) -> EventType {
        EventType::Pause
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        broadcast_then_refresh(ctx, ConferenceStatus::Paused).await
    }
}

pub struct SuspendHandler;

#[async_trait]
impl EventHandler for SuspendHandler {
    fn event_type(&self) -> EventType {
        EventType::Suspend
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        broadcast_then_refresh(ctx, ConferenceStatus::Suspended).await
    }
}

/// Closed is terminal: broadcast it, then drop the cache entry so the
/// finished hearing stops occupying memory.
pub struct CloseHandler;

#[async_trait]
impl EventHandler for CloseHandler {
    fn event_type(&self) -> EventType {
        EventType::Close
    }

    async fn handle(&self, ctx: &EventContext<'_>) -> Result<(), DispatchError> {
        let conference = ctx.conference()?;
        ctx.broadcaster
            .conference_status(conference, ConferenceStatus::Closed);
        ctx.resolver.evict(&conference.id);
        tracing::info!(conference_id = %conference.id, "Hearing closed, cache entry evicted");
        Ok(())
    }
}
