use courtcast_api::ApiError;
use courtcast_core::events::EventType;
use courtcast_core::heartbeat::HeartbeatError;
use courtcast_core::ids::ConferenceId;

/// Failure modes of one event dispatch. Nothing here is retried: a
/// failed event is a missed real-time update, and retry belongs to the
/// upstream producer.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The id could not be resolved via cache or a fresh fetch.
    #[error("conference not found: {0}")]
    ConferenceNotFound(ConferenceId),

    /// Deployment defect: the registry was asked for a discriminator it
    /// has no handler for. Caught by the completeness test.
    #[error("no handler registered for event type: {0}")]
    UnregisteredEventType(EventType),

    #[error("event type {0} requires a conference id")]
    MissingConferenceId(EventType),

    #[error("event type {0} requires an internal payload")]
    MissingPayload(EventType),

    #[error("heartbeat event carried no beacon")]
    MissingHeartbeat,

    #[error("unknown transfer room label: {0:?}")]
    UnknownTransferRoom(String),

    #[error("malformed heartbeat: {0}")]
    Heartbeat(#[from] HeartbeatError),

    #[error("conference API failure: {0}")]
    Api(ApiError),
}

impl From<ApiError> for DispatchError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(id) => Self::ConferenceNotFound(id),
            other => Self::Api(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_not_found_becomes_conference_not_found() {
        let id = ConferenceId::from_raw("conf-1");
        let err: DispatchError = ApiError::NotFound(id.clone()).into();
        assert!(matches!(err, DispatchError::ConferenceNotFound(got) if got == id));
    }

    #[test]
    fn api_upstream_stays_api() {
        let err: DispatchError = ApiError::Upstream {
            status: 500,
            body: "boom".into(),
        }
        .into();
        assert!(matches!(err, DispatchError::Api(_)));
    }

    #[test]
    fn error_messages_name_the_event_type() {
        let err = DispatchError::UnregisteredEventType(EventType::Joined);
        assert!(err.to_string().contains("joined"));

        let err = DispatchError::MissingConferenceId(EventType::Pause);
        assert!(err.to_string().contains("pause"));
    }
}
