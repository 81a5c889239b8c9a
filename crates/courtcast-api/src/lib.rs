//! Client for the conference-details API: the upstream system of record
//! for hearings. The hub only ever reads whole aggregates from it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use courtcast_core::domain::{Conference, ConferenceStatus, Endpoint, Participant, Role};
use courtcast_core::ids::{ConferenceId, EndpointId, ParticipantId};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("conference not found: {0}")]
    NotFound(ConferenceId),
    #[error("conference API returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Full hearing details as the upstream API serves them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConferenceDetails {
    pub id: ConferenceId,
    pub case_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: ConferenceStatus,
    pub participants: Vec<ParticipantDetails>,
    #[serde(default)]
    pub endpoints: Vec<EndpointDetails>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParticipantDetails {
    pub id: ParticipantId,
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointDetails {
    pub id: EndpointId,
    pub display_name: String,
}

impl From<ConferenceDetails> for Conference {
    fn from(details: ConferenceDetails) -> Self {
        Conference {
            id: details.id,
            case_name: details.case_name,
            scheduled_at: details.scheduled_at,
            status: details.status,
            participants: details
                .participants
                .into_iter()
                .map(|p| Participant {
                    id: p.id,
                    username: p.username,
                    display_name: p.display_name,
                    role: p.role,
                })
                .collect(),
            endpoints: details
                .endpoints
                .into_iter()
                .map(|e| Endpoint {
                    id: e.id,
                    display_name: e.display_name,
                })
                .collect(),
        }
    }
}

/// Fetch-by-id seam the cache resolves through. Implemented over HTTP in
/// production and by counting fakes in tests.
#[async_trait]
pub trait ConferenceApi: Send + Sync {
    async fn conference_details(&self, id: &ConferenceId)
        -> Result<ConferenceDetails, ApiError>;
}

pub struct HttpConferenceApi {
    client: Client,
    base_url: String,
}

impl HttpConferenceApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ConferenceApi for HttpConferenceApi {
    async fn conference_details(
        &self,
        id: &ConferenceId,
    ) -> Result<ConferenceDetails, ApiError> {
        let url = format!("{}/conferences/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(id.clone())),
            status if status.is_success() => Ok(response.json().await?),
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(%url, status = status.as_u16(), "Conference API error");
                Err(ApiError::Upstream {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> ConferenceDetails {
        serde_json::from_str(
            r#"{
                "id": "conf-1",
                "case_name": "Rex v Carter",
                "scheduled_at": "2026-03-02T10:00:00Z",
                "status": "not_started",
                "participants": [
                    {
                        "id": "part-1",
                        "username": "Judge.Fudge",
                        "display_name": "Judge Fudge",
                        "role": "judge"
                    },
                    {
                        "id": "part-2",
                        "username": "claimant.one",
                        "display_name": "Claimant One",
                        "role": "individual"
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn details_deserialize_without_endpoints() {
        let d = details();
        assert_eq!(d.participants.len(), 2);
        assert!(d.endpoints.is_empty());
        assert_eq!(d.status, ConferenceStatus::NotStarted);
    }

    #[test]
    fn conference_conversion_preserves_participants() {
        let conf: Conference = details().into();
        assert_eq!(conf.case_name, "Rex v Carter");
        assert_eq!(conf.participants.len(), 2);
        assert_eq!(conf.participants[0].role, Role::Judge);
        assert_eq!(conf.judge().unwrap().display_name, "Judge Fudge");
        assert_eq!(
            conf.participant(&ParticipantId::from_raw("part-2"))
                .unwrap()
                .username,
            "claimant.one"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpConferenceApi::new("http://bridge.local/api/");
        assert_eq!(api.base_url, "http://bridge.local/api");
    }
}
