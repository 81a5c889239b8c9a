use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConferenceId, EndpointId, ParticipantId};

/// Lifecycle status of a hearing. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConferenceStatus {
    NotStarted,
    InSession,
    Paused,
    Suspended,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Judge,
    Representative,
    Individual,
    StaffMember,
    Officer,
}

/// Connection state of a single participant within a hearing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantState {
    NotSignedIn,
    Joining,
    Available,
    InHearing,
    InConsultation,
    Disconnected,
}

/// Routing key for a recipient group. Always lower-invariant: usernames
/// are case-insensitive identities, so two spellings of the same username
/// must address the same group.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupName(String);

impl GroupName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One person attached to a conference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

impl Participant {
    /// The group this participant's own client listens on.
    pub fn group(&self) -> GroupName {
        GroupName::new(&self.username)
    }
}

/// A video endpoint linked to a conference (interpreter booth, CVP room).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: EndpointId,
    pub display_name: String,
}

/// The in-memory aggregate for one scheduled hearing.
///
/// Built only from a full details fetch; mutation is whole-aggregate
/// replacement in the cache, never a partial field update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conference {
    pub id: ConferenceId,
    pub case_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: ConferenceStatus,
    pub participants: Vec<Participant>,
    pub endpoints: Vec<Endpoint>,
}

impl Conference {
    /// Look up a participant by id. Absence is a valid outcome: some
    /// events carry ids this conference has never seen.
    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn judge(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.role == Role::Judge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(username: &str, role: Role) -> Participant {
        Participant {
            id: ParticipantId::new(),
            username: username.into(),
            display_name: username.into(),
            role,
        }
    }

    fn conference() -> Conference {
        Conference {
            id: ConferenceId::new(),
            case_name: "Rex v Carter".into(),
            scheduled_at: Utc::now(),
            status: ConferenceStatus::NotStarted,
            participants: vec![
                participant("judge.fudge", Role::Judge),
                participant("claimant one", Role::Individual),
            ],
            endpoints: vec![],
        }
    }

    #[test]
    fn group_name_is_lower_invariant() {
        assert_eq!(GroupName::new("Judge.Fudge"), GroupName::new("judge.fudge"));
        assert_eq!(GroupName::new("MiXeD").as_str(), "mixed");
    }

    #[test]
    fn participant_group_lowers_username() {
        let p = participant("Judge.Fudge", Role::Judge);
        assert_eq!(p.group().as_str(), "judge.fudge");
    }

    #[test]
    fn participant_lookup_by_id() {
        let conf = conference();
        let wanted = conf.participants[1].id.clone();
        assert_eq!(conf.participant(&wanted).unwrap().username, "claimant one");
    }

    #[test]
    fn participant_lookup_absent_is_none() {
        let conf = conference();
        assert!(conf.participant(&ParticipantId::new()).is_none());
    }

    #[test]
    fn judge_lookup() {
        let conf = conference();
        assert_eq!(conf.judge().unwrap().username, "judge.fudge");
    }

    #[test]
    fn judge_lookup_without_judge() {
        let mut conf = conference();
        conf.participants.retain(|p| p.role != Role::Judge);
        assert!(conf.judge().is_none());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ConferenceStatus::InSession).unwrap();
        assert_eq!(json, "\"in_session\"");
    }
}
