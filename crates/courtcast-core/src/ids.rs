use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! branded_id {
    ($name:ident, $prefix:expr) => {
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a fresh id. Used for locally-originated entities; ids
            /// supplied by upstream systems come in through `from_raw`.
            pub fn new() -> Self {
                Self(format!("{}_{}", $prefix, Uuid::now_v7()))
            }

            pub fn from_raw(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

branded_id!(ConferenceId, "conf");
branded_id!(ParticipantId, "part");
branded_id!(EndpointId, "endp");
branded_id!(EventId, "evt");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conference_id_has_prefix() {
        let id = ConferenceId::new();
        assert!(id.as_str().starts_with("conf_"), "got: {id}");
    }

    #[test]
    fn participant_id_has_prefix() {
        let id = ParticipantId::new();
        assert!(id.as_str().starts_with("part_"), "got: {id}");
    }

    #[test]
    fn event_id_has_prefix() {
        let id = EventId::new();
        assert!(id.as_str().starts_with("evt_"), "got: {id}");
    }

    #[test]
    fn ids_are_unique() {
        let a = ConferenceId::new();
        let b = ConferenceId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn from_raw_accepts_upstream_guids() {
        let id = ConferenceId::from_raw("58e9dbbc-35a5-4611-9159-55b3c1d1b21e");
        assert_eq!(id.as_str(), "58e9dbbc-35a5-4611-9159-55b3c1d1b21e");
    }

    #[test]
    fn display_and_from_str_roundtrip() {
        let id = ParticipantId::new();
        let s = id.to_string();
        let parsed: ParticipantId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_roundtrip() {
        let id = ConferenceId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ConferenceId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
