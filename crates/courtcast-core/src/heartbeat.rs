use serde::{Deserialize, Serialize};

/// Sentinel the client sends when a metric collected no samples in the
/// window. Must never reach the numeric thresholds.
pub const NO_DATA: f64 = -1.0;

/// One telemetry beacon: packet-loss percentages for each media leg,
/// overall and over the recent window, plus client environment strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Heartbeat {
    pub incoming_audio_percentage_lost: f64,
    pub incoming_video_percentage_lost: f64,
    pub outgoing_audio_percentage_lost: f64,
    pub outgoing_video_percentage_lost: f64,
    pub incoming_audio_percentage_lost_recent: f64,
    pub incoming_video_percentage_lost_recent: f64,
    pub outgoing_audio_percentage_lost_recent: f64,
    pub outgoing_video_percentage_lost_recent: f64,
    #[serde(default)]
    pub browser_name: String,
    #[serde(default)]
    pub browser_version: String,
    #[serde(default)]
    pub operating_system: String,
    #[serde(default)]
    pub operating_system_version: String,
}

impl Heartbeat {
    fn recent_metrics(&self) -> [f64; 4] {
        [
            self.incoming_audio_percentage_lost_recent,
            self.incoming_video_percentage_lost_recent,
            self.outgoing_audio_percentage_lost_recent,
            self.outgoing_video_percentage_lost_recent,
        ]
    }
}

/// Call-quality tier derived from a heartbeat. Never stored apart from
/// the beacon that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatHealth {
    None,
    Good,
    Poor,
    Bad,
}

impl HeartbeatHealth {
    /// Classify from the worst of the four recent-window metrics.
    ///
    /// The no-data check comes first: the sentinel is negative and would
    /// otherwise fall into the `Good` bucket.
    pub fn classify(heartbeat: &Heartbeat) -> Self {
        let max = heartbeat
            .recent_metrics()
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max);

        if max < 0.0 {
            Self::None
        } else if max <= 10.0 {
            Self::Good
        } else if max <= 15.0 {
            Self::Poor
        } else {
            Self::Bad
        }
    }
}

#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum HeartbeatError {
    #[error("non-finite loss metric {field}: {value}")]
    NonFiniteMetric { field: &'static str, value: f64 },
}

/// The shape submitted to the external telemetry store. Field-for-field
/// with the beacon; no business logic lives here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub incoming_audio_percentage_lost: f64,
    pub incoming_video_percentage_lost: f64,
    pub outgoing_audio_percentage_lost: f64,
    pub outgoing_video_percentage_lost: f64,
    pub incoming_audio_percentage_lost_recent: f64,
    pub incoming_video_percentage_lost_recent: f64,
    pub outgoing_audio_percentage_lost_recent: f64,
    pub outgoing_video_percentage_lost_recent: f64,
    pub browser_name: String,
    pub browser_version: String,
    pub operating_system: String,
    pub operating_system_version: String,
}

impl TryFrom<&Heartbeat> for HeartbeatRequest {
    type Error = HeartbeatError;

    fn try_from(hb: &Heartbeat) -> Result<Self, Self::Error> {
        let fields = [
            ("incoming_audio_percentage_lost", hb.incoming_audio_percentage_lost),
            ("incoming_video_percentage_lost", hb.incoming_video_percentage_lost),
            ("outgoing_audio_percentage_lost", hb.outgoing_audio_percentage_lost),
            ("outgoing_video_percentage_lost", hb.outgoing_video_percentage_lost),
            (
                "incoming_audio_percentage_lost_recent",
                hb.incoming_audio_percentage_lost_recent,
            ),
            (
                "incoming_video_percentage_lost_recent",
                hb.incoming_video_percentage_lost_recent,
            ),
            (
                "outgoing_audio_percentage_lost_recent",
                hb.outgoing_audio_percentage_lost_recent,
            ),
            (
                "outgoing_video_percentage_lost_recent",
                hb.outgoing_video_percentage_lost_recent,
            ),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(HeartbeatError::NonFiniteMetric { field, value });
            }
        }

        Ok(Self {
            incoming_audio_percentage_lost: hb.incoming_audio_percentage_lost,
            incoming_video_percentage_lost: hb.incoming_video_percentage_lost,
            outgoing_audio_percentage_lost: hb.outgoing_audio_percentage_lost,
            outgoing_video_percentage_lost: hb.outgoing_video_percentage_lost,
            incoming_audio_percentage_lost_recent: hb.incoming_audio_percentage_lost_recent,
            incoming_video_percentage_lost_recent: hb.incoming_video_percentage_lost_recent,
            outgoing_audio_percentage_lost_recent: hb.outgoing_audio_percentage_lost_recent,
            outgoing_video_percentage_lost_recent: hb.outgoing_video_percentage_lost_recent,
            browser_name: hb.browser_name.clone(),
            browser_version: hb.browser_version.clone(),
            operating_system: hb.operating_system.clone(),
            operating_system_version: hb.operating_system_version.clone(),
        })
    }
}
