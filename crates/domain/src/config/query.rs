use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when a new query reuses the id of one still in flight.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdCollisionPolicy {
    /// The new query takes the slot; the displaced one fails with `DuplicateId`.
    #[default]
    Replace,

    /// The new query fails with `DuplicateId`; the one in flight is untouched.
    Reject,
}

impl IdCollisionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Seconds to wait for a response. Absent means wait forever; zero or
    /// negative fails the query immediately.
    #[serde(default)]
    pub timeout_secs: Option<f64>,

    #[serde(default)]
    pub id_collision: IdCollisionPolicy,

    #[serde(default = "default_max_udp_payload")]
    pub max_udp_payload: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            id_collision: IdCollisionPolicy::default(),
            max_udp_payload: default_max_udp_payload(),
        }
    }
}

impl QueryConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(timeout_from_secs)
    }
}

/// Converts a caller-supplied timeout in seconds into a `Duration`.
///
/// Non-positive and NaN values map to `Duration::ZERO`, which the client
/// treats as already expired.
pub fn timeout_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

fn default_max_udp_payload() -> usize {
    4096
}
