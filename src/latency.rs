// ⏱️ Simulated latency
// Stand-in for network round-trips of the simulated backends.
// Tests use `LatencyProfile::instant()` so nothing sleeps.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a simulated backend call waits before it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Latency {
    /// Resolve immediately
    None,
    /// Always wait this many milliseconds
    Fixed { ms: u64 },
    /// Uniform over [min_ms, max_ms], both ends inclusive
    Uniform { min_ms: u64, max_ms: u64 },
}

impl Latency {
    pub fn uniform(min_ms: u64, max_ms: u64) -> Self {
        Latency::Uniform { min_ms, max_ms }
    }

    pub fn sample(&self) -> Duration {
        match *self {
            Latency::None => Duration::ZERO,
            Latency::Fixed { ms } => Duration::from_millis(ms),
            Latency::Uniform { min_ms, max_ms } => {
                let (lo, hi) = if min_ms <= max_ms {
                    (min_ms, max_ms)
                } else {
                    (max_ms, min_ms)
                };
                Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
            }
        }
    }

    pub async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Latency per backend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyProfile {
    pub add: Latency,
    pub list: Latency,
    pub update: Latency,
    pub upload: Latency,
}

impl LatencyProfile {
    pub fn instant() -> Self {
        LatencyProfile {
            add: Latency::None,
            list: Latency::None,
            update: Latency::None,
            upload: Latency::None,
        }
    }
}

impl Default for LatencyProfile {
    /// Round-trip times observed against the real site
    fn default() -> Self {
        LatencyProfile {
            add: Latency::uniform(800, 1500),
            list: Latency::uniform(500, 1000),
            update: Latency::uniform(500, 1000),
            upload: Latency::uniform(1000, 2000),
        }
    }
}
