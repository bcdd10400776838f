//! Adaptive timeout profiles (spec §4.2), grounded on
//! `original_source/backend/ci_cd/adaptive_health_checker.py`'s
//! `performance_profiles` table.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Runner/environment performance tier. Unknown profiles resolve to
/// [`PerformanceProfile::Standard`] (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceProfile {
    Fast,
    Standard,
    Slow,
}

impl PerformanceProfile {
    const fn multiplier(self) -> f64 {
        match self {
            Self::Fast => 0.5,
            Self::Standard => 1.0,
            Self::Slow => 2.0,
        }
    }

    const fn cap(self) -> Duration {
        match self {
            Self::Fast => Duration::from_secs(60),
            Self::Standard => Duration::from_secs(120),
            Self::Slow => Duration::from_secs(300),
        }
    }

    /// Multiplies `base` by this profile's factor and clamps to its cap.
    #[must_use]
    pub fn adapt(self, base: Duration) -> Duration {
        let scaled = base.mul_f64(self.multiplier());
        scaled.min(self.cap())
    }
}

impl Default for PerformanceProfile {
    fn default() -> Self {
        Self::Standard
    }
}
