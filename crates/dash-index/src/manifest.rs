use serde::Serialize;

use crate::adaptation_set::AdaptationSet;

/// A `UTCTiming` descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtcTiming {
    pub scheme_id_uri: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub id: Option<String>,
    /// `Period@start`, 0 when absent.
    pub start_ms: u64,
    /// `Period@duration`, falling back to the presentation duration.
    pub duration_ms: Option<u64>,
    pub adaptation_sets: Vec<AdaptationSet>,
}

/// A parsed Media Presentation Description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    /// Epoch milliseconds.
    pub availability_start_time_ms: Option<i64>,
    pub duration_ms: Option<u64>,
    pub min_buffer_time_ms: Option<u64>,
    /// `MPD@type="dynamic"`
    pub dynamic: bool,
    /// Only read for dynamic presentations.
    pub min_update_period_ms: Option<u64>,
    /// Only read for dynamic presentations.
    pub time_shift_buffer_depth_ms: Option<u64>,
    pub utc_timing: Option<UtcTiming>,
    pub periods: Vec<Period>,
}

impl Manifest {
    /// Duration of the period at `index`.
    ///
    /// Uses the declared duration, then the distance to the next period, then the distance to
    /// the end of the presentation.
    pub fn period_duration_ms(&self, index: usize) -> Option<u64> {
        let period = self.periods.get(index)?;
        if let Some(duration_ms) = period.duration_ms {
            return Some(duration_ms);
        }

        match self.periods.get(index + 1) {
            Some(next) => Some(next.start_ms.saturating_sub(period.start_ms)),
            None => self
                .duration_ms
                .map(|duration_ms| duration_ms.saturating_sub(period.start_ms)),
        }
    }

    pub fn adaptation_sets(&self) -> impl Iterator<Item = &AdaptationSet> {
        self.periods
            .iter()
            .flat_map(|period| period.adaptation_sets.iter())
    }
}
