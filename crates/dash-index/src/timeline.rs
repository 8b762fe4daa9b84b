use serde::Serialize;

use crate::{MpdError, MpdResult};

/// Upper bound on the number of segments a single `SegmentTimeline` may expand to.
pub const MAX_TIMELINE_SEGMENTS: u64 = 1 << 20;

/// One segment of an expanded `SegmentTimeline`, in timescale units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentTimelineElement {
    pub start: u64,
    pub duration: u64,
}

impl SegmentTimelineElement {
    pub fn new(start: u64, duration: u64) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.duration)
    }
}

/// A `S` element as written in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEntry {
    /// `S@t`, defaults to the end of the previous entry.
    pub time: Option<u64>,
    /// `S@d`
    pub duration: u64,
    /// `S@r`. Only additional segment references are counted, so `r=5` stands for 6 segments.
    /// A negative value repeats up to the end of the period.
    pub repeat_count: i64,
}

/// Expands run-length encoded timeline entries into one element per segment.
///
/// `end_time` is the period end in timescale units, used to resolve negative repeat counts.
/// Without it such an entry produces a single segment.
///
/// Fails when a segment end does not fit in `u64` or when the timeline would exceed
/// [`MAX_TIMELINE_SEGMENTS`].
pub fn expand_timeline(
    entries: &[TimelineEntry],
    end_time: Option<u64>,
) -> MpdResult<Vec<SegmentTimelineElement>> {
    let mut timeline = Vec::with_capacity(entries.len());
    let mut elapsed_time = 0u64;

    for (index, entry) in entries.iter().enumerate() {
        if let Some(time) = entry.time {
            elapsed_time = time;
        }

        let count = if entry.repeat_count >= 0 {
            entry.repeat_count as u64 + 1
        } else {
            // Repeat until the next S@t, or the end of the period for the last entry.
            let next_time = entries
                .get(index + 1)
                .and_then(|next| next.time)
                .or(end_time);
            match next_time {
                Some(until) if entry.duration > 0 && until > elapsed_time => {
                    (until - elapsed_time).div_ceil(entry.duration)
                }
                _ => {
                    tracing::warn!(
                        time = elapsed_time,
                        duration = entry.duration,
                        "Open-ended S@r without a known end, using a single segment"
                    );
                    1
                }
            }
        };

        if count > MAX_TIMELINE_SEGMENTS - timeline.len() as u64 {
            return Err(MpdError::malformed(format!(
                "SegmentTimeline has more than {MAX_TIMELINE_SEGMENTS} segments"
            )));
        }
        for _ in 0..count {
            timeline.push(SegmentTimelineElement::new(elapsed_time, entry.duration));
            elapsed_time = elapsed_time.checked_add(entry.duration).ok_or_else(|| {
                MpdError::malformed(format!(
                    "SegmentTimeline overflows after S@t={elapsed_time} S@d={}",
                    entry.duration
                ))
            })?;
        }
    }

    Ok(timeline)
}
