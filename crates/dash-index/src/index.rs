//! Mapping between segment numbers and media time.
//!
//! Segment times are relative to the start of the enclosing period, in microseconds.

use serde::Serialize;
use url::Url;

use crate::{
    format::Format,
    ranged_uri::RangedUri,
    segment_base::{MultiSegmentBase, SegmentList, SegmentTemplate},
    template::Template,
    time::{scale_large_timestamp, MICROS_PER_SECOND},
    url::{merge_baseurls, ByteRange},
    MpdError, MpdResult,
};

impl MultiSegmentBase {
    pub fn first_segment_num(&self) -> u64 {
        self.start_number
    }

    /// Whether segment times come from a `SegmentTimeline`.
    pub fn is_explicit(&self) -> bool {
        self.timeline.is_some()
    }

    /// Nominal segment duration in microseconds.
    fn nominal_duration_us(&self) -> i64 {
        self.common.scale_to_us(self.duration.unwrap_or_default())
    }

    fn period_duration_us(&self) -> Option<i64> {
        self.period_duration_ms.map(|duration_ms| {
            scale_large_timestamp(i64::try_from(duration_ms).unwrap_or(i64::MAX), 1000, 1)
        })
    }

    /// Last segment number of a fixed duration base, `None` when the period is unbounded.
    fn implicit_last_segment_num(&self) -> Option<u64> {
        let duration_us = self.nominal_duration_us();
        let period_duration_us = self.period_duration_us()?;
        let count = if duration_us > 0 {
            (period_duration_us.max(0) as u64).div_ceil(duration_us as u64)
        } else {
            1
        };
        Some(self.start_number.saturating_add(count.max(1) - 1))
    }

    /// Last segment number of a sequence of `count` segments, `None` when it is empty.
    fn last_of(&self, count: usize) -> Option<u64> {
        (count as u64)
            .checked_sub(1)
            .map(|offset| self.start_number.saturating_add(offset))
    }

    fn in_range(&self, segment_num: u64, last: Option<u64>) -> bool {
        segment_num >= self.start_number
            && last.map_or(true, |last| segment_num <= last)
            && self.timeline.as_ref().map_or(true, |timeline| {
                segment_num - self.start_number < timeline.len() as u64
            })
    }

    /// Start time of a segment known to be in range.
    fn time_us_unchecked(&self, segment_num: u64) -> i64 {
        let offset = segment_num - self.start_number;
        match &self.timeline {
            Some(timeline) => {
                let start = timeline[offset as usize].start as i128
                    - self.common.presentation_time_offset as i128;
                scale_i128(start, self.common.timescale)
            }
            None => scale_i128(
                offset as i128 * self.duration.unwrap_or_default() as i128,
                self.common.timescale,
            ),
        }
    }

    pub(crate) fn segment_time_us(&self, segment_num: u64, last: Option<u64>) -> Option<i64> {
        self.in_range(segment_num, last)
            .then(|| self.time_us_unchecked(segment_num))
    }

    pub(crate) fn segment_duration_us(&self, segment_num: u64, last: Option<u64>) -> Option<i64> {
        if !self.in_range(segment_num, last) {
            return None;
        }

        let duration_us = match &self.timeline {
            Some(timeline) => self
                .common
                .scale_to_us(timeline[(segment_num - self.start_number) as usize].duration),
            None => match self.period_duration_us() {
                // The last segment absorbs the remainder of the period.
                Some(period_duration_us) if Some(segment_num) == last => {
                    period_duration_us - self.time_us_unchecked(segment_num)
                }
                _ => self.nominal_duration_us(),
            },
        };
        Some(duration_us)
    }

    /// Number of the segment covering `time_us`, clamped to the available segments.
    pub(crate) fn segment_num(&self, time_us: i64, last: Option<u64>) -> u64 {
        let first = self.first_segment_num();

        if self.timeline.is_none() {
            let duration_us = self.nominal_duration_us();
            if duration_us <= 0 {
                return first;
            }
            let offset = time_us.div_euclid(duration_us);
            if offset < 0 {
                return first;
            }
            let segment_num = first.saturating_add(offset as u64);
            return match last {
                Some(last) if segment_num > last => last,
                _ => segment_num,
            };
        }

        let Some(timeline_last) = self.last_of(self.timeline.as_ref().map_or(0, Vec::len)) else {
            return first;
        };
        let last = last.map_or(timeline_last, |last| last.min(timeline_last));

        let mut low = first as i128;
        let mut high = last as i128;
        while low <= high {
            let mid = low + (high - low) / 2;
            let mid_time_us = self.time_us_unchecked(mid as u64);
            match mid_time_us.cmp(&time_us) {
                std::cmp::Ordering::Less => low = mid + 1,
                std::cmp::Ordering::Greater => high = mid - 1,
                std::cmp::Ordering::Equal => return mid as u64,
            }
        }

        if low == first as i128 {
            first
        } else {
            high as u64
        }
    }
}

fn scale_i128(value: i128, timescale: u64) -> i64 {
    let scaled = value * MICROS_PER_SECOND as i128 / timescale as i128;
    i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX })
}

/// Segment description of a multi-segment representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum MultiSegmentSource {
    List(SegmentList),
    Template(SegmentTemplate),
}

impl MultiSegmentSource {
    pub fn base(&self) -> &MultiSegmentBase {
        match self {
            Self::List(list) => &list.multi,
            Self::Template(template) => &template.multi,
        }
    }

    /// `None` when the number of segments is unbounded or there are no segments.
    pub fn last_segment_num(&self) -> Option<u64> {
        match self {
            Self::List(list) => list.multi.last_of(list.media_segments.len()),
            Self::Template(template) => match &template.multi.timeline {
                Some(timeline) => template.multi.last_of(timeline.len()),
                None => template.multi.implicit_last_segment_num(),
            },
        }
    }

    pub fn is_explicit(&self) -> bool {
        match self {
            Self::List(_) => true,
            Self::Template(template) => template.multi.is_explicit(),
        }
    }

    pub(crate) fn validate(&self) -> MpdResult<()> {
        match self {
            Self::List(list) => {
                list.multi.validate("SegmentList")?;
                if list.media_segments.is_empty() {
                    return Err(MpdError::malformed("SegmentList without SegmentURL"));
                }
                if let Some(timeline) = &list.multi.timeline {
                    if timeline.len() < list.media_segments.len() {
                        return Err(MpdError::malformed(
                            "SegmentTimeline shorter than the SegmentURL list",
                        ));
                    }
                }
            }
            Self::Template(template) => {
                template.multi.validate("SegmentTemplate")?;
                if template.media_template.is_none() {
                    return Err(MpdError::malformed("SegmentTemplate without @media"));
                }
            }
        }
        if self
            .base()
            .timeline
            .as_ref()
            .is_some_and(|timeline| timeline.is_empty())
        {
            return Err(MpdError::malformed("SegmentTimeline without S elements"));
        }
        Ok(())
    }

    fn template_args(&self, format: &Format, segment_num: Option<u64>) -> Template<'static> {
        let mut args = Template::new();
        args.insert_optional(Template::REPRESENTATION_ID, format.id.clone())
            .insert_optional(Template::BANDWIDTH, format.bitrate.map(|b| b.to_string()));

        if let Some(segment_num) = segment_num {
            let base = self.base();
            let offset = segment_num - base.start_number;
            let time = match &base.timeline {
                Some(timeline) => timeline[offset as usize].start,
                None => offset.saturating_mul(base.duration.unwrap_or_default()),
            };
            args.insert(Template::NUMBER, segment_num.to_string())
                .insert(Template::TIME, time.to_string());
        }
        args
    }

    /// Initialization data of the representation, if any.
    pub fn initialization(&self, format: &Format, base_url: &Url) -> MpdResult<Option<RangedUri>> {
        match self {
            Self::Template(SegmentTemplate {
                initialization_template: Some(initialization),
                ..
            }) => {
                let url = initialization.resolve(&self.template_args(format, None));
                Ok(Some(RangedUri::from_url(
                    merge_baseurls(base_url, &url)?,
                    ByteRange::FULL,
                )))
            }
            _ => Ok(self.base().common.initialization.clone()),
        }
    }

    pub fn segment_url(&self, segment_num: u64, format: &Format, base_url: &Url) -> MpdResult<RangedUri> {
        if !self
            .base()
            .in_range(segment_num, self.last_segment_num())
        {
            return Err(MpdError::SegmentOutOfRange(segment_num));
        }

        match self {
            Self::List(list) => list
                .media_segments
                .get((segment_num - list.multi.start_number) as usize)
                .cloned()
                .ok_or(MpdError::SegmentOutOfRange(segment_num)),
            Self::Template(template) => {
                let media = template
                    .media_template
                    .as_ref()
                    .ok_or_else(|| MpdError::malformed("SegmentTemplate without @media"))?;
                let url = media.resolve(&self.template_args(format, Some(segment_num)));
                Ok(RangedUri::from_url(
                    merge_baseurls(base_url, &url)?,
                    ByteRange::FULL,
                ))
            }
        }
    }
}

/// Index of a single-segment representation without an external segment index: one segment
/// covering the whole period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleSegmentIndex {
    /// Period start in microseconds.
    pub start_time_us: i64,
    /// `None` when the period duration is unknown.
    pub duration_us: Option<i64>,
    pub uri: RangedUri,
}

impl SingleSegmentIndex {
    pub const SEGMENT_NUM: u64 = 0;

    pub fn new(period_start_ms: u64, period_duration_ms: Option<u64>, uri: RangedUri) -> Self {
        let to_us = |ms: u64| scale_large_timestamp(i64::try_from(ms).unwrap_or(i64::MAX), 1000, 1);
        Self {
            start_time_us: to_us(period_start_ms),
            duration_us: period_duration_ms.map(to_us),
            uri,
        }
    }
}
