//! `SegmentBase`, `SegmentList` and `SegmentTemplate`.
//!
//! Each element is parsed into an overrides value holding only the attributes and children it
//! declares. The overrides are then merged with the closest ancestor of the same kind, falling
//! back to the defaults when there is none:
//!
//! | field                    | default |
//! |--------------------------|---------|
//! | `@timescale`             | 1       |
//! | `@presentationTimeOffset`| 0       |
//! | `@startNumber`           | 1       |
//! | `@duration`              | none    |
//!
//! Fallback happens on absence only: an empty `SegmentTimeline` overrides the parent's one.

use serde::Serialize;
use url::Url;

use crate::{
    ranged_uri::RangedUri,
    template::UrlTemplate,
    time::{scale_large_timestamp, MICROS_PER_SECOND, MILLIS_PER_SECOND},
    timeline::{expand_timeline, SegmentTimelineElement, TimelineEntry},
    url::ByteRange,
    MpdError, MpdResult,
};

pub const DEFAULT_TIMESCALE: u64 = 1;
pub const DEFAULT_START_NUMBER: u64 = 1;

/// Fields shared by every kind of segment base.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentBaseCommon {
    pub initialization: Option<RangedUri>,
    /// Units per second.
    pub timescale: u64,
    /// In timescale units.
    pub presentation_time_offset: u64,
}

impl Default for SegmentBaseCommon {
    fn default() -> Self {
        Self {
            initialization: None,
            timescale: DEFAULT_TIMESCALE,
            presentation_time_offset: 0,
        }
    }
}

impl SegmentBaseCommon {
    pub fn presentation_time_offset_us(&self) -> i64 {
        self.scale_to_us(self.presentation_time_offset)
    }

    /// Converts timescale units into microseconds.
    pub(crate) fn scale_to_us(&self, value: u64) -> i64 {
        scale_large_timestamp(
            i64::try_from(value).unwrap_or(i64::MAX),
            MICROS_PER_SECOND,
            self.timescale,
        )
    }
}

/// `SegmentBase`: the whole representation is one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleSegmentBase {
    #[serde(flatten)]
    pub common: SegmentBaseCommon,
    /// The media resource.
    pub uri: Url,
    /// Location of the segment index within [`Self::uri`].
    pub index_range: Option<ByteRange>,
}

impl SingleSegmentBase {
    pub fn new(uri: Url) -> Self {
        Self {
            common: SegmentBaseCommon::default(),
            uri,
            index_range: None,
        }
    }

    /// The segment index, if the manifest declares a non-empty one.
    pub fn index(&self) -> Option<RangedUri> {
        self.index_range
            .filter(|range| range.length.is_some_and(|length| length > 0))
            .map(|range| RangedUri::from_url(self.uri.clone(), range))
    }

    /// Points the base at another media resource, keeping its ranges.
    pub fn with_uri(mut self, uri: Url) -> Self {
        self.uri = uri;
        self
    }
}

/// Fields shared by `SegmentList` and `SegmentTemplate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiSegmentBase {
    #[serde(flatten)]
    pub common: SegmentBaseCommon,
    /// Duration of the enclosing period, `None` when unknown (e.g. the last period of a live
    /// presentation).
    pub period_duration_ms: Option<u64>,
    pub start_number: u64,
    /// Nominal segment duration in timescale units. Ignored when a timeline is present.
    pub duration: Option<u64>,
    pub timeline: Option<Vec<SegmentTimelineElement>>,
}

impl MultiSegmentBase {
    pub(crate) fn validate(&self, element: &str) -> MpdResult<()> {
        let has_duration = self.duration.is_some_and(|duration| duration > 0);
        if self.timeline.is_none() && !has_duration {
            return Err(MpdError::malformed(format!(
                "{element} has neither @duration nor SegmentTimeline"
            )));
        }
        Ok(())
    }
}

/// `SegmentList`: explicitly listed segment URLs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentList {
    #[serde(flatten)]
    pub multi: MultiSegmentBase,
    pub media_segments: Vec<RangedUri>,
}

/// `SegmentTemplate`: segment URLs built from a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentTemplate {
    #[serde(flatten)]
    pub multi: MultiSegmentBase,
    pub initialization_template: Option<UrlTemplate>,
    pub media_template: Option<UrlTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SegmentBase {
    Single(SingleSegmentBase),
    List(SegmentList),
    Template(SegmentTemplate),
}

impl SegmentBase {
    pub fn common(&self) -> &SegmentBaseCommon {
        match self {
            Self::Single(base) => &base.common,
            Self::List(list) => &list.multi.common,
            Self::Template(template) => &template.multi.common,
        }
    }

    pub fn as_single(&self) -> Option<&SingleSegmentBase> {
        match self {
            Self::Single(base) => Some(base),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&SegmentList> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_template(&self) -> Option<&SegmentTemplate> {
        match self {
            Self::Template(template) => Some(template),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonOverrides {
    pub initialization: Option<RangedUri>,
    pub timescale: Option<u64>,
    pub presentation_time_offset: Option<u64>,
}

impl CommonOverrides {
    pub fn inherit(self, parent: Option<&SegmentBaseCommon>) -> SegmentBaseCommon {
        let defaults = SegmentBaseCommon::default();
        let parent = parent.unwrap_or(&defaults);
        SegmentBaseCommon {
            initialization: self
                .initialization
                .or_else(|| parent.initialization.clone()),
            timescale: self.timescale.unwrap_or(parent.timescale),
            presentation_time_offset: self
                .presentation_time_offset
                .unwrap_or(parent.presentation_time_offset),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleSegmentOverrides {
    pub common: CommonOverrides,
    pub index_range: Option<ByteRange>,
}

impl SingleSegmentOverrides {
    pub fn inherit(self, uri: Url, parent: Option<&SingleSegmentBase>) -> SingleSegmentBase {
        SingleSegmentBase {
            common: self.common.inherit(parent.map(|p| &p.common)),
            uri,
            index_range: self
                .index_range
                .or_else(|| parent.and_then(|p| p.index_range)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiSegmentOverrides {
    pub common: CommonOverrides,
    pub start_number: Option<u64>,
    pub duration: Option<u64>,
    /// Still run-length encoded: expansion needs the inherited timescale.
    pub timeline: Option<Vec<TimelineEntry>>,
}

impl MultiSegmentOverrides {
    pub fn inherit(
        self,
        period_duration_ms: Option<u64>,
        parent: Option<&MultiSegmentBase>,
    ) -> MpdResult<MultiSegmentBase> {
        let common = self.common.inherit(parent.map(|p| &p.common));

        let timeline = match self.timeline {
            Some(entries) => {
                let end_time = period_duration_ms.map(|duration_ms| {
                    let duration = scale_large_timestamp(
                        i64::try_from(duration_ms).unwrap_or(i64::MAX),
                        common.timescale,
                        MILLIS_PER_SECOND,
                    );
                    common
                        .presentation_time_offset
                        .saturating_add(duration.max(0) as u64)
                });
                Some(expand_timeline(&entries, end_time)?)
            }
            None => parent.and_then(|p| p.timeline.clone()),
        };

        Ok(MultiSegmentBase {
            common,
            period_duration_ms,
            start_number: self
                .start_number
                .or_else(|| parent.map(|p| p.start_number))
                .unwrap_or(DEFAULT_START_NUMBER),
            duration: self.duration.or_else(|| parent.and_then(|p| p.duration)),
            timeline,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentListOverrides {
    pub multi: MultiSegmentOverrides,
    pub media_segments: Option<Vec<RangedUri>>,
}

impl SegmentListOverrides {
    pub fn inherit(
        self,
        period_duration_ms: Option<u64>,
        parent: Option<&SegmentList>,
    ) -> MpdResult<SegmentList> {
        Ok(SegmentList {
            multi: self
                .multi
                .inherit(period_duration_ms, parent.map(|p| &p.multi))?,
            media_segments: self
                .media_segments
                .or_else(|| parent.map(|p| p.media_segments.clone()))
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentTemplateOverrides {
    pub multi: MultiSegmentOverrides,
    pub initialization_template: Option<UrlTemplate>,
    pub media_template: Option<UrlTemplate>,
}

impl SegmentTemplateOverrides {
    pub fn inherit(
        self,
        period_duration_ms: Option<u64>,
        parent: Option<&SegmentTemplate>,
    ) -> MpdResult<SegmentTemplate> {
        Ok(SegmentTemplate {
            multi: self
                .multi
                .inherit(period_duration_ms, parent.map(|p| &p.multi))?,
            initialization_template: self
                .initialization_template
                .or_else(|| parent.and_then(|p| p.initialization_template.clone())),
            media_template: self
                .media_template
                .or_else(|| parent.and_then(|p| p.media_template.clone())),
        })
    }
}
