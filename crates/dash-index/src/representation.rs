use serde::Serialize;
use url::Url;

use crate::{
    format::Format,
    index::{MultiSegmentSource, SingleSegmentIndex},
    ranged_uri::RangedUri,
    segment_base::SegmentBase,
    url::ByteRange,
    MpdError, MpdResult,
};

/// One encoding of the content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Representation {
    pub content_id: Option<String>,
    /// Distinguishes successive revisions of the same content.
    pub revision_id: i64,
    pub format: Format,
    pub period_start_ms: u64,
    pub period_duration_ms: Option<u64>,
    pub presentation_time_offset_us: i64,
    pub initialization_uri: Option<RangedUri>,
    /// Resolved `BaseURL` of the representation.
    pub base_url: Url,
    pub segments: RepresentationKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum RepresentationKind {
    SingleSegment(SingleSegmentRepresentation),
    MultiSegment(MultiSegmentSource),
}

/// The media is a single resource, optionally indexed by a `sidx` box at
/// [`Self::index_uri`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleSegmentRepresentation {
    pub uri: Url,
    pub index_uri: Option<RangedUri>,
    /// Size of the resource in bytes, when known.
    pub content_length: Option<u64>,
    /// Present when there is no external index to load.
    pub segment_index: Option<SingleSegmentIndex>,
}

#[derive(Debug, Clone)]
pub struct RepresentationContext<'a> {
    pub content_id: Option<&'a str>,
    pub revision_id: i64,
    pub period_start_ms: u64,
    pub period_duration_ms: Option<u64>,
}

impl Representation {
    /// Builds a representation from its resolved segment base.
    ///
    /// A `SegmentBase` addresses the representation's own media, so its URI is replaced with
    /// `base_url`.
    pub fn new(
        context: &RepresentationContext,
        format: Format,
        base_url: Url,
        segment_base: SegmentBase,
    ) -> MpdResult<Self> {
        let presentation_time_offset_us = segment_base.common().presentation_time_offset_us();

        let (initialization_uri, segments) = match segment_base {
            SegmentBase::Single(base) => {
                let base = base.with_uri(base_url.clone());
                let index_uri = base.index();
                let segment_index = index_uri.is_none().then(|| {
                    SingleSegmentIndex::new(
                        context.period_start_ms,
                        context.period_duration_ms,
                        RangedUri::from_url(base.uri.clone(), ByteRange::FULL),
                    )
                });
                let representation = SingleSegmentRepresentation {
                    uri: base.uri,
                    index_uri,
                    content_length: None,
                    segment_index,
                };
                (
                    base.common.initialization,
                    RepresentationKind::SingleSegment(representation),
                )
            }
            SegmentBase::List(list) => {
                let source = MultiSegmentSource::List(list);
                source.validate()?;
                (
                    source.initialization(&format, &base_url)?,
                    RepresentationKind::MultiSegment(source),
                )
            }
            SegmentBase::Template(template) => {
                let source = MultiSegmentSource::Template(template);
                source.validate()?;
                (
                    source.initialization(&format, &base_url)?,
                    RepresentationKind::MultiSegment(source),
                )
            }
        };

        Ok(Self {
            content_id: context.content_id.map(str::to_string),
            revision_id: context.revision_id,
            format,
            period_start_ms: context.period_start_ms,
            period_duration_ms: context.period_duration_ms,
            presentation_time_offset_us,
            initialization_uri,
            base_url,
            segments,
        })
    }

    /// `contentId.formatId.revisionId`
    pub fn cache_key(&self) -> String {
        format!(
            "{}.{}.{}",
            self.content_id.as_deref().unwrap_or_default(),
            self.format.id.as_deref().unwrap_or_default(),
            self.revision_id
        )
    }

    /// The segment index, or `None` for a single-segment representation whose index has to be
    /// loaded from [`SingleSegmentRepresentation::index_uri`].
    pub fn index(&self) -> Option<SegmentIndex<'_>> {
        match &self.segments {
            RepresentationKind::SingleSegment(single) => {
                single.segment_index.as_ref().map(SegmentIndex::Single)
            }
            RepresentationKind::MultiSegment(source) => Some(SegmentIndex::Multi {
                source,
                format: &self.format,
                base_url: &self.base_url,
            }),
        }
    }
}

/// Queries on the segments of a [`Representation`].
#[derive(Debug, Clone, Copy)]
pub enum SegmentIndex<'a> {
    Single(&'a SingleSegmentIndex),
    Multi {
        source: &'a MultiSegmentSource,
        format: &'a Format,
        base_url: &'a Url,
    },
}

impl SegmentIndex<'_> {
    pub fn first_segment_num(&self) -> u64 {
        match self {
            Self::Single(_) => SingleSegmentIndex::SEGMENT_NUM,
            Self::Multi { source, .. } => source.base().first_segment_num(),
        }
    }

    /// `None` when the number of segments is unbounded.
    pub fn last_segment_num(&self) -> Option<u64> {
        match self {
            Self::Single(_) => Some(SingleSegmentIndex::SEGMENT_NUM),
            Self::Multi { source, .. } => source.last_segment_num(),
        }
    }

    pub fn segment_count(&self) -> Option<u64> {
        self.last_segment_num()
            .map(|last| (last - self.first_segment_num()).saturating_add(1))
    }

    /// Whether segment times are listed explicitly rather than derived from a fixed duration.
    pub fn is_explicit(&self) -> bool {
        match self {
            Self::Single(_) => true,
            Self::Multi { source, .. } => source.is_explicit(),
        }
    }

    /// Number of the segment containing `time_us`, clamped to the available segments.
    pub fn segment_num(&self, time_us: i64) -> u64 {
        match self {
            Self::Single(_) => SingleSegmentIndex::SEGMENT_NUM,
            Self::Multi { source, .. } => {
                source.base().segment_num(time_us, source.last_segment_num())
            }
        }
    }

    pub fn time_us(&self, segment_num: u64) -> Option<i64> {
        match self {
            Self::Single(index) => {
                (segment_num == SingleSegmentIndex::SEGMENT_NUM).then_some(index.start_time_us)
            }
            Self::Multi { source, .. } => source
                .base()
                .segment_time_us(segment_num, source.last_segment_num()),
        }
    }

    pub fn duration_us(&self, segment_num: u64) -> Option<i64> {
        match self {
            Self::Single(index) => (segment_num == SingleSegmentIndex::SEGMENT_NUM)
                .then_some(index.duration_us)
                .flatten(),
            Self::Multi { source, .. } => source
                .base()
                .segment_duration_us(segment_num, source.last_segment_num()),
        }
    }

    pub fn segment_url(&self, segment_num: u64) -> MpdResult<RangedUri> {
        match self {
            Self::Single(index) => {
                if segment_num != SingleSegmentIndex::SEGMENT_NUM {
                    return Err(MpdError::SegmentOutOfRange(segment_num));
                }
                Ok(index.uri.clone())
            }
            Self::Multi {
                source,
                format,
                base_url,
            } => source.segment_url(segment_num, format, base_url),
        }
    }
}
