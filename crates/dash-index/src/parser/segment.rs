//! `SegmentBase`, `SegmentList` and `SegmentTemplate` elements.

use url::Url;

use super::attributes::{next_child, parse_int, parse_range, parse_string, skip_unknown};
use crate::{
    ranged_uri::RangedUri,
    reader::TagCursor,
    segment_base::{
        CommonOverrides, MultiSegmentOverrides, SegmentBase, SegmentListOverrides,
        SegmentTemplateOverrides, SingleSegmentOverrides,
    },
    template::UrlTemplate,
    timeline::TimelineEntry,
    url::ByteRange,
    MpdError, MpdResult,
};

pub(crate) fn is_segment_base(element: &str) -> bool {
    matches!(element, "SegmentBase" | "SegmentList" | "SegmentTemplate")
}

/// Parses the segment base element at the cursor and merges it with `parent`.
///
/// `parent` only contributes when it is of the same kind.
pub(crate) fn parse_segment_base<C: TagCursor>(
    cursor: &mut C,
    element: &str,
    base_url: &Url,
    period_duration_ms: Option<u64>,
    parent: Option<&SegmentBase>,
) -> MpdResult<SegmentBase> {
    let segment_base = match element {
        "SegmentBase" => {
            let overrides = parse_single_segment(cursor, base_url)?;
            SegmentBase::Single(
                overrides.inherit(base_url.clone(), parent.and_then(SegmentBase::as_single)),
            )
        }
        "SegmentList" => {
            let overrides = parse_segment_list(cursor, base_url)?;
            SegmentBase::List(
                overrides.inherit(period_duration_ms, parent.and_then(SegmentBase::as_list))?,
            )
        }
        "SegmentTemplate" => {
            let overrides = parse_segment_template(cursor, base_url)?;
            SegmentBase::Template(
                overrides.inherit(period_duration_ms, parent.and_then(SegmentBase::as_template))?,
            )
        }
        _ => {
            return Err(MpdError::malformed(format!(
                "{element} is not a segment base"
            )))
        }
    };
    Ok(segment_base)
}

fn parse_common_attributes<C: TagCursor>(cursor: &C) -> MpdResult<CommonOverrides> {
    let timescale = parse_int(cursor, "timescale")?;
    if timescale == Some(0) {
        return Err(MpdError::attribute("timescale", "0"));
    }

    Ok(CommonOverrides {
        initialization: None,
        timescale,
        presentation_time_offset: parse_int(cursor, "presentationTimeOffset")?,
    })
}

fn parse_multi_attributes<C: TagCursor>(cursor: &C) -> MpdResult<MultiSegmentOverrides> {
    Ok(MultiSegmentOverrides {
        common: parse_common_attributes(cursor)?,
        start_number: parse_int(cursor, "startNumber")?,
        duration: parse_int(cursor, "duration")?,
        timeline: None,
    })
}

/// `Initialization`, `RepresentationIndex` or `SegmentURL`: a source attribute and a range.
fn parse_ranged_uri<C: TagCursor>(
    cursor: &mut C,
    base_url: &Url,
    source_attribute: &str,
    range_attribute: &str,
) -> MpdResult<RangedUri> {
    let source = cursor.attribute(source_attribute).map(str::to_string);
    let range = parse_range(cursor, range_attribute)?.unwrap_or(ByteRange::FULL);
    cursor.skip_subtree()?;
    RangedUri::new(base_url, source.as_deref(), range)
}

/// Handles the children shared by `SegmentList` and `SegmentTemplate`. Returns `false` for any
/// other child.
fn parse_multi_child<C: TagCursor>(
    cursor: &mut C,
    child: &str,
    base_url: &Url,
    overrides: &mut MultiSegmentOverrides,
) -> MpdResult<bool> {
    match child {
        "Initialization" => {
            overrides.common.initialization =
                Some(parse_ranged_uri(cursor, base_url, "sourceURL", "range")?);
        }
        "SegmentTimeline" => overrides.timeline = Some(parse_segment_timeline(cursor)?),
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_single_segment<C: TagCursor>(
    cursor: &mut C,
    base_url: &Url,
) -> MpdResult<SingleSegmentOverrides> {
    let mut overrides = SingleSegmentOverrides {
        common: parse_common_attributes(cursor)?,
        index_range: parse_range(cursor, "indexRange")?,
    };

    while let Some(child) = next_child(cursor, "SegmentBase")? {
        match child.as_str() {
            "Initialization" => {
                overrides.common.initialization =
                    Some(parse_ranged_uri(cursor, base_url, "sourceURL", "range")?);
            }
            "RepresentationIndex" => {
                if let Some(range) = parse_range(cursor, "range")? {
                    overrides.index_range = Some(range);
                }
                cursor.skip_subtree()?;
            }
            _ => skip_unknown(cursor, "SegmentBase")?,
        }
    }

    Ok(overrides)
}

fn parse_segment_list<C: TagCursor>(
    cursor: &mut C,
    base_url: &Url,
) -> MpdResult<SegmentListOverrides> {
    let mut multi = parse_multi_attributes(cursor)?;
    let mut media_segments: Option<Vec<RangedUri>> = None;

    while let Some(child) = next_child(cursor, "SegmentList")? {
        if child == "SegmentURL" {
            let segment = parse_ranged_uri(cursor, base_url, "media", "mediaRange")?;
            media_segments.get_or_insert_with(Vec::new).push(segment);
        } else if !parse_multi_child(cursor, &child, base_url, &mut multi)? {
            skip_unknown(cursor, "SegmentList")?;
        }
    }

    Ok(SegmentListOverrides {
        multi,
        media_segments,
    })
}

fn parse_segment_template<C: TagCursor>(
    cursor: &mut C,
    base_url: &Url,
) -> MpdResult<SegmentTemplateOverrides> {
    let mut multi = parse_multi_attributes(cursor)?;
    let initialization_template = parse_string(cursor, "initialization").map(UrlTemplate::new);
    let media_template = parse_string(cursor, "media").map(UrlTemplate::new);

    while let Some(child) = next_child(cursor, "SegmentTemplate")? {
        if !parse_multi_child(cursor, &child, base_url, &mut multi)? {
            skip_unknown(cursor, "SegmentTemplate")?;
        }
    }

    Ok(SegmentTemplateOverrides {
        multi,
        initialization_template,
        media_template,
    })
}

fn parse_segment_timeline<C: TagCursor>(cursor: &mut C) -> MpdResult<Vec<TimelineEntry>> {
    let mut entries = Vec::new();

    while let Some(child) = next_child(cursor, "SegmentTimeline")? {
        if child != "S" {
            skip_unknown(cursor, "SegmentTimeline")?;
            continue;
        }

        let duration = parse_int(cursor, "d")?
            .ok_or_else(|| MpdError::malformed("S element without @d"))?;
        entries.push(TimelineEntry {
            time: parse_int(cursor, "t")?,
            duration,
            repeat_count: parse_int(cursor, "r")?.unwrap_or(0),
        });
        cursor.skip_subtree()?;
    }

    Ok(entries)
}
