//! Builds a [`Manifest`] from the events of an MPD document.
//!
//! The base URL and the most specific segment base seen so far are threaded down from `MPD`
//! through `Period` and `AdaptationSet` to each `Representation`.

mod attributes;
mod segment;

use std::io::BufRead;

use serde::Deserialize;
use url::Url;

use self::{
    attributes::{
        next_child, parse_audio_channel_configuration, parse_base_url, parse_date_time,
        parse_duration, parse_frame_rate, parse_int, parse_string, skip_unknown,
    },
    segment::{is_segment_base, parse_segment_base},
};
use crate::{
    adaptation_set::{AdaptationSet, ContentType},
    content_protection::{
        add_representation_protection, parse_pssh, ContentProtection, ContentProtectionsBuilder,
    },
    format::{Format, FrameRate},
    manifest::{Manifest, Period, UtcTiming},
    reader::{EventKind, TagCursor, XmlCursor},
    representation::{Representation, RepresentationContext},
    segment_base::{SegmentBase, SingleSegmentBase},
    MpdError, MpdResult,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Identifies the content in [`Representation::cache_key`].
    pub content_id: Option<String>,
    pub revision_id: i64,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            content_id: None,
            revision_id: -1,
        }
    }
}

/// Values an `AdaptationSet` provides to the Representations that do not declare their own.
#[derive(Debug, Clone, Default)]
struct FormatDefaults {
    mime_type: Option<String>,
    codecs: Option<String>,
    language: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    frame_rate: Option<FrameRate>,
    audio_sampling_rate: Option<u32>,
    audio_channels: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
struct PeriodContext {
    start_ms: u64,
    duration_ms: Option<u64>,
}

pub struct MpdParser {
    options: ParserOptions,
}

impl MpdParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parses a manifest fetched from `base_url`.
    pub fn parse(&self, base_url: &Url, xml: &str) -> MpdResult<Manifest> {
        self.parse_reader(base_url, xml.as_bytes())
    }

    pub fn parse_reader<R: BufRead>(&self, base_url: &Url, reader: R) -> MpdResult<Manifest> {
        let mut cursor = XmlCursor::new(reader);
        self.parse_cursor(base_url, &mut cursor)
    }

    /// Parses from a cursor positioned before the root element.
    pub fn parse_cursor<C: TagCursor>(&self, base_url: &Url, cursor: &mut C) -> MpdResult<Manifest> {
        loop {
            match cursor.advance()? {
                EventKind::StartTag => break,
                EventKind::EndDocument => return Err(MpdError::malformed("Empty document")),
                _ => {}
            }
        }

        if !cursor.is_start_tag("MPD") {
            return Err(MpdError::malformed(format!(
                "Root element is {}, expected MPD",
                cursor.name().unwrap_or_default()
            )));
        }
        self.parse_mpd(cursor, base_url)
    }

    fn parse_mpd<C: TagCursor>(&self, cursor: &mut C, base_url: &Url) -> MpdResult<Manifest> {
        let dynamic = cursor.attribute("type") == Some("dynamic");
        let availability_start_time_ms = parse_date_time(cursor, "availabilityStartTime")?;
        let duration_ms = parse_duration(cursor, "mediaPresentationDuration")?;
        let min_buffer_time_ms = parse_duration(cursor, "minBufferTime")?;
        let (min_update_period_ms, time_shift_buffer_depth_ms) = if dynamic {
            (
                parse_duration(cursor, "minimumUpdatePeriod")?,
                parse_duration(cursor, "timeShiftBufferDepth")?,
            )
        } else {
            (None, None)
        };

        let mut base_url = base_url.clone();
        let mut utc_timing = None;
        let mut periods = Vec::new();

        while let Some(child) = next_child(cursor, "MPD")? {
            match child.as_str() {
                "BaseURL" => base_url = parse_base_url(cursor, &base_url)?,
                "UTCTiming" => utc_timing = Some(parse_utc_timing(cursor)?),
                "Period" => periods.push(self.parse_period(cursor, &base_url, duration_ms)?),
                _ => skip_unknown(cursor, "MPD")?,
            }
        }

        tracing::debug!(
            dynamic,
            duration_ms = ?duration_ms,
            periods = periods.len(),
            "Parsed manifest"
        );

        Ok(Manifest {
            availability_start_time_ms,
            duration_ms,
            min_buffer_time_ms,
            dynamic,
            min_update_period_ms,
            time_shift_buffer_depth_ms,
            utc_timing,
            periods,
        })
    }

    fn parse_period<C: TagCursor>(
        &self,
        cursor: &mut C,
        base_url: &Url,
        presentation_duration_ms: Option<u64>,
    ) -> MpdResult<Period> {
        let id = parse_string(cursor, "id");
        let context = PeriodContext {
            start_ms: parse_duration(cursor, "start")?.unwrap_or(0),
            duration_ms: parse_duration(cursor, "duration")?.or(presentation_duration_ms),
        };

        let mut base_url = base_url.clone();
        let mut segment_base = None;
        let mut adaptation_sets = Vec::new();

        while let Some(child) = next_child(cursor, "Period")? {
            match child.as_str() {
                "BaseURL" => base_url = parse_base_url(cursor, &base_url)?,
                "AdaptationSet" => adaptation_sets.push(self.parse_adaptation_set(
                    cursor,
                    context,
                    &base_url,
                    segment_base.as_ref(),
                )?),
                element if is_segment_base(element) => {
                    segment_base = Some(parse_segment_base(
                        cursor,
                        element,
                        &base_url,
                        context.duration_ms,
                        segment_base.as_ref(),
                    )?);
                }
                _ => skip_unknown(cursor, "Period")?,
            }
        }

        tracing::debug!(
            id = ?id,
            start_ms = context.start_ms,
            duration_ms = ?context.duration_ms,
            adaptation_sets = adaptation_sets.len(),
            "Parsed period"
        );

        Ok(Period {
            id,
            start_ms: context.start_ms,
            duration_ms: context.duration_ms,
            adaptation_sets,
        })
    }

    fn parse_adaptation_set<C: TagCursor>(
        &self,
        cursor: &mut C,
        period: PeriodContext,
        base_url: &Url,
        parent_segment_base: Option<&SegmentBase>,
    ) -> MpdResult<AdaptationSet> {
        let mut id = parse_int(cursor, "id")?;
        let mut content_type = cursor
            .attribute("contentType")
            .map(ContentType::from_content_type)
            .unwrap_or_default();
        let mut defaults = FormatDefaults {
            mime_type: parse_string(cursor, "mimeType"),
            codecs: parse_string(cursor, "codecs"),
            language: parse_string(cursor, "lang"),
            width: parse_int(cursor, "width")?,
            height: parse_int(cursor, "height")?,
            frame_rate: parse_frame_rate(cursor),
            audio_sampling_rate: parse_int(cursor, "audioSamplingRate")?,
            audio_channels: None,
        };
        if let Some(mime_type) = &defaults.mime_type {
            content_type = content_type.reconcile(ContentType::from_mime_type(mime_type))?;
        }

        let mut base_url = base_url.clone();
        let mut segment_base = parent_segment_base.cloned();
        let mut protections = ContentProtectionsBuilder::new();
        let mut representations = Vec::new();

        while let Some(child) = next_child(cursor, "AdaptationSet")? {
            match child.as_str() {
                "BaseURL" => base_url = parse_base_url(cursor, &base_url)?,
                "ContentProtection" => {
                    protections =
                        protections.add_adaptation_set_protection(parse_content_protection(cursor)?)?;
                }
                "ContentComponent" => {
                    if let Some(component_id) = parse_int(cursor, "id")? {
                        id = Some(component_id);
                    }
                    if let Some(value) = cursor.attribute("contentType") {
                        content_type =
                            content_type.reconcile(ContentType::from_content_type(value))?;
                    }
                    cursor.skip_subtree()?;
                }
                "AudioChannelConfiguration" => {
                    defaults.audio_channels = parse_audio_channel_configuration(cursor)?;
                }
                "Representation" => {
                    let (representation, representation_protections) = self.parse_representation(
                        cursor,
                        period,
                        &base_url,
                        segment_base.as_ref(),
                        &defaults,
                    )?;
                    if let Some(mime_type) = &representation.format.mime_type {
                        content_type =
                            content_type.reconcile(ContentType::from_mime_type(mime_type))?;
                    }
                    protections = protections.end_representation(representation_protections)?;
                    representations.push(representation);
                }
                element if is_segment_base(element) => {
                    segment_base = Some(parse_segment_base(
                        cursor,
                        element,
                        &base_url,
                        period.duration_ms,
                        segment_base.as_ref(),
                    )?);
                }
                _ => skip_unknown(cursor, "AdaptationSet")?,
            }
        }

        let content_protections = protections.build()?;
        tracing::debug!(
            id = ?id,
            ?content_type,
            representations = representations.len(),
            protections = content_protections.len(),
            "Parsed adaptation set"
        );

        Ok(AdaptationSet {
            id,
            content_type,
            representations,
            content_protections,
        })
    }

    /// Returns the representation together with the protections it declares itself.
    fn parse_representation<C: TagCursor>(
        &self,
        cursor: &mut C,
        period: PeriodContext,
        base_url: &Url,
        parent_segment_base: Option<&SegmentBase>,
        defaults: &FormatDefaults,
    ) -> MpdResult<(Representation, Vec<ContentProtection>)> {
        let mut format = Format {
            id: parse_string(cursor, "id"),
            mime_type: parse_string(cursor, "mimeType").or_else(|| defaults.mime_type.clone()),
            width: parse_int(cursor, "width")?.or(defaults.width),
            height: parse_int(cursor, "height")?.or(defaults.height),
            frame_rate: parse_frame_rate(cursor).or(defaults.frame_rate),
            audio_channels: defaults.audio_channels,
            audio_sampling_rate: parse_int(cursor, "audioSamplingRate")?
                .or(defaults.audio_sampling_rate),
            bitrate: parse_int(cursor, "bandwidth")?,
            language: parse_string(cursor, "lang").or_else(|| defaults.language.clone()),
            codecs: parse_string(cursor, "codecs").or_else(|| defaults.codecs.clone()),
        };

        let mut base_url = base_url.clone();
        let mut segment_base = parent_segment_base.cloned();
        let mut protections = Vec::new();

        while let Some(child) = next_child(cursor, "Representation")? {
            match child.as_str() {
                "BaseURL" => base_url = parse_base_url(cursor, &base_url)?,
                "AudioChannelConfiguration" => {
                    if let Some(channels) = parse_audio_channel_configuration(cursor)? {
                        format.audio_channels = Some(channels);
                    }
                }
                "ContentProtection" => {
                    add_representation_protection(
                        &mut protections,
                        parse_content_protection(cursor)?,
                    )?;
                }
                element if is_segment_base(element) => {
                    segment_base = Some(parse_segment_base(
                        cursor,
                        element,
                        &base_url,
                        period.duration_ms,
                        segment_base.as_ref(),
                    )?);
                }
                _ => skip_unknown(cursor, "Representation")?,
            }
        }

        let segment_base = segment_base
            .unwrap_or_else(|| SegmentBase::Single(SingleSegmentBase::new(base_url.clone())));
        let context = RepresentationContext {
            content_id: self.options.content_id.as_deref(),
            revision_id: self.options.revision_id,
            period_start_ms: period.start_ms,
            period_duration_ms: period.duration_ms,
        };
        let representation = Representation::new(&context, format, base_url, segment_base)?;

        tracing::trace!(
            id = ?representation.format.id,
            bitrate = ?representation.format.bitrate,
            "Parsed representation"
        );
        Ok((representation, protections))
    }
}

fn parse_utc_timing<C: TagCursor>(cursor: &mut C) -> MpdResult<UtcTiming> {
    let scheme_id_uri = parse_string(cursor, "schemeIdUri")
        .ok_or_else(|| MpdError::malformed("UTCTiming without @schemeIdUri"))?;
    let value = parse_string(cursor, "value");
    cursor.skip_subtree()?;
    Ok(UtcTiming {
        scheme_id_uri,
        value,
    })
}

fn parse_content_protection<C: TagCursor>(cursor: &mut C) -> MpdResult<ContentProtection> {
    let scheme_uri_id = parse_string(cursor, "schemeIdUri")
        .ok_or_else(|| MpdError::malformed("ContentProtection without @schemeIdUri"))?;

    let mut pssh = None;
    while let Some(child) = next_child(cursor, "ContentProtection")? {
        if child == "cenc:pssh" {
            let text = cursor.read_text("cenc:pssh")?;
            pssh = Some(parse_pssh(&text)?);
        } else {
            cursor.skip_subtree()?;
        }
    }

    let (uuid, data) = match pssh {
        Some((uuid, data)) => (Some(uuid), Some(data)),
        None => (None, None),
    };
    Ok(ContentProtection::new(scheme_uri_id, uuid, data))
}
