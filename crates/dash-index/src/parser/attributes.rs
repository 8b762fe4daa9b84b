//! Typed attribute lookups on the current start tag.

use std::str::FromStr;

use url::Url;

use crate::{
    format::FrameRate,
    reader::{EventKind, TagCursor},
    time::{parse_xs_date_time, parse_xs_duration},
    url::{merge_baseurls, parse_byte_range, ByteRange},
    MpdError, MpdResult,
};

const MPEG_AUDIO_CHANNEL_CONFIGURATION: &str =
    "urn:mpeg:dash:23003:3:audio_channel_configuration:2011";
const DOLBY_AUDIO_CHANNEL_CONFIGURATIONS: [&str; 2] = [
    "urn:dolby:dash:audio_channel_configuration:2011",
    "tag:dolby.com,2014:dash:audio_channel_configuration:2011",
];

pub(crate) fn parse_string<C: TagCursor>(cursor: &C, name: &str) -> Option<String> {
    cursor.attribute(name).map(str::to_string)
}

/// Absent yields `None`, present but invalid is an error.
pub(crate) fn parse_int<C, T>(cursor: &C, name: &str) -> MpdResult<Option<T>>
where
    C: TagCursor,
    T: FromStr,
{
    cursor
        .attribute(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| MpdError::attribute(name, value))
        })
        .transpose()
}

/// An `xs:duration` attribute in milliseconds.
pub(crate) fn parse_duration<C: TagCursor>(cursor: &C, name: &str) -> MpdResult<Option<u64>> {
    cursor
        .attribute(name)
        .map(|value| parse_xs_duration(name, value))
        .transpose()
}

/// An `xs:dateTime` attribute in epoch milliseconds.
pub(crate) fn parse_date_time<C: TagCursor>(cursor: &C, name: &str) -> MpdResult<Option<i64>> {
    cursor
        .attribute(name)
        .map(|value| parse_xs_date_time(name, value))
        .transpose()
}

pub(crate) fn parse_range<C: TagCursor>(cursor: &C, name: &str) -> MpdResult<Option<ByteRange>> {
    cursor
        .attribute(name)
        .map(|value| parse_byte_range(name, value))
        .transpose()
}

/// `@frameRate`. Values of an unexpected shape are ignored.
pub(crate) fn parse_frame_rate<C: TagCursor>(cursor: &C) -> Option<FrameRate> {
    cursor.attribute("frameRate").and_then(FrameRate::parse)
}

/// Resolves a `BaseURL` element against `parent`, leaving the cursor on its end tag.
pub(crate) fn parse_base_url<C: TagCursor>(cursor: &mut C, parent: &Url) -> MpdResult<Url> {
    let text = cursor.read_text("BaseURL")?;
    merge_baseurls(parent, &text)
}

/// Channel count of an `AudioChannelConfiguration` element, leaving the cursor on its end tag.
///
/// Unknown schemes yield `None`.
pub(crate) fn parse_audio_channel_configuration<C: TagCursor>(
    cursor: &mut C,
) -> MpdResult<Option<u32>> {
    let scheme = cursor.attribute("schemeIdUri").unwrap_or_default();
    let channels = if scheme == MPEG_AUDIO_CHANNEL_CONFIGURATION {
        parse_int(cursor, "value")?
    } else if DOLBY_AUDIO_CHANNEL_CONFIGURATIONS.contains(&scheme) {
        cursor
            .attribute("value")
            .and_then(|value| match value.trim().to_ascii_uppercase().as_str() {
                "4000" => Some(1),
                "A000" => Some(2),
                "F801" => Some(6),
                "FA01" => Some(8),
                _ => None,
            })
    } else {
        None
    };

    cursor.skip_subtree()?;
    Ok(channels)
}

/// Moves to the next child start tag of `parent` and returns its name, or `None` once the end
/// tag of `parent` is reached.
///
/// Handlers must leave the cursor on the end tag of the child they consumed.
pub(crate) fn next_child<C: TagCursor>(cursor: &mut C, parent: &str) -> MpdResult<Option<String>> {
    loop {
        match cursor.advance()? {
            EventKind::StartTag => return Ok(cursor.name().map(str::to_string)),
            EventKind::EndTag if cursor.is_end_tag(parent) => return Ok(None),
            EventKind::EndDocument => {
                return Err(MpdError::malformed(format!("Unclosed element {parent}")))
            }
            _ => {}
        }
    }
}

/// Skips an element the parser does not handle.
pub(crate) fn skip_unknown<C: TagCursor>(cursor: &mut C, parent: &str) -> MpdResult<()> {
    tracing::trace!(
        element = cursor.name().unwrap_or_default(),
        parent,
        "Skipping element"
    );
    cursor.skip_subtree()
}
