use serde::Serialize;
use url::Url;

use crate::{MpdError, MpdResult};

pub(crate) fn is_absolute_url(s: &str) -> bool {
    s.starts_with("http://")
        || s.starts_with("https://")
        || s.starts_with("file://")
        || s.starts_with("ftp://")
}

/// Resolves `new` against `current`.
///
/// A relative reference keeps the query of `current` unless it carries its own:
///
/// merge_baseurls(https://example.com/manifest.mpd?auth=secret, /video42.mp4) =>
///   https://example.com/video42.mp4?auth=secret
///
/// merge_baseurls(https://example.com/manifest.mpd?auth=old, /video42.mp4?auth=new) =>
///   https://example.com/video42.mp4?auth=new
pub fn merge_baseurls(current: &Url, new: &str) -> MpdResult<Url> {
    let new = new.trim();
    if is_absolute_url(new) {
        Ok(Url::parse(new)?)
    } else {
        let mut merged = current.join(new)?;
        if merged.query().is_none() {
            merged.set_query(current.query());
        }
        Ok(merged)
    }
}

/// A contiguous range of bytes. `length` is `None` when the range runs to the
/// end of the resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub offset: u64,
    pub length: Option<u64>,
}

impl ByteRange {
    /// The whole resource.
    pub const FULL: ByteRange = ByteRange {
        offset: 0,
        length: None,
    };

    pub fn new(offset: u64, length: Option<u64>) -> Self {
        Self { offset, length }
    }

    /// Offset of the last byte, if the range is bounded.
    pub fn last_byte(&self) -> Option<u64> {
        self.length
            .filter(|length| *length > 0)
            .and_then(|length| self.offset.checked_add(length - 1))
    }
}

/// The byte range shall be expressed and formatted as a byte-range-spec as defined in
/// IETF RFC 7233:2014, subclause 2.1. It is restricted to a single expression identifying
/// a contiguous range of bytes.
pub(crate) fn parse_byte_range(attribute: &str, s: &str) -> MpdResult<ByteRange> {
    let invalid = || MpdError::attribute(attribute, s);

    let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
    let first_byte_pos = start.trim().parse::<u64>().map_err(|_| invalid())?;

    let end = end.trim();
    let length = if end.is_empty() {
        None
    } else {
        let last_byte_pos = end.parse::<u64>().map_err(|_| invalid())?;
        if last_byte_pos < first_byte_pos {
            return Err(invalid());
        }
        // 0-500 means 501 bytes
        Some((last_byte_pos - first_byte_pos).checked_add(1).ok_or_else(invalid)?)
    };

    Ok(ByteRange {
        offset: first_byte_pos,
        length,
    })
}
