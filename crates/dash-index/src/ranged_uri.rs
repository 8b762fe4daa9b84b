use serde::Serialize;
use url::Url;

use crate::{
    url::{merge_baseurls, ByteRange},
    MpdResult,
};

/// A byte range within a resolved resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangedUri {
    pub url: Url,
    pub range: ByteRange,
}

impl RangedUri {
    /// Resolves `reference` against `base_url`. A missing reference addresses the base itself.
    pub fn new(base_url: &Url, reference: Option<&str>, range: ByteRange) -> MpdResult<Self> {
        let url = match reference {
            Some(reference) => merge_baseurls(base_url, reference)?,
            None => base_url.clone(),
        };
        Ok(Self { url, range })
    }

    pub fn from_url(url: Url, range: ByteRange) -> Self {
        Self { url, range }
    }

    pub fn start(&self) -> u64 {
        self.range.offset
    }

    pub fn length(&self) -> Option<u64> {
        self.range.length
    }

    /// Joins two ranges of the same resource when one ends exactly where the other starts.
    ///
    /// Returns `None` when the resources differ or the ranges are not adjacent.
    pub fn attempt_merge(&self, other: &RangedUri) -> Option<RangedUri> {
        if self.url != other.url {
            return None;
        }

        let joined = |first: &RangedUri, second: &RangedUri| {
            let length = first.range.length?;
            if first.range.offset.checked_add(length)? != second.range.offset {
                return None;
            }
            let merged_length = match second.range.length {
                Some(second) => Some(length.checked_add(second)?),
                None => None,
            };
            Some(RangedUri {
                url: first.url.clone(),
                range: ByteRange {
                    offset: first.range.offset,
                    length: merged_length,
                },
            })
        };

        joined(self, other).or_else(|| joined(other, self))
    }
}
