use thiserror::Error;

use crate::adaptation_set::ContentType;

#[derive(Error, Debug)]
pub enum MpdError {
    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("Inconsistent adaptation set type: {existing:?} conflicts with {found:?}")]
    InconsistentType {
        existing: ContentType,
        found: ContentType,
    },

    #[error("Inconsistent content protection for scheme {0}")]
    InconsistentContentProtection(String),

    #[error("Invalid value {value:?} for attribute {attribute}")]
    AttributeFormat { attribute: String, value: String },

    #[error("Segment {0} is out of range")]
    SegmentOutOfRange(u64),

    #[error(transparent)]
    XmlError(#[from] quick_xml::Error),

    #[error(transparent)]
    XmlAttrError(#[from] quick_xml::events::attributes::AttrError),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),
}

impl MpdError {
    pub(crate) fn malformed<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::MalformedManifest(message.into())
    }

    pub(crate) fn attribute<A, V>(attribute: A, value: V) -> Self
    where
        A: Into<String>,
        V: Into<String>,
    {
        Self::AttributeFormat {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Whether the document itself could not be read as a manifest, including
    /// tokenizer and URL errors.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedManifest(_)
                | Self::XmlError(_)
                | Self::XmlAttrError(_)
                | Self::UrlParseError(_)
        )
    }
}

pub type MpdResult<T> = Result<T, MpdError>;
