use serde::Serialize;

use crate::{content_protection::ContentProtection, representation::Representation, MpdError, MpdResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Unknown,
    Video,
    Audio,
    Text,
}

impl ContentType {
    /// From a `@contentType` attribute value.
    pub fn from_content_type(value: &str) -> Self {
        match value {
            "audio" => Self::Audio,
            "video" => Self::Video,
            "text" => Self::Text,
            _ => Self::Unknown,
        }
    }

    pub fn from_mime_type(mime_type: &str) -> Self {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        if mime_type.starts_with("audio/") {
            Self::Audio
        } else if mime_type.starts_with("video/") {
            Self::Video
        } else if mime_type.starts_with("text/") || mime_type == "application/ttml+xml" {
            Self::Text
        } else {
            Self::Unknown
        }
    }

    /// Combines two determinations of the same content type. [`ContentType::Unknown`] never
    /// conflicts.
    pub fn reconcile(self, other: ContentType) -> MpdResult<ContentType> {
        match (self, other) {
            (Self::Unknown, other) => Ok(other),
            (current, Self::Unknown) => Ok(current),
            (current, other) if current == other => Ok(current),
            (existing, found) => Err(MpdError::InconsistentType { existing, found }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptationSet {
    pub id: Option<u32>,
    pub content_type: ContentType,
    pub representations: Vec<Representation>,
    /// Protections shared by every Representation of the set.
    pub content_protections: Vec<ContentProtection>,
}

impl AdaptationSet {
    pub fn has_content_protection(&self) -> bool {
        !self.content_protections.is_empty()
    }
}
