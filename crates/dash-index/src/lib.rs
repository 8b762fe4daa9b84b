//! Parses MPEG-DASH Media Presentation Descriptions into a queryable segment index.
//!
//! ```text
//! MPD ─► Period ─► AdaptationSet ─► Representation ─► SegmentIndex
//!                                        │
//!                      SegmentBase / SegmentList / SegmentTemplate
//! ```
//!
//! [`MpdParser`] resolves base URLs and segment base inheritance while walking the document,
//! so every [`Representation`] carries everything needed to map media time to segment numbers
//! and segment numbers to byte ranges.

pub mod adaptation_set;
pub mod content_protection;
pub mod error;
pub mod format;
pub mod index;
pub mod manifest;
pub mod parser;
pub mod ranged_uri;
pub mod reader;
pub mod representation;
pub mod segment_base;
pub mod template;
pub mod time;
pub mod timeline;
pub mod url;

pub use adaptation_set::{AdaptationSet, ContentType};
pub use content_protection::ContentProtection;
pub use error::{MpdError, MpdResult};
pub use format::{Format, FrameRate};
pub use manifest::{Manifest, Period, UtcTiming};
pub use parser::{MpdParser, ParserOptions};
pub use ranged_uri::RangedUri;
pub use representation::{Representation, RepresentationKind, SegmentIndex};
pub use segment_base::SegmentBase;
