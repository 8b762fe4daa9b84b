use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static FRAME_RATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:/(\d+))?$").unwrap());

/// `@frameRate`, either a whole number or a fraction such as `30000/1001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FrameRate {
    Integer(u32),
    Rational { numerator: u32, denominator: u32 },
}

impl FrameRate {
    /// Returns `None` for values that are neither `N` nor `N/D`.
    pub fn parse(value: &str) -> Option<Self> {
        let caps = FRAME_RATE_REGEX.captures(value.trim())?;
        let numerator = caps[1].parse().ok()?;
        match caps.get(2) {
            Some(denominator) => {
                let denominator = denominator.as_str().parse().ok()?;
                (denominator != 0).then_some(Self::Rational {
                    numerator,
                    denominator,
                })
            }
            None => Some(Self::Integer(numerator)),
        }
    }

    pub fn as_f32(&self) -> f32 {
        match *self {
            Self::Integer(rate) => rate as f32,
            Self::Rational {
                numerator,
                denominator,
            } => numerator as f32 / denominator as f32,
        }
    }
}

/// Properties of one Representation. Fields the manifest does not declare are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Format {
    /// `Representation@id`
    pub id: Option<String>,
    pub mime_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<FrameRate>,
    pub audio_channels: Option<u32>,
    pub audio_sampling_rate: Option<u32>,
    /// `@bandwidth`, in bits per second.
    pub bitrate: Option<u64>,
    pub language: Option<String>,
    pub codecs: Option<String>,
}
