use std::path::Path;

use dash_index::ParserOptions;
use serde::Deserialize;
use url::Url;

/// Optional settings file, e.g.
///
/// ```toml
/// base_url = "https://cdn.example.com/vod/manifest.mpd"
/// content_id = "movie"
/// revision_id = 3
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub base_url: Option<Url>,
    #[serde(flatten)]
    pub parser: ParserOptions,
}

impl Config {
    pub fn load(file: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(file)?;
        let config = toml::from_str(&data)?;
        Ok(config)
    }
}
