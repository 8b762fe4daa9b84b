mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dash_index::{
    url::ByteRange, Manifest, MpdParser, Representation, RepresentationKind, SegmentIndex,
};
use serde::Serialize;
use url::Url;

use crate::config::Config;

#[derive(Parser, Debug, Clone)]
#[clap(version, author)]
/// Prints the segment index of an MPEG-DASH manifest.
pub struct MpdInspectArgs {
    /// The manifest file to read.
    pub manifest: PathBuf,

    /// URL the manifest was fetched from, used to resolve relative segment URLs.
    /// Defaults to the location of the manifest file.
    #[clap(long, env = "MPD_BASE_URL")]
    pub base_url: Option<Url>,

    /// Content identifier used in representation cache keys.
    #[clap(long, env = "MPD_CONTENT_ID")]
    pub content_id: Option<String>,

    /// Revision of the content used in representation cache keys.
    #[clap(long, allow_hyphen_values = true)]
    pub revision_id: Option<i64>,

    /// TOML file with default values for the options above.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Locate the segment covering this media time of each representation, in seconds.
    #[clap(long)]
    pub time: Option<f64>,

    /// Print JSON instead of a summary.
    #[clap(long)]
    pub json: bool,

    /// Debug output
    #[clap(long, alias = "debug")]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
struct SegmentLookup {
    representation: String,
    segment_num: u64,
    time_us: Option<i64>,
    duration_us: Option<i64>,
    url: Url,
    range: ByteRange,
}

fn main() -> anyhow::Result<()> {
    let args = MpdInspectArgs::parse();

    let default_level = if args.verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(file) => Config::load(file)
            .with_context(|| format!("Failed to load config from {}", file.display()))?,
        None => Config::default(),
    };
    if let Some(content_id) = args.content_id.clone() {
        config.parser.content_id = Some(content_id);
    }
    if let Some(revision_id) = args.revision_id {
        config.parser.revision_id = revision_id;
    }

    let base_url = match args.base_url.clone().or(config.base_url.take()) {
        Some(base_url) => base_url,
        None => {
            let path = std::fs::canonicalize(&args.manifest)?;
            Url::from_file_path(&path)
                .map_err(|_| anyhow::anyhow!("Cannot convert {} to a URL", path.display()))?
        }
    };
    tracing::debug!(%base_url, options = ?config.parser, "Parsing manifest");

    let xml = std::fs::read_to_string(&args.manifest)
        .with_context(|| format!("Failed to read {}", args.manifest.display()))?;
    let manifest = MpdParser::new(config.parser).parse(&base_url, &xml)?;

    match args.time {
        Some(seconds) => {
            let lookups = lookup_segments(&manifest, (seconds * 1_000_000.0) as i64)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&lookups)?);
            } else {
                for lookup in lookups {
                    println!(
                        "{}: #{} {} {}",
                        lookup.representation,
                        lookup.segment_num,
                        lookup.url,
                        format_range(&lookup.range)
                    );
                }
            }
        }
        None if args.json => println!("{}", serde_json::to_string_pretty(&manifest)?),
        None => print_summary(&manifest),
    }

    Ok(())
}

fn representation_name(representation: &Representation) -> String {
    representation
        .format
        .id
        .clone()
        .unwrap_or_else(|| representation.cache_key())
}

fn lookup_segments(manifest: &Manifest, time_us: i64) -> anyhow::Result<Vec<SegmentLookup>> {
    let mut lookups = Vec::new();
    for adaptation_set in manifest.adaptation_sets() {
        for representation in &adaptation_set.representations {
            let Some(index) = representation.index() else {
                tracing::warn!(
                    representation = %representation_name(representation),
                    "Segment index is stored in the media, skipping"
                );
                continue;
            };

            let segment_num = index.segment_num(time_us);
            let segment = index.segment_url(segment_num)?;
            lookups.push(SegmentLookup {
                representation: representation_name(representation),
                segment_num,
                time_us: index.time_us(segment_num),
                duration_us: index.duration_us(segment_num),
                url: segment.url,
                range: segment.range,
            });
        }
    }
    Ok(lookups)
}

fn format_range(range: &ByteRange) -> String {
    match (range.offset, range.last_byte()) {
        (0, None) => String::new(),
        (offset, Some(last)) => format!("bytes={offset}-{last}"),
        (offset, None) => format!("bytes={offset}-"),
    }
}

fn describe_index(index: Option<SegmentIndex>) -> String {
    let Some(index) = index else {
        return "indexed in media".to_string();
    };
    let kind = if index.is_explicit() {
        "explicit"
    } else {
        "implicit"
    };
    match index.segment_count() {
        Some(count) => format!(
            "{count} {kind} segments from #{}",
            index.first_segment_num()
        ),
        None => format!(
            "unbounded {kind} segments from #{}",
            index.first_segment_num()
        ),
    }
}

/// Byte range holding both the initialization and the `sidx` box, when they are adjacent.
fn header_range(representation: &Representation) -> Option<ByteRange> {
    let RepresentationKind::SingleSegment(single) = &representation.segments else {
        return None;
    };
    let initialization = representation.initialization_uri.as_ref()?;
    let index = single.index_uri.as_ref()?;
    initialization.attempt_merge(index).map(|merged| merged.range)
}

fn print_summary(manifest: &Manifest) {
    println!(
        "{} manifest, duration: {}",
        if manifest.dynamic { "Dynamic" } else { "Static" },
        manifest
            .duration_ms
            .map_or_else(|| "unknown".to_string(), |ms| format!("{ms}ms"))
    );

    for (period_index, period) in manifest.periods.iter().enumerate() {
        println!(
            "Period {} start={}ms duration={}",
            period.id.as_deref().unwrap_or("-"),
            period.start_ms,
            manifest
                .period_duration_ms(period_index)
                .map_or_else(|| "unknown".to_string(), |ms| format!("{ms}ms"))
        );

        for adaptation_set in &period.adaptation_sets {
            println!(
                "  AdaptationSet {} ({:?})",
                adaptation_set
                    .id
                    .map_or_else(|| "-".to_string(), |id| id.to_string()),
                adaptation_set.content_type
            );
            for protection in &adaptation_set.content_protections {
                println!(
                    "    protection {}{}",
                    protection.scheme_uri_id,
                    protection
                        .uuid
                        .map(|uuid| format!(" system={uuid}"))
                        .unwrap_or_default()
                );
            }

            for representation in &adaptation_set.representations {
                let kind = match &representation.segments {
                    RepresentationKind::SingleSegment(_) => "single",
                    RepresentationKind::MultiSegment(_) => "multi",
                };
                println!(
                    "    Representation {} {}bps {} [{kind}] {}",
                    representation_name(representation),
                    representation.format.bitrate.unwrap_or_default(),
                    representation.format.codecs.as_deref().unwrap_or("-"),
                    describe_index(representation.index())
                );
                if let Some(header) = header_range(representation) {
                    println!("      header {}", format_range(&header));
                }
            }
        }
    }
}
