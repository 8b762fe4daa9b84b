use dash_index::{representation::RepresentationKind, url::ByteRange, ContentType};

use crate::{parse_manifest, AssertWrapper};

const MANIFEST_URL: &str = "https://media.test/ondemand/manifest.mpd";

#[test]
fn test_single_segment_with_index_range() -> anyhow::Result<()> {
    let manifest = parse_manifest(MANIFEST_URL, include_str!("../fixtures/on_demand.mpd"))?;
    let video = &manifest.periods[0].adaptation_sets[0];
    assert_eq!(video.content_type, ContentType::Video);

    let representation = &video.representations[0];
    assert_eq!(representation.format.width, Some(640));
    assert_eq!(
        representation.base_url.as_str(),
        "https://media.test/ondemand/video-800k.webm"
    );

    let initialization = representation.initialization_uri.as_ref().assert_success();
    assert_eq!(initialization.url, representation.base_url);
    assert_eq!(initialization.range, ByteRange::new(0, Some(4452)));

    let RepresentationKind::SingleSegment(single) = &representation.segments else {
        panic!("expected a single segment representation");
    };
    let index_uri = single.index_uri.as_ref().assert_success();
    assert_eq!(index_uri.url, representation.base_url);
    assert_eq!(index_uri.start(), 4452);
    assert_eq!(index_uri.length(), Some(468));

    // The index has to be loaded from the media.
    representation.index().assert_error();
    Ok(())
}

#[test]
fn test_single_segment_without_index() -> anyhow::Result<()> {
    let manifest = parse_manifest(MANIFEST_URL, include_str!("../fixtures/on_demand.mpd"))?;
    let representation = &manifest.periods[0].adaptation_sets[0].representations[1];
    assert_eq!(representation.initialization_uri, None);

    let index = representation.index().assert_success();
    assert_eq!(index.first_segment_num(), 0);
    assert_eq!(index.last_segment_num(), Some(0));
    assert_eq!(index.segment_num(29_000_000), 0);
    assert_eq!(index.time_us(0), Some(0));
    assert_eq!(index.duration_us(0), Some(30_000_000));

    let segment = index.segment_url(0)?;
    assert_eq!(
        segment.url.as_str(),
        "https://media.test/ondemand/video-400k.webm"
    );
    assert_eq!(segment.range, ByteRange::FULL);
    Ok(())
}

#[test]
fn test_segment_list_media_ranges() -> anyhow::Result<()> {
    let manifest = parse_manifest(MANIFEST_URL, include_str!("../fixtures/on_demand.mpd"))?;
    let audio = &manifest.periods[0].adaptation_sets[1];
    assert_eq!(audio.id, Some(7));
    assert_eq!(audio.content_type, ContentType::Audio);

    let representation = &audio.representations[0];
    let initialization = representation.initialization_uri.as_ref().assert_success();
    assert_eq!(
        initialization.url.as_str(),
        "https://media.test/ondemand/audio.mp4"
    );
    assert_eq!(initialization.range, ByteRange::new(0, Some(100)));

    let index = representation.index().assert_success();
    assert!(index.is_explicit());
    assert_eq!(index.first_segment_num(), 1);
    assert_eq!(index.last_segment_num(), Some(3));

    let first = index.segment_url(1)?;
    assert_eq!(first.url.as_str(), "https://media.test/ondemand/audio.mp4");
    assert_eq!(first.start(), 100);
    assert_eq!(first.length(), Some(100));

    let second = index.segment_url(2)?;
    assert_eq!(
        first.attempt_merge(&second).assert_success().range,
        ByteRange::new(100, Some(200))
    );

    let last = index.segment_url(3)?;
    assert_eq!(last.range, ByteRange::new(300, None));
    index.segment_url(4).assert_error();

    assert_eq!(index.segment_num(25_000_000), 3);
    assert_eq!(index.duration_us(3), Some(10_000_000));
    Ok(())
}
