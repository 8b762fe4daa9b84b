use dash_index::{
    representation::RepresentationKind, url::ByteRange, ContentType, FrameRate,
};
use uuid::Uuid;

use crate::{parse_manifest, AssertWrapper};

const MANIFEST_URL: &str = "https://origin.test/manifests/vod.mpd";

#[test]
fn test_vod_template_structure() -> anyhow::Result<()> {
    let manifest = parse_manifest(MANIFEST_URL, include_str!("../fixtures/vod_template.mpd"))?;

    assert!(!manifest.dynamic);
    assert_eq!(manifest.duration_ms, Some(60_500));
    assert_eq!(manifest.min_buffer_time_ms, Some(2_000));
    assert_eq!(manifest.periods.len(), 1);

    let period = &manifest.periods[0];
    assert_eq!(period.id.as_deref(), Some("main"));
    assert_eq!(period.start_ms, 0);
    assert_eq!(period.duration_ms, Some(60_500));
    assert_eq!(manifest.period_duration_ms(0), Some(60_500));

    let video = &period.adaptation_sets[0];
    assert_eq!(video.id, Some(1));
    assert_eq!(video.content_type, ContentType::Video);
    assert_eq!(video.representations.len(), 2);

    let hd = &video.representations[1];
    assert_eq!(hd.format.id.as_deref(), Some("video-1080"));
    assert_eq!(hd.format.bitrate, Some(6_000_000));
    assert_eq!(hd.format.width, Some(1920));
    assert_eq!(hd.format.codecs.as_deref(), Some("avc1.640028"));
    assert_eq!(
        hd.format.frame_rate,
        Some(FrameRate::Rational {
            numerator: 30000,
            denominator: 1001
        })
    );
    assert_eq!(hd.base_url.as_str(), "https://cdn.test/vod/content/hd/");
    assert_eq!(hd.cache_key(), ".video-1080.-1");

    let sd = &video.representations[0];
    assert_eq!(sd.format.codecs.as_deref(), Some("avc1.64001f"));
    assert_eq!(sd.format.mime_type.as_deref(), Some("video/mp4"));

    let audio = &period.adaptation_sets[1];
    assert_eq!(audio.content_type, ContentType::Audio);
    let audio = &audio.representations[0];
    assert_eq!(audio.format.language.as_deref(), Some("en"));
    assert_eq!(audio.format.audio_channels, Some(2));
    assert_eq!(audio.format.audio_sampling_rate, Some(48_000));
    Ok(())
}

#[test]
fn test_vod_template_protections() -> anyhow::Result<()> {
    let manifest = parse_manifest(MANIFEST_URL, include_str!("../fixtures/vod_template.mpd"))?;
    let video = &manifest.periods[0].adaptation_sets[0];

    assert!(video.has_content_protection());
    assert_eq!(video.content_protections.len(), 2);

    let common = &video.content_protections[0];
    assert_eq!(common.scheme_uri_id, "urn:mpeg:dash:mp4protection:2011");
    assert_eq!(common.uuid, None);
    assert_eq!(common.data, None);

    let widevine = &video.content_protections[1];
    assert_eq!(
        widevine.uuid,
        Some(Uuid::parse_str("edef8ba9-79d6-4ace-a3c8-27dcd51d21ed")?)
    );
    let data = widevine.data.as_ref().assert_success();
    assert_eq!(data.len(), 26);
    assert_eq!(&data[..4], &[0x08, 0x01, 0x12, 0x10]);

    assert!(!manifest.periods[0].adaptation_sets[1].has_content_protection());
    Ok(())
}

#[test]
fn test_vod_template_implicit_index() -> anyhow::Result<()> {
    let manifest = parse_manifest(MANIFEST_URL, include_str!("../fixtures/vod_template.mpd"))?;
    let video = &manifest.periods[0].adaptation_sets[0].representations;

    let sd = &video[0];
    assert_eq!(
        sd.initialization_uri.as_ref().assert_success().url.as_str(),
        "https://cdn.test/vod/content/video-720/init.mp4"
    );

    let index = sd.index().assert_success();
    assert!(!index.is_explicit());
    assert_eq!(index.first_segment_num(), 1);
    assert_eq!(index.last_segment_num(), Some(16));
    assert_eq!(index.segment_count(), Some(16));

    for n in 1..16 {
        assert_eq!(index.duration_us(n), Some(4_000_000));
        assert_eq!(index.time_us(n), Some((n as i64 - 1) * 4_000_000));
    }
    // 60.5s period: the last segment only covers the remaining half second.
    assert_eq!(index.time_us(16), Some(60_000_000));
    assert_eq!(index.duration_us(16), Some(500_000));
    index.duration_us(17).assert_error();

    assert_eq!(index.segment_num(0), 1);
    assert_eq!(index.segment_num(13_999_999), 4);
    assert_eq!(index.segment_num(3_600_000_000), 16);

    let segment = index.segment_url(3)?;
    assert_eq!(
        segment.url.as_str(),
        "https://cdn.test/vod/content/video-720/00003.m4s"
    );
    assert_eq!(segment.range, ByteRange::FULL);

    let hd = video[1].index().assert_success();
    assert_eq!(
        hd.segment_url(16)?.url.as_str(),
        "https://cdn.test/vod/content/hd/video-1080/00016.m4s"
    );
    hd.segment_url(17).assert_error();
    Ok(())
}

#[test]
fn test_vod_template_explicit_index() -> anyhow::Result<()> {
    let manifest = parse_manifest(MANIFEST_URL, include_str!("../fixtures/vod_template.mpd"))?;
    let audio = &manifest.periods[0].adaptation_sets[1].representations[0];

    let RepresentationKind::MultiSegment(source) = &audio.segments else {
        panic!("expected a segment template");
    };
    assert_eq!(source.base().common.timescale, 48_000);

    assert_eq!(
        audio.initialization_uri.as_ref().assert_success().url.as_str(),
        "https://cdn.test/vod/content/audio/init.mp4"
    );

    let index = audio.index().assert_success();
    assert!(index.is_explicit());
    assert_eq!(index.last_segment_num(), Some(16));

    for n in 1..=16 {
        let time_us = index.time_us(n).assert_success();
        assert_eq!(index.segment_num(time_us), n);
    }
    assert_eq!(index.duration_us(16), Some(500_000));
    assert_eq!(index.segment_num(30_000_000), 8);
    assert_eq!(index.segment_num(-1), 1);

    assert_eq!(
        index.segment_url(16)?.url.as_str(),
        "https://cdn.test/vod/content/audio/2880000.m4s"
    );
    Ok(())
}
