use dash_index::UtcTiming;

use crate::{parse_manifest, AssertWrapper};

const MANIFEST_URL: &str = "https://live.test/channel/manifest.mpd";

#[test]
fn test_live_manifest_attributes() -> anyhow::Result<()> {
    let manifest = parse_manifest(MANIFEST_URL, include_str!("../fixtures/live_timeline.mpd"))?;

    assert!(manifest.dynamic);
    assert_eq!(manifest.availability_start_time_ms, Some(1_704_067_200_000));
    assert_eq!(manifest.min_update_period_ms, Some(2_000));
    assert_eq!(manifest.time_shift_buffer_depth_ms, Some(30_000));
    assert_eq!(manifest.min_buffer_time_ms, Some(4_000));
    assert_eq!(manifest.duration_ms, None);
    assert_eq!(
        manifest.utc_timing,
        Some(UtcTiming {
            scheme_id_uri: "urn:mpeg:dash:utc:http-xsdate:2014".to_string(),
            value: Some("https://time.test/now".to_string()),
        })
    );

    let period = &manifest.periods[0];
    assert_eq!(period.duration_ms, None);
    manifest.period_duration_ms(0).assert_error();
    Ok(())
}

#[test]
fn test_open_ended_repeat_until_next_time() -> anyhow::Result<()> {
    let manifest = parse_manifest(MANIFEST_URL, include_str!("../fixtures/live_timeline.mpd"))?;
    let representation = &manifest.periods[0].adaptation_sets[0].representations[0];
    assert_eq!(representation.presentation_time_offset_us, 1_000_000_000);

    let index = representation.index().assert_success();
    assert!(index.is_explicit());
    assert_eq!(index.first_segment_num(), 500);
    assert_eq!(index.last_segment_num(), Some(506));

    // Five 2s segments fill the gap up to t=1010000, then two 1s segments.
    let times: Vec<_> = (500..=506).map(|n| index.time_us(n).unwrap()).collect();
    assert_eq!(
        times,
        vec![0, 2_000_000, 4_000_000, 6_000_000, 8_000_000, 10_000_000, 11_000_000]
    );
    assert_eq!(index.duration_us(504), Some(2_000_000));
    assert_eq!(index.duration_us(505), Some(1_000_000));

    assert_eq!(index.segment_num(10_500_000), 505);
    assert_eq!(index.segment_num(60_000_000), 506);

    // The base URL query is carried over to segment URLs.
    assert_eq!(
        index.segment_url(505)?.url.as_str(),
        "https://live.test/channel/v/505.m4s?token=abc"
    );
    Ok(())
}

#[test]
fn test_unbounded_implicit_template() -> anyhow::Result<()> {
    let manifest = parse_manifest(MANIFEST_URL, include_str!("../fixtures/live_timeline.mpd"))?;
    let representation = &manifest.periods[0].adaptation_sets[1].representations[0];

    let index = representation.index().assert_success();
    assert!(!index.is_explicit());
    index.last_segment_num().assert_error();
    index.segment_count().assert_error();

    assert_eq!(index.segment_num(3_600_000_000), 1_801);
    assert_eq!(index.time_us(1_801), Some(3_600_000_000));
    assert_eq!(index.duration_us(1_000_000), Some(2_000_000));
    assert_eq!(
        index.segment_url(1_801)?.url.as_str(),
        "https://live.test/channel/w/1801.m4s?token=abc"
    );
    Ok(())
}
