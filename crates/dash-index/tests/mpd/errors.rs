use dash_index::{ContentType, MpdError};

use crate::{parse_manifest, AssertWrapper};

const MANIFEST_URL: &str = "https://errors.test/manifest.mpd";

#[test]
fn test_root_is_not_mpd() {
    let result = parse_manifest(MANIFEST_URL, r#"<?xml version="1.0"?><Playlist/>"#);
    assert!(matches!(result, Err(MpdError::MalformedManifest(_))));
}

#[test]
fn test_truncated_document() {
    let result = parse_manifest(
        MANIFEST_URL,
        r#"<MPD><Period><AdaptationSet mimeType="video/mp4">"#,
    );
    assert!(result.is_err_and(|e| e.is_malformed()));
}

#[test]
fn test_representation_type_conflicts_with_adaptation_set() {
    let xml = r#"<MPD>
      <Period>
        <AdaptationSet mimeType="video/mp4">
          <Representation id="1" mimeType="audio/mp4" bandwidth="64000"/>
        </AdaptationSet>
      </Period>
    </MPD>"#;
    match parse_manifest(MANIFEST_URL, xml) {
        Err(MpdError::InconsistentType { existing, found }) => {
            assert_eq!(existing, ContentType::Video);
            assert_eq!(found, ContentType::Audio);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_content_component_type_conflict() {
    let xml = r#"<MPD>
      <Period>
        <AdaptationSet contentType="text">
          <ContentComponent id="1" contentType="audio"/>
        </AdaptationSet>
      </Period>
    </MPD>"#;
    assert!(matches!(
        parse_manifest(MANIFEST_URL, xml),
        Err(MpdError::InconsistentType { .. })
    ));
}

#[test]
fn test_invalid_attribute_values() {
    let bad_width = r#"<MPD><Period><AdaptationSet>
        <Representation id="1" width="wide"/>
    </AdaptationSet></Period></MPD>"#;
    match parse_manifest(MANIFEST_URL, bad_width) {
        Err(MpdError::AttributeFormat { attribute, value }) => {
            assert_eq!(attribute, "width");
            assert_eq!(value, "wide");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let bad_duration = r#"<MPD mediaPresentationDuration="ten seconds"/>"#;
    assert!(matches!(
        parse_manifest(MANIFEST_URL, bad_duration),
        Err(MpdError::AttributeFormat { .. })
    ));

    // An unparseable frame rate is ignored.
    let manifest = parse_manifest(
        MANIFEST_URL,
        r#"<MPD><Period><AdaptationSet><Representation id="1" frameRate="fast"/></AdaptationSet></Period></MPD>"#,
    )
    .assert_success();
    let representation = &manifest.periods[0].adaptation_sets[0].representations[0];
    assert_eq!(representation.format.frame_rate, None);
}

#[test]
fn test_template_without_duration_or_timeline() {
    let xml = r#"<MPD mediaPresentationDuration="PT10S">
      <Period>
        <AdaptationSet mimeType="video/mp4">
          <SegmentTemplate media="$Number$.m4s"/>
          <Representation id="1" bandwidth="1"/>
        </AdaptationSet>
      </Period>
    </MPD>"#;
    assert!(parse_manifest(MANIFEST_URL, xml).is_err_and(|e| e.is_malformed()));
}

#[test]
fn test_segment_timeline_overflow() {
    let xml = r#"<MPD mediaPresentationDuration="PT10S">
      <Period>
        <AdaptationSet mimeType="video/mp4">
          <SegmentTemplate media="$Time$.m4s">
            <SegmentTimeline>
              <S t="18446744073709551000" d="1000" r="1"/>
            </SegmentTimeline>
          </SegmentTemplate>
          <Representation id="1" bandwidth="1000"/>
        </AdaptationSet>
      </Period>
    </MPD>"#;
    assert!(parse_manifest(MANIFEST_URL, xml).is_err_and(|e| e.is_malformed()));
}

#[test]
fn test_segment_timeline_repeat_limit() {
    let huge_repeat = r#"<MPD mediaPresentationDuration="PT10S">
      <Period>
        <AdaptationSet mimeType="video/mp4">
          <SegmentTemplate media="$Time$.m4s">
            <SegmentTimeline><S t="0" d="1000" r="9223372036854775806"/></SegmentTimeline>
          </SegmentTemplate>
          <Representation id="1" bandwidth="1000"/>
        </AdaptationSet>
      </Period>
    </MPD>"#;
    assert!(parse_manifest(MANIFEST_URL, huge_repeat).is_err_and(|e| e.is_malformed()));

    let open_ended = r#"<MPD mediaPresentationDuration="P365D">
      <Period>
        <AdaptationSet mimeType="video/mp4">
          <SegmentTemplate media="$Time$.m4s" timescale="90000">
            <SegmentTimeline><S t="0" d="1" r="-1"/></SegmentTimeline>
          </SegmentTemplate>
          <Representation id="1" bandwidth="1000"/>
        </AdaptationSet>
      </Period>
    </MPD>"#;
    assert!(parse_manifest(MANIFEST_URL, open_ended).is_err_and(|e| e.is_malformed()));
}
