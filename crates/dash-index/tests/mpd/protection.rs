use dash_index::{ContentProtection, MpdError};
use uuid::Uuid;

use crate::parse_manifest;

const MANIFEST_URL: &str = "https://drm.test/manifest.mpd";

#[test]
fn test_identical_protections_bubble_up_once() -> anyhow::Result<()> {
    let manifest = parse_manifest(
        MANIFEST_URL,
        include_str!("../fixtures/protection_bubbled.mpd"),
    )?;
    let adaptation_set = &manifest.periods[0].adaptation_sets[0];

    assert_eq!(adaptation_set.representations.len(), 2);
    assert_eq!(
        adaptation_set.content_protections,
        vec![ContentProtection::new(
            "urn:x",
            Some(Uuid::from_u64_pair(0, 0xaa)),
            Some(b"key-1".to_vec()),
        )]
    );
    Ok(())
}

#[test]
fn test_one_byte_difference_is_inconsistent() {
    let result = parse_manifest(
        MANIFEST_URL,
        include_str!("../fixtures/protection_mismatch.mpd"),
    );
    match result {
        Err(MpdError::InconsistentContentProtection(scheme)) => assert_eq!(scheme, "urn:x"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_protection_only_on_some_representations() {
    let xml = r#"<MPD mediaPresentationDuration="PT4S">
      <Period>
        <AdaptationSet mimeType="video/mp4">
          <SegmentTemplate duration="2" media="$Number$.m4s"/>
          <Representation id="a" bandwidth="1">
            <ContentProtection schemeIdUri="urn:x"/>
          </Representation>
          <Representation id="b" bandwidth="2"/>
        </AdaptationSet>
      </Period>
    </MPD>"#;
    assert!(matches!(
        parse_manifest(MANIFEST_URL, xml),
        Err(MpdError::InconsistentContentProtection(_))
    ));
}

#[test]
fn test_invalid_protection_elements() {
    let without_scheme = r#"<MPD><Period><AdaptationSet>
        <ContentProtection value="cenc"/>
    </AdaptationSet></Period></MPD>"#;
    assert!(parse_manifest(MANIFEST_URL, without_scheme).is_err_and(|e| e.is_malformed()));

    let bad_pssh = r#"<MPD><Period><AdaptationSet>
        <ContentProtection schemeIdUri="urn:x"><cenc:pssh>AAAA</cenc:pssh></ContentProtection>
    </AdaptationSet></Period></MPD>"#;
    assert!(matches!(
        parse_manifest(MANIFEST_URL, bad_pssh),
        Err(MpdError::AttributeFormat { .. })
    ));
}
