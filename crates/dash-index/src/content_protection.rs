use std::{
    io::{Cursor, Read},
    sync::LazyLock,
};

use base64::{
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;
use uuid::Uuid;

use crate::{MpdError, MpdResult};

static ENGINE: LazyLock<GeneralPurpose> = LazyLock::new(|| {
    GeneralPurpose::new(
        &base64::alphabet::STANDARD,
        GeneralPurposeConfig::new()
            .with_decode_padding_mode(DecodePaddingMode::Indifferent)
            .with_decode_allow_trailing_bits(true),
    )
});

/// A `ContentProtection` descriptor.
///
/// Two descriptors are equal when scheme, UUID and payload all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContentProtection {
    /// `@schemeIdUri`, identifies the protection scheme.
    pub scheme_uri_id: String,
    /// System id read from `cenc:pssh`.
    pub uuid: Option<Uuid>,
    /// Scheme specific data read from `cenc:pssh`.
    pub data: Option<Vec<u8>>,
}

impl ContentProtection {
    pub fn new(scheme_uri_id: impl Into<String>, uuid: Option<Uuid>, data: Option<Vec<u8>>) -> Self {
        Self {
            scheme_uri_id: scheme_uri_id.into(),
            uuid,
            data,
        }
    }
}

/// Decodes the base64 text of a `cenc:pssh` element into its system id and payload.
///
/// The atom is read as: 4 bytes size, 4 bytes type, 4 bytes version and flags, 16 bytes
/// system id, 4 bytes payload size, then the payload.
pub fn parse_pssh(text: &str) -> MpdResult<(Uuid, Vec<u8>)> {
    let invalid = || MpdError::attribute("cenc:pssh", text);

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let atom = ENGINE.decode(compact).map_err(|_| invalid())?;

    let mut reader = Cursor::new(atom.as_slice());
    reader.set_position(12);
    let most_significant = reader.read_u64::<BigEndian>().map_err(|_| invalid())?;
    let least_significant = reader.read_u64::<BigEndian>().map_err(|_| invalid())?;
    let data_size = reader.read_u32::<BigEndian>().map_err(|_| invalid())?;

    if data_size as u64 > atom.len() as u64 - reader.position() {
        return Err(invalid());
    }
    let mut data = vec![0u8; data_size as usize];
    reader.read_exact(&mut data).map_err(|_| invalid())?;

    Ok((
        Uuid::from_u64_pair(most_significant, least_significant),
        data,
    ))
}

/// Reference set of protections shared by every Representation of an AdaptationSet.
#[derive(Debug, Clone, Default, PartialEq)]
enum RepresentationProtections {
    /// No Representation has ended yet.
    #[default]
    Unset,
    Set(Vec<ContentProtection>),
}

/// Collects the `ContentProtection` elements of an AdaptationSet and its Representations into
/// one consistent list.
///
/// The builder is threaded by value through the AdaptationSet parse:
/// [`Self::add_adaptation_set_protection`] for every AdaptationSet level element,
/// [`Self::end_representation`] after each Representation, then [`Self::build`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentProtectionsBuilder {
    adaptation_set: Vec<ContentProtection>,
    representations: RepresentationProtections,
}

impl ContentProtectionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_adaptation_set_protection(
        mut self,
        protection: ContentProtection,
    ) -> MpdResult<Self> {
        maybe_add_content_protection(&mut self.adaptation_set, protection)?;
        Ok(self)
    }

    /// Records the protections of one finished Representation, as collected by
    /// [`add_representation_protection`].
    ///
    /// Every Representation must declare the same set as the first one.
    pub fn end_representation(mut self, mut protections: Vec<ContentProtection>) -> MpdResult<Self> {
        protections.sort_by(|a, b| a.scheme_uri_id.cmp(&b.scheme_uri_id));

        match &self.representations {
            RepresentationProtections::Unset => {
                self.representations = RepresentationProtections::Set(protections);
            }
            RepresentationProtections::Set(expected) => {
                if *expected != protections {
                    let scheme = first_difference(expected, &protections);
                    return Err(MpdError::InconsistentContentProtection(scheme));
                }
            }
        }

        Ok(self)
    }

    /// Returns the final list, bubbling the Representation level protections up.
    pub fn build(self) -> MpdResult<Vec<ContentProtection>> {
        let representations = match self.representations {
            RepresentationProtections::Unset => Vec::new(),
            RepresentationProtections::Set(protections) => protections,
        };

        if self.adaptation_set.is_empty() {
            return Ok(representations);
        }

        let mut protections = self.adaptation_set;
        for protection in representations {
            maybe_add_content_protection(&mut protections, protection)?;
        }
        Ok(protections)
    }
}

/// Adds a protection found in a Representation element to that Representation's list.
pub fn add_representation_protection(
    protections: &mut Vec<ContentProtection>,
    protection: ContentProtection,
) -> MpdResult<()> {
    maybe_add_content_protection(protections, protection)
}

/// Checks a protection against `protections`, adding it when its scheme is new.
///
/// - An identical entry is already present: nothing to do.
/// - An entry with the same scheme but different data: the manifest is inconsistent.
/// - Otherwise the protection is appended.
fn maybe_add_content_protection(
    protections: &mut Vec<ContentProtection>,
    protection: ContentProtection,
) -> MpdResult<()> {
    if protections.contains(&protection) {
        return Ok(());
    }
    if protections
        .iter()
        .any(|existing| existing.scheme_uri_id == protection.scheme_uri_id)
    {
        return Err(MpdError::InconsistentContentProtection(
            protection.scheme_uri_id,
        ));
    }
    protections.push(protection);
    Ok(())
}

fn first_difference(expected: &[ContentProtection], found: &[ContentProtection]) -> String {
    expected
        .iter()
        .zip(found.iter())
        .find(|(a, b)| a != b)
        .map(|(a, _)| a)
        .or_else(|| expected.get(found.len()))
        .or_else(|| found.get(expected.len()))
        .map(|protection| protection.scheme_uri_id.clone())
        .unwrap_or_default()
}
