//! Certificates, RFC 5280 Section 4.1.
//!
//! ```asn1
//! Certificate  ::=  SEQUENCE  {
//!     tbsCertificate       TBSCertificate,
//!     signatureAlgorithm   AlgorithmIdentifier,
//!     signatureValue       BIT STRING  }
//!
//! TBSCertificate  ::=  SEQUENCE  {
//!     version         [0]  EXPLICIT Version DEFAULT v1,
//!     serialNumber         CertificateSerialNumber,
//!     signature            AlgorithmIdentifier,
//!     issuer               Name,
//!     validity             Validity,
//!     subject              Name,
//!     subjectPublicKeyInfo SubjectPublicKeyInfo,
//!     issuerUniqueID  [1]  IMPLICIT UniqueIdentifier OPTIONAL,
//!                          -- If present, version MUST be v2 or v3
//!     subjectUniqueID [2]  IMPLICIT UniqueIdentifier OPTIONAL,
//!                          -- If present, version MUST be v2 or v3
//!     extensions      [3]  EXPLICIT Extensions OPTIONAL
//!                          -- If present, version MUST be v3
//!     }
//!
//! Version  ::=  INTEGER  {  v1(0), v2(1), v3(2)  }
//! ```

use asn1::{BitString, Element, Integer, Tagged, UniversalTag};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::algorithm::{AlgorithmIdentifier, SubjectPublicKeyInfo};
use crate::error::{Error, Kind};
use crate::extensions::{Extension, Extensions};
use crate::name::Name;
use crate::oid;
use crate::resolve::{self, Resolve, resolvable};
use crate::time::{Time, Validity};

/// The stored value is one less than the version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Version {
    V1 = 0,
    V2 = 1,
    V3 = 2,
}

impl Version {
    pub(crate) fn from_integer(kind: Kind, integer: &Integer) -> Result<Self, Error> {
        match integer.to_i64() {
            Some(0) => Ok(Version::V1),
            Some(1) => Ok(Version::V2),
            Some(2) => Ok(Version::V3),
            _ => Err(Error::invalid(kind, format!("unknown version {}", integer))),
        }
    }

    pub(crate) fn to_integer(self) -> Integer {
        Integer::from(self as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TbsCertificate {
    version: Version,
    // Whether the [0] version field is written. Only a v1 certificate may
    // leave it out, but decoded input keeps whatever it carried.
    version_tagged: bool,
    serial_number: Integer,
    signature: AlgorithmIdentifier,
    issuer: Name,
    validity: Validity,
    subject: Name,
    subject_public_key_info: SubjectPublicKeyInfo,
    issuer_unique_id: Option<BitString>,
    subject_unique_id: Option<BitString>,
    extensions: Option<Extensions>,
}

impl TbsCertificate {
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn serial_number(&self) -> &Integer {
        &self.serial_number
    }

    pub fn signature(&self) -> &AlgorithmIdentifier {
        &self.signature
    }

    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    pub fn subject(&self) -> &Name {
        &self.subject
    }

    pub fn subject_public_key_info(&self) -> &SubjectPublicKeyInfo {
        &self.subject_public_key_info
    }

    pub fn issuer_unique_id(&self) -> Option<&BitString> {
        self.issuer_unique_id.as_ref()
    }

    pub fn subject_unique_id(&self) -> Option<&BitString> {
        self.subject_unique_id.as_ref()
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.extensions.as_ref()
    }

    pub fn extension<T: Extension>(&self) -> Result<Option<T>, Error> {
        match &self.extensions {
            Some(extensions) => extensions.extension::<T>(),
            None => Ok(None),
        }
    }

    fn check_version(&self) -> Result<(), Error> {
        let kind = Kind::TbsCertificate;
        let has_unique_ids = self.issuer_unique_id.is_some() || self.subject_unique_id.is_some();
        match self.version {
            Version::V1 if has_unique_ids || self.extensions.is_some() => Err(Error::invalid(
                kind,
                "v1 certificate carries unique identifiers or extensions",
            )),
            Version::V2 if self.extensions.is_some() => {
                Err(Error::invalid(kind, "v2 certificate carries extensions"))
            }
            _ => Ok(()),
        }
    }
}

fn unique_id(tagged: &Tagged) -> Result<BitString, Error> {
    let node = tagged.implicit_as(UniversalTag::BitString)?;
    Ok(resolve::bit_string(Kind::TbsCertificate, &node)?.clone())
}

impl DecodableFrom<Element> for TbsCertificate {}

impl Decoder<Element, TbsCertificate> for Element {
    type Error = Error;

    fn decode(&self) -> Result<TbsCertificate, Self::Error> {
        let kind = Kind::TbsCertificate;
        let elements = resolve::sequence(kind, self, 6, 10)?;

        let (explicit_version, fields) = match elements.split_first() {
            Some((Element::Tagged(tagged), rest)) if tagged.is_context(0) => {
                let node = tagged.explicit_inner()?;
                let version = Version::from_integer(kind, resolve::integer(kind, node)?)?;
                (Some(version), rest)
            }
            _ => (None, elements),
        };
        if fields.len() < 6 {
            return Err(Error::element_count(kind, 7, Some(10), elements.len()));
        }
        let (base, trailing) = fields.split_at(6);
        let [issuer_uid, subject_uid, extensions] = resolve::tagged_fields::<3>(kind, trailing, 1)?;

        let issuer_unique_id = issuer_uid.map(unique_id).transpose()?;
        let subject_unique_id = subject_uid.map(unique_id).transpose()?;
        let extensions = extensions
            .map(resolve::from_explicit::<Extensions>)
            .transpose()?;

        // Without a version field the trailing fields decide the shape.
        let version = explicit_version.unwrap_or(if extensions.is_some() {
            Version::V3
        } else if issuer_unique_id.is_some() || subject_unique_id.is_some() {
            Version::V2
        } else {
            Version::V1
        });
        trace!(
            "TBSCertificate {:?} (version field {})",
            version,
            if explicit_version.is_some() { "present" } else { "absent" }
        );

        let tbs = TbsCertificate {
            version,
            version_tagged: explicit_version.is_some(),
            serial_number: resolve::integer(kind, &base[0])?.clone(),
            signature: AlgorithmIdentifier::from_node(&base[1])?,
            issuer: Name::from_node(&base[2])?,
            validity: Validity::from_node(&base[3])?,
            subject: Name::from_node(&base[4])?,
            subject_public_key_info: SubjectPublicKeyInfo::from_node(&base[5])?,
            issuer_unique_id,
            subject_unique_id,
            extensions,
        };
        tbs.check_version()?;
        Ok(tbs)
    }
}

impl EncodableTo<TbsCertificate> for Element {}

impl Encoder<TbsCertificate, Element> for TbsCertificate {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        self.check_version()?;
        let mut elements = Vec::with_capacity(10);
        if self.version_tagged {
            elements.push(Tagged::explicit(0, Element::Integer(self.version.to_integer())).into());
        }
        elements.push(Element::Integer(self.serial_number.clone()));
        elements.push(self.signature.to_node()?);
        elements.push(self.issuer.to_node()?);
        elements.push(self.validity.to_node()?);
        elements.push(self.subject.to_node()?);
        elements.push(self.subject_public_key_info.to_node()?);
        if let Some(id) = &self.issuer_unique_id {
            elements.push(Tagged::implicit(1, &Element::BitString(id.clone()))?.into());
        }
        if let Some(id) = &self.subject_unique_id {
            elements.push(Tagged::implicit(2, &Element::BitString(id.clone()))?.into());
        }
        if let Some(extensions) = &self.extensions {
            elements.push(resolve::to_explicit(extensions, 3)?);
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(TbsCertificate, TbsCertificate);

/// A signed certificate. The signature is carried, never checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    tbs_certificate: TbsCertificate,
    signature_algorithm: AlgorithmIdentifier,
    signature_value: BitString,
}

impl Certificate {
    pub fn new(
        tbs_certificate: TbsCertificate,
        signature_algorithm: AlgorithmIdentifier,
        signature_value: BitString,
    ) -> Self {
        Certificate {
            tbs_certificate,
            signature_algorithm,
            signature_value,
        }
    }

    pub fn tbs_certificate(&self) -> &TbsCertificate {
        &self.tbs_certificate
    }

    pub fn signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.signature_algorithm
    }

    pub fn signature_value(&self) -> &BitString {
        &self.signature_value
    }

    pub fn extension<T: Extension>(&self) -> Result<Option<T>, Error> {
        self.tbs_certificate.extension::<T>()
    }
}

impl DecodableFrom<Element> for Certificate {}

impl Decoder<Element, Certificate> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Certificate, Self::Error> {
        let kind = Kind::Certificate;
        let elements = resolve::sequence(kind, self, 3, 3)?;
        Ok(Certificate {
            tbs_certificate: TbsCertificate::from_node(&elements[0])?,
            signature_algorithm: AlgorithmIdentifier::from_node(&elements[1])?,
            signature_value: resolve::bit_string(kind, &elements[2])?.clone(),
        })
    }
}

impl EncodableTo<Certificate> for Element {}

impl Encoder<Certificate, Element> for Certificate {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            self.tbs_certificate.to_node()?,
            self.signature_algorithm.to_node()?,
            Element::BitString(self.signature_value.clone()),
        ]))
    }
}

resolvable!(Certificate, Certificate);

/// Fields shared by the certificate generators.
#[derive(Debug, Clone, Default)]
struct CommonFields {
    serial_number: Option<Integer>,
    signature: Option<AlgorithmIdentifier>,
    issuer: Option<Name>,
    start_date: Option<Time>,
    end_date: Option<Time>,
    subject: Option<Name>,
    subject_public_key_info: Option<SubjectPublicKeyInfo>,
}

impl CommonFields {
    fn missing(&self, subject_optional: bool) -> Vec<&'static str> {
        [
            ("serial_number", self.serial_number.is_some()),
            ("signature", self.signature.is_some()),
            ("issuer", self.issuer.is_some()),
            ("start_date", self.start_date.is_some()),
            ("end_date", self.end_date.is_some()),
            ("subject", self.subject.is_some() || subject_optional),
            ("subject_public_key_info", self.subject_public_key_info.is_some()),
        ]
        .into_iter()
        .filter(|(_, set)| !set)
        .map(|(name, _)| name)
        .collect()
    }

    fn build(&self, version: Version, subject_optional: bool) -> Result<TbsCertificate, Error> {
        let missing = self.missing(subject_optional);
        let (
            Some(serial_number),
            Some(signature),
            Some(issuer),
            Some(start_date),
            Some(end_date),
            Some(subject_public_key_info),
        ) = (
            &self.serial_number,
            &self.signature,
            &self.issuer,
            self.start_date,
            self.end_date,
            &self.subject_public_key_info,
        )
        else {
            return Err(Error::incomplete(Kind::TbsCertificate, missing));
        };
        if !missing.is_empty() {
            return Err(Error::incomplete(Kind::TbsCertificate, missing));
        }
        Ok(TbsCertificate {
            version,
            version_tagged: version != Version::V1,
            serial_number: serial_number.clone(),
            signature: signature.clone(),
            issuer: issuer.clone(),
            validity: Validity::new(start_date, end_date),
            subject: self.subject.clone().unwrap_or_else(Name::empty),
            subject_public_key_info: subject_public_key_info.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: None,
        })
    }
}

macro_rules! common_setters {
    () => {
        pub fn set_serial_number(&mut self, serial_number: Integer) -> &mut Self {
            self.common.serial_number = Some(serial_number);
            self
        }

        pub fn set_signature(&mut self, signature: AlgorithmIdentifier) -> &mut Self {
            self.common.signature = Some(signature);
            self
        }

        pub fn set_issuer(&mut self, issuer: Name) -> &mut Self {
            self.common.issuer = Some(issuer);
            self
        }

        pub fn set_start_date(&mut self, start_date: impl Into<Time>) -> &mut Self {
            self.common.start_date = Some(start_date.into());
            self
        }

        pub fn set_end_date(&mut self, end_date: impl Into<Time>) -> &mut Self {
            self.common.end_date = Some(end_date.into());
            self
        }

        pub fn set_subject(&mut self, subject: Name) -> &mut Self {
            self.common.subject = Some(subject);
            self
        }

        pub fn set_subject_public_key_info(&mut self, spki: SubjectPublicKeyInfo) -> &mut Self {
            self.common.subject_public_key_info = Some(spki);
            self
        }
    };
}

/// Builds a version 1 TBSCertificate. Every field is mandatory.
#[derive(Debug, Clone, Default)]
pub struct V1TbsCertificateGenerator {
    common: CommonFields,
}

impl V1TbsCertificateGenerator {
    pub fn new() -> Self {
        V1TbsCertificateGenerator::default()
    }

    common_setters!();

    pub fn build(&self) -> Result<TbsCertificate, Error> {
        let tbs = self.common.build(Version::V1, false)?;
        debug!("built v1 TBSCertificate, serial {}", tbs.serial_number);
        Ok(tbs)
    }
}

/// Builds a version 3 TBSCertificate.
///
/// The subject may be left unset when the extensions carry a critical
/// subjectAltName; the certificate then gets an empty subject name.
#[derive(Debug, Clone, Default)]
pub struct V3TbsCertificateGenerator {
    common: CommonFields,
    issuer_unique_id: Option<BitString>,
    subject_unique_id: Option<BitString>,
    extensions: Option<Extensions>,
}

impl V3TbsCertificateGenerator {
    pub fn new() -> Self {
        V3TbsCertificateGenerator::default()
    }

    common_setters!();

    pub fn set_issuer_unique_id(&mut self, id: BitString) -> &mut Self {
        self.issuer_unique_id = Some(id);
        self
    }

    pub fn set_subject_unique_id(&mut self, id: BitString) -> &mut Self {
        self.subject_unique_id = Some(id);
        self
    }

    pub fn set_extensions(&mut self, extensions: Extensions) -> &mut Self {
        self.extensions = Some(extensions);
        self
    }

    fn has_critical_alt_name(&self) -> bool {
        self.extensions.as_ref().is_some_and(|extensions| {
            extensions
                .critical_oids()
                .any(|id| *id == oid::SUBJECT_ALT_NAME)
        })
    }

    pub fn build(&self) -> Result<TbsCertificate, Error> {
        let mut tbs = self.common.build(Version::V3, self.has_critical_alt_name())?;
        tbs.issuer_unique_id = self.issuer_unique_id.clone();
        tbs.subject_unique_id = self.subject_unique_id.clone();
        tbs.extensions = self.extensions.clone();
        debug!(
            "built v3 TBSCertificate, serial {}, {} extensions",
            tbs.serial_number,
            tbs.extensions.as_ref().map_or(0, Extensions::len)
        );
        Ok(tbs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AlgorithmParameters;
    use crate::error::Violation;
    use crate::extensions::{BasicConstraints, ExtensionsGenerator, SubjectAltName};
    use crate::general_name::GeneralName;
    use crate::key_identifier::tests::ed25519_spki;
    use crate::name::tests::common_name;
    use asn1::ObjectIdentifier;
    use chrono::NaiveDateTime;
    use rstest::rstest;
    use std::str::FromStr;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn ed25519() -> AlgorithmIdentifier {
        AlgorithmIdentifier::new(
            ObjectIdentifier::from_str("1.3.101.112").unwrap(),
            AlgorithmParameters::Absent,
        )
    }

    fn v3_generator() -> V3TbsCertificateGenerator {
        let mut generator = V3TbsCertificateGenerator::new();
        generator
            .set_serial_number(Integer::from(4660i64))
            .set_signature(ed25519())
            .set_issuer(common_name("Test CA"))
            .set_start_date(datetime("2024-01-01 00:00:00"))
            .set_end_date(datetime("2054-01-01 00:00:00"))
            .set_subject(common_name("leaf"))
            .set_subject_public_key_info(ed25519_spki());
        generator
    }

    fn alt_name_extensions(critical: bool) -> Extensions {
        let san = SubjectAltName::new(GeneralName::DnsName("example.com".to_string()).into());
        let mut generator = ExtensionsGenerator::new();
        generator.add_extension(critical, &san).unwrap();
        generator.build().unwrap()
    }

    #[test]
    fn test_v3_generator_round_trip() {
        let mut generator = v3_generator();
        let mut extensions = ExtensionsGenerator::new();
        extensions
            .add_extension(true, &BasicConstraints { ca: true, path_len_constraint: Some(0) })
            .unwrap();
        generator.set_extensions(extensions.build().unwrap());
        let tbs = generator.build().unwrap();
        assert_eq!(Version::V3, tbs.version());
        // end date past 2049 switches to GeneralizedTime
        assert!(matches!(tbs.validity().not_after(), Time::Generalized(_)));

        let der = tbs.to_der().unwrap();
        let decoded = TbsCertificate::from_der(&der).unwrap();
        assert_eq!(tbs, decoded);
        assert_eq!(der, decoded.to_der().unwrap());
        assert_eq!(
            Some(BasicConstraints { ca: true, path_len_constraint: Some(0) }),
            decoded.extension::<BasicConstraints>().unwrap()
        );
    }

    #[test]
    fn test_v3_generator_requires_public_key() {
        let mut generator = V3TbsCertificateGenerator::new();
        generator
            .set_serial_number(Integer::from(1i64))
            .set_signature(ed25519())
            .set_issuer(common_name("Test CA"))
            .set_start_date(datetime("2024-01-01 00:00:00"))
            .set_end_date(datetime("2025-01-01 00:00:00"))
            .set_subject(common_name("leaf"));
        let err = generator.build().unwrap_err();
        assert!(matches!(
            &err,
            Error::IncompleteStructure { kind: Kind::TbsCertificate, missing }
                if missing == &vec!["subject_public_key_info"]
        ));
        generator.set_subject_public_key_info(ed25519_spki());
        assert!(generator.build().is_ok());
        // build does not consume the generator
        assert!(generator.build().is_ok());
    }

    #[test]
    fn test_v3_generator_critical_alt_name_replaces_subject() {
        let mut generator = V3TbsCertificateGenerator::new();
        generator
            .set_serial_number(Integer::from(1i64))
            .set_signature(ed25519())
            .set_issuer(common_name("Test CA"))
            .set_start_date(datetime("2024-01-01 00:00:00"))
            .set_end_date(datetime("2025-01-01 00:00:00"))
            .set_subject_public_key_info(ed25519_spki())
            .set_extensions(alt_name_extensions(true));
        let tbs = generator.build().unwrap();
        assert!(tbs.subject().is_empty());
        let decoded = TbsCertificate::from_der(&tbs.to_der().unwrap()).unwrap();
        assert!(decoded.subject().is_empty());

        generator.set_extensions(alt_name_extensions(false));
        let err = generator.build().unwrap_err();
        assert!(matches!(
            &err,
            Error::IncompleteStructure { missing, .. } if missing == &vec!["subject"]
        ));
    }

    #[test]
    fn test_empty_generator_lists_every_missing_field() {
        let err = V1TbsCertificateGenerator::new().build().unwrap_err();
        assert_eq!(
            "TbsCertificate: incomplete structure, missing serial_number, signature, issuer, \
             start_date, end_date, subject, subject_public_key_info",
            err.to_string()
        );
    }

    #[test]
    fn test_v1_round_trip_omits_version() {
        let mut generator = V1TbsCertificateGenerator::new();
        generator
            .set_serial_number(Integer::from(1i64))
            .set_signature(ed25519())
            .set_issuer(common_name("CA"))
            .set_start_date(datetime("2024-01-01 00:00:00"))
            .set_end_date(datetime("2025-01-01 00:00:00"))
            .set_subject(common_name("CA"))
            .set_subject_public_key_info(ed25519_spki());
        let tbs = generator.build().unwrap();
        let Element::Sequence(elements) = tbs.to_node().unwrap() else {
            panic!("expected SEQUENCE");
        };
        assert_eq!(6, elements.len());
        assert!(matches!(elements[0], Element::Integer(_)));
        let tbs = TbsCertificate::from_node(&Element::Sequence(elements)).unwrap();
        assert_eq!(Version::V1, tbs.version());
    }

    fn tbs_fields() -> Vec<Element> {
        let Element::Sequence(elements) = v3_generator().build().unwrap().to_node().unwrap() else {
            panic!("expected SEQUENCE");
        };
        elements
    }

    #[rstest(
        count,
        ok,
        // [0] version + 6 base fields
        case(7, true),
        case(6, false),
    )]
    fn test_tbs_certificate_minimum_fields(count: usize, ok: bool) {
        let elements = tbs_fields().into_iter().take(count).collect();
        assert_eq!(ok, TbsCertificate::from_node(&Element::Sequence(elements)).is_ok());
    }

    #[test]
    fn test_tbs_certificate_field_count_bounds() {
        let unique_id = |number: u8, byte: u8| {
            let bits = Element::BitString(BitString::new(0, vec![byte]).unwrap());
            Element::from(Tagged::implicit(number, &bits).unwrap())
        };
        let uid = || unique_id(1, 0x01);
        let suid = || unique_id(2, 0x02);
        let extensions = resolve::to_explicit(&alt_name_extensions(false), 3).unwrap();

        let mut elements = tbs_fields();
        elements.extend([uid(), suid(), extensions.clone()]);
        // 10 fields, the maximum
        let tbs = TbsCertificate::from_node(&Element::Sequence(elements.clone())).unwrap();
        assert!(tbs.issuer_unique_id().is_some() && tbs.extensions().is_some());

        elements.push(extensions);
        let err = TbsCertificate::from_node(&Element::Sequence(elements)).unwrap_err();
        assert_eq!(
            Some(&Violation::ElementCount { min: 6, max: Some(10), actual: 11 }),
            err.violation()
        );

        let truncated = Element::Sequence(tbs_fields()[1..6].to_vec());
        let err = TbsCertificate::from_node(&truncated).unwrap_err();
        assert_eq!(
            Some(&Violation::ElementCount { min: 6, max: Some(10), actual: 5 }),
            err.violation()
        );
    }

    #[test]
    fn test_tbs_certificate_infers_version_without_tag() {
        let mut elements = tbs_fields()[1..].to_vec();
        elements.push(resolve::to_explicit(&alt_name_extensions(false), 3).unwrap());
        let node = Element::Sequence(elements);
        let tbs = TbsCertificate::from_node(&node).unwrap();
        assert_eq!(Version::V3, tbs.version());
        // the version field stays absent on re-encoding
        assert_eq!(node, tbs.to_node().unwrap());
    }

    #[rstest(
        version,
        case::v1(0),
        case::v2(1),
    )]
    fn test_tbs_certificate_rejects_extensions_before_v3(version: i64) {
        let mut elements = tbs_fields();
        elements[0] = Tagged::explicit(0, Element::Integer(Integer::from(version))).into();
        elements.push(resolve::to_explicit(&alt_name_extensions(false), 3).unwrap());
        let err = TbsCertificate::from_node(&Element::Sequence(elements)).unwrap_err();
        assert!(matches!(err.violation(), Some(Violation::InvalidValue(_))));
    }

    #[test]
    fn test_tbs_certificate_rejects_unknown_version() {
        let mut elements = tbs_fields();
        elements[0] = Tagged::explicit(0, Element::Integer(Integer::from(3i64))).into();
        let err = TbsCertificate::from_node(&Element::Sequence(elements)).unwrap_err();
        assert_eq!(
            Some(&Violation::InvalidValue("unknown version 3".to_string())),
            err.violation()
        );
    }

    #[test]
    fn test_certificate_round_trip_and_identity() {
        let tbs = v3_generator().build().unwrap();
        let cert = Certificate::new(tbs, ed25519(), BitString::new(0, vec![0xab; 64]).unwrap());
        let der = cert.to_der().unwrap();
        let decoded = Certificate::from_der(&der).unwrap();
        assert_eq!(cert, decoded);
        assert_eq!(der, decoded.to_der().unwrap());

        let same = Certificate::resolve(resolve::Resolvable::Typed(decoded.clone())).unwrap();
        assert_eq!(decoded, same);
        assert!(cert.extension::<BasicConstraints>().unwrap().is_none());
    }

    #[rstest(count, case(2), case(4))]
    fn test_certificate_requires_three_fields(count: usize) {
        let node = Element::Sequence(vec![Element::Null; count]);
        let err = Certificate::from_node(&node).unwrap_err();
        assert_eq!(
            Some(&Violation::ElementCount { min: 3, max: Some(3), actual: count }),
            err.violation()
        );
    }
}
