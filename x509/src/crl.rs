//! Certificate revocation lists, RFC 5280 Section 5.1.
//!
//! ```asn1
//! CertificateList  ::=  SEQUENCE  {
//!     tbsCertList          TBSCertList,
//!     signatureAlgorithm   AlgorithmIdentifier,
//!     signatureValue       BIT STRING  }
//!
//! TBSCertList  ::=  SEQUENCE  {
//!     version                 Version OPTIONAL,
//!                                  -- if present, MUST be v2
//!     signature               AlgorithmIdentifier,
//!     issuer                  Name,
//!     thisUpdate              Time,
//!     nextUpdate              Time OPTIONAL,
//!     revokedCertificates     SEQUENCE OF SEQUENCE  {
//!          userCertificate         CertificateSerialNumber,
//!          revocationDate          Time,
//!          crlEntryExtensions      Extensions OPTIONAL
//!                                   -- if present, version MUST be v2
//!                               }  OPTIONAL,
//!     crlExtensions           [0]  EXPLICIT Extensions OPTIONAL
//!                                   -- if present, version MUST be v2
//!                               }
//! ```
//!
//! Only `crlExtensions` carries a tag, so the optional fields between
//! `thisUpdate` and it are told apart by the universal type of the next node.

use asn1::{BitString, Element, Integer};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::algorithm::AlgorithmIdentifier;
use crate::certificate::Version;
use crate::error::{Error, Kind};
use crate::extensions::{CrlReason, Extension, Extensions, ExtensionsGenerator};
use crate::name::Name;
use crate::resolve::{self, Resolve, resolvable};
use crate::time::Time;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrlEntry {
    user_certificate: Integer,
    revocation_date: Time,
    crl_entry_extensions: Option<Extensions>,
}

impl CrlEntry {
    pub fn new(
        user_certificate: Integer,
        revocation_date: Time,
        crl_entry_extensions: Option<Extensions>,
    ) -> Self {
        CrlEntry {
            user_certificate,
            revocation_date,
            crl_entry_extensions,
        }
    }

    pub fn user_certificate(&self) -> &Integer {
        &self.user_certificate
    }

    pub fn revocation_date(&self) -> &Time {
        &self.revocation_date
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.crl_entry_extensions.as_ref()
    }

    /// The reasonCode entry extension, if the entry has one.
    pub fn reason(&self) -> Result<Option<CrlReason>, Error> {
        match &self.crl_entry_extensions {
            Some(extensions) => extensions.extension::<CrlReason>(),
            None => Ok(None),
        }
    }
}

impl DecodableFrom<Element> for CrlEntry {}

impl Decoder<Element, CrlEntry> for Element {
    type Error = Error;

    fn decode(&self) -> Result<CrlEntry, Self::Error> {
        let kind = Kind::CrlEntry;
        let elements = resolve::sequence(kind, self, 2, 3)?;
        Ok(CrlEntry {
            user_certificate: resolve::integer(kind, &elements[0])?.clone(),
            revocation_date: Time::from_node(&elements[1])?,
            crl_entry_extensions: elements.get(2).map(Extensions::from_node).transpose()?,
        })
    }
}

impl EncodableTo<CrlEntry> for Element {}

impl Encoder<CrlEntry, Element> for CrlEntry {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = vec![
            Element::Integer(self.user_certificate.clone()),
            self.revocation_date.to_node()?,
        ];
        if let Some(extensions) = &self.crl_entry_extensions {
            elements.push(extensions.to_node()?);
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(CrlEntry, CrlEntry);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TbsCertList {
    version: Option<Version>,
    signature: AlgorithmIdentifier,
    issuer: Name,
    this_update: Time,
    next_update: Option<Time>,
    revoked_certificates: Option<Vec<CrlEntry>>,
    crl_extensions: Option<Extensions>,
}

impl TbsCertList {
    /// `None` for a version 1 list, which leaves the field out.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn signature(&self) -> &AlgorithmIdentifier {
        &self.signature
    }

    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    pub fn this_update(&self) -> &Time {
        &self.this_update
    }

    pub fn next_update(&self) -> Option<&Time> {
        self.next_update.as_ref()
    }

    /// Revoked entries in encoded order; empty when the field is absent.
    pub fn revoked_certificates(&self) -> &[CrlEntry] {
        self.revoked_certificates.as_deref().unwrap_or_default()
    }

    pub fn extensions(&self) -> Option<&Extensions> {
        self.crl_extensions.as_ref()
    }

    pub fn extension<T: Extension>(&self) -> Result<Option<T>, Error> {
        match &self.crl_extensions {
            Some(extensions) => extensions.extension::<T>(),
            None => Ok(None),
        }
    }

    fn check_version(&self) -> Result<(), Error> {
        let kind = Kind::TbsCertList;
        match self.version {
            Some(Version::V2) => Ok(()),
            Some(other) => Err(Error::invalid(
                kind,
                format!("CRL version must be v2, got {:?}", other),
            )),
            None => {
                let entry_extensions = self
                    .revoked_certificates()
                    .iter()
                    .any(|entry| entry.crl_entry_extensions.is_some());
                if self.crl_extensions.is_some() || entry_extensions {
                    Err(Error::invalid(kind, "v1 CRL carries extensions"))
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl DecodableFrom<Element> for TbsCertList {}

impl Decoder<Element, TbsCertList> for Element {
    type Error = Error;

    fn decode(&self) -> Result<TbsCertList, Self::Error> {
        let kind = Kind::TbsCertList;
        let elements = resolve::sequence(kind, self, 3, 7)?;
        let mut fields = elements.iter().peekable();

        let version = fields
            .next_if(|node| matches!(node, Element::Integer(_)))
            .map(|node| Version::from_integer(kind, resolve::integer(kind, node)?))
            .transpose()?;
        let (Some(signature), Some(issuer), Some(this_update)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::element_count(kind, 4, Some(7), elements.len()));
        };

        let next_update = fields
            .next_if(|node| matches!(node, Element::UTCTime(_) | Element::GeneralizedTime(_)))
            .map(Time::from_node)
            .transpose()?;
        let revoked_certificates = fields
            .next_if(|node| matches!(node, Element::Sequence(_)))
            .map(|node| {
                resolve::sequence_of(kind, node)?
                    .iter()
                    .map(CrlEntry::from_node)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        let crl_extensions = match fields.next() {
            None => None,
            Some(node) => {
                let tagged = resolve::tagged(kind, node)?;
                if tagged.number() != 0 {
                    return Err(Error::unexpected_tag(kind, tagged.number()));
                }
                Some(resolve::from_explicit::<Extensions>(tagged)?)
            }
        };
        if let Some(extra) = fields.next() {
            return Err(match extra {
                Element::Tagged(tagged) => Error::unexpected_tag(kind, tagged.number()),
                _ => Error::invalid(kind, "unexpected field after crlExtensions"),
            });
        }
        trace!(
            "TBSCertList {:?}, nextUpdate {}, {} entries",
            version,
            next_update.is_some(),
            revoked_certificates.as_ref().map_or(0, Vec::len)
        );

        let tbs = TbsCertList {
            version,
            signature: AlgorithmIdentifier::from_node(signature)?,
            issuer: Name::from_node(issuer)?,
            this_update: Time::from_node(this_update)?,
            next_update,
            revoked_certificates,
            crl_extensions,
        };
        tbs.check_version()?;
        Ok(tbs)
    }
}

impl EncodableTo<TbsCertList> for Element {}

impl Encoder<TbsCertList, Element> for TbsCertList {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        self.check_version()?;
        let mut elements = Vec::with_capacity(7);
        if let Some(version) = self.version {
            elements.push(Element::Integer(version.to_integer()));
        }
        elements.push(self.signature.to_node()?);
        elements.push(self.issuer.to_node()?);
        elements.push(self.this_update.to_node()?);
        if let Some(next_update) = &self.next_update {
            elements.push(next_update.to_node()?);
        }
        if let Some(entries) = &self.revoked_certificates {
            elements.push(Element::Sequence(
                entries
                    .iter()
                    .map(|entry| entry.to_node())
                    .collect::<Result<Vec<_>, _>>()?,
            ));
        }
        if let Some(extensions) = &self.crl_extensions {
            elements.push(resolve::to_explicit(extensions, 0)?);
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(TbsCertList, TbsCertList);

/// A signed CRL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateList {
    tbs_cert_list: TbsCertList,
    signature_algorithm: AlgorithmIdentifier,
    signature_value: BitString,
}

impl CertificateList {
    pub fn new(
        tbs_cert_list: TbsCertList,
        signature_algorithm: AlgorithmIdentifier,
        signature_value: BitString,
    ) -> Self {
        CertificateList {
            tbs_cert_list,
            signature_algorithm,
            signature_value,
        }
    }

    pub fn tbs_cert_list(&self) -> &TbsCertList {
        &self.tbs_cert_list
    }

    pub fn signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.signature_algorithm
    }

    pub fn signature_value(&self) -> &BitString {
        &self.signature_value
    }

    pub fn revoked_certificates(&self) -> &[CrlEntry] {
        self.tbs_cert_list.revoked_certificates()
    }
}

impl DecodableFrom<Element> for CertificateList {}

impl Decoder<Element, CertificateList> for Element {
    type Error = Error;

    fn decode(&self) -> Result<CertificateList, Self::Error> {
        let kind = Kind::CertificateList;
        let elements = resolve::sequence(kind, self, 3, 3)?;
        Ok(CertificateList {
            tbs_cert_list: TbsCertList::from_node(&elements[0])?,
            signature_algorithm: AlgorithmIdentifier::from_node(&elements[1])?,
            signature_value: resolve::bit_string(kind, &elements[2])?.clone(),
        })
    }
}

impl EncodableTo<CertificateList> for Element {}

impl Encoder<CertificateList, Element> for CertificateList {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            self.tbs_cert_list.to_node()?,
            self.signature_algorithm.to_node()?,
            Element::BitString(self.signature_value.clone()),
        ]))
    }
}

resolvable!(CertificateList, CertificateList);

/// Builds a version 2 TBSCertList. Signature, issuer and thisUpdate are
/// mandatory.
#[derive(Debug, Clone, Default)]
pub struct V2TbsCertListGenerator {
    signature: Option<AlgorithmIdentifier>,
    issuer: Option<Name>,
    this_update: Option<Time>,
    next_update: Option<Time>,
    entries: Vec<CrlEntry>,
    extensions: Option<Extensions>,
}

impl V2TbsCertListGenerator {
    pub fn new() -> Self {
        V2TbsCertListGenerator::default()
    }

    pub fn set_signature(&mut self, signature: AlgorithmIdentifier) -> &mut Self {
        self.signature = Some(signature);
        self
    }

    pub fn set_issuer(&mut self, issuer: Name) -> &mut Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn set_this_update(&mut self, this_update: impl Into<Time>) -> &mut Self {
        self.this_update = Some(this_update.into());
        self
    }

    pub fn set_next_update(&mut self, next_update: impl Into<Time>) -> &mut Self {
        self.next_update = Some(next_update.into());
        self
    }

    /// Adds an entry, with a non-critical reasonCode extension when a reason
    /// is given.
    pub fn add_crl_entry(
        &mut self,
        user_certificate: Integer,
        revocation_date: impl Into<Time>,
        reason: Option<CrlReason>,
    ) -> Result<&mut Self, Error> {
        let extensions = match reason {
            Some(reason) => {
                let mut generator = ExtensionsGenerator::new();
                generator.add_extension(false, &reason)?;
                Some(generator.build()?)
            }
            None => None,
        };
        Ok(self.add_crl_entry_with_extensions(user_certificate, revocation_date, extensions))
    }

    pub fn add_crl_entry_with_extensions(
        &mut self,
        user_certificate: Integer,
        revocation_date: impl Into<Time>,
        extensions: Option<Extensions>,
    ) -> &mut Self {
        self.entries.push(CrlEntry::new(
            user_certificate,
            revocation_date.into(),
            extensions,
        ));
        self
    }

    pub fn set_extensions(&mut self, extensions: Extensions) -> &mut Self {
        self.extensions = Some(extensions);
        self
    }

    pub fn build(&self) -> Result<TbsCertList, Error> {
        let (Some(signature), Some(issuer), Some(this_update)) =
            (&self.signature, &self.issuer, self.this_update)
        else {
            let missing = [
                ("signature", self.signature.is_some()),
                ("issuer", self.issuer.is_some()),
                ("this_update", self.this_update.is_some()),
            ]
            .into_iter()
            .filter(|(_, set)| !set)
            .map(|(name, _)| name)
            .collect();
            return Err(Error::incomplete(Kind::TbsCertList, missing));
        };
        debug!("built v2 TBSCertList with {} entries", self.entries.len());
        Ok(TbsCertList {
            version: Some(Version::V2),
            signature: signature.clone(),
            issuer: issuer.clone(),
            this_update,
            next_update: self.next_update,
            revoked_certificates: (!self.entries.is_empty()).then(|| self.entries.clone()),
            crl_extensions: self.extensions.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AlgorithmParameters;
    use crate::error::Violation;
    use crate::extensions::CrlNumber;
    use crate::name::tests::common_name;
    use asn1::{ObjectIdentifier, Tagged};
    use chrono::NaiveDateTime;
    use rstest::rstest;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn sha256_with_rsa() -> AlgorithmIdentifier {
        AlgorithmIdentifier::new(
            "1.2.840.113549.1.1.11".parse::<ObjectIdentifier>().unwrap(),
            AlgorithmParameters::Null,
        )
    }

    fn generator() -> V2TbsCertListGenerator {
        let mut generator = V2TbsCertListGenerator::new();
        generator
            .set_signature(sha256_with_rsa())
            .set_issuer(common_name("Test CA"))
            .set_this_update(datetime("2024-06-01 00:00:00"));
        generator
    }

    #[test]
    fn test_generator_round_trip_with_reasons() {
        let mut generator = generator();
        generator
            .set_next_update(datetime("2024-07-01 00:00:00"))
            .add_crl_entry(
                Integer::from(1i64),
                datetime("2024-05-01 12:00:00"),
                Some(CrlReason::KEY_COMPROMISE),
            )
            .unwrap()
            .add_crl_entry(Integer::from(2i64), datetime("2024-05-02 12:00:00"), None)
            .unwrap();
        let mut extensions = ExtensionsGenerator::new();
        extensions.add_extension(false, &CrlNumber::from(7u64)).unwrap();
        generator.set_extensions(extensions.build().unwrap());

        let tbs = generator.build().unwrap();
        let der = tbs.to_der().unwrap();
        let decoded = TbsCertList::from_der(&der).unwrap();
        assert_eq!(tbs, decoded);
        assert_eq!(der, decoded.to_der().unwrap());

        assert_eq!(Some(Version::V2), decoded.version());
        let entries = decoded.revoked_certificates();
        assert_eq!(2, entries.len());
        assert_eq!(Some(CrlReason::KEY_COMPROMISE), entries[0].reason().unwrap());
        assert_eq!(None, entries[1].reason().unwrap());
        assert!(!entries[0].extensions().unwrap().extensions()[0].is_critical());
        assert_eq!(Some(CrlNumber::from(7u64)), decoded.extension::<CrlNumber>().unwrap());
    }

    #[test]
    fn test_generator_lists_missing_fields() {
        let err = V2TbsCertListGenerator::new().build().unwrap_err();
        assert!(matches!(
            &err,
            Error::IncompleteStructure { kind: Kind::TbsCertList, missing }
                if missing == &vec!["signature", "issuer", "this_update"]
        ));
        let mut generator = V2TbsCertListGenerator::new();
        generator.set_issuer(common_name("Test CA"));
        let err = generator.build().unwrap_err();
        assert_eq!(
            "TbsCertList: incomplete structure, missing signature, this_update",
            err.to_string()
        );
    }

    fn node(tbs: &TbsCertList) -> Vec<Element> {
        let Element::Sequence(elements) = tbs.to_node().unwrap() else {
            panic!("expected SEQUENCE");
        };
        elements
    }

    #[rstest(
        with_next_update,
        with_entries,
        with_extensions,
        case(false, false, false),
        case(true, false, false),
        case(false, true, false),
        case(false, false, true),
        case(true, true, false),
        case(false, true, true),
        case(true, true, true),
    )]
    fn test_optional_fields_by_lookahead(
        with_next_update: bool,
        with_entries: bool,
        with_extensions: bool,
    ) {
        let mut generator = generator();
        if with_next_update {
            // GeneralizedTime
            generator.set_next_update(datetime("2050-01-01 00:00:00"));
        }
        if with_entries {
            generator.add_crl_entry_with_extensions(
                Integer::from(9i64),
                datetime("2024-05-01 00:00:00"),
                None,
            );
        }
        if with_extensions {
            let mut extensions = ExtensionsGenerator::new();
            extensions.add_extension(false, &CrlNumber::from(1u64)).unwrap();
            generator.set_extensions(extensions.build().unwrap());
        }
        let tbs = generator.build().unwrap();
        let decoded = TbsCertList::from_node(&Element::Sequence(node(&tbs))).unwrap();
        assert_eq!(with_next_update, decoded.next_update().is_some());
        assert_eq!(with_entries, !decoded.revoked_certificates().is_empty());
        assert_eq!(with_extensions, decoded.extensions().is_some());
        assert_eq!(tbs, decoded);
    }

    #[test]
    fn test_v1_crl_without_version() {
        let tbs = generator().build().unwrap();
        let elements = node(&tbs)[1..].to_vec();
        // the minimum: signature, issuer, thisUpdate
        assert_eq!(3, elements.len());
        let decoded = TbsCertList::from_node(&Element::Sequence(elements.clone())).unwrap();
        assert_eq!(None, decoded.version());
        assert_eq!(Element::Sequence(elements), decoded.to_node().unwrap());

        let truncated = Element::Sequence(node(&tbs)[1..3].to_vec());
        let err = TbsCertList::from_node(&truncated).unwrap_err();
        assert_eq!(
            Some(&Violation::ElementCount { min: 3, max: Some(7), actual: 2 }),
            err.violation()
        );
    }

    #[test]
    fn test_v1_crl_rejects_extensions() {
        let mut generator = generator();
        let mut extensions = ExtensionsGenerator::new();
        extensions.add_extension(false, &CrlNumber::from(1u64)).unwrap();
        generator.set_extensions(extensions.build().unwrap());
        let elements = node(&generator.build().unwrap())[1..].to_vec();
        let err = TbsCertList::from_node(&Element::Sequence(elements)).unwrap_err();
        assert!(matches!(err.violation(), Some(Violation::InvalidValue(_))));
    }

    #[test]
    fn test_tbs_cert_list_field_count_bounds() {
        let mut generator = generator();
        generator
            .set_next_update(datetime("2024-07-01 00:00:00"))
            .add_crl_entry_with_extensions(
                Integer::from(9i64),
                datetime("2024-05-01 00:00:00"),
                None,
            );
        let mut extensions = ExtensionsGenerator::new();
        extensions.add_extension(false, &CrlNumber::from(1u64)).unwrap();
        generator.set_extensions(extensions.build().unwrap());
        let mut elements = node(&generator.build().unwrap());
        assert_eq!(7, elements.len());
        assert!(TbsCertList::from_node(&Element::Sequence(elements.clone())).is_ok());

        elements.push(Element::Null);
        let err = TbsCertList::from_node(&Element::Sequence(elements)).unwrap_err();
        assert_eq!(
            Some(&Violation::ElementCount { min: 3, max: Some(7), actual: 8 }),
            err.violation()
        );
    }

    #[test]
    fn test_crl_extensions_must_use_tag_zero() {
        let mut elements = node(&generator().build().unwrap());
        let mut extensions = ExtensionsGenerator::new();
        extensions.add_extension(false, &CrlNumber::from(1u64)).unwrap();
        let extensions = extensions.build().unwrap();
        elements.push(Tagged::explicit(1, extensions.to_node().unwrap()).into());
        let err = TbsCertList::from_node(&Element::Sequence(elements)).unwrap_err();
        assert_eq!(Some(&Violation::UnexpectedTag(1)), err.violation());
    }

    #[rstest(count, ok, case(1, false), case(2, true), case(3, true), case(4, false))]
    fn test_crl_entry_field_count(count: usize, ok: bool) {
        let mut extensions = ExtensionsGenerator::new();
        extensions
            .add_extension(false, &CrlReason::SUPERSEDED)
            .unwrap();
        let full = vec![
            Element::Integer(Integer::from(5i64)),
            Element::UTCTime(datetime("2024-05-01 00:00:00")),
            extensions.build().unwrap().to_node().unwrap(),
            Element::Null,
        ];
        let node = Element::Sequence(full.into_iter().take(count).collect());
        assert_eq!(ok, CrlEntry::from_node(&node).is_ok());
    }

    #[test]
    fn test_certificate_list_round_trip() {
        let tbs = generator().build().unwrap();
        let signature = BitString::new(0, vec![0x5a; 32]).unwrap();
        let crl = CertificateList::new(tbs, sha256_with_rsa(), signature);
        let der = crl.to_der().unwrap();
        let decoded = CertificateList::from_der(&der).unwrap();
        assert_eq!(crl, decoded);
        assert_eq!(der, decoded.to_der().unwrap());
        assert!(decoded.revoked_certificates().is_empty());
    }
}
