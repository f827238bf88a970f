use asn1::{AsOid, Element, ObjectIdentifier, OctetString};
use log::debug;
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind, Violation};
use crate::resolve::{self, Resolve, resolvable};

mod alt_name;
mod authority_key_identifier;
mod basic_constraints;
mod certificate_policies;
mod crl_distribution_points;
mod crl_number;
mod crl_reason;
mod extended_key_usage;
mod issuing_distribution_point;
mod key_usage;
mod name_constraints;
mod policy_mappings;
mod subject_key_identifier;
mod target_information;

pub use alt_name::{IssuerAltName, SubjectAltName};
pub use authority_key_identifier::AuthorityKeyIdentifier;
pub use basic_constraints::BasicConstraints;
pub use certificate_policies::{
    CertificatePolicies, DisplayText, DisplayTextEncoding, NoticeReference, PolicyId,
    PolicyInformation, PolicyQualifierInfo, UserNotice,
};
pub use crl_distribution_points::{
    CrlDistributionPoints, DistributionPoint, DistributionPointName, ReasonFlags,
};
pub use crl_number::CrlNumber;
pub use crl_reason::CrlReason;
pub use extended_key_usage::ExtendedKeyUsage;
pub use issuing_distribution_point::IssuingDistributionPoint;
pub use key_usage::KeyUsage;
pub use name_constraints::{GeneralSubtree, NameConstraints};
pub use policy_mappings::{PolicyMapping, PolicyMappings};
pub use subject_key_identifier::SubjectKeyIdentifier;
pub use target_information::{Target, TargetInformation, Targets};

/*
RFC 5280 Section 4.1.2.9

Extensions  ::=  SEQUENCE SIZE (1..MAX) OF Extension

Extension  ::=  SEQUENCE  {
    extnID      OBJECT IDENTIFIER,
    critical    BOOLEAN DEFAULT FALSE,
    extnValue   OCTET STRING
                -- contains the DER encoding of an ASN.1 value
                -- corresponding to the extension type identified
                -- by extnID
}
*/

/// An extension as carried on the wire: OID, critical flag and the DER
/// encoding of its value. Nothing here depends on what the OID means, so
/// unknown extensions round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExtension {
    oid: ObjectIdentifier,
    critical: bool,
    value: OctetString,
}

impl RawExtension {
    pub fn new(oid: ObjectIdentifier, critical: bool, value: OctetString) -> Self {
        RawExtension {
            oid,
            critical,
            value,
        }
    }

    pub fn oid(&self) -> &ObjectIdentifier {
        &self.oid
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn value(&self) -> &OctetString {
        &self.value
    }

    /// Re-enters the node codec on the value octets and resolves them as `V`.
    /// Results are not cached; every call decodes again.
    pub fn decode_as<V: Resolve>(&self) -> Result<V, Error> {
        debug!("decoding extension {} as {}", self.oid, V::KIND);
        let malformed = |source: Error| Error::MalformedExtension {
            oid: self.oid.clone(),
            source: Box::new(source),
        };
        let node = Element::from_der(self.value.as_bytes()).map_err(|e| malformed(e.into()))?;
        V::from_node(&node).map_err(malformed)
    }

    /// Decodes the value as the typed extension registered for this OID.
    pub fn parse<T: Extension>(&self) -> Result<T, Error> {
        let expected = T::oid()?;
        if self.oid != expected {
            return Err(Error::invalid(
                Kind::Extension,
                format!("expected extension {}, got {}", expected, self.oid),
            ));
        }
        self.decode_as()
    }
}

impl DecodableFrom<Element> for RawExtension {}

impl Decoder<Element, RawExtension> for Element {
    type Error = Error;

    fn decode(&self) -> Result<RawExtension, Self::Error> {
        let kind = Kind::Extension;
        let elements = resolve::sequence(kind, self, 2, 3)?;
        let oid = resolve::oid(kind, &elements[0])?.clone();
        let (critical, value) = match elements {
            [_, value] => (false, value),
            [_, critical, value] => (resolve::boolean(kind, critical)?, value),
            _ => return Err(Error::element_count(kind, 2, Some(3), elements.len())),
        };
        Ok(RawExtension {
            oid,
            critical,
            value: resolve::octet_string(kind, value)?.clone(),
        })
    }
}

impl EncodableTo<RawExtension> for Element {}

impl Encoder<RawExtension, Element> for RawExtension {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = vec![Element::ObjectIdentifier(self.oid.clone())];
        // DEFAULT FALSE is never encoded.
        if self.critical {
            elements.push(Element::Boolean(true));
        }
        elements.push(Element::OctetString(self.value.clone()));
        Ok(Element::Sequence(elements))
    }
}

resolvable!(RawExtension, Extension);

/// Ordered extension registry ([RFC 5280 Section 4.1.2.9](https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.9)).
///
/// Entries keep the order they were decoded or added in, and an OID appears
/// at most once. The registry stores opaque values only; callers choose the
/// type to decode a value as with [`Extensions::decode_as`] or
/// [`Extensions::extension`].
///
/// # ASN.1 Structure
/// ```text
/// Extensions ::= SEQUENCE SIZE (1..MAX) OF Extension
/// ```
///
/// The explicit context tag the registry sits under (`[3]` in a
/// TBSCertificate, `[0]` in a TBSCertList) belongs to the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extensions {
    extensions: Vec<RawExtension>,
}

impl Extensions {
    /// Rejects an empty list and repeated OIDs.
    pub fn new(extensions: Vec<RawExtension>) -> Result<Self, Error> {
        resolve::check_count(Kind::Extensions, extensions.len(), 1, None)?;
        for (i, ext) in extensions.iter().enumerate() {
            if extensions[..i].iter().any(|seen| seen.oid == ext.oid) {
                return Err(Error::schema(
                    Kind::Extensions,
                    Violation::DuplicateExtension(ext.oid.clone()),
                ));
            }
        }
        Ok(Extensions { extensions })
    }

    pub fn extensions(&self) -> &[RawExtension] {
        &self.extensions
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn oids(&self) -> impl Iterator<Item = &ObjectIdentifier> {
        self.extensions.iter().map(RawExtension::oid)
    }

    pub fn critical_oids(&self) -> impl Iterator<Item = &ObjectIdentifier> {
        self.extensions
            .iter()
            .filter(|ext| ext.critical)
            .map(RawExtension::oid)
    }

    pub fn get(&self, oid: &ObjectIdentifier) -> Option<&RawExtension> {
        self.extensions.iter().find(|ext| &ext.oid == oid)
    }

    /// Decodes the value stored under `oid` as `V`. `Ok(None)` when the OID
    /// is absent.
    pub fn decode_as<V: Resolve>(&self, oid: impl AsOid) -> Result<Option<V>, Error> {
        let oid = oid.as_oid()?;
        self.get(&oid).map(|ext| ext.decode_as::<V>()).transpose()
    }

    /// Decodes the extension registered for `T`, if present.
    pub fn extension<T: Extension>(&self) -> Result<Option<T>, Error> {
        self.decode_as(T::oid()?)
    }
}

impl DecodableFrom<Element> for Extensions {}

impl Decoder<Element, Extensions> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Extensions, Self::Error> {
        let extensions = resolve::sequence_of(Kind::Extensions, self)?
            .iter()
            .map(RawExtension::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        Extensions::new(extensions)
    }
}

impl EncodableTo<Extensions> for Element {}

impl Encoder<Extensions, Element> for Extensions {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| ext.to_node())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Element::Sequence(extensions))
    }
}

resolvable!(Extensions, Extensions);

/// Accumulates extensions in insertion order. Repeated OIDs are rejected when
/// added.
#[derive(Debug, Clone, Default)]
pub struct ExtensionsGenerator {
    extensions: Vec<RawExtension>,
}

impl ExtensionsGenerator {
    pub fn new() -> Self {
        ExtensionsGenerator::default()
    }

    /// Encodes a typed extension value and adds it under its registered OID.
    pub fn add_extension<T: Extension>(
        &mut self,
        critical: bool,
        value: &T,
    ) -> Result<&mut Self, Error> {
        let octets = value.to_der()?;
        self.add_raw(T::oid()?, critical, OctetString::from(octets))
    }

    /// Adds an already encoded value.
    pub fn add_raw(
        &mut self,
        oid: impl AsOid,
        critical: bool,
        value: OctetString,
    ) -> Result<&mut Self, Error> {
        let oid = oid.as_oid()?;
        if self.has(&oid) {
            return Err(Error::schema(
                Kind::Extensions,
                Violation::DuplicateExtension(oid),
            ));
        }
        self.extensions.push(RawExtension::new(oid, critical, value));
        Ok(self)
    }

    pub fn has(&self, oid: &ObjectIdentifier) -> bool {
        self.extensions.iter().any(|ext| &ext.oid == oid)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn reset(&mut self) {
        self.extensions.clear();
    }

    pub fn build(&self) -> Result<Extensions, Error> {
        if self.extensions.is_empty() {
            return Err(Error::incomplete(Kind::Extensions, vec!["extension"]));
        }
        debug!("built {} extensions", self.extensions.len());
        Ok(Extensions {
            extensions: self.extensions.clone(),
        })
    }
}

/// A typed extension value bound to its OID.
///
/// # Example
/// ```no_run
/// use x509::Certificate;
/// use x509::extensions::BasicConstraints;
/// use x509::resolve::Resolve;
///
/// # fn example(der: &[u8]) -> Result<(), x509::error::Error> {
/// let cert = Certificate::from_der(der)?;
/// if let Some(bc) = cert.extension::<BasicConstraints>()? {
///     println!("CA: {}, PathLen: {:?}", bc.ca, bc.path_len_constraint);
/// }
/// # Ok(())
/// # }
/// ```
pub trait Extension: Resolve {
    /// Dotted OID, e.g. "2.5.29.19" for BasicConstraints.
    const OID: &'static str;

    fn oid() -> Result<ObjectIdentifier, Error> {
        Ok(Self::OID.parse()?)
    }

    /// Decodes the content of an extension's OCTET STRING.
    fn parse(value: &OctetString) -> Result<Self, Error> {
        RawExtension::new(Self::oid()?, false, value.clone()).decode_as()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use rstest::rstest;
    use std::str::FromStr;

    fn oid(s: &str) -> ObjectIdentifier {
        ObjectIdentifier::from_str(s).unwrap()
    }

    #[rstest(
        input,
        expected,
        // critical omitted
        case(
            Element::Sequence(vec![
                Element::ObjectIdentifier(oid("2.5.29.19")),
                Element::OctetString(OctetString::from(vec![0x30, 0x00])),
            ]),
            RawExtension::new(oid("2.5.29.19"), false, OctetString::from(vec![0x30, 0x00]))
        ),
        case(
            Element::Sequence(vec![
                Element::ObjectIdentifier(oid("2.5.29.19")),
                Element::Boolean(true),
                Element::OctetString(OctetString::from(vec![0x30, 0x03, 0x01, 0x01, 0xff])),
            ]),
            RawExtension::new(
                oid("2.5.29.19"),
                true,
                OctetString::from(vec![0x30, 0x03, 0x01, 0x01, 0xff])
            )
        ),
    )]
    fn test_raw_extension_decode(input: Element, expected: RawExtension) {
        let ext = RawExtension::from_node(&input).unwrap();
        assert_eq!(expected, ext);
        assert_eq!(input, ext.to_node().unwrap());
    }

    #[rstest(
        input,
        expected,
        case(
            Element::Sequence(vec![Element::ObjectIdentifier(oid("2.5.29.19"))]),
            Violation::ElementCount { min: 2, max: Some(3), actual: 1 }
        ),
        case(
            Element::Sequence(vec![
                Element::ObjectIdentifier(oid("2.5.29.19")),
                Element::Null,
                Element::OctetString(OctetString::from(vec![0x30, 0x00])),
            ]),
            Violation::Expected("BOOLEAN")
        ),
        case(
            Element::Sequence(vec![
                Element::ObjectIdentifier(oid("2.5.29.19")),
                Element::Null,
            ]),
            Violation::Expected("OCTET STRING")
        ),
    )]
    fn test_raw_extension_decode_failure(input: Element, expected: Violation) {
        let err = RawExtension::from_node(&input).unwrap_err();
        assert_eq!(Some(&expected), err.violation());
    }

    #[test]
    fn test_generator_keeps_insertion_order() {
        let mut generator = ExtensionsGenerator::new();
        generator
            .add_raw("2.5.29.15", true, OctetString::from(hex!("03 02 05 a0").to_vec()))
            .unwrap()
            .add_raw("2.5.29.17", false, OctetString::from(hex!("30 03 82 01 61").to_vec()))
            .unwrap();
        let extensions = generator.build().unwrap();
        let der = extensions.to_der().unwrap();
        assert_eq!(
            hex!(
                "30 1e 30 0e 06 03 55 1d 0f 01 01 ff 04 04 03 02 05 a0
                 30 0c 06 03 55 1d 11 04 05 30 03 82 01 61"
            )
            .to_vec(),
            der
        );
        let decoded = Extensions::from_der(&der).unwrap();
        let oids = decoded.oids().map(|o| o.to_string()).collect::<Vec<_>>();
        assert_eq!(vec!["2.5.29.15", "2.5.29.17"], oids);
        assert_eq!(vec![&oid("2.5.29.15")], decoded.critical_oids().collect::<Vec<_>>());
    }

    #[test]
    fn test_generator_rejects_duplicate_at_add_time() {
        let mut generator = ExtensionsGenerator::new();
        generator
            .add_raw("2.5.29.19", true, OctetString::from(vec![0x30, 0x00]))
            .unwrap();
        let err = generator
            .add_raw("2.5.29.19", false, OctetString::from(vec![0x30, 0x00]))
            .unwrap_err();
        assert_eq!(
            Some(&Violation::DuplicateExtension(oid("2.5.29.19"))),
            err.violation()
        );
        assert_eq!(1, generator.build().unwrap().len());
    }

    #[test]
    fn test_generator_without_extensions_is_incomplete() {
        let err = ExtensionsGenerator::new().build().unwrap_err();
        assert!(matches!(err, Error::IncompleteStructure { kind: Kind::Extensions, .. }));
    }

    #[test]
    fn test_extensions_reject_duplicates_on_decode() {
        let ext = Element::Sequence(vec![
            Element::ObjectIdentifier(oid("2.5.29.19")),
            Element::OctetString(OctetString::from(vec![0x30, 0x00])),
        ]);
        let err = Extensions::from_node(&Element::Sequence(vec![ext.clone(), ext])).unwrap_err();
        assert_eq!(
            Some(&Violation::DuplicateExtension(oid("2.5.29.19"))),
            err.violation()
        );
        let err = Extensions::from_node(&Element::Sequence(vec![])).unwrap_err();
        assert_eq!(
            Some(&Violation::ElementCount { min: 1, max: None, actual: 0 }),
            err.violation()
        );
    }

    #[test]
    fn test_decode_as_wraps_failures_as_malformed_extension() {
        let mut generator = ExtensionsGenerator::new();
        generator
            // not DER at all
            .add_raw("2.5.29.19", true, OctetString::from(vec![0x30, 0x05, 0x01]))
            .unwrap()
            // DER, but a BIT STRING where BasicConstraints needs a SEQUENCE
            .add_raw("2.5.29.14", false, OctetString::from(hex!("03 02 05 a0").to_vec()))
            .unwrap();
        let extensions = generator.build().unwrap();

        let err = extensions.extension::<BasicConstraints>().unwrap_err();
        assert!(matches!(
            &err,
            Error::MalformedExtension { oid: o, source }
                if o == &oid("2.5.29.19") && matches!(**source, Error::Asn1(_))
        ));

        let err = extensions.extension::<SubjectKeyIdentifier>().unwrap_err();
        let Error::MalformedExtension { source, .. } = err else {
            panic!("expected MalformedExtension");
        };
        assert!(matches!(*source, Error::SchemaViolation { kind: Kind::SubjectKeyIdentifier, .. }));

        assert!(extensions.extension::<KeyUsage>().unwrap().is_none());
    }

    #[test]
    fn test_parse_checks_oid() {
        let value = OctetString::from(hex!("03 02 05 a0").to_vec());
        let ext = RawExtension::new(oid("2.5.29.15"), true, value);
        assert!(ext.parse::<KeyUsage>().unwrap().digital_signature);
        assert!(ext.parse::<BasicConstraints>().is_err());
    }
}
