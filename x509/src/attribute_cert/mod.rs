//! Attribute certificates, RFC 5755.
//!
//! ```asn1
//! AttributeCertificate ::= SEQUENCE {
//!     acinfo               AttributeCertificateInfo,
//!     signatureAlgorithm   AlgorithmIdentifier,
//!     signatureValue       BIT STRING }
//!
//! AttributeCertificateInfo ::= SEQUENCE {
//!     version              AttCertVersion -- version is v2,
//!     holder               Holder,
//!     issuer               AttCertIssuer,
//!     signature            AlgorithmIdentifier,
//!     serialNumber         CertificateSerialNumber,
//!     attrCertValidityPeriod   AttCertValidityPeriod,
//!     attributes           SEQUENCE OF Attribute,
//!     issuerUniqueID       UniqueIdentifier OPTIONAL,
//!     extensions           Extensions     OPTIONAL }
//!
//! AttCertVersion ::= INTEGER { v2(1) }
//! ```
//!
//! The X.509 (1997) v1 form leaves the version out (DEFAULT v1) and carries
//! its holder as a tagged CHOICE; both forms decode and keep their shape.

mod holder;
mod issuer;

pub use holder::{DigestedObjectType, Holder, IssuerSerial, ObjectDigestInfo, V1Holder, V2Holder};
pub use issuer::{AttCertIssuer, V2Form};

use asn1::{BitString, Element, Integer, ObjectIdentifier};
use chrono::NaiveDateTime;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::algorithm::AlgorithmIdentifier;
use crate::error::{Error, Kind};
use crate::extensions::{Extension, Extensions};
use crate::resolve::{self, Resolve, resolvable};
use crate::time::AttCertValidityPeriod;

/*
Attribute ::= SEQUENCE {
     type      AttributeType,
     values    SET OF AttributeValue }
*/

/// An attribute with its values kept as generic nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    attr_type: ObjectIdentifier,
    values: Vec<Element>,
}

impl Attribute {
    pub fn new(attr_type: ObjectIdentifier, values: Vec<Element>) -> Self {
        Attribute { attr_type, values }
    }

    pub fn attr_type(&self) -> &ObjectIdentifier {
        &self.attr_type
    }

    pub fn values(&self) -> &[Element] {
        &self.values
    }
}

impl DecodableFrom<Element> for Attribute {}

impl Decoder<Element, Attribute> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Attribute, Self::Error> {
        let kind = Kind::Attribute;
        let elements = resolve::sequence(kind, self, 2, 2)?;
        Ok(Attribute {
            attr_type: resolve::oid(kind, &elements[0])?.clone(),
            values: resolve::set_of(kind, &elements[1])?.to_vec(),
        })
    }
}

impl EncodableTo<Attribute> for Element {}

impl Encoder<Attribute, Element> for Attribute {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            Element::ObjectIdentifier(self.attr_type.clone()),
            Element::Set(self.values.clone()),
        ]))
    }
}

resolvable!(Attribute, Attribute);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttCertVersion {
    /// No version field on the wire.
    V1,
    /// Encoded as INTEGER 1.
    V2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCertificateInfo {
    version: AttCertVersion,
    holder: Holder,
    issuer: AttCertIssuer,
    signature: AlgorithmIdentifier,
    serial_number: Integer,
    attr_cert_validity_period: AttCertValidityPeriod,
    attributes: Vec<Attribute>,
    issuer_unique_id: Option<BitString>,
    extensions: Option<Extensions>,
}

impl AttributeCertificateInfo {
    pub fn version(&self) -> AttCertVersion {
        self.version
    }

    pub fn holder(&self) -> &Holder {
        &self.holder
    }

    pub fn issuer(&self) -> &AttCertIssuer {
        &self.issuer
    }

    pub fn signature(&self) -> &AlgorithmIdentifier {
        &self.signature
    }

    pub fn serial_number(&self) -> &Integer {
        &self.serial_number
    }

    pub fn attr_cert_validity_period(&self) -> &AttCertValidityPeriod {
        &self.attr_cert_validity_period
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn issuer_unique_id(&self) -> Option<&BitString> {
        self.issuer_unique_id.as_ref()
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
}

impl DecodableFrom<Element> for AttributeCertificateInfo {}

impl Decoder<Element, AttributeCertificateInfo> for Element {
    type Error = Error;

    fn decode(&self) -> Result<AttributeCertificateInfo, Self::Error> {
        let kind = Kind::AttributeCertificateInfo;
        let elements = resolve::sequence(kind, self, 6, 9)?;
        let (version, fields) = match elements.split_first() {
            Some((Element::Integer(integer), rest)) => match integer.to_i64() {
                Some(1) => (AttCertVersion::V2, rest),
                _ => {
                    return Err(Error::invalid(
                        kind,
                        format!("unknown attribute certificate version {}", integer),
                    ));
                }
            },
            _ => (AttCertVersion::V1, elements),
        };
        trace!("AttributeCertificateInfo {:?}", version);
        if fields.len() < 6 {
            return Err(Error::element_count(kind, 7, Some(9), elements.len()));
        }
        let (base, trailing) = fields.split_at(6);

        let mut trailing = trailing.iter().peekable();
        let issuer_unique_id = trailing
            .next_if(|node| matches!(node, Element::BitString(_)))
            .map(|node| resolve::bit_string(kind, node).cloned())
            .transpose()?;
        let extensions = trailing.next().map(Extensions::from_node).transpose()?;
        if trailing.next().is_some() {
            return Err(Error::invalid(kind, "unexpected field after extensions"));
        }

        Ok(AttributeCertificateInfo {
            version,
            holder: Holder::from_node(&base[0])?,
            issuer: AttCertIssuer::from_node(&base[1])?,
            signature: AlgorithmIdentifier::from_node(&base[2])?,
            serial_number: resolve::integer(kind, &base[3])?.clone(),
            attr_cert_validity_period: AttCertValidityPeriod::from_node(&base[4])?,
            attributes: resolve::sequence_of(kind, &base[5])?
                .iter()
                .map(Attribute::from_node)
                .collect::<Result<Vec<_>, _>>()?,
            issuer_unique_id,
            extensions,
        })
    }
}

impl EncodableTo<AttributeCertificateInfo> for Element {}

impl Encoder<AttributeCertificateInfo, Element> for AttributeCertificateInfo {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = Vec::with_capacity(9);
        if self.version == AttCertVersion::V2 {
            elements.push(Element::Integer(Integer::from(1i64)));
        }
        elements.push(self.holder.to_node()?);
        elements.push(self.issuer.to_node()?);
        elements.push(self.signature.to_node()?);
        elements.push(Element::Integer(self.serial_number.clone()));
        elements.push(self.attr_cert_validity_period.to_node()?);
        elements.push(Element::Sequence(
            self.attributes
                .iter()
                .map(|attribute| attribute.to_node())
                .collect::<Result<Vec<_>, _>>()?,
        ));
        if let Some(uid) = &self.issuer_unique_id {
            elements.push(Element::BitString(uid.clone()));
        }
        if let Some(extensions) = &self.extensions {
            elements.push(extensions.to_node()?);
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(AttributeCertificateInfo, AttributeCertificateInfo);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCertificate {
    acinfo: AttributeCertificateInfo,
    signature_algorithm: AlgorithmIdentifier,
    signature_value: BitString,
}

impl AttributeCertificate {
    pub fn new(
        acinfo: AttributeCertificateInfo,
        signature_algorithm: AlgorithmIdentifier,
        signature_value: BitString,
    ) -> Self {
        AttributeCertificate {
            acinfo,
            signature_algorithm,
            signature_value,
        }
    }

    pub fn acinfo(&self) -> &AttributeCertificateInfo {
        &self.acinfo
    }

    pub fn signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.signature_algorithm
    }

    pub fn signature_value(&self) -> &BitString {
        &self.signature_value
    }
}

impl DecodableFrom<Element> for AttributeCertificate {}

impl Decoder<Element, AttributeCertificate> for Element {
    type Error = Error;

    fn decode(&self) -> Result<AttributeCertificate, Self::Error> {
        let kind = Kind::AttributeCertificate;
        let elements = resolve::sequence(kind, self, 3, 3)?;
        Ok(AttributeCertificate {
            acinfo: AttributeCertificateInfo::from_node(&elements[0])?,
            signature_algorithm: AlgorithmIdentifier::from_node(&elements[1])?,
            signature_value: resolve::bit_string(kind, &elements[2])?.clone(),
        })
    }
}

impl EncodableTo<AttributeCertificate> for Element {}

impl Encoder<AttributeCertificate, Element> for AttributeCertificate {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            self.acinfo.to_node()?,
            self.signature_algorithm.to_node()?,
            Element::BitString(self.signature_value.clone()),
        ]))
    }
}

resolvable!(AttributeCertificate, AttributeCertificate);

/// Builds a v2 AttributeCertificateInfo. The issuer must use the v2 form.
#[derive(Debug, Clone, Default)]
pub struct AttributeCertificateInfoGenerator {
    holder: Option<Holder>,
    issuer: Option<AttCertIssuer>,
    signature: Option<AlgorithmIdentifier>,
    serial_number: Option<Integer>,
    start_date: Option<NaiveDateTime>,
    end_date: Option<NaiveDateTime>,
    attributes: Vec<Attribute>,
    issuer_unique_id: Option<BitString>,
    extensions: Option<Extensions>,
}

impl AttributeCertificateInfoGenerator {
    pub fn new() -> Self {
        AttributeCertificateInfoGenerator::default()
    }

    pub fn set_holder(&mut self, holder: Holder) -> &mut Self {
        self.holder = Some(holder);
        self
    }

    /// Fails with `UnsupportedLegacyForm` for a v1Form issuer.
    pub fn set_issuer(&mut self, issuer: AttCertIssuer) -> Result<&mut Self, Error> {
        if let AttCertIssuer::V1Form(_) = issuer {
            return Err(Error::UnsupportedLegacyForm {
                kind: Kind::AttCertIssuer,
                form: "v1Form issuer",
            });
        }
        self.issuer = Some(issuer);
        Ok(self)
    }

    pub fn set_signature(&mut self, signature: AlgorithmIdentifier) -> &mut Self {
        self.signature = Some(signature);
        self
    }

    pub fn set_serial_number(&mut self, serial_number: Integer) -> &mut Self {
        self.serial_number = Some(serial_number);
        self
    }

    pub fn set_start_date(&mut self, start_date: NaiveDateTime) -> &mut Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn set_end_date(&mut self, end_date: NaiveDateTime) -> &mut Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn add_attribute(&mut self, attribute: Attribute) -> &mut Self {
        self.attributes.push(attribute);
        self
    }

    pub fn set_issuer_unique_id(&mut self, id: BitString) -> &mut Self {
        self.issuer_unique_id = Some(id);
        self
    }

    pub fn set_extensions(&mut self, extensions: Extensions) -> &mut Self {
        self.extensions = Some(extensions);
        self
    }

    pub fn build(&self) -> Result<AttributeCertificateInfo, Error> {
        let (
            Some(holder),
            Some(issuer),
            Some(signature),
            Some(serial_number),
            Some(start_date),
            Some(end_date),
            false,
        ) = (
            &self.holder,
            &self.issuer,
            &self.signature,
            &self.serial_number,
            self.start_date,
            self.end_date,
            self.attributes.is_empty(),
        )
        else {
            let missing = [
                ("holder", self.holder.is_some()),
                ("issuer", self.issuer.is_some()),
                ("signature", self.signature.is_some()),
                ("serial_number", self.serial_number.is_some()),
                ("start_date", self.start_date.is_some()),
                ("end_date", self.end_date.is_some()),
                ("attributes", !self.attributes.is_empty()),
            ]
            .into_iter()
            .filter(|(_, set)| !set)
            .map(|(name, _)| name)
            .collect();
            return Err(Error::incomplete(Kind::AttributeCertificateInfo, missing));
        };
        debug!(
            "built AttributeCertificateInfo, serial {}, {} attributes",
            serial_number,
            self.attributes.len()
        );
        Ok(AttributeCertificateInfo {
            version: AttCertVersion::V2,
            holder: holder.clone(),
            issuer: issuer.clone(),
            signature: signature.clone(),
            serial_number: serial_number.clone(),
            attr_cert_validity_period: AttCertValidityPeriod::new(start_date, end_date),
            attributes: self.attributes.clone(),
            issuer_unique_id: self.issuer_unique_id.clone(),
            extensions: self.extensions.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AlgorithmParameters;
    use crate::error::Violation;
    use crate::extensions::{ExtensionsGenerator, Target, TargetInformation, Targets};
    use crate::general_name::{GeneralName, GeneralNames};
    use super::holder::tests::issuer_serial;
    use rstest::rstest;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn ecdsa_with_sha256() -> AlgorithmIdentifier {
        AlgorithmIdentifier::new(
            "1.2.840.10045.4.3.2".parse::<ObjectIdentifier>().unwrap(),
            AlgorithmParameters::Absent,
        )
    }

    // id-aca-group
    fn group_attribute() -> Attribute {
        Attribute::new(
            "1.3.6.1.5.5.7.10.4".parse::<ObjectIdentifier>().unwrap(),
            vec![Element::UTF8String("admins".to_string())],
        )
    }

    fn issuer() -> AttCertIssuer {
        V2Form::new(GeneralName::DnsName("aa.example".to_string()).into()).into()
    }

    fn generator() -> AttributeCertificateInfoGenerator {
        let mut generator = AttributeCertificateInfoGenerator::new();
        generator
            .set_holder(Holder::from_base_certificate_id(issuer_serial()))
            .set_issuer(issuer())
            .unwrap()
            .set_signature(ecdsa_with_sha256())
            .set_serial_number(Integer::from(100i64))
            .set_start_date(datetime("2024-01-01 00:00:00"))
            .set_end_date(datetime("2024-12-31 23:59:59"))
            .add_attribute(group_attribute());
        generator
    }

    #[test]
    fn test_generator_round_trip() {
        let mut generator = generator();
        let targets = TargetInformation::new(vec![Targets::new(vec![Target::Name(
            GeneralName::DnsName("service.example".to_string()),
        )])])
        .unwrap();
        let mut extensions = ExtensionsGenerator::new();
        extensions.add_extension(true, &targets).unwrap();
        generator.set_extensions(extensions.build().unwrap());

        let info = generator.build().unwrap();
        assert_eq!(AttCertVersion::V2, info.version());
        let der = info.to_der().unwrap();
        let decoded = AttributeCertificateInfo::from_der(&der).unwrap();
        assert_eq!(info, decoded);
        assert_eq!(der, decoded.to_der().unwrap());
        assert_eq!(Some(targets), decoded.extension::<TargetInformation>().unwrap());
        assert_eq!(&[group_attribute()], decoded.attributes());
    }

    #[test]
    fn test_generator_rejects_v1_form_issuer() {
        let names: GeneralNames = GeneralName::DnsName("aa.example".to_string()).into();
        let err = AttributeCertificateInfoGenerator::new()
            .set_issuer(AttCertIssuer::V1Form(names))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedLegacyForm { kind: Kind::AttCertIssuer, .. }
        ));
    }

    #[test]
    fn test_generator_lists_missing_fields() {
        let err = AttributeCertificateInfoGenerator::new().build().unwrap_err();
        assert_eq!(
            "AttributeCertificateInfo: incomplete structure, missing holder, issuer, signature, \
             serial_number, start_date, end_date, attributes",
            err.to_string()
        );

        let mut generator = generator();
        generator.attributes.clear();
        let err = generator.build().unwrap_err();
        assert!(matches!(
            &err,
            Error::IncompleteStructure { missing, .. } if missing == &vec!["attributes"]
        ));
        generator.add_attribute(group_attribute());
        assert!(generator.build().is_ok());
    }

    fn info_fields() -> Vec<Element> {
        let Element::Sequence(elements) = generator().build().unwrap().to_node().unwrap() else {
            panic!("expected SEQUENCE");
        };
        elements
    }

    #[test]
    fn test_v1_shape_without_version() {
        let mut elements = info_fields()[1..].to_vec();
        elements[0] = Holder::V1(V1Holder::BaseCertificateId(issuer_serial()))
            .to_node()
            .unwrap();
        elements[1] = AttCertIssuer::V1Form(GeneralName::DnsName("aa.example".to_string()).into())
            .to_node()
            .unwrap();
        let node = Element::Sequence(elements);
        let info = AttributeCertificateInfo::from_node(&node).unwrap();
        assert_eq!(AttCertVersion::V1, info.version());
        assert!(matches!(info.holder(), Holder::V1(_)));
        assert!(matches!(info.issuer(), AttCertIssuer::V1Form(_)));
        assert_eq!(node, info.to_node().unwrap());
    }

    #[test]
    fn test_field_count_bounds() {
        let mut elements = info_fields();
        // version and the six mandatory fields
        assert_eq!(7, elements.len());
        elements.push(Element::BitString(BitString::new(0, vec![0x01]).unwrap()));
        let mut extensions = ExtensionsGenerator::new();
        extensions
            .add_raw("2.5.29.56", false, asn1::OctetString::from(vec![0x05, 0x00]))
            .unwrap();
        elements.push(extensions.build().unwrap().to_node().unwrap());
        let info =
            AttributeCertificateInfo::from_node(&Element::Sequence(elements.clone())).unwrap();
        assert!(info.issuer_unique_id().is_some());
        assert!(info.extensions().is_some());

        elements.push(Element::Null);
        let err = AttributeCertificateInfo::from_node(&Element::Sequence(elements)).unwrap_err();
        assert_eq!(
            Some(&Violation::ElementCount { min: 6, max: Some(9), actual: 10 }),
            err.violation()
        );

        let truncated = Element::Sequence(info_fields()[1..6].to_vec());
        let err = AttributeCertificateInfo::from_node(&truncated).unwrap_err();
        assert_eq!(
            Some(&Violation::ElementCount { min: 6, max: Some(9), actual: 5 }),
            err.violation()
        );
    }

    #[rstest(version, case(0), case(2))]
    fn test_rejects_unknown_version(version: i64) {
        let mut elements = info_fields();
        elements[0] = Element::Integer(Integer::from(version));
        let err = AttributeCertificateInfo::from_node(&Element::Sequence(elements)).unwrap_err();
        assert!(matches!(err.violation(), Some(Violation::InvalidValue(_))));
    }

    #[test]
    fn test_attribute_certificate_round_trip() {
        let acinfo = generator().build().unwrap();
        let signature = BitString::new(0, vec![0x30, 0x00]).unwrap();
        let cert = AttributeCertificate::new(acinfo, ecdsa_with_sha256(), signature);
        let der = cert.to_der().unwrap();
        let decoded = AttributeCertificate::from_der(&der).unwrap();
        assert_eq!(cert, decoded);
        assert_eq!(der, decoded.to_der().unwrap());
    }

    #[test]
    fn test_attribute_requires_set_of_values() {
        let node = Element::Sequence(vec![
            Element::ObjectIdentifier("2.5.4.72".parse::<ObjectIdentifier>().unwrap()),
            Element::Sequence(vec![]),
        ]);
        let err = Attribute::from_node(&node).unwrap_err();
        assert_eq!(Some(&Violation::Expected("SET")), err.violation());
    }
}
