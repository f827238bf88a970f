use asn1::{BitString, Element, Integer, ObjectIdentifier, UniversalTag};
use log::trace;
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::algorithm::AlgorithmIdentifier;
use crate::error::{Error, Kind};
use crate::general_name::GeneralNames;
use crate::resolve::{self, Resolve, resolvable};

/*
RFC 5755 Section 4.1
IssuerSerial  ::=  SEQUENCE {
     issuer         GeneralNames,
     serial         CertificateSerialNumber,
     issuerUID      UniqueIdentifier OPTIONAL }
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerSerial {
    issuer: GeneralNames,
    serial: Integer,
    issuer_uid: Option<BitString>,
}

impl IssuerSerial {
    pub fn new(issuer: GeneralNames, serial: Integer) -> Self {
        IssuerSerial {
            issuer,
            serial,
            issuer_uid: None,
        }
    }

    pub fn with_issuer_uid(issuer: GeneralNames, serial: Integer, issuer_uid: BitString) -> Self {
        IssuerSerial {
            issuer,
            serial,
            issuer_uid: Some(issuer_uid),
        }
    }

    pub fn issuer(&self) -> &GeneralNames {
        &self.issuer
    }

    pub fn serial(&self) -> &Integer {
        &self.serial
    }

    pub fn issuer_uid(&self) -> Option<&BitString> {
        self.issuer_uid.as_ref()
    }
}

impl DecodableFrom<Element> for IssuerSerial {}

impl Decoder<Element, IssuerSerial> for Element {
    type Error = Error;

    fn decode(&self) -> Result<IssuerSerial, Self::Error> {
        let kind = Kind::IssuerSerial;
        let elements = resolve::sequence(kind, self, 2, 3)?;
        Ok(IssuerSerial {
            issuer: GeneralNames::from_node(&elements[0])?,
            serial: resolve::integer(kind, &elements[1])?.clone(),
            issuer_uid: elements
                .get(2)
                .map(|node| resolve::bit_string(kind, node).cloned())
                .transpose()?,
        })
    }
}

impl EncodableTo<IssuerSerial> for Element {}

impl Encoder<IssuerSerial, Element> for IssuerSerial {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = vec![self.issuer.to_node()?, Element::Integer(self.serial.clone())];
        if let Some(uid) = &self.issuer_uid {
            elements.push(Element::BitString(uid.clone()));
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(IssuerSerial, IssuerSerial);

/*
ObjectDigestInfo    ::= SEQUENCE {
     digestedObjectType  ENUMERATED {
          publicKey            (0),
          publicKeyCert        (1),
          otherObjectTypes     (2) },
                  -- otherObjectTypes MUST NOT
                  -- be used in this profile
     otherObjectTypeID   OBJECT IDENTIFIER  OPTIONAL,
     digestAlgorithm     AlgorithmIdentifier,
     objectDigest        BIT STRING }
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestedObjectType {
    PublicKey = 0,
    PublicKeyCert = 1,
    OtherObjectTypes = 2,
}

impl DigestedObjectType {
    fn from_code(code: i64) -> Result<Self, Error> {
        match code {
            0 => Ok(DigestedObjectType::PublicKey),
            1 => Ok(DigestedObjectType::PublicKeyCert),
            2 => Ok(DigestedObjectType::OtherObjectTypes),
            other => Err(Error::invalid(
                Kind::ObjectDigestInfo,
                format!("unknown digestedObjectType {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDigestInfo {
    digested_object_type: DigestedObjectType,
    other_object_type_id: Option<ObjectIdentifier>,
    digest_algorithm: AlgorithmIdentifier,
    object_digest: BitString,
}

impl ObjectDigestInfo {
    /// `other_object_type_id` must be given exactly when the type is
    /// `OtherObjectTypes`.
    pub fn new(
        digested_object_type: DigestedObjectType,
        other_object_type_id: Option<ObjectIdentifier>,
        digest_algorithm: AlgorithmIdentifier,
        object_digest: BitString,
    ) -> Result<Self, Error> {
        let other = digested_object_type == DigestedObjectType::OtherObjectTypes;
        if other != other_object_type_id.is_some() {
            return Err(Error::invalid(
                Kind::ObjectDigestInfo,
                "otherObjectTypeID is required for otherObjectTypes and only then",
            ));
        }
        Ok(ObjectDigestInfo {
            digested_object_type,
            other_object_type_id,
            digest_algorithm,
            object_digest,
        })
    }

    pub fn digested_object_type(&self) -> DigestedObjectType {
        self.digested_object_type
    }

    pub fn other_object_type_id(&self) -> Option<&ObjectIdentifier> {
        self.other_object_type_id.as_ref()
    }

    pub fn digest_algorithm(&self) -> &AlgorithmIdentifier {
        &self.digest_algorithm
    }

    pub fn object_digest(&self) -> &BitString {
        &self.object_digest
    }
}

impl DecodableFrom<Element> for ObjectDigestInfo {}

impl Decoder<Element, ObjectDigestInfo> for Element {
    type Error = Error;

    fn decode(&self) -> Result<ObjectDigestInfo, Self::Error> {
        let kind = Kind::ObjectDigestInfo;
        let elements = resolve::sequence(kind, self, 3, 4)?;
        let digested_object_type = match &elements[0] {
            Element::Enumerated(code) => {
                DigestedObjectType::from_code(resolve::small_integer(kind, code)?)?
            }
            _ => return Err(Error::expected(kind, "ENUMERATED")),
        };
        let (other_object_type_id, rest) = match elements.len() {
            4 => (Some(resolve::oid(kind, &elements[1])?.clone()), &elements[2..]),
            _ => (None, &elements[1..]),
        };
        ObjectDigestInfo::new(
            digested_object_type,
            other_object_type_id,
            AlgorithmIdentifier::from_node(&rest[0])?,
            resolve::bit_string(kind, &rest[1])?.clone(),
        )
    }
}

impl EncodableTo<ObjectDigestInfo> for Element {}

impl Encoder<ObjectDigestInfo, Element> for ObjectDigestInfo {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = vec![Element::Enumerated(Integer::from(
            self.digested_object_type as i64,
        ))];
        if let Some(id) = &self.other_object_type_id {
            elements.push(Element::ObjectIdentifier(id.clone()));
        }
        elements.push(self.digest_algorithm.to_node()?);
        elements.push(Element::BitString(self.object_digest.clone()));
        Ok(Element::Sequence(elements))
    }
}

resolvable!(ObjectDigestInfo, ObjectDigestInfo);

/*
RFC 5755 Section 4.1
Holder ::= SEQUENCE {
     baseCertificateID   [0] IssuerSerial OPTIONAL,
     entityName          [1] GeneralNames OPTIONAL,
     objectDigestInfo    [2] ObjectDigestInfo OPTIONAL }

X.509 (1997) AttributeCertificateInfoV1 carries a CHOICE instead:
subject CHOICE {
     baseCertificateID   [0] IssuerSerial,
     subjectName         [1] GeneralNames }

The v1 alternatives are explicitly tagged, the v2 fields implicitly.
*/

/// The holder of an attribute certificate, in the shape it was encoded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holder {
    V1(V1Holder),
    V2(V2Holder),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum V1Holder {
    BaseCertificateId(IssuerSerial),
    SubjectName(GeneralNames),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V2Holder {
    pub base_certificate_id: Option<IssuerSerial>,
    pub entity_name: Option<GeneralNames>,
    pub object_digest_info: Option<ObjectDigestInfo>,
}

impl Holder {
    pub fn from_base_certificate_id(id: IssuerSerial) -> Self {
        Holder::V2(V2Holder {
            base_certificate_id: Some(id),
            ..Default::default()
        })
    }

    pub fn from_entity_name(names: GeneralNames) -> Self {
        Holder::V2(V2Holder {
            entity_name: Some(names),
            ..Default::default()
        })
    }

    pub fn from_object_digest_info(info: ObjectDigestInfo) -> Self {
        Holder::V2(V2Holder {
            object_digest_info: Some(info),
            ..Default::default()
        })
    }

    pub fn base_certificate_id(&self) -> Option<&IssuerSerial> {
        match self {
            Holder::V1(V1Holder::BaseCertificateId(id)) => Some(id),
            Holder::V1(V1Holder::SubjectName(_)) => None,
            Holder::V2(holder) => holder.base_certificate_id.as_ref(),
        }
    }

    /// entityName, or subjectName in the v1 shape.
    pub fn entity_name(&self) -> Option<&GeneralNames> {
        match self {
            Holder::V1(V1Holder::SubjectName(names)) => Some(names),
            Holder::V1(V1Holder::BaseCertificateId(_)) => None,
            Holder::V2(holder) => holder.entity_name.as_ref(),
        }
    }

    pub fn object_digest_info(&self) -> Option<&ObjectDigestInfo> {
        match self {
            Holder::V1(_) => None,
            Holder::V2(holder) => holder.object_digest_info.as_ref(),
        }
    }
}

impl DecodableFrom<Element> for Holder {}

impl Decoder<Element, Holder> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Holder, Self::Error> {
        let kind = Kind::Holder;
        match self {
            Element::Sequence(elements) => {
                trace!("Holder in v2 shape");
                resolve::check_count(kind, elements.len(), 0, Some(3))?;
                let [id, name, digest] = resolve::tagged_fields::<3>(kind, elements, 0)?;
                Ok(Holder::V2(V2Holder {
                    base_certificate_id: id
                        .map(|t| resolve::from_implicit(t, UniversalTag::Sequence))
                        .transpose()?,
                    entity_name: name
                        .map(|t| resolve::from_implicit(t, UniversalTag::Sequence))
                        .transpose()?,
                    object_digest_info: digest
                        .map(|t| resolve::from_implicit(t, UniversalTag::Sequence))
                        .transpose()?,
                }))
            }
            Element::Tagged(_) => {
                let tagged = resolve::tagged(kind, self)?;
                trace!("Holder in v1 shape, alternative [{}]", tagged.number());
                match tagged.number() {
                    0 => Ok(Holder::V1(V1Holder::BaseCertificateId(
                        resolve::from_explicit(tagged)?,
                    ))),
                    1 => Ok(Holder::V1(V1Holder::SubjectName(resolve::from_explicit(tagged)?))),
                    other => Err(Error::unexpected_tag(kind, other)),
                }
            }
            _ => Err(Error::expected(kind, "SEQUENCE or context-specific tagged value")),
        }
    }
}

impl EncodableTo<Holder> for Element {}

impl Encoder<Holder, Element> for Holder {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        match self {
            Holder::V1(V1Holder::BaseCertificateId(id)) => resolve::to_explicit(id, 0),
            Holder::V1(V1Holder::SubjectName(names)) => resolve::to_explicit(names, 1),
            Holder::V2(holder) => {
                let mut elements = Vec::new();
                if let Some(id) = &holder.base_certificate_id {
                    elements.push(resolve::to_implicit(id, 0)?);
                }
                if let Some(names) = &holder.entity_name {
                    elements.push(resolve::to_implicit(names, 1)?);
                }
                if let Some(info) = &holder.object_digest_info {
                    elements.push(resolve::to_implicit(info, 2)?);
                }
                Ok(Element::Sequence(elements))
            }
        }
    }
}

resolvable!(Holder, Holder);

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::algorithm::AlgorithmParameters;
    use crate::error::Violation;
    use crate::general_name::GeneralName;
    use hex_literal::hex;
    use rstest::rstest;

    pub(crate) fn issuer_serial() -> IssuerSerial {
        IssuerSerial::new(
            GeneralName::DnsName("ca.example".to_string()).into(),
            Integer::from(42i64),
        )
    }

    fn sha256() -> AlgorithmIdentifier {
        AlgorithmIdentifier::new(
            "2.16.840.1.101.3.4.2.1".parse::<ObjectIdentifier>().unwrap(),
            AlgorithmParameters::Absent,
        )
    }

    #[rstest(
        der,
        case::without_uid(
            hex!("30 11 30 0c 82 0a 63 61 2e 65 78 61 6d 70 6c 65 02 01 2a").to_vec()
        ),
        case::with_uid(
            hex!("30 15 30 0c 82 0a 63 61 2e 65 78 61 6d 70 6c 65 02 01 2a 03 02 00 ff").to_vec()
        ),
    )]
    fn test_issuer_serial_round_trip(der: Vec<u8>) {
        let issuer_serial = IssuerSerial::from_der(&der).unwrap();
        assert_eq!(ca_names(), issuer_serial.issuer().clone());
        assert_eq!(Integer::from(42i64), *issuer_serial.serial());
        assert_eq!(der, issuer_serial.to_der().unwrap());
    }

    fn ca_names() -> GeneralNames {
        GeneralName::DnsName("ca.example".to_string()).into()
    }

    #[rstest(
        len,
        ok,
        case(1, false),
        case(2, true),
        case(3, true),
        case(4, false),
    )]
    fn test_issuer_serial_field_count(len: usize, ok: bool) {
        let full = vec![
            ca_names().to_node().unwrap(),
            Element::Integer(Integer::from(1i64)),
            Element::BitString(BitString::new(0, vec![0x01]).unwrap()),
            Element::Null,
        ];
        let node = Element::Sequence(full.into_iter().take(len).collect());
        assert_eq!(ok, IssuerSerial::from_node(&node).is_ok());
    }

    #[test]
    fn test_object_digest_info_requires_other_id_only_for_other_types() {
        let digest = BitString::new(0, vec![0u8; 32]).unwrap();
        let digest_info = |kind, id: Option<&ObjectIdentifier>| {
            ObjectDigestInfo::new(kind, id.cloned(), sha256(), digest.clone())
        };
        assert!(digest_info(DigestedObjectType::PublicKey, None).is_ok());
        assert!(digest_info(DigestedObjectType::OtherObjectTypes, None).is_err());
        let id = "1.2.3.4".parse::<ObjectIdentifier>().unwrap();
        assert!(digest_info(DigestedObjectType::PublicKeyCert, Some(&id)).is_err());
        let info = digest_info(DigestedObjectType::OtherObjectTypes, Some(&id)).unwrap();
        let decoded = ObjectDigestInfo::from_der(&info.to_der().unwrap()).unwrap();
        assert_eq!(info, decoded);
        assert_eq!(Some(&id), decoded.other_object_type_id());
    }

    #[test]
    fn test_object_digest_info_decode() {
        // publicKey, sha256, two-byte digest
        let der = hex!("30 15 0a 01 00 30 0b 06 09 60 86 48 01 65 03 04 02 01 03 03 00 01 02");
        let info = ObjectDigestInfo::from_der(&der).unwrap();
        assert_eq!(DigestedObjectType::PublicKey, info.digested_object_type());
        assert_eq!(&sha256(), info.digest_algorithm());
        assert_eq!(der.to_vec(), info.to_der().unwrap());

        // digestedObjectType 3
        let err = ObjectDigestInfo::from_der(&hex!(
            "30 15 0a 01 03 30 0b 06 09 60 86 48 01 65 03 04 02 01 03 03 00 01 02"
        ))
        .unwrap_err();
        assert!(matches!(err.violation(), Some(Violation::InvalidValue(_))));
    }

    #[rstest(
        holder,
        case::v2_base_certificate_id(Holder::from_base_certificate_id(issuer_serial())),
        case::v2_entity_name(Holder::from_entity_name(
            GeneralName::Uri("urn:holder".to_string()).into()
        )),
        case::v2_all_fields(Holder::V2(V2Holder {
            base_certificate_id: Some(issuer_serial()),
            entity_name: Some(GeneralName::DnsName("holder".to_string()).into()),
            object_digest_info: Some(
                ObjectDigestInfo::new(
                    DigestedObjectType::PublicKeyCert,
                    None,
                    sha256(),
                    BitString::new(0, vec![0xaa; 32]).unwrap(),
                )
                .unwrap()
            ),
        })),
        case::v1_base_certificate_id(Holder::V1(V1Holder::BaseCertificateId(issuer_serial()))),
        case::v1_subject_name(Holder::V1(V1Holder::SubjectName(
            GeneralName::DnsName("holder".to_string()).into()
        ))),
    )]
    fn test_holder_keeps_shape(holder: Holder) {
        let der = holder.to_der().unwrap();
        let decoded = Holder::from_der(&der).unwrap();
        assert_eq!(holder, decoded);
        assert_eq!(der, decoded.to_der().unwrap());
    }

    #[test]
    fn test_holder_v2_wire_form() {
        // [1] entityName DNS:h
        let der = hex!("30 05 a1 03 82 01 68");
        let holder = Holder::from_der(&der).unwrap();
        assert_eq!(
            Some(&GeneralNames::from(GeneralName::DnsName("h".to_string()))),
            holder.entity_name()
        );
        assert!(holder.base_certificate_id().is_none());
        // v1 subjectName DNS:h, explicit [1] around the GeneralNames SEQUENCE
        let der_v1 = hex!("a1 05 30 03 82 01 68");
        let v1 = Holder::from_der(&der_v1).unwrap();
        assert!(matches!(v1, Holder::V1(V1Holder::SubjectName(_))));
        assert_eq!(holder.entity_name(), v1.entity_name());
        assert_eq!(der_v1.to_vec(), v1.to_der().unwrap());
    }

    #[rstest(
        der,
        expected,
        case(hex!("a2 02 30 00").to_vec(), Violation::UnexpectedTag(2)),
        case(hex!("30 02 83 00").to_vec(), Violation::UnexpectedTag(3)),
        case(
            hex!("05 00").to_vec(),
            Violation::Expected("SEQUENCE or context-specific tagged value")
        ),
    )]
    fn test_holder_decode_failure(der: Vec<u8>, expected: Violation) {
        let err = Holder::from_der(&der).unwrap_err();
        assert_eq!(Some(&expected), err.violation());
    }
}
