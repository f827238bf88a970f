use asn1::{Element, UniversalTag};
use log::trace;
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::attribute_cert::{IssuerSerial, ObjectDigestInfo};
use crate::error::{Error, Kind};
use crate::general_name::GeneralNames;
use crate::resolve::{self, Resolve, resolvable};

/*
RFC 5755 Section 4.1
AttCertIssuer ::= CHOICE {
     v1Form   GeneralNames,  -- MUST NOT be used in this
                             -- profile
     v2Form   [0] V2Form     -- v2 only
}

V2Form ::= SEQUENCE {
     issuerName            GeneralNames  OPTIONAL,
     baseCertificateID     [0] IssuerSerial  OPTIONAL,
     objectDigestInfo      [1] ObjectDigestInfo  OPTIONAL
}
*/

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V2Form {
    pub issuer_name: Option<GeneralNames>,
    pub base_certificate_id: Option<IssuerSerial>,
    pub object_digest_info: Option<ObjectDigestInfo>,
}

impl V2Form {
    pub fn new(issuer_name: GeneralNames) -> Self {
        V2Form {
            issuer_name: Some(issuer_name),
            ..Default::default()
        }
    }
}

impl DecodableFrom<Element> for V2Form {}

impl Decoder<Element, V2Form> for Element {
    type Error = Error;

    fn decode(&self) -> Result<V2Form, Self::Error> {
        let kind = Kind::V2Form;
        let elements = resolve::sequence(kind, self, 0, 3)?;
        let (issuer_name, rest) = match elements.split_first() {
            Some((first @ Element::Sequence(_), rest)) => {
                (Some(GeneralNames::from_node(first)?), rest)
            }
            _ => (None, elements),
        };
        let [id, digest] = resolve::tagged_fields::<2>(kind, rest, 0)?;
        Ok(V2Form {
            issuer_name,
            base_certificate_id: id
                .map(|t| resolve::from_implicit(t, UniversalTag::Sequence))
                .transpose()?,
            object_digest_info: digest
                .map(|t| resolve::from_implicit(t, UniversalTag::Sequence))
                .transpose()?,
        })
    }
}

impl EncodableTo<V2Form> for Element {}

impl Encoder<V2Form, Element> for V2Form {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = Vec::new();
        if let Some(names) = &self.issuer_name {
            elements.push(names.to_node()?);
        }
        if let Some(id) = &self.base_certificate_id {
            elements.push(resolve::to_implicit(id, 0)?);
        }
        if let Some(info) = &self.object_digest_info {
            elements.push(resolve::to_implicit(info, 1)?);
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(V2Form, V2Form);

/// The issuer of an attribute certificate. Both forms decode; only
/// [`AttCertIssuer::V2Form`] is accepted when building a new certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttCertIssuer {
    V1Form(GeneralNames),
    V2Form(V2Form),
}

impl AttCertIssuer {
    pub fn issuer_name(&self) -> Option<&GeneralNames> {
        match self {
            AttCertIssuer::V1Form(names) => Some(names),
            AttCertIssuer::V2Form(form) => form.issuer_name.as_ref(),
        }
    }
}

impl From<V2Form> for AttCertIssuer {
    fn from(form: V2Form) -> Self {
        AttCertIssuer::V2Form(form)
    }
}

impl DecodableFrom<Element> for AttCertIssuer {}

impl Decoder<Element, AttCertIssuer> for Element {
    type Error = Error;

    fn decode(&self) -> Result<AttCertIssuer, Self::Error> {
        let kind = Kind::AttCertIssuer;
        match self {
            Element::Sequence(_) => {
                trace!("AttCertIssuer v1Form");
                Ok(AttCertIssuer::V1Form(GeneralNames::from_node(self)?))
            }
            Element::Tagged(_) => {
                let tagged = resolve::tagged(kind, self)?;
                trace!("AttCertIssuer alternative [{}]", tagged.number());
                match tagged.number() {
                    0 => Ok(AttCertIssuer::V2Form(resolve::from_implicit(
                        tagged,
                        UniversalTag::Sequence,
                    )?)),
                    other => Err(Error::unexpected_tag(kind, other)),
                }
            }
            _ => Err(Error::expected(kind, "SEQUENCE or context-specific tagged value")),
        }
    }
}

impl EncodableTo<AttCertIssuer> for Element {}

impl Encoder<AttCertIssuer, Element> for AttCertIssuer {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        match self {
            AttCertIssuer::V1Form(names) => names.to_node(),
            AttCertIssuer::V2Form(form) => resolve::to_implicit(form, 0),
        }
    }
}

resolvable!(AttCertIssuer, AttCertIssuer);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute_cert::holder::tests::issuer_serial;
    use crate::error::Violation;
    use crate::general_name::GeneralName;
    use hex_literal::hex;
    use rstest::rstest;

    fn names(dns: &str) -> GeneralNames {
        GeneralName::DnsName(dns.to_string()).into()
    }

    #[rstest(
        der,
        expected,
        case(
            hex!("30 05 82 03 61 2e 62").to_vec(),
            AttCertIssuer::V1Form(names("a.b"))
        ),
        // [0] IMPLICIT V2Form { issuerName DNS:a.b }
        case(
            hex!("a0 07 30 05 82 03 61 2e 62").to_vec(),
            AttCertIssuer::V2Form(V2Form::new(names("a.b")))
        ),
        case(hex!("a0 00").to_vec(), AttCertIssuer::V2Form(V2Form::default())),
    )]
    fn test_att_cert_issuer_round_trip(der: Vec<u8>, expected: AttCertIssuer) {
        let issuer = AttCertIssuer::from_der(&der).unwrap();
        assert_eq!(expected, issuer);
        assert_eq!(der, issuer.to_der().unwrap());
    }

    #[test]
    fn test_v2_form_with_base_certificate_id() {
        let form = V2Form {
            issuer_name: Some(names("issuer")),
            base_certificate_id: Some(issuer_serial()),
            object_digest_info: None,
        };
        let issuer = AttCertIssuer::from(form.clone());
        let decoded = AttCertIssuer::from_der(&issuer.to_der().unwrap()).unwrap();
        assert_eq!(issuer, decoded);
        assert_eq!(Some(&names("issuer")), decoded.issuer_name());

        // baseCertificateID alone, with no issuerName in front
        let form = V2Form {
            base_certificate_id: Some(issuer_serial()),
            ..Default::default()
        };
        assert_eq!(form, V2Form::from_der(&form.to_der().unwrap()).unwrap());
    }

    #[test]
    fn test_att_cert_issuer_rejects_other_tags() {
        let err = AttCertIssuer::from_der(&hex!("a1 00")).unwrap_err();
        assert_eq!(Some(&Violation::UnexpectedTag(1)), err.violation());
    }

    #[test]
    fn test_v2_form_rejects_out_of_order_fields() {
        let err = V2Form::from_der(&hex!("30 04 a1 00 a0 00")).unwrap_err();
        assert_eq!(Some(&Violation::UnexpectedTag(0)), err.violation());
    }
}
