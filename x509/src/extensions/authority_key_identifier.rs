use asn1::{Element, Integer, OctetString, Tagged, UniversalTag};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::algorithm::SubjectPublicKeyInfo;
use crate::error::{Error, Kind};
use crate::extensions::Extension;
use crate::general_name::GeneralNames;
use crate::key_identifier;
use crate::oid;
use crate::resolve::{self, resolvable};

/*
RFC 5280 Section 4.2.1.1
AuthorityKeyIdentifier ::= SEQUENCE {
    keyIdentifier             [0] KeyIdentifier           OPTIONAL,
    authorityCertIssuer       [1] GeneralNames            OPTIONAL,
    authorityCertSerialNumber [2] CertificateSerialNumber OPTIONAL  }
*/

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Option<OctetString>,
    pub authority_cert_issuer: Option<GeneralNames>,
    pub authority_cert_serial_number: Option<Integer>,
}

impl AuthorityKeyIdentifier {
    /// Only the key identifier, derived from the issuer's public key.
    pub fn from_public_key(spki: &SubjectPublicKeyInfo) -> Self {
        AuthorityKeyIdentifier {
            key_identifier: Some(key_identifier::key_identifier(spki)),
            ..Default::default()
        }
    }

    /// Key identifier plus the issuer name and serial of the issuer's certificate.
    pub fn from_public_key_and_issuer(
        spki: &SubjectPublicKeyInfo,
        issuer: GeneralNames,
        serial_number: Integer,
    ) -> Self {
        AuthorityKeyIdentifier {
            key_identifier: Some(key_identifier::key_identifier(spki)),
            authority_cert_issuer: Some(issuer),
            authority_cert_serial_number: Some(serial_number),
        }
    }
}

impl Extension for AuthorityKeyIdentifier {
    const OID: &'static str = oid::AUTHORITY_KEY_IDENTIFIER;
}

impl DecodableFrom<Element> for AuthorityKeyIdentifier {}

impl Decoder<Element, AuthorityKeyIdentifier> for Element {
    type Error = Error;

    fn decode(&self) -> Result<AuthorityKeyIdentifier, Self::Error> {
        let kind = Kind::AuthorityKeyIdentifier;
        let elements = resolve::sequence(kind, self, 0, 3)?;
        let [key_id, issuer, serial] = resolve::tagged_fields::<3>(kind, elements, 0)?;

        let key_identifier = key_id
            .map(|t| {
                let node = t.implicit_as(UniversalTag::OctetString)?;
                Ok::<_, Error>(resolve::octet_string(kind, &node)?.clone())
            })
            .transpose()?;
        let authority_cert_issuer = issuer
            .map(|t| resolve::from_implicit::<GeneralNames>(t, UniversalTag::Sequence))
            .transpose()?;
        let authority_cert_serial_number = serial
            .map(|t| {
                let node = t.implicit_as(UniversalTag::Integer)?;
                Ok::<_, Error>(resolve::integer(kind, &node)?.clone())
            })
            .transpose()?;

        // RFC 5280: issuer and serial appear together or not at all
        if authority_cert_issuer.is_some() != authority_cert_serial_number.is_some() {
            return Err(Error::invalid(
                kind,
                "authorityCertIssuer and authorityCertSerialNumber must both be present or absent",
            ));
        }

        Ok(AuthorityKeyIdentifier {
            key_identifier,
            authority_cert_issuer,
            authority_cert_serial_number,
        })
    }
}

impl EncodableTo<AuthorityKeyIdentifier> for Element {}

impl Encoder<AuthorityKeyIdentifier, Element> for AuthorityKeyIdentifier {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = Vec::new();
        if let Some(key_id) = &self.key_identifier {
            elements.push(Tagged::implicit(0, &Element::OctetString(key_id.clone()))?.into());
        }
        if let Some(issuer) = &self.authority_cert_issuer {
            elements.push(resolve::to_implicit(issuer, 1)?);
        }
        if let Some(serial) = &self.authority_cert_serial_number {
            elements.push(Tagged::implicit(2, &Element::Integer(serial.clone()))?.into());
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(AuthorityKeyIdentifier, AuthorityKeyIdentifier);
