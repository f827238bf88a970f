use asn1::{Element, OctetString};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::algorithm::SubjectPublicKeyInfo;
use crate::error::{Error, Kind};
use crate::extensions::Extension;
use crate::key_identifier;
use crate::oid;
use crate::resolve::{self, resolvable};

/*
RFC 5280 Section 4.2.1.2
SubjectKeyIdentifier ::= KeyIdentifier
KeyIdentifier ::= OCTET STRING
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectKeyIdentifier {
    pub key_identifier: OctetString,
}

impl SubjectKeyIdentifier {
    pub fn new(key_identifier: OctetString) -> Self {
        SubjectKeyIdentifier { key_identifier }
    }

    /// 20-byte SHA-1 identifier of the public key.
    pub fn from_public_key(spki: &SubjectPublicKeyInfo) -> Self {
        SubjectKeyIdentifier::new(key_identifier::key_identifier(spki))
    }

    /// 8-byte identifier, see [`key_identifier::truncated_key_identifier`].
    pub fn from_public_key_truncated(spki: &SubjectPublicKeyInfo) -> Self {
        SubjectKeyIdentifier::new(key_identifier::truncated_key_identifier(spki))
    }
}

impl Extension for SubjectKeyIdentifier {
    const OID: &'static str = oid::SUBJECT_KEY_IDENTIFIER;
}

impl DecodableFrom<Element> for SubjectKeyIdentifier {}

impl Decoder<Element, SubjectKeyIdentifier> for Element {
    type Error = Error;

    fn decode(&self) -> Result<SubjectKeyIdentifier, Self::Error> {
        let octets = resolve::octet_string(Kind::SubjectKeyIdentifier, self)?;
        Ok(SubjectKeyIdentifier::new(octets.clone()))
    }
}

impl EncodableTo<SubjectKeyIdentifier> for Element {}

impl Encoder<SubjectKeyIdentifier, Element> for SubjectKeyIdentifier {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::OctetString(self.key_identifier.clone()))
    }
}

resolvable!(SubjectKeyIdentifier, SubjectKeyIdentifier);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_identifier::tests::ed25519_spki;
    use crate::resolve::Resolve;
    use hex_literal::hex;

    #[test]
    fn test_subject_key_identifier_from_public_key() {
        let ski = SubjectKeyIdentifier::from_public_key(&ed25519_spki());
        assert_eq!(
            hex!("04 14 a2 8c c1 f8 6e 59 60 d3 e0 3a e7 5c 96 2c 97 a8 d4 48 29 3c").to_vec(),
            ski.to_der().unwrap()
        );
        let truncated = SubjectKeyIdentifier::from_public_key_truncated(&ed25519_spki());
        assert_eq!(8, truncated.key_identifier.as_bytes().len());
    }

    #[test]
    fn test_subject_key_identifier_round_trip() {
        let der = hex!("04 08 46 2c 97 a8 d4 48 29 3c");
        let ski = SubjectKeyIdentifier::from_der(&der).unwrap();
        assert_eq!(hex!("462c97a8d448293c").as_slice(), ski.key_identifier.as_bytes());
        assert_eq!(der.to_vec(), ski.to_der().unwrap());
    }
}
