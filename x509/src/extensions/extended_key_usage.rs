use asn1::{Element, ObjectIdentifier};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind};
use crate::extensions::Extension;
use crate::oid;
use crate::resolve::{self, resolvable};

/*
RFC 5280 Section 4.2.1.12
ExtendedKeyUsage ::= SEQUENCE SIZE (1..MAX) OF KeyPurposeId
KeyPurposeId ::= OBJECT IDENTIFIER
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedKeyUsage {
    key_purposes: Vec<ObjectIdentifier>,
}

impl ExtendedKeyUsage {
    pub const SERVER_AUTH: &'static str = oid::KP_SERVER_AUTH;
    pub const CLIENT_AUTH: &'static str = oid::KP_CLIENT_AUTH;
    pub const CODE_SIGNING: &'static str = oid::KP_CODE_SIGNING;
    pub const EMAIL_PROTECTION: &'static str = oid::KP_EMAIL_PROTECTION;
    pub const TIME_STAMPING: &'static str = oid::KP_TIME_STAMPING;
    pub const OCSP_SIGNING: &'static str = oid::KP_OCSP_SIGNING;
    pub const ANY: &'static str = oid::ANY_EXTENDED_KEY_USAGE;

    pub fn new(key_purposes: Vec<ObjectIdentifier>) -> Result<Self, Error> {
        resolve::check_count(Kind::ExtendedKeyUsage, key_purposes.len(), 1, None)?;
        Ok(ExtendedKeyUsage { key_purposes })
    }

    pub fn key_purposes(&self) -> &[ObjectIdentifier] {
        &self.key_purposes
    }

    pub fn has_key_purpose(&self, purpose: &str) -> bool {
        self.key_purposes.iter().any(|oid| *oid == purpose)
    }
}

impl Extension for ExtendedKeyUsage {
    const OID: &'static str = oid::EXTENDED_KEY_USAGE;
}

impl DecodableFrom<Element> for ExtendedKeyUsage {}

impl Decoder<Element, ExtendedKeyUsage> for Element {
    type Error = Error;

    fn decode(&self) -> Result<ExtendedKeyUsage, Self::Error> {
        let kind = Kind::ExtendedKeyUsage;
        let key_purposes = resolve::non_empty_sequence_of(kind, self)?
            .iter()
            .map(|node| resolve::oid(kind, node).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExtendedKeyUsage { key_purposes })
    }
}

impl EncodableTo<ExtendedKeyUsage> for Element {}

impl Encoder<ExtendedKeyUsage, Element> for ExtendedKeyUsage {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(
            self.key_purposes
                .iter()
                .cloned()
                .map(Element::ObjectIdentifier)
                .collect(),
        ))
    }
}

resolvable!(ExtendedKeyUsage, ExtendedKeyUsage);
