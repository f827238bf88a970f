use asn1::{BitString, Element};
use serde::{Deserialize, Serialize};
use std::fmt;
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind};
use crate::extensions::Extension;
use crate::oid;
use crate::resolve::{self, resolvable};

/*
RFC 5280 Section 4.2.1.3
KeyUsage ::= BIT STRING {
    digitalSignature        (0),
    nonRepudiation          (1), -- renamed to contentCommitment
    keyEncipherment         (2),
    dataEncipherment        (3),
    keyAgreement            (4),
    keyCertSign             (5),
    cRLSign                 (6),
    encipherOnly            (7),
    decipherOnly            (8)
}
*/

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyUsage {
    pub digital_signature: bool,
    pub content_commitment: bool,
    pub key_encipherment: bool,
    pub data_encipherment: bool,
    pub key_agreement: bool,
    pub key_cert_sign: bool,
    pub crl_sign: bool,
    pub encipher_only: bool,
    pub decipher_only: bool,
}

impl KeyUsage {
    fn bits(&self) -> [bool; 9] {
        [
            self.digital_signature,
            self.content_commitment,
            self.key_encipherment,
            self.data_encipherment,
            self.key_agreement,
            self.key_cert_sign,
            self.crl_sign,
            self.encipher_only,
            self.decipher_only,
        ]
    }
}

impl Extension for KeyUsage {
    const OID: &'static str = oid::KEY_USAGE;
}

impl DecodableFrom<Element> for KeyUsage {}

impl Decoder<Element, KeyUsage> for Element {
    type Error = Error;

    fn decode(&self) -> Result<KeyUsage, Self::Error> {
        let bits = resolve::bit_string(Kind::KeyUsage, self)?;
        Ok(KeyUsage {
            digital_signature: bits.bit(0),
            content_commitment: bits.bit(1),
            key_encipherment: bits.bit(2),
            data_encipherment: bits.bit(3),
            key_agreement: bits.bit(4),
            key_cert_sign: bits.bit(5),
            crl_sign: bits.bit(6),
            encipher_only: bits.bit(7),
            decipher_only: bits.bit(8),
        })
    }
}

impl EncodableTo<KeyUsage> for Element {}

impl Encoder<KeyUsage, Element> for KeyUsage {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::BitString(BitString::from_bits(&self.bits())))
    }
}

resolvable!(KeyUsage, KeyUsage);

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 9] = [
            "Digital Signature",
            "Content Commitment",
            "Key Encipherment",
            "Data Encipherment",
            "Key Agreement",
            "Certificate Sign",
            "CRL Sign",
            "Encipher Only",
            "Decipher Only",
        ];
        let usages = NAMES
            .iter()
            .zip(self.bits())
            .filter(|(_, set)| *set)
            .map(|(name, _)| *name)
            .collect::<Vec<_>>();
        write!(f, "{}", usages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolve;
    use hex_literal::hex;
    use rstest::rstest;

    #[rstest(
        der,
        expected,
        // digitalSignature, keyEncipherment
        case(
            hex!("03 02 05 a0").to_vec(),
            KeyUsage { digital_signature: true, key_encipherment: true, ..Default::default() }
        ),
        // keyCertSign, cRLSign
        case(
            hex!("03 02 01 06").to_vec(),
            KeyUsage { key_cert_sign: true, crl_sign: true, ..Default::default() }
        ),
        // decipherOnly needs a second octet
        case(
            hex!("03 03 07 80 80").to_vec(),
            KeyUsage { digital_signature: true, decipher_only: true, ..Default::default() }
        ),
    )]
    fn test_key_usage_round_trip(der: Vec<u8>, expected: KeyUsage) {
        let usage = KeyUsage::from_der(&der).unwrap();
        assert_eq!(expected, usage);
        assert_eq!(der, usage.to_der().unwrap());
    }

    #[test]
    fn test_key_usage_non_minimal_bits_decode() {
        // keyCertSign, cRLSign with a trailing zero octet
        let usage = KeyUsage::from_der(&hex!("03 03 07 06 00")).unwrap();
        assert!(usage.key_cert_sign && usage.crl_sign);
        assert_eq!(hex!("03 02 01 06").to_vec(), usage.to_der().unwrap());
    }

    #[test]
    fn test_key_usage_display() {
        let usage = KeyUsage { digital_signature: true, crl_sign: true, ..Default::default() };
        assert_eq!("Digital Signature, CRL Sign", usage.to_string());
    }
}
