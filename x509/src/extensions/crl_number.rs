use asn1::{Element, Integer};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind};
use crate::extensions::Extension;
use crate::oid;
use crate::resolve::{self, resolvable};

/*
RFC 5280 Section 5.2.3
CRLNumber ::= INTEGER (0..MAX)
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrlNumber(Integer);

impl CrlNumber {
    pub fn new(number: Integer) -> Result<Self, Error> {
        if number.as_bigint().sign() == num_bigint::Sign::Minus {
            return Err(Error::invalid(
                Kind::CrlNumber,
                format!("CRL number {} is negative", number),
            ));
        }
        Ok(CrlNumber(number))
    }

    pub fn number(&self) -> &Integer {
        &self.0
    }
}

impl From<u64> for CrlNumber {
    fn from(number: u64) -> Self {
        CrlNumber(Integer::from(number))
    }
}

impl Extension for CrlNumber {
    const OID: &'static str = oid::CRL_NUMBER;
}

impl DecodableFrom<Element> for CrlNumber {}

impl Decoder<Element, CrlNumber> for Element {
    type Error = Error;

    fn decode(&self) -> Result<CrlNumber, Self::Error> {
        CrlNumber::new(resolve::integer(Kind::CrlNumber, self)?.clone())
    }
}

impl EncodableTo<CrlNumber> for Element {}

impl Encoder<CrlNumber, Element> for CrlNumber {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Integer(self.0.clone()))
    }
}

resolvable!(CrlNumber, CrlNumber);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolve;
    use hex_literal::hex;
    use rstest::rstest;

    #[rstest(
        der,
        expected,
        case(hex!("02 01 00").to_vec(), 0),
        case(hex!("02 02 00 ff").to_vec(), 255),
        case(hex!("02 02 10 00").to_vec(), 4096),
    )]
    fn test_crl_number_round_trip(der: Vec<u8>, expected: u64) {
        let number = CrlNumber::from_der(&der).unwrap();
        assert_eq!(CrlNumber::from(expected), number);
        assert_eq!(der, number.to_der().unwrap());
    }

    #[test]
    fn test_crl_number_rejects_negative() {
        assert!(CrlNumber::from_der(&hex!("02 01 ff")).is_err());
    }
}
