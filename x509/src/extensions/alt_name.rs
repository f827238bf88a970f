use asn1::Element;
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};
use std::fmt;

use crate::error::Error;
use crate::extensions::Extension;
use crate::general_name::GeneralNames;
use crate::oid;
use crate::resolve::{Resolve, resolvable};

/*
RFC 5280 Section 4.2.1.6 / 4.2.1.7
SubjectAltName ::= GeneralNames
IssuerAltName ::= GeneralNames
*/

macro_rules! alt_name {
    ($(#[$meta:meta])* $name:ident, $oid:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub names: GeneralNames,
        }

        impl $name {
            pub fn new(names: GeneralNames) -> Self {
                $name { names }
            }
        }

        impl Extension for $name {
            const OID: &'static str = $oid;
        }

        impl DecodableFrom<Element> for $name {}

        impl Decoder<Element, $name> for Element {
            type Error = Error;

            fn decode(&self) -> Result<$name, Self::Error> {
                Ok($name {
                    names: GeneralNames::from_node(self)?,
                })
            }
        }

        impl EncodableTo<$name> for Element {}

        impl Encoder<$name, Element> for $name {
            type Error = Error;

            fn encode(&self) -> Result<Element, Self::Error> {
                self.names.to_node()
            }
        }

        resolvable!($name, $name);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let names = self.names.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "{}", names.join(", "))
            }
        }
    };
}

alt_name!(
    /// Subject Alternative Name. When the subject Name is empty this extension
    /// must be present and critical.
    SubjectAltName,
    oid::SUBJECT_ALT_NAME
);

alt_name!(IssuerAltName, oid::ISSUER_ALT_NAME);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Kind, Violation};
    use crate::general_name::GeneralName;
    use hex_literal::hex;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_subject_alt_name_round_trip() {
        // DNS:example.com, IP Address:192.0.2.1
        let der = hex!("30 13 82 0b 65 78 61 6d 70 6c 65 2e 63 6f 6d 87 04 c0 00 02 01");
        let san = SubjectAltName::from_der(&der).unwrap();
        assert_eq!(
            vec![
                GeneralName::DnsName("example.com".to_string()),
                GeneralName::IpAddress(crate::general_name::IpAddressOrRange::Address(
                    IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))
                )),
            ],
            san.names.names()
        );
        assert_eq!("DNS:example.com, IP Address:192.0.2.1", san.to_string());
        assert_eq!(der.to_vec(), san.to_der().unwrap());
    }

    #[test]
    fn test_issuer_alt_name_rejects_empty() {
        let err = IssuerAltName::from_der(&hex!("30 00")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::SchemaViolation {
                kind: Kind::GeneralNames,
                violation: Violation::ElementCount { min: 1, max: None, actual: 0 },
            }
        ));
    }
}
