use asn1::{Element, Integer};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};
use std::fmt;

use crate::error::{Error, Kind};
use crate::extensions::Extension;
use crate::oid;
use crate::resolve::{self, resolvable};

/*
RFC 5280 Section 4.2.1.9
BasicConstraints ::= SEQUENCE {
    cA                      BOOLEAN DEFAULT FALSE,
    pathLenConstraint       INTEGER (0..MAX) OPTIONAL
}
*/

/// Basic Constraints extension ([RFC 5280 Section 4.2.1.9](https://datatracker.ietf.org/doc/html/rfc5280#section-4.2.1.9)).
///
/// # Fields
/// - `ca`: whether the certified public key may verify certificate signatures
/// - `path_len_constraint`: maximum number of non-self-issued intermediate
///   certificates that may follow this one in a path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicConstraints {
    pub ca: bool,
    pub path_len_constraint: Option<u32>,
}

impl Extension for BasicConstraints {
    const OID: &'static str = oid::BASIC_CONSTRAINTS;
}

impl DecodableFrom<Element> for BasicConstraints {}

impl Decoder<Element, BasicConstraints> for Element {
    type Error = Error;

    fn decode(&self) -> Result<BasicConstraints, Self::Error> {
        let kind = Kind::BasicConstraints;
        let elements = resolve::sequence(kind, self, 0, 2)?;
        let path_len = |node: &Element| {
            let integer = resolve::integer(kind, node)?;
            integer.to_u32().ok_or_else(|| {
                Error::invalid(kind, format!("pathLenConstraint {} out of range", integer))
            })
        };
        let (ca, path_len_constraint) = match elements {
            [] => (false, None),
            [Element::Boolean(ca)] => (*ca, None),
            [single] => (false, Some(path_len(single)?)),
            [ca, len] => (resolve::boolean(kind, ca)?, Some(path_len(len)?)),
            _ => return Err(Error::element_count(kind, 0, Some(2), elements.len())),
        };
        Ok(BasicConstraints {
            ca,
            path_len_constraint,
        })
    }
}

impl EncodableTo<BasicConstraints> for Element {}

impl Encoder<BasicConstraints, Element> for BasicConstraints {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let ca = self.ca.then_some(Element::Boolean(true));
        let path_len = self
            .path_len_constraint
            .map(|len| Element::Integer(Integer::from(u64::from(len))));
        Ok(Element::Sequence(ca.into_iter().chain(path_len).collect()))
    }
}

resolvable!(BasicConstraints, BasicConstraints);

impl fmt::Display for BasicConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ca {
            return write!(f, "CA:FALSE");
        }
        write!(f, "CA:TRUE")?;
        if let Some(pathlen) = self.path_len_constraint {
            write!(f, ", pathlen:{}", pathlen)?;
        }
        Ok(())
    }
}
