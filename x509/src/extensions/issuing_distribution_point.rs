use asn1::{Element, Tagged, UniversalTag};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind};
use crate::extensions::{DistributionPointName, Extension, ReasonFlags};
use crate::oid;
use crate::resolve::{self, resolvable};

/*
RFC 5280 Section 5.2.5
IssuingDistributionPoint ::= SEQUENCE {
     distributionPoint          [0] DistributionPointName OPTIONAL,
     onlyContainsUserCerts      [1] BOOLEAN DEFAULT FALSE,
     onlyContainsCACerts        [2] BOOLEAN DEFAULT FALSE,
     onlySomeReasons            [3] ReasonFlags OPTIONAL,
     indirectCRL                [4] BOOLEAN DEFAULT FALSE,
     onlyContainsAttributeCerts [5] BOOLEAN DEFAULT FALSE }
*/

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuingDistributionPoint {
    pub distribution_point: Option<DistributionPointName>,
    pub only_contains_user_certs: bool,
    pub only_contains_ca_certs: bool,
    pub only_some_reasons: Option<ReasonFlags>,
    pub indirect_crl: bool,
    pub only_contains_attribute_certs: bool,
}

impl Extension for IssuingDistributionPoint {
    const OID: &'static str = oid::ISSUING_DISTRIBUTION_POINT;
}

fn flag(tagged: Option<&Tagged>) -> Result<bool, Error> {
    match tagged {
        None => Ok(false),
        Some(t) => resolve::boolean(
            Kind::IssuingDistributionPoint,
            &t.implicit_as(UniversalTag::Boolean)?,
        ),
    }
}

// DEFAULT FALSE is never encoded.
fn push_flag(elements: &mut Vec<Element>, number: u8, set: bool) -> Result<(), Error> {
    if set {
        elements.push(Tagged::implicit(number, &Element::Boolean(true))?.into());
    }
    Ok(())
}

impl DecodableFrom<Element> for IssuingDistributionPoint {}

impl Decoder<Element, IssuingDistributionPoint> for Element {
    type Error = Error;

    fn decode(&self) -> Result<IssuingDistributionPoint, Self::Error> {
        let kind = Kind::IssuingDistributionPoint;
        let elements = resolve::sequence(kind, self, 0, 6)?;
        let [name, user, ca, reasons, indirect, attribute] =
            resolve::tagged_fields::<6>(kind, elements, 0)?;
        Ok(IssuingDistributionPoint {
            distribution_point: name.map(resolve::from_explicit).transpose()?,
            only_contains_user_certs: flag(user)?,
            only_contains_ca_certs: flag(ca)?,
            only_some_reasons: reasons
                .map(|t| resolve::from_implicit(t, UniversalTag::BitString))
                .transpose()?,
            indirect_crl: flag(indirect)?,
            only_contains_attribute_certs: flag(attribute)?,
        })
    }
}

impl EncodableTo<IssuingDistributionPoint> for Element {}

impl Encoder<IssuingDistributionPoint, Element> for IssuingDistributionPoint {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = Vec::new();
        if let Some(name) = &self.distribution_point {
            elements.push(resolve::to_explicit(name, 0)?);
        }
        push_flag(&mut elements, 1, self.only_contains_user_certs)?;
        push_flag(&mut elements, 2, self.only_contains_ca_certs)?;
        if let Some(reasons) = &self.only_some_reasons {
            elements.push(resolve::to_implicit(reasons, 3)?);
        }
        push_flag(&mut elements, 4, self.indirect_crl)?;
        push_flag(&mut elements, 5, self.only_contains_attribute_certs)?;
        Ok(Element::Sequence(elements))
    }
}

resolvable!(IssuingDistributionPoint, IssuingDistributionPoint);
