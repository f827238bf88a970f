use asn1::{BitString, Element, UniversalTag};
use log::trace;
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};
use std::fmt;

use crate::error::{Error, Kind};
use crate::extensions::Extension;
use crate::general_name::GeneralNames;
use crate::name::RelativeDistinguishedName;
use crate::oid;
use crate::resolve::{self, Resolve, resolvable};

/*
RFC 5280 Section 4.2.1.13

CRLDistributionPoints ::= SEQUENCE SIZE (1..MAX) OF DistributionPoint

DistributionPoint ::= SEQUENCE {
     distributionPoint       [0]     DistributionPointName OPTIONAL,
     reasons                 [1]     ReasonFlags OPTIONAL,
     cRLIssuer               [2]     GeneralNames OPTIONAL }

DistributionPointName ::= CHOICE {
     fullName                [0]     GeneralNames,
     nameRelativeToCRLIssuer [1]     RelativeDistinguishedName }

ReasonFlags ::= BIT STRING {
     unused                  (0),
     keyCompromise           (1),
     cACompromise            (2),
     affiliationChanged      (3),
     superseded              (4),
     cessationOfOperation    (5),
     certificateHold         (6),
     privilegeWithdrawn      (7),
     aACompromise            (8) }

DistributionPointName is a CHOICE, so its [0] inside DistributionPoint is
explicit; reasons and cRLIssuer are implicit.
*/

/// Where a CRL can be found, either as a full name or relative to the CRL issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionPointName {
    FullName(GeneralNames),
    NameRelativeToCrlIssuer(RelativeDistinguishedName),
}

impl fmt::Display for DistributionPointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionPointName::FullName(names) => {
                let names = names.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "Full Name: {}", names.join(", "))
            }
            DistributionPointName::NameRelativeToCrlIssuer(rdn) => {
                write!(f, "Relative Name: {}", rdn)
            }
        }
    }
}

impl DecodableFrom<Element> for DistributionPointName {}

impl Decoder<Element, DistributionPointName> for Element {
    type Error = Error;

    fn decode(&self) -> Result<DistributionPointName, Self::Error> {
        let kind = Kind::DistributionPointName;
        let tagged = resolve::tagged(kind, self)?;
        trace!("DistributionPointName alternative [{}]", tagged.number());
        match tagged.number() {
            0 => Ok(DistributionPointName::FullName(resolve::from_implicit(
                tagged,
                UniversalTag::Sequence,
            )?)),
            1 => Ok(DistributionPointName::NameRelativeToCrlIssuer(
                resolve::from_implicit(tagged, UniversalTag::Set)?,
            )),
            other => Err(Error::unexpected_tag(kind, other)),
        }
    }
}

impl EncodableTo<DistributionPointName> for Element {}

impl Encoder<DistributionPointName, Element> for DistributionPointName {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        match self {
            DistributionPointName::FullName(names) => resolve::to_implicit(names, 0),
            DistributionPointName::NameRelativeToCrlIssuer(rdn) => resolve::to_implicit(rdn, 1),
        }
    }
}

resolvable!(DistributionPointName, DistributionPointName);

/// Revocation reasons covered by a CRL, as a named bit list.
///
/// The decoded BIT STRING is kept as-is, so bits without a name (bit 0 and
/// anything past `aACompromise`) re-encode unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonFlags {
    bits: BitString,
}

impl ReasonFlags {
    pub const UNUSED: usize = 0;
    pub const KEY_COMPROMISE: usize = 1;
    pub const CA_COMPROMISE: usize = 2;
    pub const AFFILIATION_CHANGED: usize = 3;
    pub const SUPERSEDED: usize = 4;
    pub const CESSATION_OF_OPERATION: usize = 5;
    pub const CERTIFICATE_HOLD: usize = 6;
    pub const PRIVILEGE_WITHDRAWN: usize = 7;
    pub const AA_COMPROMISE: usize = 8;

    /// Sets the given bit positions, e.g. `ReasonFlags::KEY_COMPROMISE`.
    pub fn from_reasons(reasons: &[usize]) -> Self {
        let len = reasons.iter().max().map_or(0, |max| max + 1);
        let mut bits = vec![false; len];
        for reason in reasons {
            bits[*reason] = true;
        }
        ReasonFlags {
            bits: BitString::from_bits(&bits),
        }
    }

    pub fn contains(&self, reason: usize) -> bool {
        self.bits.bit(reason)
    }

    pub fn key_compromise(&self) -> bool {
        self.contains(Self::KEY_COMPROMISE)
    }

    pub fn ca_compromise(&self) -> bool {
        self.contains(Self::CA_COMPROMISE)
    }

    pub fn superseded(&self) -> bool {
        self.contains(Self::SUPERSEDED)
    }

    pub fn bits(&self) -> &BitString {
        &self.bits
    }
}

impl Default for ReasonFlags {
    fn default() -> Self {
        ReasonFlags::from_reasons(&[])
    }
}

impl DecodableFrom<Element> for ReasonFlags {}

impl Decoder<Element, ReasonFlags> for Element {
    type Error = Error;

    fn decode(&self) -> Result<ReasonFlags, Self::Error> {
        let bits = resolve::bit_string(Kind::ReasonFlags, self)?;
        Ok(ReasonFlags { bits: bits.clone() })
    }
}

impl EncodableTo<ReasonFlags> for Element {}

impl Encoder<ReasonFlags, Element> for ReasonFlags {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::BitString(self.bits.clone()))
    }
}

resolvable!(ReasonFlags, ReasonFlags);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionPoint {
    pub distribution_point: Option<DistributionPointName>,
    pub reasons: Option<ReasonFlags>,
    pub crl_issuer: Option<GeneralNames>,
}

impl DecodableFrom<Element> for DistributionPoint {}

impl Decoder<Element, DistributionPoint> for Element {
    type Error = Error;

    fn decode(&self) -> Result<DistributionPoint, Self::Error> {
        let kind = Kind::DistributionPoint;
        let elements = resolve::sequence(kind, self, 0, 3)?;
        let [name, reasons, issuer] = resolve::tagged_fields::<3>(kind, elements, 0)?;
        Ok(DistributionPoint {
            distribution_point: name.map(resolve::from_explicit).transpose()?,
            reasons: reasons
                .map(|t| resolve::from_implicit(t, UniversalTag::BitString))
                .transpose()?,
            crl_issuer: issuer
                .map(|t| resolve::from_implicit(t, UniversalTag::Sequence))
                .transpose()?,
        })
    }
}

impl EncodableTo<DistributionPoint> for Element {}

impl Encoder<DistributionPoint, Element> for DistributionPoint {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = Vec::new();
        if let Some(name) = &self.distribution_point {
            elements.push(resolve::to_explicit(name, 0)?);
        }
        if let Some(reasons) = &self.reasons {
            elements.push(resolve::to_implicit(reasons, 1)?);
        }
        if let Some(issuer) = &self.crl_issuer {
            elements.push(resolve::to_implicit(issuer, 2)?);
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(DistributionPoint, DistributionPoint);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrlDistributionPoints {
    points: Vec<DistributionPoint>,
}

impl CrlDistributionPoints {
    pub fn new(points: Vec<DistributionPoint>) -> Result<Self, Error> {
        resolve::check_count(Kind::CrlDistributionPoints, points.len(), 1, None)?;
        Ok(CrlDistributionPoints { points })
    }

    pub fn points(&self) -> &[DistributionPoint] {
        &self.points
    }
}

impl Extension for CrlDistributionPoints {
    const OID: &'static str = oid::CRL_DISTRIBUTION_POINTS;
}

impl DecodableFrom<Element> for CrlDistributionPoints {}

impl Decoder<Element, CrlDistributionPoints> for Element {
    type Error = Error;

    fn decode(&self) -> Result<CrlDistributionPoints, Self::Error> {
        let points = resolve::non_empty_sequence_of(Kind::CrlDistributionPoints, self)?
            .iter()
            .map(DistributionPoint::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CrlDistributionPoints { points })
    }
}

impl EncodableTo<CrlDistributionPoints> for Element {}

impl Encoder<CrlDistributionPoints, Element> for CrlDistributionPoints {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(
            self.points
                .iter()
                .map(|p| p.to_node())
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }
}

resolvable!(CrlDistributionPoints, CrlDistributionPoints);
