use asn1::Element;
use log::trace;
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind};
use crate::extensions::Extension;
use crate::general_name::GeneralName;
use crate::oid;
use crate::resolve::{self, Resolve, resolvable};

/*
RFC 5755 Section 4.3.2
TargetInformation ::= SEQUENCE SIZE (1..MAX) OF Targets

Targets ::= SEQUENCE OF Target

Target ::= CHOICE {
     targetName     [0] GeneralName,
     targetGroup    [1] GeneralName,
     targetCert     [2] TargetCert }

GeneralName is a CHOICE, so both alternatives are explicitly tagged.
targetCert is not supported.
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Name(GeneralName),
    Group(GeneralName),
}

impl DecodableFrom<Element> for Target {}

impl Decoder<Element, Target> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Target, Self::Error> {
        let kind = Kind::Target;
        let tagged = resolve::tagged(kind, self)?;
        trace!("Target alternative [{}]", tagged.number());
        match tagged.number() {
            0 => Ok(Target::Name(resolve::from_explicit(tagged)?)),
            1 => Ok(Target::Group(resolve::from_explicit(tagged)?)),
            other => Err(Error::unexpected_tag(kind, other)),
        }
    }
}

impl EncodableTo<Target> for Element {}

impl Encoder<Target, Element> for Target {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        match self {
            Target::Name(name) => resolve::to_explicit(name, 0),
            Target::Group(group) => resolve::to_explicit(group, 1),
        }
    }
}

resolvable!(Target, Target);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets(Vec<Target>);

impl Targets {
    pub fn new(targets: Vec<Target>) -> Self {
        Targets(targets)
    }

    pub fn targets(&self) -> &[Target] {
        &self.0
    }
}

impl DecodableFrom<Element> for Targets {}

impl Decoder<Element, Targets> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Targets, Self::Error> {
        let targets = resolve::sequence_of(Kind::Targets, self)?
            .iter()
            .map(Target::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Targets(targets))
    }
}

impl EncodableTo<Targets> for Element {}

impl Encoder<Targets, Element> for Targets {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(
            self.0
                .iter()
                .map(|t| t.to_node())
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }
}

resolvable!(Targets, Targets);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInformation(Vec<Targets>);

impl TargetInformation {
    pub fn new(targets: Vec<Targets>) -> Result<Self, Error> {
        resolve::check_count(Kind::TargetInformation, targets.len(), 1, None)?;
        Ok(TargetInformation(targets))
    }

    pub fn targets(&self) -> &[Targets] {
        &self.0
    }

    /// Every target across all `Targets` groups, in order.
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.0.iter().flat_map(|t| t.targets())
    }
}

impl Extension for TargetInformation {
    const OID: &'static str = oid::TARGET_INFORMATION;
}

impl DecodableFrom<Element> for TargetInformation {}

impl Decoder<Element, TargetInformation> for Element {
    type Error = Error;

    fn decode(&self) -> Result<TargetInformation, Self::Error> {
        let targets = resolve::non_empty_sequence_of(Kind::TargetInformation, self)?
            .iter()
            .map(Targets::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TargetInformation(targets))
    }
}

impl EncodableTo<TargetInformation> for Element {}

impl Encoder<TargetInformation, Element> for TargetInformation {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(
            self.0
                .iter()
                .map(|t| t.to_node())
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }
}

resolvable!(TargetInformation, TargetInformation);
