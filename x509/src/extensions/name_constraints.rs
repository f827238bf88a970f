use asn1::{Element, Integer, Tagged, UniversalTag};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind};
use crate::extensions::Extension;
use crate::general_name::GeneralName;
use crate::oid;
use crate::resolve::{self, Resolve, resolvable};

/*
RFC 5280 Section 4.2.1.10
NameConstraints ::= SEQUENCE {
     permittedSubtrees       [0]     GeneralSubtrees OPTIONAL,
     excludedSubtrees        [1]     GeneralSubtrees OPTIONAL }

GeneralSubtrees ::= SEQUENCE SIZE (1..MAX) OF GeneralSubtree

GeneralSubtree ::= SEQUENCE {
     base                    GeneralName,
     minimum         [0]     BaseDistance DEFAULT 0,
     maximum         [1]     BaseDistance OPTIONAL }

BaseDistance ::= INTEGER (0..MAX)
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSubtree {
    pub base: GeneralName,
    pub minimum: u64,
    pub maximum: Option<u64>,
}

impl GeneralSubtree {
    pub fn new(base: GeneralName) -> Self {
        GeneralSubtree {
            base,
            minimum: 0,
            maximum: None,
        }
    }
}

fn base_distance(tagged: &Tagged) -> Result<u64, Error> {
    let kind = Kind::GeneralSubtree;
    let node = tagged.implicit_as(UniversalTag::Integer)?;
    let integer = resolve::integer(kind, &node)?;
    integer
        .to_u64()
        .ok_or_else(|| Error::invalid(kind, format!("BaseDistance {} out of range", integer)))
}

impl DecodableFrom<Element> for GeneralSubtree {}

impl Decoder<Element, GeneralSubtree> for Element {
    type Error = Error;

    fn decode(&self) -> Result<GeneralSubtree, Self::Error> {
        let kind = Kind::GeneralSubtree;
        let elements = resolve::sequence(kind, self, 1, 3)?;
        let [minimum, maximum] = resolve::tagged_fields::<2>(kind, &elements[1..], 0)?;
        Ok(GeneralSubtree {
            base: GeneralName::from_node(&elements[0])?,
            minimum: minimum.map(base_distance).transpose()?.unwrap_or(0),
            maximum: maximum.map(base_distance).transpose()?,
        })
    }
}

impl EncodableTo<GeneralSubtree> for Element {}

impl Encoder<GeneralSubtree, Element> for GeneralSubtree {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = vec![self.base.to_node()?];
        // DEFAULT 0 is never encoded.
        if self.minimum != 0 {
            let minimum = Element::Integer(Integer::from(self.minimum));
            elements.push(Tagged::implicit(0, &minimum)?.into());
        }
        if let Some(maximum) = self.maximum {
            elements.push(Tagged::implicit(1, &Element::Integer(Integer::from(maximum)))?.into());
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(GeneralSubtree, GeneralSubtree);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameConstraints {
    pub permitted_subtrees: Option<Vec<GeneralSubtree>>,
    pub excluded_subtrees: Option<Vec<GeneralSubtree>>,
}

fn subtrees_from(tagged: &Tagged) -> Result<Vec<GeneralSubtree>, Error> {
    let node = tagged.implicit_as(UniversalTag::Sequence)?;
    resolve::non_empty_sequence_of(Kind::NameConstraints, &node)?
        .iter()
        .map(GeneralSubtree::from_node)
        .collect()
}

fn subtrees_to(subtrees: &[GeneralSubtree], number: u8) -> Result<Element, Error> {
    resolve::check_count(Kind::NameConstraints, subtrees.len(), 1, None)?;
    let node = Element::Sequence(
        subtrees
            .iter()
            .map(|s| s.to_node())
            .collect::<Result<Vec<_>, _>>()?,
    );
    Ok(Tagged::implicit(number, &node)?.into())
}

impl Extension for NameConstraints {
    const OID: &'static str = oid::NAME_CONSTRAINTS;
}

impl DecodableFrom<Element> for NameConstraints {}

impl Decoder<Element, NameConstraints> for Element {
    type Error = Error;

    fn decode(&self) -> Result<NameConstraints, Self::Error> {
        let kind = Kind::NameConstraints;
        let elements = resolve::sequence(kind, self, 0, 2)?;
        let [permitted, excluded] = resolve::tagged_fields::<2>(kind, elements, 0)?;
        Ok(NameConstraints {
            permitted_subtrees: permitted.map(subtrees_from).transpose()?,
            excluded_subtrees: excluded.map(subtrees_from).transpose()?,
        })
    }
}

impl EncodableTo<NameConstraints> for Element {}

impl Encoder<NameConstraints, Element> for NameConstraints {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = Vec::new();
        if let Some(permitted) = &self.permitted_subtrees {
            elements.push(subtrees_to(permitted, 0)?);
        }
        if let Some(excluded) = &self.excluded_subtrees {
            elements.push(subtrees_to(excluded, 1)?);
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(NameConstraints, NameConstraints);
