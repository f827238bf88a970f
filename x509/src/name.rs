//! Distinguished names, RFC 5280 Section 4.1.2.4
//!
//! ```asn1
//! Name ::= CHOICE { -- only one possibility for now --
//!     rdnSequence  RDNSequence
//! }
//!
//! RDNSequence ::= SEQUENCE OF RelativeDistinguishedName
//!
//! RelativeDistinguishedName ::= SET SIZE (1..MAX) OF AttributeTypeAndValue
//!
//! AttributeTypeAndValue ::= SEQUENCE {
//!     type     AttributeType,
//!     value    AttributeValue
//! }
//! ```
//!
//! Attribute values are kept as nodes so names re-encode with the string
//! types they were issued with.

use std::fmt;

use asn1::{Element, ObjectIdentifier};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind};
use crate::resolve::{self, Resolve, resolvable};

const SHORT_NAMES: &[(&str, &str)] = &[
    ("2.5.4.3", "CN"),
    ("2.5.4.5", "serialNumber"),
    ("2.5.4.6", "C"),
    ("2.5.4.7", "L"),
    ("2.5.4.8", "ST"),
    ("2.5.4.9", "street"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("2.5.4.12", "title"),
    ("0.9.2342.19200300.100.1.1", "UID"),
    ("0.9.2342.19200300.100.1.25", "DC"),
    ("1.2.840.113549.1.9.1", "emailAddress"),
];

/// X.509 Distinguished Name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    rdn_sequence: Vec<RelativeDistinguishedName>,
}

impl Name {
    pub fn new(rdn_sequence: Vec<RelativeDistinguishedName>) -> Self {
        Name { rdn_sequence }
    }

    /// The empty RDN sequence, used as the subject when a critical
    /// subjectAltName carries the identity.
    pub fn empty() -> Self {
        Name::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rdn_sequence.is_empty()
    }

    pub fn rdn_sequence(&self) -> &[RelativeDistinguishedName] {
        &self.rdn_sequence
    }

    /// Values of every attribute with the given type, in order.
    pub fn values_of<'a>(
        &'a self,
        attr_type: &'a ObjectIdentifier,
    ) -> impl Iterator<Item = &'a Element> {
        self.rdn_sequence
            .iter()
            .flat_map(|rdn| rdn.attributes.iter())
            .filter(move |atav| &atav.attribute_type == attr_type)
            .map(|atav| &atav.value)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .rdn_sequence
            .iter()
            .map(|rdn| rdn.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", formatted)
    }
}

impl DecodableFrom<Element> for Name {}

impl Decoder<Element, Name> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Name, Self::Error> {
        let rdn_sequence = resolve::sequence_of(Kind::Name, self)?
            .iter()
            .map(RelativeDistinguishedName::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Name { rdn_sequence })
    }
}

impl EncodableTo<Name> for Element {}

impl Encoder<Name, Element> for Name {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let rdns = self
            .rdn_sequence
            .iter()
            .map(|rdn| rdn.to_node())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Element::Sequence(rdns))
    }
}

resolvable!(Name, Name);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeDistinguishedName {
    attributes: Vec<AttributeTypeAndValue>,
}

impl RelativeDistinguishedName {
    pub fn new(attributes: Vec<AttributeTypeAndValue>) -> Result<Self, Error> {
        resolve::check_count(Kind::RelativeDistinguishedName, attributes.len(), 1, None)?;
        Ok(RelativeDistinguishedName { attributes })
    }

    pub fn attributes(&self) -> &[AttributeTypeAndValue] {
        &self.attributes
    }
}

impl fmt::Display for RelativeDistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .attributes
            .iter()
            .map(|atav| atav.to_string())
            .collect::<Vec<_>>()
            .join("+");
        write!(f, "{}", formatted)
    }
}

impl DecodableFrom<Element> for RelativeDistinguishedName {}

impl Decoder<Element, RelativeDistinguishedName> for Element {
    type Error = Error;

    fn decode(&self) -> Result<RelativeDistinguishedName, Self::Error> {
        let kind = Kind::RelativeDistinguishedName;
        let elements = resolve::set_of(kind, self)?;
        resolve::check_count(kind, elements.len(), 1, None)?;
        let attributes = elements
            .iter()
            .map(AttributeTypeAndValue::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RelativeDistinguishedName { attributes })
    }
}

impl EncodableTo<RelativeDistinguishedName> for Element {}

impl Encoder<RelativeDistinguishedName, Element> for RelativeDistinguishedName {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let attributes = self
            .attributes
            .iter()
            .map(|atav| atav.to_node())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Element::Set(attributes))
    }
}

resolvable!(RelativeDistinguishedName, RelativeDistinguishedName);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeTypeAndValue {
    attribute_type: ObjectIdentifier,
    value: Element,
}

impl AttributeTypeAndValue {
    pub fn new(attribute_type: ObjectIdentifier, value: Element) -> Self {
        AttributeTypeAndValue {
            attribute_type,
            value,
        }
    }

    pub fn attribute_type(&self) -> &ObjectIdentifier {
        &self.attribute_type
    }

    pub fn value(&self) -> &Element {
        &self.value
    }

    /// The value as text, when it is one of the string types.
    pub fn value_str(&self) -> Option<&str> {
        match &self.value {
            Element::UTF8String(s)
            | Element::PrintableString(s)
            | Element::T61String(s)
            | Element::IA5String(s)
            | Element::VisibleString(s)
            | Element::BMPString(s) => Some(s),
            _ => None,
        }
    }

    fn short_name(&self) -> Option<&'static str> {
        SHORT_NAMES
            .iter()
            .find(|(oid, _)| self.attribute_type == *oid)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for AttributeTypeAndValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.short_name() {
            Some(name) => write!(f, "{}=", name)?,
            None => write!(f, "{}=", self.attribute_type)?,
        }
        match self.value_str() {
            Some(s) => write!(f, "{}", s),
            None => write!(f, "{}", self.value),
        }
    }
}

impl DecodableFrom<Element> for AttributeTypeAndValue {}

impl Decoder<Element, AttributeTypeAndValue> for Element {
    type Error = Error;

    fn decode(&self) -> Result<AttributeTypeAndValue, Self::Error> {
        let kind = Kind::AttributeTypeAndValue;
        let elements = resolve::sequence(kind, self, 2, 2)?;
        Ok(AttributeTypeAndValue {
            attribute_type: resolve::oid(kind, &elements[0])?.clone(),
            value: elements[1].clone(),
        })
    }
}

impl EncodableTo<AttributeTypeAndValue> for Element {}

impl Encoder<AttributeTypeAndValue, Element> for AttributeTypeAndValue {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            Element::ObjectIdentifier(self.attribute_type.clone()),
            self.value.clone(),
        ]))
    }
}

resolvable!(AttributeTypeAndValue, AttributeTypeAndValue);
