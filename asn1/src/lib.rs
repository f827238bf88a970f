use std::{fmt::Display, str::FromStr};

use chrono::{NaiveDateTime, Timelike};
use der::{Der, Tag, Tlv, Value};
use error::Error;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

pub mod error;

pub use der::{Class, UniversalTag};

#[derive(Debug, Clone)]
pub struct ASN1Object {
    elements: Vec<Element>,
}

impl ASN1Object {
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn new(elements: Vec<Element>) -> Self {
        ASN1Object { elements }
    }
}

impl DecodableFrom<Der> for ASN1Object {}

impl Decoder<Der, ASN1Object> for Der {
    type Error = Error;
    fn decode(&self) -> Result<ASN1Object, Error> {
        let elements = self
            .elements()
            .iter()
            .map(Element::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ASN1Object { elements })
    }
}

impl EncodableTo<ASN1Object> for Der {}

impl Encoder<ASN1Object, Der> for ASN1Object {
    type Error = Error;

    fn encode(&self) -> Result<Der, Self::Error> {
        let tlvs = self
            .elements
            .iter()
            .map(|element| element.encode())
            .collect::<Result<Vec<Tlv>, _>>()?;
        Ok(Der::new(tlvs))
    }
}

/// A decoded ASN.1 value.
///
/// Universal types get their own variant. Application, context-specific and
/// private tags are kept as [`Tagged`] nodes; whether such a node is an
/// implicit or explicit tag is only known to the schema reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Boolean(bool),
    Integer(Integer),
    Enumerated(Integer),
    BitString(BitString),
    OctetString(OctetString),
    Null,
    ObjectIdentifier(ObjectIdentifier),
    UTF8String(String),
    PrintableString(String),
    T61String(String),
    IA5String(String),
    VisibleString(String),
    BMPString(String),
    UTCTime(NaiveDateTime),
    GeneralizedTime(NaiveDateTime),
    Sequence(Vec<Element>),
    Set(Vec<Element>),
    Tagged(Tagged),
    Unimplemented(Tlv),
}

impl Element {
    /// Decodes exactly one DER value.
    pub fn from_der(bytes: &[u8]) -> Result<Element, Error> {
        let der: Der = bytes.decode().map_err(Error::FailedToDecodeDer)?;
        match der.elements() {
            [tlv] => Element::try_from(tlv),
            elements => Err(Error::ExpectedSingleElement(elements.len())),
        }
    }

    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        let tlv: Tlv = self.encode()?;
        tlv.to_bytes().map_err(Error::FailedToEncodeDer)
    }

    pub fn as_tagged(&self) -> Option<&Tagged> {
        match self {
            Element::Tagged(tagged) => Some(tagged),
            _ => None,
        }
    }

    /// True for a context-specific node with the given tag number.
    pub fn is_context(&self, number: u8) -> bool {
        self.as_tagged().is_some_and(|t| t.is_context(number))
    }

    pub fn is_time(&self) -> bool {
        matches!(self, Element::UTCTime(_) | Element::GeneralizedTime(_))
    }

    fn name(&self) -> &'static str {
        match self {
            Element::Boolean(_) => "BOOLEAN",
            Element::Integer(_) => "INTEGER",
            Element::Enumerated(_) => "ENUMERATED",
            Element::BitString(_) => "BIT STRING",
            Element::OctetString(_) => "OCTET STRING",
            Element::Null => "NULL",
            Element::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            Element::UTF8String(_) => "UTF8String",
            Element::PrintableString(_) => "PrintableString",
            Element::T61String(_) => "T61String",
            Element::IA5String(_) => "IA5String",
            Element::VisibleString(_) => "VisibleString",
            Element::BMPString(_) => "BMPString",
            Element::UTCTime(_) => "UTCTime",
            Element::GeneralizedTime(_) => "GeneralizedTime",
            Element::Sequence(_) => "SEQUENCE",
            Element::Set(_) => "SET",
            Element::Tagged(_) => "tagged value",
            Element::Unimplemented(_) => "unimplemented value",
        }
    }
}

impl TryFrom<&Tlv> for Element {
    type Error = Error;

    fn try_from(tlv: &Tlv) -> Result<Self, Self::Error> {
        match (tlv.tag(), tlv.value()) {
            (Tag::Universal { tag, .. }, _) if matches!(tag, UniversalTag::Unimplemented(_)) => {
                Ok(Element::Unimplemented(tlv.clone()))
            }
            (Tag::Universal { tag, .. }, Value::Tlv(tlvs)) => {
                let elements = tlvs
                    .iter()
                    .map(Element::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                match tag {
                    UniversalTag::Sequence => Ok(Element::Sequence(elements)),
                    UniversalTag::Set => Ok(Element::Set(elements)),
                    other => Err(Error::InvalidConstruction(*other)),
                }
            }
            (Tag::Universal { tag, .. }, Value::Data(data)) => decode_primitive(*tag, data),
            (Tag::Tagged { class, number, .. }, Value::Tlv(tlvs)) => {
                let elements = tlvs
                    .iter()
                    .map(Element::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Element::Tagged(Tagged::new(
                    *class,
                    *number,
                    TaggedContent::Constructed(elements),
                )))
            }
            (Tag::Tagged { class, number, .. }, Value::Data(data)) => Ok(Element::Tagged(
                Tagged::new(*class, *number, TaggedContent::Primitive(data.clone())),
            )),
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Boolean(b) => write!(f, "Boolean({})", b),
            Element::Integer(i) => write!(f, "Integer({})", i),
            Element::Enumerated(i) => write!(f, "Enumerated({})", i),
            Element::BitString(bs) => write!(f, "BitString({})", bs),
            Element::OctetString(os) => write!(f, "OctetString({})", os),
            Element::Null => write!(f, "Null"),
            Element::ObjectIdentifier(oid) => write!(f, "ObjectIdentifier({})", oid),
            Element::UTF8String(s) => write!(f, "UTF8String({})", s),
            Element::PrintableString(s) => write!(f, "PrintableString({})", s),
            Element::T61String(s) => write!(f, "T61String({})", s),
            Element::IA5String(s) => write!(f, "IA5String({})", s),
            Element::VisibleString(s) => write!(f, "VisibleString({})", s),
            Element::BMPString(s) => write!(f, "BMPString({})", s),
            Element::UTCTime(dt) => write!(f, "UTCTime({})", dt),
            Element::GeneralizedTime(dt) => write!(f, "GeneralizedTime({})", dt),
            Element::Sequence(seq) => write!(f, "Sequence({:?})", seq),
            Element::Set(set) => write!(f, "Set({:?})", set),
            Element::Tagged(tagged) => write!(f, "{}", tagged),
            Element::Unimplemented(tlv) => write!(f, "Unimplemented({:?})", tlv),
        }
    }
}

impl TryFrom<&Element> for Tlv {
    type Error = Error;

    fn try_from(element: &Element) -> Result<Self, Self::Error> {
        match element {
            Element::Sequence(elements) | Element::Set(elements) => {
                let tag = if matches!(element, Element::Set(_)) {
                    UniversalTag::Set
                } else {
                    UniversalTag::Sequence
                };
                let tlvs = elements
                    .iter()
                    .map(Tlv::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Tlv::new_constructed(Tag::universal(tag), tlvs))
            }
            Element::Tagged(tagged) => {
                let tag = Tag::Tagged {
                    class: tagged.class,
                    number: tagged.number,
                    constructed: tagged.is_constructed(),
                };
                match &tagged.content {
                    TaggedContent::Primitive(data) => Ok(Tlv::new_primitive(tag, data.clone())),
                    TaggedContent::Constructed(elements) => {
                        let tlvs = elements
                            .iter()
                            .map(Tlv::try_from)
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(Tlv::new_constructed(tag, tlvs))
                    }
                }
            }
            // Unknown universal types pass through untouched.
            Element::Unimplemented(tlv) => Ok(tlv.clone()),
            primitive => {
                let (tag, data) = encode_primitive(primitive)?;
                Ok(Tlv::new_primitive(Tag::universal(tag), data))
            }
        }
    }
}

impl EncodableTo<Element> for Tlv {}

impl Encoder<Element, Tlv> for Element {
    type Error = Error;

    fn encode(&self) -> Result<Tlv, Self::Error> {
        Tlv::try_from(self)
    }
}

impl Serialize for Element {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let der = self.to_der().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&to_hex(&der))
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let der = from_hex(&s).map_err(serde::de::Error::custom)?;
        Element::from_der(&der).map_err(serde::de::Error::custom)
    }
}

fn decode_primitive(tag: UniversalTag, data: &[u8]) -> Result<Element, Error> {
    match tag {
        UniversalTag::Boolean => match data {
            [0x00] => Ok(Element::Boolean(false)),
            [0xff] => Ok(Element::Boolean(true)),
            _ => Err(Error::InvalidBoolean),
        },
        UniversalTag::Integer => Integer::try_from(data).map(Element::Integer),
        UniversalTag::Enumerated => Integer::try_from(data).map(Element::Enumerated),
        UniversalTag::BitString => BitString::try_from(data).map(Element::BitString),
        UniversalTag::OctetString => Ok(Element::OctetString(OctetString::from(data))),
        UniversalTag::Null if data.is_empty() => Ok(Element::Null),
        UniversalTag::Null => Err(Error::NullWithContent(data.len())),
        UniversalTag::ObjectIdentifier => {
            ObjectIdentifier::try_from(data).map(Element::ObjectIdentifier)
        }
        UniversalTag::UTF8String => String::from_utf8(data.to_vec())
            .map(Element::UTF8String)
            .map_err(|_| Error::Utf8StringInvalidUtf8),
        UniversalTag::PrintableString => {
            ascii_string(data, |b| b.is_ascii(), Error::PrintableStringInvalidEncoding)
                .map(Element::PrintableString)
        }
        UniversalTag::IA5String => {
            ascii_string(data, |b| b.is_ascii(), Error::Ia5StringInvalidEncoding)
        }
            .map(Element::IA5String),
        UniversalTag::VisibleString => ascii_string(
            data,
            |b| (0x20..=0x7e).contains(&b),
            Error::VisibleStringInvalidEncoding,
        )
        .map(Element::VisibleString),
        // Latin-1: every byte maps to the code point of the same value.
        UniversalTag::T61String => {
            Ok(Element::T61String(data.iter().map(|&b| b as char).collect()))
        }
        UniversalTag::BMPString => parse_bmp_string(data).map(Element::BMPString),
        UniversalTag::UTCTime => parse_utc_time(data).map(Element::UTCTime),
        UniversalTag::GeneralizedTime => parse_generalized_time(data).map(Element::GeneralizedTime),
        UniversalTag::Sequence | UniversalTag::Set => Err(Error::InvalidConstruction(tag)),
        UniversalTag::Unimplemented(n) => Err(Error::ElementUnimplemented(n)),
    }
}

fn encode_primitive(element: &Element) -> Result<(UniversalTag, Vec<u8>), Error> {
    let encoded = match element {
        Element::Boolean(b) => (UniversalTag::Boolean, vec![if *b { 0xff } else { 0x00 }]),
        Element::Integer(i) => (UniversalTag::Integer, i.to_signed_bytes_be()),
        Element::Enumerated(i) => (UniversalTag::Enumerated, i.to_signed_bytes_be()),
        Element::BitString(bs) => (UniversalTag::BitString, Vec::from(bs.clone())),
        Element::OctetString(os) => (UniversalTag::OctetString, os.as_bytes().to_vec()),
        Element::Null => (UniversalTag::Null, vec![]),
        Element::ObjectIdentifier(oid) => {
            (UniversalTag::ObjectIdentifier, Vec::<u8>::try_from(oid)?)
        }
        Element::UTF8String(s) => (UniversalTag::UTF8String, s.as_bytes().to_vec()),
        Element::PrintableString(s) => (UniversalTag::PrintableString, s.as_bytes().to_vec()),
        Element::IA5String(s) => (UniversalTag::IA5String, s.as_bytes().to_vec()),
        Element::VisibleString(s) => (UniversalTag::VisibleString, s.as_bytes().to_vec()),
        Element::T61String(s) => {
            let data = s
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| Error::T61StringOutOfRange))
                .collect::<Result<Vec<_>, _>>()?;
            (UniversalTag::T61String, data)
        }
        Element::BMPString(s) => (UniversalTag::BMPString, encode_bmp_string(s)?),
        Element::UTCTime(dt) => (UniversalTag::UTCTime, format_utc_time(dt)?.into_bytes()),
        Element::GeneralizedTime(dt) => (
            UniversalTag::GeneralizedTime,
            format_generalized_time(dt).into_bytes(),
        ),
        other => return Err(Error::ElementCannotEncode(other.name())),
    };
    Ok(encoded)
}

fn ascii_string(data: &[u8], valid: impl Fn(u8) -> bool, err: Error) -> Result<String, Error> {
    if !data.iter().all(|&b| valid(b)) {
        return Err(err);
    }
    String::from_utf8(data.to_vec()).map_err(|_| err)
}

/// A non-universal tagged value.
///
/// Primitive content is kept as raw octets, constructed content as child
/// elements (any number of them, so `[n] IMPLICIT SEQUENCE` is represented
/// faithfully).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged {
    class: Class,
    number: u8,
    content: TaggedContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggedContent {
    Primitive(Vec<u8>),
    Constructed(Vec<Element>),
}

impl Tagged {
    pub fn new(class: Class, number: u8, content: TaggedContent) -> Self {
        Tagged {
            class,
            number,
            content,
        }
    }

    /// `[number] EXPLICIT inner` in the context-specific class.
    pub fn explicit(number: u8, inner: Element) -> Self {
        Tagged::new(
            Class::ContextSpecific,
            number,
            TaggedContent::Constructed(vec![inner]),
        )
    }

    /// `[number] IMPLICIT inner` in the context-specific class: the tag of
    /// `inner` is replaced, its content kept.
    pub fn implicit(number: u8, inner: &Element) -> Result<Self, Error> {
        let content = match inner {
            Element::Sequence(elements) | Element::Set(elements) => {
                TaggedContent::Constructed(elements.clone())
            }
            Element::Tagged(_) => return Err(Error::ImplicitTagOnTagged(number)),
            Element::Unimplemented(tlv) => match tlv.data() {
                Some(data) => TaggedContent::Primitive(data.to_vec()),
                None => return Err(Error::ElementCannotEncode("unimplemented constructed value")),
            },
            primitive => TaggedContent::Primitive(encode_primitive(primitive)?.1),
        };
        Ok(Tagged::new(Class::ContextSpecific, number, content))
    }

    pub fn class(&self) -> Class {
        self.class
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn content(&self) -> &TaggedContent {
        &self.content
    }

    pub fn is_constructed(&self) -> bool {
        matches!(self.content, TaggedContent::Constructed(_))
    }

    pub fn is_context(&self, number: u8) -> bool {
        self.class == Class::ContextSpecific && self.number == number
    }

    /// The single element wrapped by an explicit tag.
    pub fn explicit_inner(&self) -> Result<&Element, Error> {
        match &self.content {
            TaggedContent::Constructed(elements) => match elements.as_slice() {
                [inner] => Ok(inner),
                elements => Err(Error::ExplicitTagElementCount {
                    number: self.number,
                    actual: elements.len(),
                }),
            },
            TaggedContent::Primitive(_) => Err(Error::ExplicitTagElementCount {
                number: self.number,
                actual: 0,
            }),
        }
    }

    /// Reads an implicitly tagged value as the universal type it replaced.
    pub fn implicit_as(&self, tag: UniversalTag) -> Result<Element, Error> {
        match (&self.content, tag) {
            (TaggedContent::Constructed(elements), UniversalTag::Sequence) => {
                Ok(Element::Sequence(elements.clone()))
            }
            (TaggedContent::Constructed(elements), UniversalTag::Set) => {
                Ok(Element::Set(elements.clone()))
            }
            (TaggedContent::Primitive(data), tag) if !tag.is_constructed() => {
                decode_primitive(tag, data)
            }
            _ => Err(Error::ImplicitTagMismatch {
                number: self.number,
                tag,
            }),
        }
    }
}

impl From<Tagged> for Element {
    fn from(tagged: Tagged) -> Self {
        Element::Tagged(tagged)
    }
}

impl Display for Tagged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let class = match self.class {
            Class::Universal => "UNIVERSAL ",
            Class::Application => "APPLICATION ",
            Class::ContextSpecific => "",
            Class::Private => "PRIVATE ",
        };
        match &self.content {
            TaggedContent::Primitive(data) => {
                write!(f, "[{}{}]({})", class, self.number, to_hex(data))
            }
            TaggedContent::Constructed(elements) => {
                write!(f, "[{}{}]{:?}", class, self.number, elements)
            }
        }
    }
}

// ASN1 integer is possible to be a positive and negative value.
// This can be arbitrary sized values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Integer {
    inner: BigInt,
}

impl Integer {
    /// Returns a reference to the inner BigInt
    pub fn as_bigint(&self) -> &BigInt {
        &self.inner
    }

    /// Minimal two's complement encoding.
    pub fn to_signed_bytes_be(&self) -> Vec<u8> {
        self.inner.to_signed_bytes_be()
    }

    pub fn to_u32(&self) -> Option<u32> {
        self.inner.to_u32()
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.inner.to_i64()
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.inner.to_u64()
    }
}

impl Serialize for Integer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.inner.to_string())
    }
}

impl<'de> Deserialize<'de> for Integer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let inner = s.parse::<BigInt>().map_err(serde::de::Error::custom)?;
        Ok(Integer { inner })
    }
}

impl TryFrom<&[u8]> for Integer {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(Error::IntegerNoData);
        }
        Ok(Integer {
            inner: BigInt::from_signed_bytes_be(value),
        })
    }
}

impl From<BigInt> for Integer {
    fn from(inner: BigInt) -> Self {
        Integer { inner }
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer {
            inner: BigInt::from(value),
        }
    }
}

impl From<u64> for Integer {
    fn from(value: u64) -> Self {
        Integer {
            inner: BigInt::from(value),
        }
    }
}

impl TryFrom<&Integer> for i64 {
    type Error = Error;

    fn try_from(value: &Integer) -> Result<Self, Self::Error> {
        value.inner.to_i64().ok_or(Error::IntegerOutOfRange("i64"))
    }
}

impl TryFrom<&Integer> for u64 {
    type Error = Error;

    fn try_from(value: &Integer) -> Result<Self, Self::Error> {
        value.inner.to_u64().ok_or(Error::IntegerOutOfRange("u64"))
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectIdentifier {
    inner: Vec<u64>,
}

impl ObjectIdentifier {
    pub fn arcs(&self) -> &[u64] {
        &self.inner
    }

    fn from_arcs(inner: Vec<u64>) -> Result<Self, Error> {
        match inner.as_slice() {
            [] | [_] => Err(Error::ObjectIdentifierTooFewComponents),
            [first, second, ..] if *first > 2 || (*first < 2 && *second >= 40) => {
                Err(Error::ObjectIdentifierInvalidRoot(*first, *second))
            }
            _ => {
                let oid = ObjectIdentifier { inner };
                // the first two arcs share one subidentifier, which must fit in 64 bits
                oid.first_subidentifier()?;
                Ok(oid)
            }
        }
    }

    fn first_subidentifier(&self) -> Result<u64, Error> {
        match self.inner.as_slice() {
            [a, b, ..] => a
                .checked_mul(40)
                .and_then(|v| v.checked_add(*b))
                .ok_or(Error::ObjectIdentifierArcOverflow),
            _ => Err(Error::ObjectIdentifierTooFewComponents),
        }
    }
}

impl Serialize for ObjectIdentifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ObjectIdentifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ObjectIdentifier::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<&[u8]> for ObjectIdentifier {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(Error::ObjectIdentifierNoData);
        }

        let mut subidentifiers = Vec::new();
        let mut val = 0u64;
        let mut fresh = true;
        for &b in value {
            if fresh && b == 0x80 {
                return Err(Error::ObjectIdentifierNonMinimalArc);
            }
            if val > (u64::MAX >> 7) {
                return Err(Error::ObjectIdentifierArcOverflow);
            }
            val = (val << 7) | u64::from(b & 0x7f);
            fresh = b & 0x80 == 0;
            if fresh {
                subidentifiers.push(val);
                val = 0;
            }
        }
        if !fresh {
            return Err(Error::ObjectIdentifierIncompleteEncoding);
        }

        // The first subidentifier packs the first two arcs.
        let first = subidentifiers[0];
        let (a, b) = match first {
            0..=39 => (0, first),
            40..=79 => (1, first - 40),
            _ => (2, first - 80),
        };
        let mut inner = Vec::with_capacity(subidentifiers.len() + 1);
        inner.push(a);
        inner.push(b);
        inner.extend_from_slice(&subidentifiers[1..]);
        Ok(ObjectIdentifier { inner })
    }
}

impl TryFrom<&ObjectIdentifier> for Vec<u8> {
    type Error = Error;

    fn try_from(oid: &ObjectIdentifier) -> Result<Self, Self::Error> {
        let first = oid.first_subidentifier()?;
        let rest = &oid.inner[2..];

        let mut result = Vec::new();
        for v in std::iter::once(&first).chain(rest) {
            let mut encoded = vec![(*v & 0x7f) as u8];
            let mut value = *v >> 7;
            while value > 0 {
                encoded.push((value & 0x7f) as u8 | 0x80);
                value >>= 7;
            }
            result.extend(encoded.iter().rev());
        }
        Ok(result)
    }
}

impl Display for ObjectIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self
            .inner
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", s)
    }
}

impl FromStr for ObjectIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split('.')
            .map(|c| {
                c.parse::<u64>()
                    .map_err(|source| Error::ObjectIdentifierInvalidComponent {
                        component: c.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<u64>, Error>>()?;
        ObjectIdentifier::from_arcs(values)
    }
}

impl PartialEq<&str> for ObjectIdentifier {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl PartialEq<ObjectIdentifier> for &str {
    fn eq(&self, other: &ObjectIdentifier) -> bool {
        *self == other.to_string()
    }
}

/// Trait for types that can be converted to an ObjectIdentifier
pub trait AsOid {
    fn as_oid(&self) -> Result<ObjectIdentifier, Error>;
}

impl AsOid for ObjectIdentifier {
    fn as_oid(&self) -> Result<ObjectIdentifier, Error> {
        Ok(self.clone())
    }
}

impl AsOid for &ObjectIdentifier {
    fn as_oid(&self) -> Result<ObjectIdentifier, Error> {
        Ok((*self).clone())
    }
}

impl AsOid for &str {
    fn as_oid(&self) -> Result<ObjectIdentifier, Error> {
        ObjectIdentifier::from_str(self)
    }
}

impl AsOid for String {
    fn as_oid(&self) -> Result<ObjectIdentifier, Error> {
        ObjectIdentifier::from_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitString {
    unused: u8,
    data: Vec<u8>,
}

impl serde::Serialize for BitString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            use serde::ser::SerializeStruct;
            let mut state = serializer.serialize_struct("BitString", 2)?;
            state.serialize_field("bit_length", &self.bit_len())?;
            let hex_string = self
                .data
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(":");
            state.serialize_field("bits", &hex_string)?;
            state.end()
        } else {
            (self.unused, &self.data).serialize(serializer)
        }
    }
}

impl<'de> serde::Deserialize<'de> for BitString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Readable {
            bit_length: usize,
            bits: String,
        }

        if deserializer.is_human_readable() {
            let readable = Readable::deserialize(deserializer)?;
            let data = from_hex(&readable.bits).map_err(serde::de::Error::custom)?;
            let unused = (data.len() * 8)
                .checked_sub(readable.bit_length)
                .filter(|u| *u < 8)
                .ok_or_else(|| serde::de::Error::custom("bit_length does not match bits"))?;
            Ok(BitString {
                unused: unused as u8,
                data,
            })
        } else {
            let (unused, data) = <(u8, Vec<u8>)>::deserialize(deserializer)?;
            BitString::new(unused, data).map_err(serde::de::Error::custom)
        }
    }
}

impl BitString {
    /// Creates a new BitString with the specified number of unused bits and data.
    ///
    /// `unused` must be 0-7, and 0 when `data` is empty.
    pub fn new(unused: u8, data: Vec<u8>) -> Result<Self, Error> {
        if unused > 7 || (unused != 0 && data.is_empty()) {
            return Err(Error::BitStringUnusedBitsOutOfRange(unused));
        }
        Ok(BitString { unused, data })
    }

    /// Returns the number of unused bits in the last byte
    pub fn unused_bits(&self) -> u8 {
        self.unused
    }

    /// Returns a reference to the underlying byte data
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the BitString and returns the underlying byte data
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the total number of bits (excluding unused bits)
    pub fn bit_len(&self) -> usize {
        if self.data.is_empty() {
            0
        } else {
            self.data.len() * 8 - self.unused as usize
        }
    }

    /// Bit `index` counted from the most significant bit of the first byte.
    pub fn bit(&self, index: usize) -> bool {
        if index >= self.bit_len() {
            return false;
        }
        self.data[index / 8] & (0x80 >> (index % 8)) != 0
    }

    /// Named-bit-list encoding: trailing zero bits are dropped as DER requires.
    pub fn from_bits(bits: &[bool]) -> Self {
        let last_bit = bits.iter().rposition(|&b| b).map_or(0, |p| p + 1);
        let num_bytes = last_bit.div_ceil(8);
        let mut data = vec![0u8; num_bytes];
        for (i, _) in bits[..last_bit].iter().enumerate().filter(|(_, b)| **b) {
            data[i / 8] |= 0x80 >> (i % 8);
        }
        let unused = (num_bytes * 8 - last_bit) as u8;
        BitString { unused, data }
    }
}

impl AsRef<[u8]> for BitString {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl TryFrom<&[u8]> for BitString {
    type Error = Error;
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        match value.split_first() {
            Some((&unused, data)) => BitString::new(unused, data.to_vec()),
            None => Err(Error::BitStringNoData),
        }
    }
}

impl TryFrom<Vec<u8>> for BitString {
    type Error = Error;
    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        BitString::try_from(value.as_slice())
    }
}

impl From<BitString> for Vec<u8> {
    fn from(value: BitString) -> Self {
        let mut result = Vec::with_capacity(value.data.len() + 1);
        result.push(value.unused);
        result.extend(value.data);
        result
    }
}

impl Display for BitString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = (0..self.bit_len())
            .map(|i| if self.bit(i) { '1' } else { '0' })
            .collect::<String>();
        write!(f, "{}", result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OctetString {
    inner: Vec<u8>,
}

impl Serialize for OctetString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&to_hex(&self.inner))
        } else {
            self.inner.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for OctetString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let hex_string = String::deserialize(deserializer)?;
            let inner = from_hex(&hex_string).map_err(serde::de::Error::custom)?;
            Ok(OctetString { inner })
        } else {
            let inner = Vec::<u8>::deserialize(deserializer)?;
            Ok(OctetString { inner })
        }
    }
}

impl OctetString {
    /// Returns the inner bytes as a slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Consumes self and returns the inner bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner
    }
}

impl TryFrom<&OctetString> for ASN1Object {
    type Error = Error;

    fn try_from(value: &OctetString) -> Result<Self, Self::Error> {
        let der: Der = value.as_bytes().decode().map_err(Error::FailedToDecodeDer)?;
        der.decode()
    }
}

impl AsRef<[u8]> for OctetString {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl From<Vec<u8>> for OctetString {
    fn from(value: Vec<u8>) -> Self {
        OctetString { inner: value }
    }
}

impl From<&[u8]> for OctetString {
    fn from(value: &[u8]) -> Self {
        OctetString {
            inner: value.to_vec(),
        }
    }
}

impl Display for OctetString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", to_hex(&self.inner))
    }
}

fn to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

fn from_hex(s: &str) -> Result<Vec<u8>, String> {
    // Remove any whitespace or common separators
    let cleaned = s.replace(|c: char| c.is_whitespace() || c == ':' || c == '-', "");
    if cleaned.len() % 2 != 0 {
        return Err("hex string must have even length".to_string());
    }
    (0..cleaned.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&cleaned[i..i + 2], 16)
                .map_err(|e| format!("invalid hex string: {}", e))
        })
        .collect()
}

fn parse_bmp_string(data: &[u8]) -> Result<String, Error> {
    if data.len() % 2 != 0 {
        return Err(Error::BmpStringOddLength(data.len()));
    }
    let units = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| match c {
            Ok(c) if u32::from(c) > 0xffff => Err(Error::BmpStringRequiresSurrogatePair),
            Ok(c) => Ok(c),
            Err(_) => Err(Error::BmpStringInvalidUtf16),
        })
        .collect()
}

fn encode_bmp_string(s: &str) -> Result<Vec<u8>, Error> {
    if s.chars().any(|c| u32::from(c) > 0xffff) {
        return Err(Error::BmpStringRequiresSurrogatePair);
    }
    Ok(s.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect())
}

// RFC 5280 4.1.2.5.1: two-digit years 50-99 are 19xx, 00-49 are 20xx.
fn parse_utc_time(data: &[u8]) -> Result<NaiveDateTime, Error> {
    // YYMMDDHHMMSSZ, digits only.
    match data.split_last() {
        Some((b'Z', digits)) if digits.len() == 12 && digits.iter().all(u8::is_ascii_digit) => {}
        _ => return Err(Error::UtcTimeInvalidFormat),
    }
    let s = std::str::from_utf8(data).map_err(|_| Error::UtcTimeInvalidFormat)?;
    let yy: i32 = s[..2].parse().map_err(|_| Error::UtcTimeInvalidFormat)?;
    let century = if yy >= 50 { 1900 } else { 2000 };
    NaiveDateTime::parse_from_str(&format!("{}{}", century + yy, &s[2..]), "%Y%m%d%H%M%SZ")
        .map_err(|_| Error::UtcTimeInvalidFormat)
}

fn format_utc_time(dt: &NaiveDateTime) -> Result<String, Error> {
    let year = chrono::Datelike::year(dt);
    if !(1950..=2049).contains(&year) {
        return Err(Error::UtcTimeOutOfRange(year));
    }
    Ok(format!("{:02}{}", year % 100, dt.format("%m%d%H%M%SZ")))
}

fn parse_generalized_time(data: &[u8]) -> Result<NaiveDateTime, Error> {
    if data.len() < 15 || !data[..14].iter().all(u8::is_ascii_digit) {
        return Err(Error::GeneralizedTimeInvalidFormat);
    }
    let s = std::str::from_utf8(data).map_err(|_| Error::GeneralizedTimeInvalidFormat)?;
    // DER forbids trailing zeros in the fraction.
    if s.contains('.') && (s.ends_with("0Z") || s.ends_with(".Z")) {
        return Err(Error::GeneralizedTimeInvalidFormat);
    }
    NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S%.fZ")
        .map_err(|_| Error::GeneralizedTimeInvalidFormat)
}

fn format_generalized_time(dt: &NaiveDateTime) -> String {
    let base = dt.format("%Y%m%d%H%M%S").to_string();
    match dt.nanosecond() {
        0 => format!("{}Z", base),
        nanos => {
            let fraction = format!("{:09}", nanos);
            format!("{}.{}Z", base, fraction.trim_end_matches('0'))
        }
    }
}
