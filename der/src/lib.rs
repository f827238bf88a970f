//! DER tag-length-value scanner and serializer.
//!
//! `Der` is a flat list of top-level [`Tlv`]s. Constructed values are parsed
//! recursively so the tree mirrors the encoding. Only the definite length form
//! and low tag numbers (0-30) are accepted, which covers every X.509 structure.

use nom::{IResult, Parser};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

pub mod error;

use error::Error;

pub const TAG_CONSTRUCTED: u8 = 0x20;
const TAG_NUMBER_MASK: u8 = 0x1f;
const TAG_CLASS_MASK: u8 = 0xc0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Der {
    elements: Vec<Tlv>,
}

impl Der {
    pub fn new(elements: Vec<Tlv>) -> Self {
        Der { elements }
    }

    pub fn elements(&self) -> &[Tlv] {
        &self.elements
    }

    fn parse(mut input: &[u8]) -> Result<Der, Error> {
        let mut elements = Vec::new();
        while !input.is_empty() {
            let (rest, tlv) = Tlv::parse(input)?;
            elements.push(tlv);
            input = rest;
        }
        Ok(Der { elements })
    }
}

impl DecodableFrom<Vec<u8>> for Der {}

impl Decoder<Vec<u8>, Der> for Vec<u8> {
    type Error = Error;

    fn decode(&self) -> Result<Der, Self::Error> {
        Der::parse(self)
    }
}

impl<'a> DecodableFrom<&'a [u8]> for Der {}

impl<'a> Decoder<&'a [u8], Der> for &'a [u8] {
    type Error = Error;

    fn decode(&self) -> Result<Der, Self::Error> {
        Der::parse(self)
    }
}

impl EncodableTo<Der> for Vec<u8> {}

impl Encoder<Der, Vec<u8>> for Der {
    type Error = Error;

    fn encode(&self) -> Result<Vec<u8>, Self::Error> {
        let mut out = Vec::new();
        for tlv in &self.elements {
            tlv.encode_into(&mut out)?;
        }
        Ok(out)
    }
}

/// Identifier class, the top two bits of the identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

impl Class {
    fn bits(self) -> u8 {
        match self {
            Class::Universal => 0x00,
            Class::Application => 0x40,
            Class::ContextSpecific => 0x80,
            Class::Private => 0xc0,
        }
    }

    fn from_identifier(identifier: u8) -> Self {
        match identifier & TAG_CLASS_MASK {
            0x00 => Class::Universal,
            0x40 => Class::Application,
            0x80 => Class::ContextSpecific,
            _ => Class::Private,
        }
    }
}

/// Universal tag numbers understood by the node model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniversalTag {
    Boolean,
    Integer,
    BitString,
    OctetString,
    Null,
    ObjectIdentifier,
    Enumerated,
    UTF8String,
    Sequence,
    Set,
    PrintableString,
    T61String,
    IA5String,
    UTCTime,
    GeneralizedTime,
    VisibleString,
    BMPString,
    Unimplemented(u8),
}

impl UniversalTag {
    /// SEQUENCE and SET are always constructed, everything else is primitive.
    pub fn is_constructed(&self) -> bool {
        matches!(self, UniversalTag::Sequence | UniversalTag::Set)
    }
}

impl From<u8> for UniversalTag {
    fn from(number: u8) -> Self {
        match number {
            0x01 => UniversalTag::Boolean,
            0x02 => UniversalTag::Integer,
            0x03 => UniversalTag::BitString,
            0x04 => UniversalTag::OctetString,
            0x05 => UniversalTag::Null,
            0x06 => UniversalTag::ObjectIdentifier,
            0x0a => UniversalTag::Enumerated,
            0x0c => UniversalTag::UTF8String,
            0x10 => UniversalTag::Sequence,
            0x11 => UniversalTag::Set,
            0x13 => UniversalTag::PrintableString,
            0x14 => UniversalTag::T61String,
            0x16 => UniversalTag::IA5String,
            0x17 => UniversalTag::UTCTime,
            0x18 => UniversalTag::GeneralizedTime,
            0x1a => UniversalTag::VisibleString,
            0x1e => UniversalTag::BMPString,
            n => UniversalTag::Unimplemented(n),
        }
    }
}

impl From<UniversalTag> for u8 {
    fn from(tag: UniversalTag) -> Self {
        match tag {
            UniversalTag::Boolean => 0x01,
            UniversalTag::Integer => 0x02,
            UniversalTag::BitString => 0x03,
            UniversalTag::OctetString => 0x04,
            UniversalTag::Null => 0x05,
            UniversalTag::ObjectIdentifier => 0x06,
            UniversalTag::Enumerated => 0x0a,
            UniversalTag::UTF8String => 0x0c,
            UniversalTag::Sequence => 0x10,
            UniversalTag::Set => 0x11,
            UniversalTag::PrintableString => 0x13,
            UniversalTag::T61String => 0x14,
            UniversalTag::IA5String => 0x16,
            UniversalTag::UTCTime => 0x17,
            UniversalTag::GeneralizedTime => 0x18,
            UniversalTag::VisibleString => 0x1a,
            UniversalTag::BMPString => 0x1e,
            UniversalTag::Unimplemented(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Universal {
        tag: UniversalTag,
        constructed: bool,
    },
    /// Application, context-specific or private tag.
    Tagged {
        class: Class,
        number: u8,
        constructed: bool,
    },
}

impl Tag {
    /// The natural tag of a universal type.
    pub fn universal(tag: UniversalTag) -> Self {
        Tag::Universal {
            tag,
            constructed: tag.is_constructed(),
        }
    }

    pub fn context(number: u8, constructed: bool) -> Self {
        Tag::Tagged {
            class: Class::ContextSpecific,
            number,
            constructed,
        }
    }

    pub fn is_constructed(&self) -> bool {
        match self {
            Tag::Universal { constructed, .. } | Tag::Tagged { constructed, .. } => *constructed,
        }
    }

    pub fn class(&self) -> Class {
        match self {
            Tag::Universal { .. } => Class::Universal,
            Tag::Tagged { class, .. } => *class,
        }
    }

    /// The identifier octet.
    pub fn identifier(&self) -> Result<u8, Error> {
        let (class, number, constructed) = match self {
            Tag::Universal { tag, constructed } => (Class::Universal, u8::from(*tag), *constructed),
            Tag::Tagged {
                class,
                number,
                constructed,
            } => (*class, *number, *constructed),
        };
        if number >= TAG_NUMBER_MASK {
            return Err(Error::TagNumberOutOfRange(number));
        }
        let constructed = if constructed { TAG_CONSTRUCTED } else { 0 };
        Ok(class.bits() | constructed | number)
    }
}

impl From<u8> for Tag {
    fn from(identifier: u8) -> Self {
        let constructed = identifier & TAG_CONSTRUCTED == TAG_CONSTRUCTED;
        let number = identifier & TAG_NUMBER_MASK;
        match Class::from_identifier(identifier) {
            Class::Universal => Tag::Universal {
                tag: UniversalTag::from(number),
                constructed,
            },
            class => Tag::Tagged {
                class,
                number,
                constructed,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tag: Tag,
    value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Tlv(Vec<Tlv>),
    Data(Vec<u8>),
}

impl Tlv {
    pub fn new_primitive(tag: Tag, data: Vec<u8>) -> Self {
        Tlv {
            tag,
            value: Value::Data(data),
        }
    }

    pub fn new_constructed(tag: Tag, tlvs: Vec<Tlv>) -> Self {
        Tlv {
            tag,
            value: Value::Tlv(tlvs),
        }
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Content octets of a primitive value.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Data(data) => Some(data),
            Value::Tlv(_) => None,
        }
    }

    /// Children of a constructed value.
    pub fn tlvs(&self) -> Option<&[Tlv]> {
        match &self.value {
            Value::Tlv(tlvs) => Some(tlvs),
            Value::Data(_) => None,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Tlv, Error> {
        let (input, tag) = parse_tag(input)?;
        let (input, length) = parse_length(input)?;
        let (input, data) = nom::bytes::complete::take::<_, _, Error>(length).parse(input)?;

        if tag.is_constructed() {
            let mut tlvs = Vec::new();
            let mut data = data;
            while !data.is_empty() {
                let (rest, tlv) = Self::parse(data)?;
                data = rest;
                tlvs.push(tlv);
            }
            return Ok((input, Tlv::new_constructed(tag, tlvs)));
        }

        Ok((input, Tlv::new_primitive(tag, data.to_vec())))
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        let identifier = self.tag.identifier()?;
        let content = match &self.value {
            Value::Data(data) => data.clone(),
            Value::Tlv(tlvs) => {
                let mut content = Vec::new();
                for tlv in tlvs {
                    tlv.encode_into(&mut content)?;
                }
                content
            }
        };
        out.push(identifier);
        out.extend(encode_length(content.len()));
        out.extend(content);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }
}

fn parse_tag(input: &[u8]) -> IResult<&[u8], Tag, Error> {
    let (input, identifier) = nom::number::complete::be_u8::<_, Error>(input)?;
    if identifier & TAG_NUMBER_MASK == TAG_NUMBER_MASK {
        return Err(nom::Err::Failure(Error::HighTagNumber));
    }
    Ok((input, Tag::from(identifier)))
}

fn parse_length(input: &[u8]) -> IResult<&[u8], usize, Error> {
    let (input, n) = nom::number::complete::be_u8::<_, Error>(input)?;
    if n & 0x80 == 0 {
        // short form: 0-127
        return Ok((input, n as usize));
    }
    // long form: the low 7 bits count the length octets that follow
    let count = (n & 0x7f) as usize;
    if count == 0 {
        return Err(nom::Err::Failure(Error::IndefiniteLength));
    }
    if count > std::mem::size_of::<usize>() {
        return Err(nom::Err::Failure(Error::LengthTooLong(count)));
    }
    let (input, bs) = nom::bytes::complete::take::<_, _, Error>(count).parse(input)?;
    if bs.first() == Some(&0) {
        return Err(nom::Err::Failure(Error::NonMinimalLength));
    }
    let length = bs.iter().fold(0usize, |n, &b| (n << 8) | b as usize);
    if length < 0x80 {
        return Err(nom::Err::Failure(Error::NonMinimalLength));
    }
    Ok((input, length))
}

fn encode_length(length: usize) -> Vec<u8> {
    if length < 0x80 {
        return vec![length as u8];
    }
    let bytes = length.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    let mut out = Vec::with_capacity(bytes.len() - skip + 1);
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use shomei::decoder::Decoder;
    use shomei::encoder::Encoder;

    use crate::error::Error;
    use crate::{
        Class, Der, Tag, Tlv, UniversalTag, Value, encode_length, parse_length, parse_tag,
    };

    #[rstest(input, expected,
        case(vec![0x02], Tag::universal(UniversalTag::Integer)),
        case(vec![0x02, 0x01], Tag::universal(UniversalTag::Integer)),
        case(vec![0x30, 0x01], Tag::universal(UniversalTag::Sequence)),
        case(vec![0x0a], Tag::universal(UniversalTag::Enumerated)),
        case(vec![0x1e], Tag::universal(UniversalTag::BMPString)),
        case(vec![0xa0], Tag::context(0, true)),
        case(vec![0x81], Tag::context(1, false)),
        case(vec![0x61], Tag::Tagged { class: Class::Application, number: 1, constructed: true }),
        case(vec![0xc2], Tag::Tagged { class: Class::Private, number: 2, constructed: false }),
    )]
    fn test_parse_tag(input: Vec<u8>, expected: Tag) {
        let (_, actual) = parse_tag(&input).unwrap();
        assert_eq!(expected, actual);
        assert_eq!(input[0], actual.identifier().unwrap());
    }

    #[test]
    fn test_parse_tag_high_tag_number() {
        let err = parse_tag(&[0x9f, 0x21]).unwrap_err();
        assert_eq!(nom::Err::Failure(Error::HighTagNumber), err);
    }

    #[rstest(input, expected,
        case(vec![0x02], 0x02),
        case(vec![0x7f, 0x01], 0x7f),
        case(vec![0x81, 0x80], 0x80),
        case(vec![0x82, 0x02, 0x10], 256 * 0x02 + 0x10),
        case(vec![0x83, 0x01, 0x00, 0x00], 256 * 256),
        case(vec![0x82, 0xff, 0xff], 256 * 0xff + 0xff),
    )]
    fn test_parse_length(input: Vec<u8>, expected: usize) {
        let (_, actual) = parse_length(&input).unwrap();
        assert_eq!(expected, actual);
    }

    #[rstest(input, expected,
        case::indefinite(vec![0x80], Error::IndefiniteLength),
        case::leading_zero(vec![0x82, 0x00, 0x90], Error::NonMinimalLength),
        case::short_in_long_form(vec![0x81, 0x05], Error::NonMinimalLength),
    )]
    fn test_parse_length_rejects(input: Vec<u8>, expected: Error) {
        let err = parse_length(&input).unwrap_err();
        assert_eq!(nom::Err::Failure(expected), err);
    }

    #[rstest(length, expected,
        case(0, vec![0x00]),
        case(0x7f, vec![0x7f]),
        case(0x80, vec![0x81, 0x80]),
        case(0x0210, vec![0x82, 0x02, 0x10]),
        case(0x010000, vec![0x83, 0x01, 0x00, 0x00]),
    )]
    fn test_encode_length(length: usize, expected: Vec<u8>) {
        assert_eq!(expected, encode_length(length));
    }

    #[rstest(input, expected,
        case(
            vec![0x02, 0x01, 0x01],
            Tlv::new_primitive(Tag::universal(UniversalTag::Integer), vec![0x01])
        ),
        case(
            vec![0x13, 0x02, 0x68, 0x69],
            Tlv::new_primitive(Tag::universal(UniversalTag::PrintableString), vec![0x68, 0x69])
        ),
        case(
            vec![0x0c, 0x04, 0xf0, 0x9f, 0x98, 0x8e],
            Tlv::new_primitive(
                Tag::universal(UniversalTag::UTF8String),
                vec![0xf0, 0x9f, 0x98, 0x8e]
            )
        ),
        case(
            vec![0x06, 0x03, 0x55, 0x1d, 0x0f],
            Tlv::new_primitive(
                Tag::universal(UniversalTag::ObjectIdentifier),
                vec![0x55, 0x1d, 0x0f]
            )
        ),
        case(vec![0x05, 0x00], Tlv::new_primitive(Tag::universal(UniversalTag::Null), vec![])),
        case(
            vec![0x03, 0x02, 0x05, 0xa0],
            Tlv::new_primitive(Tag::universal(UniversalTag::BitString), vec![0x05, 0xa0])
        ),
        case(
            vec![0x80, 0x02, 0xab, 0xcd],
            Tlv::new_primitive(Tag::context(0, false), vec![0xab, 0xcd])
        ),
        case(vec![0x30, 0x06, 0x02, 0x01, 0x07, 0x02, 0x01, 0x08], Tlv::new_constructed(
            Tag::universal(UniversalTag::Sequence),
            vec![
                Tlv::new_primitive(Tag::universal(UniversalTag::Integer), vec![0x07]),
                Tlv::new_primitive(Tag::universal(UniversalTag::Integer), vec![0x08]),
            ],
        )),
        // [1] IMPLICIT SEQUENCE with two children
        case(vec![0xa1, 0x06, 0x02, 0x01, 0x07, 0x01, 0x01, 0xff], Tlv::new_constructed(
            Tag::context(1, true),
            vec![
                Tlv::new_primitive(Tag::universal(UniversalTag::Integer), vec![0x07]),
                Tlv::new_primitive(Tag::universal(UniversalTag::Boolean), vec![0xff]),
            ],
        )),
    )]
    fn test_tlv_parse_and_encode(input: Vec<u8>, expected: Tlv) {
        let (rest, actual) = Tlv::parse(&input).unwrap();
        assert!(rest.is_empty());
        assert_eq!(expected, actual);
        assert_eq!(input, actual.to_bytes().unwrap());
    }

    #[test]
    fn test_tlv_parse_truncated_value() {
        let err = Tlv::parse(&[0x04, 0x05, 0x01]).unwrap_err();
        assert!(matches!(err, nom::Err::Error(Error::Parser(_))));
    }

    #[test]
    fn test_der_decode_multiple_top_level() {
        let bytes = vec![0x05, 0x00, 0x30, 0x03, 0x01, 0x01, 0x00];
        let der: Der = bytes.decode().unwrap();
        assert_eq!(2, der.elements().len());
        match der.elements()[1].value() {
            Value::Tlv(children) => assert_eq!(1, children.len()),
            Value::Data(_) => panic!("expected constructed value"),
        }
        let encoded: Vec<u8> = der.encode().unwrap();
        assert_eq!(bytes, encoded);
    }

    #[test]
    fn test_der_decode_long_form_value() {
        let mut bytes = vec![0x04, 0x81, 0x90];
        bytes.extend(std::iter::repeat_n(0x5a, 0x90));
        let der: Der = bytes.as_slice().decode().unwrap();
        assert_eq!(Some(0x90), der.elements()[0].data().map(|d| d.len()));
        let encoded: Vec<u8> = der.encode().unwrap();
        assert_eq!(bytes, encoded);
    }
}
