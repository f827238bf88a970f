//! Tag-directed resolution from generic nodes to typed values.
//!
//! Every typed entity implements [`Resolve`]. Decoding from a node checks the
//! node's universal type or context tag before descending, fixed-shape
//! SEQUENCEs check their field count first, and optional fields are found by
//! looking at the tag of the next node.

use asn1::{BitString, Element, Integer, ObjectIdentifier, OctetString, Tagged, UniversalTag};
use log::trace;

use crate::error::{Error, Kind};

/// Bare host values accepted by a few types for compatibility with older callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyForm {
    Oid(ObjectIdentifier),
    Text(String),
    Code(i64),
}

impl LegacyForm {
    pub fn describe(&self) -> &'static str {
        match self {
            LegacyForm::Oid(_) => "bare OID",
            LegacyForm::Text(_) => "bare string",
            LegacyForm::Code(_) => "bare integer",
        }
    }
}

/// Anything a typed value can be resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolvable<T> {
    Typed(T),
    Node(Element),
    Legacy(LegacyForm),
}

impl<T> From<Element> for Resolvable<T> {
    fn from(node: Element) -> Self {
        Resolvable::Node(node)
    }
}

impl<T> From<LegacyForm> for Resolvable<T> {
    fn from(form: LegacyForm) -> Self {
        Resolvable::Legacy(form)
    }
}

pub trait Resolve: Sized {
    const KIND: Kind;

    fn from_node(node: &Element) -> Result<Self, Error>;

    fn to_node(&self) -> Result<Element, Error>;

    fn from_legacy(form: LegacyForm) -> Result<Self, Error> {
        Err(Error::UnsupportedLegacyForm {
            kind: Self::KIND,
            form: form.describe(),
        })
    }

    /// Already-typed input is returned unchanged.
    fn resolve(input: impl Into<Resolvable<Self>>) -> Result<Self, Error> {
        match input.into() {
            Resolvable::Typed(value) => Ok(value),
            Resolvable::Node(node) => {
                trace!("resolving {} from {}", Self::KIND, node);
                Self::from_node(&node)
            }
            Resolvable::Legacy(form) => {
                trace!("resolving {} from {}", Self::KIND, form.describe());
                Self::from_legacy(form)
            }
        }
    }

    fn from_der(bytes: &[u8]) -> Result<Self, Error> {
        Self::from_node(&Element::from_der(bytes)?)
    }

    fn to_der(&self) -> Result<Vec<u8>, Error> {
        Ok(self.to_node()?.to_der()?)
    }
}

/// Implements [`Resolve`] on top of a type's `Decoder`/`Encoder` impls.
macro_rules! resolvable {
    ($ty:ty, $kind:ident) => {
        impl $crate::resolve::Resolve for $ty {
            const KIND: $crate::error::Kind = $crate::error::Kind::$kind;

            fn from_node(node: &asn1::Element) -> Result<Self, $crate::error::Error> {
                shomei::decoder::Decoder::<asn1::Element, $ty>::decode(node)
            }

            fn to_node(&self) -> Result<asn1::Element, $crate::error::Error> {
                shomei::encoder::Encoder::<$ty, asn1::Element>::encode(self)
            }
        }
    };
}

pub(crate) use resolvable;

pub(crate) fn check_count(
    kind: Kind,
    actual: usize,
    min: usize,
    max: Option<usize>,
) -> Result<(), Error> {
    if actual < min || max.is_some_and(|max| actual > max) {
        return Err(Error::element_count(kind, min, max, actual));
    }
    Ok(())
}

/// The fields of a SEQUENCE holding between `min` and `max` elements.
pub(crate) fn sequence(
    kind: Kind,
    node: &Element,
    min: usize,
    max: usize,
) -> Result<&[Element], Error> {
    let elements = sequence_of(kind, node)?;
    check_count(kind, elements.len(), min, Some(max))?;
    Ok(elements)
}

/// The items of a `SEQUENCE OF` with no size bound.
pub(crate) fn sequence_of(kind: Kind, node: &Element) -> Result<&[Element], Error> {
    match node {
        Element::Sequence(elements) => Ok(elements),
        _ => Err(Error::expected(kind, "SEQUENCE")),
    }
}

/// The items of a `SEQUENCE SIZE (1..MAX) OF`.
pub(crate) fn non_empty_sequence_of(kind: Kind, node: &Element) -> Result<&[Element], Error> {
    let elements = sequence_of(kind, node)?;
    check_count(kind, elements.len(), 1, None)?;
    Ok(elements)
}

pub(crate) fn set_of(kind: Kind, node: &Element) -> Result<&[Element], Error> {
    match node {
        Element::Set(elements) => Ok(elements),
        _ => Err(Error::expected(kind, "SET")),
    }
}

pub(crate) fn tagged(kind: Kind, node: &Element) -> Result<&Tagged, Error> {
    match node {
        Element::Tagged(tagged) if tagged.class() == asn1::Class::ContextSpecific => Ok(tagged),
        _ => Err(Error::expected(kind, "context-specific tagged value")),
    }
}

pub(crate) fn oid(kind: Kind, node: &Element) -> Result<&ObjectIdentifier, Error> {
    match node {
        Element::ObjectIdentifier(oid) => Ok(oid),
        _ => Err(Error::expected(kind, "OBJECT IDENTIFIER")),
    }
}

pub(crate) fn integer(kind: Kind, node: &Element) -> Result<&Integer, Error> {
    match node {
        Element::Integer(integer) => Ok(integer),
        _ => Err(Error::expected(kind, "INTEGER")),
    }
}

pub(crate) fn bit_string(kind: Kind, node: &Element) -> Result<&BitString, Error> {
    match node {
        Element::BitString(bits) => Ok(bits),
        _ => Err(Error::expected(kind, "BIT STRING")),
    }
}

pub(crate) fn octet_string(kind: Kind, node: &Element) -> Result<&OctetString, Error> {
    match node {
        Element::OctetString(octets) => Ok(octets),
        _ => Err(Error::expected(kind, "OCTET STRING")),
    }
}

pub(crate) fn boolean(kind: Kind, node: &Element) -> Result<bool, Error> {
    match node {
        Element::Boolean(b) => Ok(*b),
        _ => Err(Error::expected(kind, "BOOLEAN")),
    }
}

pub(crate) fn small_integer(kind: Kind, integer: &Integer) -> Result<i64, Error> {
    integer
        .to_i64()
        .ok_or_else(|| Error::invalid(kind, format!("integer {} out of range", integer)))
}

/// Sorts a run of optional context-tagged fields into slots: slot `i` holds
/// tag `first_tag + i`. Tags must be increasing and each may appear once.
pub(crate) fn tagged_fields<'a, const N: usize>(
    kind: Kind,
    elements: &'a [Element],
    first_tag: u8,
) -> Result<[Option<&'a Tagged>; N], Error> {
    let mut slots = [None; N];
    let mut next_slot = 0;
    for element in elements {
        let field = tagged(kind, element)?;
        let slot = field
            .number()
            .checked_sub(first_tag)
            .map(usize::from)
            .filter(|slot| *slot >= next_slot && *slot < N)
            .ok_or_else(|| Error::unexpected_tag(kind, field.number()))?;
        slots[slot] = Some(field);
        next_slot = slot + 1;
    }
    Ok(slots)
}

/// `[number] IMPLICIT T`: the tag replaced `universal`.
pub(crate) fn from_implicit<T: Resolve>(
    tagged: &Tagged,
    universal: UniversalTag,
) -> Result<T, Error> {
    T::from_node(&tagged.implicit_as(universal)?)
}

pub(crate) fn to_implicit<T: Resolve>(value: &T, number: u8) -> Result<Element, Error> {
    Ok(Tagged::implicit(number, &value.to_node()?)?.into())
}

/// `[number] EXPLICIT T`: the tag wraps a complete `T`.
pub(crate) fn from_explicit<T: Resolve>(tagged: &Tagged) -> Result<T, Error> {
    T::from_node(tagged.explicit_inner()?)
}

pub(crate) fn to_explicit<T: Resolve>(value: &T, number: u8) -> Result<Element, Error> {
    Ok(Tagged::explicit(number, value.to_node()?).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Violation;
    use rstest::rstest;

    #[rstest(
        actual,
        min,
        max,
        ok,
        case(5, 6, Some(10), false),
        case(6, 6, Some(10), true),
        case(10, 6, Some(10), true),
        case(11, 6, Some(10), false),
        case(0, 1, None, false),
        case(100, 1, None, true),
    )]
    fn test_check_count(actual: usize, min: usize, max: Option<usize>, ok: bool) {
        assert_eq!(ok, check_count(Kind::TbsCertificate, actual, min, max).is_ok());
    }

    #[test]
    fn test_sequence_rejects_other_nodes() {
        let err = sequence(Kind::Validity, &Element::Null, 2, 2).unwrap_err();
        assert_eq!("Validity: expected SEQUENCE", err.to_string());
    }

    fn context(number: u8) -> Element {
        Element::Tagged(Tagged::new(
            asn1::Class::ContextSpecific,
            number,
            asn1::TaggedContent::Primitive(vec![0x01]),
        ))
    }

    #[rstest(
        tags,
        expected,
        case(vec![], vec![false, false, false]),
        case(vec![1], vec![false, true, false]),
        case(vec![0, 2], vec![true, false, true]),
        case(vec![0, 1, 2], vec![true, true, true]),
    )]
    fn test_tagged_fields(tags: Vec<u8>, expected: Vec<bool>) {
        let elements = tags.into_iter().map(context).collect::<Vec<_>>();
        let slots = tagged_fields::<3>(Kind::DistributionPoint, &elements, 0).unwrap();
        assert_eq!(expected, slots.iter().map(Option::is_some).collect::<Vec<_>>());
    }

    #[rstest(
        tags,
        first_tag,
        bad_tag,
        case::out_of_order(vec![1, 0], 0, 0),
        case::repeated(vec![1, 1], 0, 1),
        case::unknown(vec![3], 0, 3),
        case::below_first(vec![0], 1, 0),
    )]
    fn test_tagged_fields_rejects(tags: Vec<u8>, first_tag: u8, bad_tag: u8) {
        let elements = tags.into_iter().map(context).collect::<Vec<_>>();
        let err = tagged_fields::<3>(Kind::DistributionPoint, &elements, first_tag).unwrap_err();
        assert_eq!(Some(&Violation::UnexpectedTag(bad_tag)), err.violation());
    }

    #[test]
    fn test_tagged_rejects_application_class() {
        let node = Element::Tagged(Tagged::new(
            asn1::Class::Application,
            0,
            asn1::TaggedContent::Primitive(vec![]),
        ));
        assert!(tagged(Kind::Holder, &node).is_err());
    }
}
