use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use asn1::{Element, ObjectIdentifier, OctetString, Tagged, TaggedContent, UniversalTag};
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use log::debug;
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};

use crate::error::{Error, Kind};
use crate::name::Name;
use crate::resolve::{self, Resolve, resolvable};

/// An iPAddress name: a single address in subjectAltName, an address and
/// mask in NameConstraints. Octets that are neither (a mask that is not a
/// prefix, or a length other than 4, 8, 16 or 32) are kept as `Raw`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpAddressOrRange {
    Address(IpAddr),
    Network(IpNet),
    Raw(Vec<u8>),
}

/// The prefix length of a contiguous mask.
fn prefix_len(mask: u128, bits: u32) -> Option<u8> {
    let prefix = mask.leading_ones().min(bits);
    let host = mask.checked_shl(prefix).unwrap_or(0);
    (host == 0).then_some(prefix as u8)
}

impl IpAddressOrRange {
    fn from_octets(bytes: &[u8]) -> Self {
        let parsed = match bytes.len() {
            4 => <[u8; 4]>::try_from(bytes)
                .ok()
                .map(|v4| IpAddressOrRange::Address(IpAddr::from(v4))),
            16 => <[u8; 16]>::try_from(bytes)
                .ok()
                .map(|v6| IpAddressOrRange::Address(IpAddr::from(v6))),
            8 => {
                let (addr, mask) = bytes.split_at(4);
                let addr = <[u8; 4]>::try_from(addr).ok().map(Ipv4Addr::from);
                let mask = <[u8; 4]>::try_from(mask).ok().map(u32::from_be_bytes);
                addr.zip(mask)
                    .and_then(|(addr, mask)| {
                        let prefix = prefix_len(u128::from(mask) << 96, 32)?;
                        Ipv4Net::new(addr, prefix).ok()
                    })
                    .map(|net| IpAddressOrRange::Network(IpNet::V4(net)))
            }
            32 => {
                let (addr, mask) = bytes.split_at(16);
                let addr = <[u8; 16]>::try_from(addr).ok().map(Ipv6Addr::from);
                let mask = <[u8; 16]>::try_from(mask).ok().map(u128::from_be_bytes);
                addr.zip(mask)
                    .and_then(|(addr, mask)| {
                        let prefix = prefix_len(mask, 128)?;
                        Ipv6Net::new(addr, prefix).ok()
                    })
                    .map(|net| IpAddressOrRange::Network(IpNet::V6(net)))
            }
            _ => None,
        };
        parsed.unwrap_or_else(|| {
            debug!("iPAddress kept as {} raw octets", bytes.len());
            IpAddressOrRange::Raw(bytes.to_vec())
        })
    }

    fn to_octets(&self) -> Vec<u8> {
        match self {
            IpAddressOrRange::Address(IpAddr::V4(addr)) => addr.octets().to_vec(),
            IpAddressOrRange::Address(IpAddr::V6(addr)) => addr.octets().to_vec(),
            IpAddressOrRange::Network(IpNet::V4(net)) => {
                [net.addr().octets(), net.netmask().octets()].concat()
            }
            IpAddressOrRange::Network(IpNet::V6(net)) => {
                [net.addr().octets(), net.netmask().octets()].concat()
            }
            IpAddressOrRange::Raw(bytes) => bytes.clone(),
        }
    }
}

impl fmt::Display for IpAddressOrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpAddressOrRange::Address(addr) => write!(f, "{}", addr),
            IpAddressOrRange::Network(net) => write!(f, "{}", net),
            IpAddressOrRange::Raw(bytes) => {
                let hex = bytes
                    .iter()
                    .map(|b| format!("{:02X}", b))
                    .collect::<Vec<_>>();
                write!(f, "<raw {}>", hex.join(":"))
            }
        }
    }
}

/*
RFC 5280 Section 4.2.1.6

GeneralName ::= CHOICE {
    otherName                 [0] OtherName,
    rfc822Name                [1] IA5String,
    dNSName                   [2] IA5String,
    x400Address               [3] ORAddress,
    directoryName             [4] Name,
    ediPartyName              [5] EDIPartyName,
    uniformResourceIdentifier [6] IA5String,
    iPAddress                 [7] OCTET STRING,
    registeredID              [8] OBJECT IDENTIFIER
}

OtherName ::= SEQUENCE {
    type-id    OBJECT IDENTIFIER,
    value      [0] EXPLICIT ANY DEFINED BY type-id
}

EDIPartyName ::= SEQUENCE {
    nameAssigner [0] DirectoryString OPTIONAL,
    partyName    [1] DirectoryString
}

The module uses IMPLICIT tagging, but Name and DirectoryString are CHOICE
types, so directoryName and the EDIPartyName fields are explicitly tagged.
*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneralName {
    OtherName(OtherName),
    Rfc822Name(String),
    DnsName(String),
    /// ORAddress content, kept as-is.
    X400Address(Vec<Element>),
    DirectoryName(Name),
    EdiPartyName(EdiPartyName),
    Uri(String),
    IpAddress(IpAddressOrRange),
    RegisteredId(ObjectIdentifier),
}

impl GeneralName {
    fn ia5(tagged: &Tagged) -> Result<String, Error> {
        match tagged.implicit_as(UniversalTag::IA5String)? {
            Element::IA5String(s) => Ok(s),
            _ => Err(Error::expected(Kind::GeneralName, "IA5String")),
        }
    }

    fn implicit_ia5(number: u8, value: &str) -> Result<Element, Error> {
        Ok(Tagged::implicit(number, &Element::IA5String(value.to_string()))?.into())
    }
}

impl fmt::Display for GeneralName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneralName::OtherName(other) => write!(f, "othername:{}", other.type_id),
            GeneralName::Rfc822Name(email) => write!(f, "email:{}", email),
            GeneralName::DnsName(dns) => write!(f, "DNS:{}", dns),
            GeneralName::X400Address(_) => write!(f, "X400Name:<unsupported>"),
            GeneralName::DirectoryName(name) => write!(f, "DirName:{}", name),
            GeneralName::EdiPartyName(_) => write!(f, "EdiPartyName:<unsupported>"),
            GeneralName::Uri(uri) => write!(f, "URI:{}", uri),
            GeneralName::IpAddress(ip) => write!(f, "IP Address:{}", ip),
            GeneralName::RegisteredId(oid) => write!(f, "Registered ID:{}", oid),
        }
    }
}

impl DecodableFrom<Element> for GeneralName {}

impl Decoder<Element, GeneralName> for Element {
    type Error = Error;

    fn decode(&self) -> Result<GeneralName, Self::Error> {
        let kind = Kind::GeneralName;
        let tagged = resolve::tagged(kind, self)?;
        match tagged.number() {
            0 => Ok(GeneralName::OtherName(resolve::from_implicit(
                tagged,
                UniversalTag::Sequence,
            )?)),
            1 => GeneralName::ia5(tagged).map(GeneralName::Rfc822Name),
            2 => GeneralName::ia5(tagged).map(GeneralName::DnsName),
            3 => match tagged.content() {
                TaggedContent::Constructed(elements) => {
                    Ok(GeneralName::X400Address(elements.clone()))
                }
                TaggedContent::Primitive(_) => Err(Error::expected(kind, "ORAddress SEQUENCE")),
            },
            4 => Ok(GeneralName::DirectoryName(resolve::from_explicit(tagged)?)),
            5 => Ok(GeneralName::EdiPartyName(resolve::from_implicit(
                tagged,
                UniversalTag::Sequence,
            )?)),
            6 => GeneralName::ia5(tagged).map(GeneralName::Uri),
            7 => match tagged.implicit_as(UniversalTag::OctetString)? {
                Element::OctetString(octets) => Ok(GeneralName::IpAddress(
                    IpAddressOrRange::from_octets(octets.as_bytes()),
                )),
                _ => Err(Error::expected(kind, "OCTET STRING")),
            },
            8 => match tagged.implicit_as(UniversalTag::ObjectIdentifier)? {
                Element::ObjectIdentifier(oid) => Ok(GeneralName::RegisteredId(oid)),
                _ => Err(Error::expected(kind, "OBJECT IDENTIFIER")),
            },
            other => Err(Error::unexpected_tag(kind, other)),
        }
    }
}

impl EncodableTo<GeneralName> for Element {}

impl Encoder<GeneralName, Element> for GeneralName {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        match self {
            GeneralName::OtherName(other) => resolve::to_implicit(other, 0),
            GeneralName::Rfc822Name(email) => GeneralName::implicit_ia5(1, email),
            GeneralName::DnsName(dns) => GeneralName::implicit_ia5(2, dns),
            GeneralName::X400Address(elements) => Ok(Tagged::new(
                asn1::Class::ContextSpecific,
                3,
                TaggedContent::Constructed(elements.clone()),
            )
            .into()),
            GeneralName::DirectoryName(name) => resolve::to_explicit(name, 4),
            GeneralName::EdiPartyName(edi) => resolve::to_implicit(edi, 5),
            GeneralName::Uri(uri) => GeneralName::implicit_ia5(6, uri),
            GeneralName::IpAddress(ip) => Ok(Tagged::implicit(
                7,
                &Element::OctetString(OctetString::from(ip.to_octets())),
            )?
            .into()),
            GeneralName::RegisteredId(oid) => {
                Ok(Tagged::implicit(8, &Element::ObjectIdentifier(oid.clone()))?.into())
            }
        }
    }
}

resolvable!(GeneralName, GeneralName);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherName {
    pub type_id: ObjectIdentifier,
    pub value: Element,
}

impl DecodableFrom<Element> for OtherName {}

impl Decoder<Element, OtherName> for Element {
    type Error = Error;

    fn decode(&self) -> Result<OtherName, Self::Error> {
        let kind = Kind::OtherName;
        let elements = resolve::sequence(kind, self, 2, 2)?;
        let type_id = resolve::oid(kind, &elements[0])?.clone();
        let value = resolve::tagged(kind, &elements[1])?;
        if !value.is_context(0) {
            return Err(Error::unexpected_tag(kind, value.number()));
        }
        Ok(OtherName {
            type_id,
            value: value.explicit_inner()?.clone(),
        })
    }
}

impl EncodableTo<OtherName> for Element {}

impl Encoder<OtherName, Element> for OtherName {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            Element::ObjectIdentifier(self.type_id.clone()),
            Tagged::explicit(0, self.value.clone()).into(),
        ]))
    }
}

resolvable!(OtherName, OtherName);

/// DirectoryString values are kept as the string nodes they were encoded with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdiPartyName {
    pub name_assigner: Option<Element>,
    pub party_name: Element,
}

impl DecodableFrom<Element> for EdiPartyName {}

impl Decoder<Element, EdiPartyName> for Element {
    type Error = Error;

    fn decode(&self) -> Result<EdiPartyName, Self::Error> {
        let kind = Kind::EdiPartyName;
        let elements = resolve::sequence(kind, self, 1, 2)?;
        let mut name_assigner = None;
        let mut party_name = None;
        for element in elements {
            let tagged = resolve::tagged(kind, element)?;
            match tagged.number() {
                0 if name_assigner.is_none() && party_name.is_none() => {
                    name_assigner = Some(tagged.explicit_inner()?.clone());
                }
                1 if party_name.is_none() => {
                    party_name = Some(tagged.explicit_inner()?.clone());
                }
                other => return Err(Error::unexpected_tag(kind, other)),
            }
        }
        Ok(EdiPartyName {
            name_assigner,
            party_name: party_name.ok_or_else(|| Error::expected(kind, "partyName [1]"))?,
        })
    }
}

impl EncodableTo<EdiPartyName> for Element {}

impl Encoder<EdiPartyName, Element> for EdiPartyName {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = Vec::with_capacity(2);
        if let Some(assigner) = &self.name_assigner {
            elements.push(Tagged::explicit(0, assigner.clone()).into());
        }
        elements.push(Tagged::explicit(1, self.party_name.clone()).into());
        Ok(Element::Sequence(elements))
    }
}

resolvable!(EdiPartyName, EdiPartyName);

/// `GeneralNames ::= SEQUENCE SIZE (1..MAX) OF GeneralName`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneralNames(Vec<GeneralName>);

impl GeneralNames {
    pub fn new(names: Vec<GeneralName>) -> Result<Self, Error> {
        resolve::check_count(Kind::GeneralNames, names.len(), 1, None)?;
        Ok(GeneralNames(names))
    }

    pub fn names(&self) -> &[GeneralName] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeneralName> {
        self.0.iter()
    }
}

impl From<GeneralName> for GeneralNames {
    fn from(name: GeneralName) -> Self {
        GeneralNames(vec![name])
    }
}

impl<'a> IntoIterator for &'a GeneralNames {
    type Item = &'a GeneralName;
    type IntoIter = std::slice::Iter<'a, GeneralName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl DecodableFrom<Element> for GeneralNames {}

impl Decoder<Element, GeneralNames> for Element {
    type Error = Error;

    fn decode(&self) -> Result<GeneralNames, Self::Error> {
        let names = resolve::non_empty_sequence_of(Kind::GeneralNames, self)?
            .iter()
            .map(GeneralName::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GeneralNames(names))
    }
}

impl EncodableTo<GeneralNames> for Element {}

impl Encoder<GeneralNames, Element> for GeneralNames {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let names = self
            .0
            .iter()
            .map(|name| name.to_node())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Element::Sequence(names))
    }
}

resolvable!(GeneralNames, GeneralNames);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Violation;
    use crate::name::tests::common_name;
    use hex_literal::hex;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest(
        der,
        expected,
        case::dns(
            hex!("82 0b 65 78 61 6d 70 6c 65 2e 63 6f 6d").to_vec(),
            GeneralName::DnsName("example.com".to_string())
        ),
        case::email(
            hex!("81 0d 61 64 6d 69 6e 40 65 78 2e 63 6f 6d 2e").to_vec(),
            GeneralName::Rfc822Name("admin@ex.com.".to_string())
        ),
        case::uri(
            hex!("86 0f 68 74 74 70 3a 2f 2f 65 78 2e 63 6f 6d 2f 61").to_vec(),
            GeneralName::Uri("http://ex.com/a".to_string())
        ),
        case::ipv4(
            hex!("87 04 c0 a8 01 01").to_vec(),
            GeneralName::IpAddress(IpAddressOrRange::Address("192.168.1.1".parse().unwrap()))
        ),
        case::ipv4_network(
            hex!("87 08 c0 a8 00 00 ff ff 00 00").to_vec(),
            GeneralName::IpAddress(IpAddressOrRange::Network("192.168.0.0/16".parse().unwrap()))
        ),
        case::ipv6(
            hex!("87 10 20 01 0d b8 00 00 00 00 00 00 00 00 00 00 00 01").to_vec(),
            GeneralName::IpAddress(IpAddressOrRange::Address("2001:db8::1".parse().unwrap()))
        ),
        case::registered_id(
            hex!("88 03 2a 03 04").to_vec(),
            GeneralName::RegisteredId(ObjectIdentifier::from_str("1.2.3.4").unwrap())
        ),
        case::directory_name(
            hex!("a4 14 30 12 31 10 30 0e 06 03 55 04 03 0c 07 45 78 61 6d 70 6c 65").to_vec(),
            GeneralName::DirectoryName(common_name("Example"))
        ),
        case::other_name(
            hex!("a0 11 06 03 2a 03 04 a0 0a 0c 08 75 73 65 72 40 65 78 31").to_vec(),
            GeneralName::OtherName(OtherName {
                type_id: ObjectIdentifier::from_str("1.2.3.4").unwrap(),
                value: Element::UTF8String("user@ex1".to_string()),
            })
        ),
        case::edi_party_name(
            hex!("a5 0a a0 03 0c 01 41 a1 03 0c 01 42").to_vec(),
            GeneralName::EdiPartyName(EdiPartyName {
                name_assigner: Some(Element::UTF8String("A".to_string())),
                party_name: Element::UTF8String("B".to_string()),
            })
        ),
    )]
    fn test_general_name_round_trip(der: Vec<u8>, expected: GeneralName) {
        let name = GeneralName::from_der(&der).unwrap();
        assert_eq!(expected, name);
        assert_eq!(der, name.to_der().unwrap());
    }

    #[rstest(
        input,
        expected,
        case::unknown_tag(hex!("89 01 00").to_vec(), Violation::UnexpectedTag(9)),
        case::untagged(
            hex!("16 01 41").to_vec(),
            Violation::Expected("context-specific tagged value")
        ),
    )]
    fn test_general_name_decode_failure(input: Vec<u8>, expected: Violation) {
        let err = GeneralName::from_der(&input).unwrap_err();
        assert_eq!(Some(&expected), err.violation());
    }

    #[rstest(
        der,
        shown,
        case::five_octets(hex!("87 05 01 02 03 04 05").to_vec(), "<raw 01:02:03:04:05>"),
        case::non_prefix_mask(
            hex!("87 08 0a 00 00 00 ff 00 ff 00").to_vec(),
            "<raw 0A:00:00:00:FF:00:FF:00>"
        ),
        case::empty(hex!("87 00").to_vec(), "<raw >"),
    )]
    fn test_ip_address_raw_octets_round_trip(der: Vec<u8>, shown: &str) {
        let name = GeneralName::from_der(&der).unwrap();
        let GeneralName::IpAddress(IpAddressOrRange::Raw(bytes)) = &name else {
            panic!("expected raw iPAddress octets, got {:?}", name);
        };
        assert_eq!(&der[2..], bytes.as_slice());
        assert_eq!(format!("IP Address:{}", shown), name.to_string());
        assert_eq!(der, name.to_der().unwrap());
    }

    #[test]
    fn test_ip_network_keeps_host_bits() {
        let der = hex!("87 08 0a 01 02 03 ff 00 00 00");
        let name = GeneralName::from_der(&der).unwrap();
        assert_eq!("IP Address:10.1.2.3/8", name.to_string());
        assert_eq!(der.to_vec(), name.to_der().unwrap());
    }

    #[test]
    fn test_general_names_must_not_be_empty() {
        let err = GeneralNames::from_der(&hex!("30 00")).unwrap_err();
        assert_eq!(
            Some(&Violation::ElementCount { min: 1, max: None, actual: 0 }),
            err.violation()
        );
        assert!(GeneralNames::new(vec![]).is_err());
    }

    #[test]
    fn test_general_name_display() {
        let names = GeneralNames::new(vec![
            GeneralName::DnsName("example.com".to_string()),
            GeneralName::IpAddress(IpAddressOrRange::Network("10.0.0.0/8".parse().unwrap())),
        ])
        .unwrap();
        let shown = names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        assert_eq!(vec!["DNS:example.com", "IP Address:10.0.0.0/8"], shown);
    }
}
