use asn1::{Element, Integer, ObjectIdentifier};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};
use std::fmt;

use crate::error::{Error, Kind};
use crate::extensions::Extension;
use crate::oid;
use crate::resolve::{self, LegacyForm, Resolve, resolvable};

/*
RFC 5280 Section 4.2.1.4

certificatePolicies ::= SEQUENCE SIZE (1..MAX) OF PolicyInformation

PolicyInformation ::= SEQUENCE {
    policyIdentifier   CertPolicyId,
    policyQualifiers   SEQUENCE SIZE (1..MAX) OF
                            PolicyQualifierInfo OPTIONAL }

CertPolicyId ::= OBJECT IDENTIFIER

PolicyQualifierInfo ::= SEQUENCE {
    policyQualifierId  PolicyQualifierId,
    qualifier          ANY DEFINED BY policyQualifierId }

Qualifier ::= CHOICE {
    cPSuri           CPSuri,
    userNotice       UserNotice }

CPSuri ::= IA5String

UserNotice ::= SEQUENCE {
    noticeRef        NoticeReference OPTIONAL,
    explicitText     DisplayText OPTIONAL }

NoticeReference ::= SEQUENCE {
    organization     DisplayText,
    noticeNumbers    SEQUENCE OF INTEGER }

DisplayText ::= CHOICE {
    ia5String        IA5String      (SIZE (1..200)),
    visibleString    VisibleString  (SIZE (1..200)),
    bmpString        BMPString      (SIZE (1..200)),
    utf8String       UTF8String     (SIZE (1..200)) }
*/

/// Upper bound on DisplayText length, in characters.
pub const DISPLAY_TEXT_MAXIMUM_SIZE: usize = 200;

/// A certificate policy OID (CertPolicyId).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyId(ObjectIdentifier);

impl PolicyId {
    pub fn new(oid: ObjectIdentifier) -> Self {
        PolicyId(oid)
    }

    /// The special anyPolicy identifier (2.5.29.32.0).
    pub fn any_policy() -> Result<Self, Error> {
        Ok(PolicyId(oid::ANY_POLICY.parse()?))
    }

    pub fn oid(&self) -> &ObjectIdentifier {
        &self.0
    }

    pub fn is_any_policy(&self) -> bool {
        self.0 == oid::ANY_POLICY
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl DecodableFrom<Element> for PolicyId {}

impl Decoder<Element, PolicyId> for Element {
    type Error = Error;

    fn decode(&self) -> Result<PolicyId, Self::Error> {
        Ok(PolicyId(resolve::oid(Kind::PolicyId, self)?.clone()))
    }
}

impl EncodableTo<PolicyId> for Element {}

impl Encoder<PolicyId, Element> for PolicyId {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::ObjectIdentifier(self.0.clone()))
    }
}

impl Resolve for PolicyId {
    const KIND: Kind = Kind::PolicyId;

    fn from_node(node: &Element) -> Result<Self, Error> {
        node.decode()
    }

    fn to_node(&self) -> Result<Element, Error> {
        self.encode()
    }

    fn from_legacy(form: LegacyForm) -> Result<Self, Error> {
        match form {
            LegacyForm::Oid(oid) => Ok(PolicyId(oid)),
            other => Err(Error::UnsupportedLegacyForm {
                kind: Self::KIND,
                form: other.describe(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayTextEncoding {
    Ia5,
    Visible,
    Bmp,
    Utf8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayText {
    encoding: DisplayTextEncoding,
    text: String,
}

impl DisplayText {
    /// Text longer than [`DISPLAY_TEXT_MAXIMUM_SIZE`] characters is cut to
    /// that length.
    pub fn new(encoding: DisplayTextEncoding, text: &str) -> Self {
        DisplayText {
            encoding,
            text: text.chars().take(DISPLAY_TEXT_MAXIMUM_SIZE).collect(),
        }
    }

    pub fn encoding(&self) -> DisplayTextEncoding {
        self.encoding
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for DisplayText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl DecodableFrom<Element> for DisplayText {}

impl Decoder<Element, DisplayText> for Element {
    type Error = Error;

    // Received text is kept as-is, even when it exceeds the size limit.
    fn decode(&self) -> Result<DisplayText, Self::Error> {
        let (encoding, text) = match self {
            Element::IA5String(s) => (DisplayTextEncoding::Ia5, s),
            Element::VisibleString(s) => (DisplayTextEncoding::Visible, s),
            Element::BMPString(s) => (DisplayTextEncoding::Bmp, s),
            Element::UTF8String(s) => (DisplayTextEncoding::Utf8, s),
            _ => {
                return Err(Error::expected(
                    Kind::DisplayText,
                    "IA5String, VisibleString, BMPString or UTF8String",
                ));
            }
        };
        Ok(DisplayText {
            encoding,
            text: text.clone(),
        })
    }
}

impl EncodableTo<DisplayText> for Element {}

impl Encoder<DisplayText, Element> for DisplayText {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let text = self.text.clone();
        Ok(match self.encoding {
            DisplayTextEncoding::Ia5 => Element::IA5String(text),
            DisplayTextEncoding::Visible => Element::VisibleString(text),
            DisplayTextEncoding::Bmp => Element::BMPString(text),
            DisplayTextEncoding::Utf8 => Element::UTF8String(text),
        })
    }
}

impl Resolve for DisplayText {
    const KIND: Kind = Kind::DisplayText;

    fn from_node(node: &Element) -> Result<Self, Error> {
        node.decode()
    }

    fn to_node(&self) -> Result<Element, Error> {
        self.encode()
    }

    fn from_legacy(form: LegacyForm) -> Result<Self, Error> {
        match form {
            LegacyForm::Text(text) => Ok(DisplayText::new(DisplayTextEncoding::Utf8, &text)),
            other => Err(Error::UnsupportedLegacyForm {
                kind: Self::KIND,
                form: other.describe(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeReference {
    pub organization: DisplayText,
    pub notice_numbers: Vec<Integer>,
}

impl DecodableFrom<Element> for NoticeReference {}

impl Decoder<Element, NoticeReference> for Element {
    type Error = Error;

    fn decode(&self) -> Result<NoticeReference, Self::Error> {
        let kind = Kind::NoticeReference;
        let elements = resolve::sequence(kind, self, 2, 2)?;
        let notice_numbers = resolve::sequence_of(kind, &elements[1])?
            .iter()
            .map(|node| resolve::integer(kind, node).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NoticeReference {
            organization: DisplayText::from_node(&elements[0])?,
            notice_numbers,
        })
    }
}

impl EncodableTo<NoticeReference> for Element {}

impl Encoder<NoticeReference, Element> for NoticeReference {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(vec![
            self.organization.to_node()?,
            Element::Sequence(
                self.notice_numbers
                    .iter()
                    .cloned()
                    .map(Element::Integer)
                    .collect(),
            ),
        ]))
    }
}

resolvable!(NoticeReference, NoticeReference);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotice {
    pub notice_ref: Option<NoticeReference>,
    pub explicit_text: Option<DisplayText>,
}

impl DecodableFrom<Element> for UserNotice {}

impl Decoder<Element, UserNotice> for Element {
    type Error = Error;

    fn decode(&self) -> Result<UserNotice, Self::Error> {
        let kind = Kind::UserNotice;
        let elements = resolve::sequence(kind, self, 0, 2)?;
        // noticeRef is the only SEQUENCE alternative, so it leads when present
        let (notice_ref, rest) = match elements {
            [first @ Element::Sequence(_), rest @ ..] => {
                (Some(NoticeReference::from_node(first)?), rest)
            }
            rest => (None, rest),
        };
        let explicit_text = match rest {
            [] => None,
            [text] => Some(DisplayText::from_node(text)?),
            _ => return Err(Error::expected(kind, "noticeRef before explicitText")),
        };
        Ok(UserNotice {
            notice_ref,
            explicit_text,
        })
    }
}

impl EncodableTo<UserNotice> for Element {}

impl Encoder<UserNotice, Element> for UserNotice {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = Vec::new();
        if let Some(notice_ref) = &self.notice_ref {
            elements.push(notice_ref.to_node()?);
        }
        if let Some(text) = &self.explicit_text {
            elements.push(text.to_node()?);
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(UserNotice, UserNotice);

/// A policy qualifier, typed for the two qualifiers RFC 5280 defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyQualifierInfo {
    Cps(String),
    UserNotice(UserNotice),
    Other {
        id: ObjectIdentifier,
        qualifier: Element,
    },
}

impl DecodableFrom<Element> for PolicyQualifierInfo {}

impl Decoder<Element, PolicyQualifierInfo> for Element {
    type Error = Error;

    fn decode(&self) -> Result<PolicyQualifierInfo, Self::Error> {
        let kind = Kind::PolicyQualifierInfo;
        let elements = resolve::sequence(kind, self, 2, 2)?;
        let id = resolve::oid(kind, &elements[0])?;
        let qualifier = &elements[1];
        if *id == oid::QT_CPS {
            match qualifier {
                Element::IA5String(uri) => Ok(PolicyQualifierInfo::Cps(uri.clone())),
                _ => Err(Error::expected(kind, "IA5String CPS URI")),
            }
        } else if *id == oid::QT_UNOTICE {
            Ok(PolicyQualifierInfo::UserNotice(UserNotice::from_node(
                qualifier,
            )?))
        } else {
            Ok(PolicyQualifierInfo::Other {
                id: id.clone(),
                qualifier: qualifier.clone(),
            })
        }
    }
}

impl EncodableTo<PolicyQualifierInfo> for Element {}

impl Encoder<PolicyQualifierInfo, Element> for PolicyQualifierInfo {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let (id, qualifier): (ObjectIdentifier, Element) = match self {
            PolicyQualifierInfo::Cps(uri) => {
                (oid::QT_CPS.parse()?, Element::IA5String(uri.clone()))
            }
            PolicyQualifierInfo::UserNotice(notice) => {
                (oid::QT_UNOTICE.parse()?, notice.to_node()?)
            }
            PolicyQualifierInfo::Other { id, qualifier } => (id.clone(), qualifier.clone()),
        };
        Ok(Element::Sequence(vec![
            Element::ObjectIdentifier(id),
            qualifier,
        ]))
    }
}

resolvable!(PolicyQualifierInfo, PolicyQualifierInfo);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyInformation {
    pub policy_identifier: PolicyId,
    pub policy_qualifiers: Option<Vec<PolicyQualifierInfo>>,
}

impl PolicyInformation {
    pub fn new(policy_identifier: PolicyId) -> Self {
        PolicyInformation {
            policy_identifier,
            policy_qualifiers: None,
        }
    }
}

impl DecodableFrom<Element> for PolicyInformation {}

impl Decoder<Element, PolicyInformation> for Element {
    type Error = Error;

    fn decode(&self) -> Result<PolicyInformation, Self::Error> {
        let kind = Kind::PolicyInformation;
        let elements = resolve::sequence(kind, self, 1, 2)?;
        let policy_qualifiers = elements
            .get(1)
            .map(|node| {
                resolve::non_empty_sequence_of(kind, node)?
                    .iter()
                    .map(PolicyQualifierInfo::from_node)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        Ok(PolicyInformation {
            policy_identifier: PolicyId::from_node(&elements[0])?,
            policy_qualifiers,
        })
    }
}

impl EncodableTo<PolicyInformation> for Element {}

impl Encoder<PolicyInformation, Element> for PolicyInformation {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        let mut elements = vec![self.policy_identifier.to_node()?];
        if let Some(qualifiers) = &self.policy_qualifiers {
            resolve::check_count(Kind::PolicyInformation, qualifiers.len(), 1, None)?;
            elements.push(Element::Sequence(
                qualifiers
                    .iter()
                    .map(|q| q.to_node())
                    .collect::<Result<Vec<_>, _>>()?,
            ));
        }
        Ok(Element::Sequence(elements))
    }
}

resolvable!(PolicyInformation, PolicyInformation);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificatePolicies {
    policies: Vec<PolicyInformation>,
}

impl CertificatePolicies {
    pub fn new(policies: Vec<PolicyInformation>) -> Result<Self, Error> {
        resolve::check_count(Kind::CertificatePolicies, policies.len(), 1, None)?;
        Ok(CertificatePolicies { policies })
    }

    pub fn policies(&self) -> &[PolicyInformation] {
        &self.policies
    }

    pub fn get(&self, id: &PolicyId) -> Option<&PolicyInformation> {
        self.policies.iter().find(|p| &p.policy_identifier == id)
    }
}

impl Extension for CertificatePolicies {
    const OID: &'static str = oid::CERTIFICATE_POLICIES;
}

impl DecodableFrom<Element> for CertificatePolicies {}

impl Decoder<Element, CertificatePolicies> for Element {
    type Error = Error;

    fn decode(&self) -> Result<CertificatePolicies, Self::Error> {
        let policies = resolve::non_empty_sequence_of(Kind::CertificatePolicies, self)?
            .iter()
            .map(PolicyInformation::from_node)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CertificatePolicies { policies })
    }
}

impl EncodableTo<CertificatePolicies> for Element {}

impl Encoder<CertificatePolicies, Element> for CertificatePolicies {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Sequence(
            self.policies
                .iter()
                .map(|p| p.to_node())
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }
}

resolvable!(CertificatePolicies, CertificatePolicies);
