use asn1::{Element, Integer};
use serde::{Deserialize, Serialize};
use shomei::decoder::{DecodableFrom, Decoder};
use shomei::encoder::{EncodableTo, Encoder};
use std::fmt;

use crate::error::{Error, Kind};
use crate::extensions::Extension;
use crate::oid;
use crate::resolve::{self, LegacyForm, Resolve};

/*
RFC 5280 Section 5.3.1
CRLReason ::= ENUMERATED {
     unspecified             (0),
     keyCompromise           (1),
     cACompromise            (2),
     affiliationChanged      (3),
     superseded              (4),
     cessationOfOperation    (5),
     certificateHold         (6),
          -- value 7 is not used
     removeFromCRL           (8),
     privilegeWithdrawn      (9),
     aACompromise           (10) }
*/

const REASON_NAMES: [&str; 11] = [
    "Unspecified",
    "KeyCompromise",
    "CACompromise",
    "AffiliationChanged",
    "Superseded",
    "CessationOfOperation",
    "CertificateHold",
    "Unknown",
    "RemoveFromCRL",
    "PrivilegeWithdrawn",
    "AACompromise",
];

/// A CRL entry reason code. Any ENUMERATED value is kept as-is so that
/// unknown codes survive a round trip; [`CrlReason::name`] reports them as
/// "Invalid".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrlReason(i64);

impl CrlReason {
    pub const UNSPECIFIED: CrlReason = CrlReason(0);
    pub const KEY_COMPROMISE: CrlReason = CrlReason(1);
    pub const CA_COMPROMISE: CrlReason = CrlReason(2);
    pub const AFFILIATION_CHANGED: CrlReason = CrlReason(3);
    pub const SUPERSEDED: CrlReason = CrlReason(4);
    pub const CESSATION_OF_OPERATION: CrlReason = CrlReason(5);
    pub const CERTIFICATE_HOLD: CrlReason = CrlReason(6);
    pub const REMOVE_FROM_CRL: CrlReason = CrlReason(8);
    pub const PRIVILEGE_WITHDRAWN: CrlReason = CrlReason(9);
    pub const AA_COMPROMISE: CrlReason = CrlReason(10);

    pub fn new(code: i64) -> Self {
        CrlReason(code)
    }

    pub fn code(&self) -> i64 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        usize::try_from(self.0)
            .ok()
            .and_then(|i| REASON_NAMES.get(i))
            .copied()
            .unwrap_or("Invalid")
    }
}

impl fmt::Display for CrlReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CRLReason: {}", self.name())
    }
}

impl Extension for CrlReason {
    const OID: &'static str = oid::CRL_REASON;
}

impl DecodableFrom<Element> for CrlReason {}

impl Decoder<Element, CrlReason> for Element {
    type Error = Error;

    fn decode(&self) -> Result<CrlReason, Self::Error> {
        let kind = Kind::CrlReason;
        match self {
            Element::Enumerated(code) => Ok(CrlReason(resolve::small_integer(kind, code)?)),
            _ => Err(Error::expected(kind, "ENUMERATED")),
        }
    }
}

impl EncodableTo<CrlReason> for Element {}

impl Encoder<CrlReason, Element> for CrlReason {
    type Error = Error;

    fn encode(&self) -> Result<Element, Self::Error> {
        Ok(Element::Enumerated(Integer::from(self.0)))
    }
}

impl Resolve for CrlReason {
    const KIND: Kind = Kind::CrlReason;

    fn from_node(node: &Element) -> Result<Self, Error> {
        node.decode()
    }

    fn to_node(&self) -> Result<Element, Error> {
        self.encode()
    }

    fn from_legacy(form: LegacyForm) -> Result<Self, Error> {
        match form {
            LegacyForm::Code(code) => Ok(CrlReason(code)),
            other => Err(Error::UnsupportedLegacyForm {
                kind: Self::KIND,
                form: other.describe(),
            }),
        }
    }
}
