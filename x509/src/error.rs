use std::fmt;

use asn1::ObjectIdentifier;
use thiserror::Error;

/// Names the entity an error was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    AlgorithmIdentifier,
    SubjectPublicKeyInfo,
    Name,
    RelativeDistinguishedName,
    AttributeTypeAndValue,
    Time,
    Validity,
    AttCertValidityPeriod,
    GeneralName,
    GeneralNames,
    OtherName,
    EdiPartyName,
    KeyUsage,
    CrlReason,
    DisplayText,
    PolicyId,
    IssuerSerial,
    ObjectDigestInfo,
    AttCertIssuer,
    V2Form,
    Holder,
    Attribute,
    DistributionPointName,
    DistributionPoint,
    ReasonFlags,
    Target,
    Targets,
    TargetInformation,
    Extension,
    Extensions,
    AuthorityKeyIdentifier,
    SubjectKeyIdentifier,
    ExtendedKeyUsage,
    CertificatePolicies,
    PolicyInformation,
    PolicyQualifierInfo,
    UserNotice,
    NoticeReference,
    PolicyMappings,
    PolicyMapping,
    CrlDistributionPoints,
    IssuingDistributionPoint,
    GeneralSubtree,
    NameConstraints,
    BasicConstraints,
    SubjectAltName,
    IssuerAltName,
    CrlNumber,
    TbsCertificate,
    Certificate,
    CrlEntry,
    TbsCertList,
    CertificateList,
    AttributeCertificateInfo,
    AttributeCertificate,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Variant names are the ASN.1 type names.
        fmt::Debug::fmt(self, f)
    }
}

/// What was wrong with a node that did not fit its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    ElementCount {
        min: usize,
        max: Option<usize>,
        actual: usize,
    },
    UnexpectedTag(u8),
    Expected(&'static str),
    InvalidValue(String),
    DuplicateExtension(ObjectIdentifier),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ElementCount {
                min,
                max: Some(max),
                actual,
            } if min == max => write!(f, "expected {} elements, got {}", min, actual),
            Violation::ElementCount {
                min,
                max: Some(max),
                actual,
            } => write!(f, "expected {} to {} elements, got {}", min, max, actual),
            Violation::ElementCount {
                min,
                max: None,
                actual,
            } => write!(f, "expected at least {} elements, got {}", min, actual),
            Violation::UnexpectedTag(tag) => write!(f, "unexpected context-specific tag [{}]", tag),
            Violation::Expected(what) => write!(f, "expected {}", what),
            Violation::InvalidValue(msg) => write!(f, "{}", msg),
            Violation::DuplicateExtension(oid) => write!(f, "duplicate extension {}", oid),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind}: {violation}")]
    SchemaViolation { kind: Kind, violation: Violation },
    #[error("extension {oid}: malformed value: {source}")]
    MalformedExtension {
        oid: ObjectIdentifier,
        #[source]
        source: Box<Error>,
    },
    #[error("{kind}: incomplete structure, missing {}", .missing.join(", "))]
    IncompleteStructure {
        kind: Kind,
        missing: Vec<&'static str>,
    },
    #[error("{kind}: {form} is not accepted here")]
    UnsupportedLegacyForm { kind: Kind, form: &'static str },
    #[error("ASN.1: {0}")]
    Asn1(#[from] asn1::error::Error),
}

impl Error {
    pub(crate) fn schema(kind: Kind, violation: Violation) -> Self {
        Error::SchemaViolation { kind, violation }
    }

    pub(crate) fn expected(kind: Kind, what: &'static str) -> Self {
        Error::schema(kind, Violation::Expected(what))
    }

    pub(crate) fn unexpected_tag(kind: Kind, tag: u8) -> Self {
        Error::schema(kind, Violation::UnexpectedTag(tag))
    }

    pub(crate) fn invalid(kind: Kind, msg: impl Into<String>) -> Self {
        Error::schema(kind, Violation::InvalidValue(msg.into()))
    }

    pub(crate) fn element_count(kind: Kind, min: usize, max: Option<usize>, actual: usize) -> Self {
        Error::schema(kind, Violation::ElementCount { min, max, actual })
    }

    pub(crate) fn incomplete(kind: Kind, missing: Vec<&'static str>) -> Self {
        Error::IncompleteStructure { kind, missing }
    }

    /// The violation carried by a `SchemaViolation`, if this is one.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Error::SchemaViolation { violation, .. } => Some(violation),
            _ => None,
        }
    }
}
