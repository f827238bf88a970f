//! Error types for ASN.1 parsing and encoding.

use std::num::ParseIntError;

use der::UniversalTag;
use thiserror::Error;

/// Errors that can occur during ASN.1 parsing and encoding operations.
#[derive(Debug, Error)]
pub enum Error {
    // Boolean errors
    #[error("BOOLEAN: invalid encoding")]
    InvalidBoolean,

    // Integer errors
    #[error("INTEGER: no data")]
    IntegerNoData,
    #[error("INTEGER: value out of range for {0}")]
    IntegerOutOfRange(&'static str),

    // Null errors
    #[error("NULL: content must be empty, got {0} bytes")]
    NullWithContent(usize),

    // ObjectIdentifier errors
    #[error("OBJECT IDENTIFIER: no data")]
    ObjectIdentifierNoData,
    #[error("OBJECT IDENTIFIER: incomplete encoding")]
    ObjectIdentifierIncompleteEncoding,
    #[error("OBJECT IDENTIFIER: arc is not minimally encoded")]
    ObjectIdentifierNonMinimalArc,
    #[error("OBJECT IDENTIFIER: arc does not fit in 64 bits")]
    ObjectIdentifierArcOverflow,
    #[error("OBJECT IDENTIFIER: too few components (need at least 2)")]
    ObjectIdentifierTooFewComponents,
    #[error("OBJECT IDENTIFIER: invalid leading arcs {0}.{1}")]
    ObjectIdentifierInvalidRoot(u64, u64),
    #[error("OBJECT IDENTIFIER: invalid component '{component}': {source}")]
    ObjectIdentifierInvalidComponent {
        component: String,
        #[source]
        source: ParseIntError,
    },

    // BitString errors
    #[error("BIT STRING: no data")]
    BitStringNoData,
    #[error("BIT STRING: unused bits {0} out of range (must be 0-7)")]
    BitStringUnusedBitsOutOfRange(u8),

    // String type errors
    #[error("UTF8String: invalid UTF-8")]
    Utf8StringInvalidUtf8,
    #[error("PrintableString: invalid encoding")]
    PrintableStringInvalidEncoding,
    #[error("IA5String: invalid encoding")]
    Ia5StringInvalidEncoding,
    #[error("VisibleString: invalid encoding")]
    VisibleStringInvalidEncoding,
    #[error("T61String: character outside Latin-1")]
    T61StringOutOfRange,
    #[error("BMPString: odd byte length {0}")]
    BmpStringOddLength(usize),
    #[error("BMPString: invalid UTF-16 sequence")]
    BmpStringInvalidUtf16,
    #[error("BMPString: contains character outside the Basic Multilingual Plane")]
    BmpStringRequiresSurrogatePair,

    // Time errors
    #[error("UTCTime: invalid format")]
    UtcTimeInvalidFormat,
    #[error("UTCTime: year {0} outside 1950-2049")]
    UtcTimeOutOfRange(i32),
    #[error("GeneralizedTime: invalid format")]
    GeneralizedTimeInvalidFormat,

    // Structure errors
    #[error("{0:?}: invalid primitive/constructed form")]
    InvalidConstruction(UniversalTag),
    #[error("[{number}] EXPLICIT: expected exactly one inner element, got {actual}")]
    ExplicitTagElementCount { number: u8, actual: usize },
    #[error("[{number}] IMPLICIT: content does not fit {tag:?}")]
    ImplicitTagMismatch { number: u8, tag: UniversalTag },
    #[error("[{0}] IMPLICIT: a tagged value needs explicit tagging")]
    ImplicitTagOnTagged(u8),
    #[error("expected a single top-level element, got {0}")]
    ExpectedSingleElement(usize),

    // DER errors
    #[error("invalid DER encoding: {0}")]
    FailedToDecodeDer(#[source] der::error::Error),
    #[error("cannot encode DER: {0}")]
    FailedToEncodeDer(#[source] der::error::Error),

    // Element errors
    #[error("element: cannot encode {0} as a primitive")]
    ElementCannotEncode(&'static str),
    #[error("element: unimplemented universal tag {0}")]
    ElementUnimplemented(u8),
}
