//! Dotted object identifiers used across the crate.

// id-ce arcs (RFC 5280 Section 4.2.1, RFC 5755 Section 4.3)
pub const SUBJECT_KEY_IDENTIFIER: &str = "2.5.29.14";
pub const KEY_USAGE: &str = "2.5.29.15";
pub const SUBJECT_ALT_NAME: &str = "2.5.29.17";
pub const ISSUER_ALT_NAME: &str = "2.5.29.18";
pub const BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const CRL_NUMBER: &str = "2.5.29.20";
pub const CRL_REASON: &str = "2.5.29.21";
pub const ISSUING_DISTRIBUTION_POINT: &str = "2.5.29.28";
pub const NAME_CONSTRAINTS: &str = "2.5.29.30";
pub const CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";
pub const CERTIFICATE_POLICIES: &str = "2.5.29.32";
pub const ANY_POLICY: &str = "2.5.29.32.0";
pub const POLICY_MAPPINGS: &str = "2.5.29.33";
pub const AUTHORITY_KEY_IDENTIFIER: &str = "2.5.29.35";
pub const EXTENDED_KEY_USAGE: &str = "2.5.29.37";
pub const TARGET_INFORMATION: &str = "2.5.29.55";

// id-qt policy qualifiers
pub const QT_CPS: &str = "1.3.6.1.5.5.7.2.1";
pub const QT_UNOTICE: &str = "1.3.6.1.5.5.7.2.2";

// id-kp key purposes
pub const KP_SERVER_AUTH: &str = "1.3.6.1.5.5.7.3.1";
pub const KP_CLIENT_AUTH: &str = "1.3.6.1.5.5.7.3.2";
pub const KP_CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";
pub const KP_EMAIL_PROTECTION: &str = "1.3.6.1.5.5.7.3.4";
pub const KP_TIME_STAMPING: &str = "1.3.6.1.5.5.7.3.8";
pub const KP_OCSP_SIGNING: &str = "1.3.6.1.5.5.7.3.9";
pub const ANY_EXTENDED_KEY_USAGE: &str = "2.5.29.37.0";
