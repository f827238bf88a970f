//! Typed X.509 structures over the `asn1` node model.
//!
//! Every type here converts from and to an [`asn1::Element`] through the
//! [`Resolve`](resolve::Resolve) trait: certificates (RFC 5280 Section 4),
//! CRLs (RFC 5280 Section 5), attribute certificates (RFC 5755) and the
//! extension values they carry. Nothing is signed or verified; signatures
//! are carried as opaque bit strings.
//!
//! ```no_run
//! use x509::Certificate;
//! use x509::extensions::SubjectAltName;
//! use x509::resolve::Resolve;
//!
//! # fn example(der: &[u8]) -> Result<(), x509::error::Error> {
//! let cert = Certificate::from_der(der)?;
//! println!("subject: {}", cert.tbs_certificate().subject());
//! if let Some(san) = cert.extension::<SubjectAltName>()? {
//!     println!("alt names: {}", san);
//! }
//! assert_eq!(der, cert.to_der()?.as_slice());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod algorithm;
pub mod attribute_cert;
pub mod certificate;
pub mod crl;
pub mod error;
pub mod extensions;
pub mod general_name;
pub mod key_identifier;
pub mod name;
pub mod oid;
pub mod resolve;
pub mod time;

pub use algorithm::{AlgorithmIdentifier, AlgorithmParameters, SubjectPublicKeyInfo};
pub use attribute_cert::{
    AttributeCertificate, AttributeCertificateInfo, AttributeCertificateInfoGenerator,
};
pub use certificate::{
    Certificate, TbsCertificate, V1TbsCertificateGenerator, V3TbsCertificateGenerator, Version,
};
pub use crl::{CertificateList, CrlEntry, TbsCertList, V2TbsCertListGenerator};
pub use error::Error;
pub use extensions::{Extension, Extensions, ExtensionsGenerator, RawExtension};
pub use general_name::{GeneralName, GeneralNames};
pub use name::Name;
pub use resolve::{LegacyForm, Resolvable, Resolve};
pub use time::{Time, Validity};
