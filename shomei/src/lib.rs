//! # shomei
//!
//! Conversion traits shared by every layer of the shomei PKI codec.
//!
//! Data flows through the layers like this:
//! ```text
//! Vec<u8> → Der → Element → typed PKI value (Certificate, CRL, attribute certificate, ...)
//! ```
//!
//! Each step implements `Decoder`, and the reverse direction implements `Encoder`.
//! The marker traits `DecodableFrom` and `EncodableTo` restrict which pairs of
//! types may be converted, so an invalid conversion fails to compile.
//!
//! ```ignore
//! use shomei::decoder::Decoder;
//! use shomei::encoder::Encoder;
//! use der::Der;
//! use asn1::ASN1Object;
//!
//! let bytes = vec![0x30, 0x00];
//! let der: Der = bytes.decode().unwrap();
//! let object: ASN1Object = der.decode().unwrap();
//!
//! let der: Der = object.encode().unwrap();
//! let bytes: Vec<u8> = der.encode().unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
