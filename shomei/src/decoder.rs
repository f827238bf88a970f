//! Decoder trait for type-safe conversions.
//!
//! `Decoder<T, D>` converts a source `T` into a destination `D`. The destination
//! opts in through the `DecodableFrom<T>` marker, so only declared pairs compile.
//!
//! ```no_run
//! use shomei::decoder::{Decoder, DecodableFrom};
//!
//! struct Source(Vec<u8>);
//! struct Dest(String);
//!
//! #[derive(Debug)]
//! struct MyError;
//!
//! impl DecodableFrom<Source> for Dest {}
//!
//! impl Decoder<Source, Dest> for Source {
//!     type Error = MyError;
//!
//!     fn decode(&self) -> Result<Dest, Self::Error> {
//!         Ok(Dest(String::from_utf8_lossy(&self.0).to_string()))
//!     }
//! }
//! ```

/// Converts `self` (of type `T`) into `D`.
///
/// Implemented on the source type. `D` must implement `DecodableFrom<T>`.
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if `self` does not have the shape `D` requires.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait indicating that type `D` can be decoded from type `T`.
///
/// It has no methods. Implement it on the destination type for every source it
/// accepts.
pub trait DecodableFrom<T> {}
