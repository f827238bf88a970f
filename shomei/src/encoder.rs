//! Encoder trait, the mirror image of [`crate::decoder`].
//!
//! `Encoder<T, E>` is implemented on the typed value `T` and produces its
//! representation `E`. The representation opts in through `EncodableTo<T>`.
//!
//! ```no_run
//! use shomei::encoder::{Encoder, EncodableTo};
//!
//! struct Value(u8);
//! struct Bytes(Vec<u8>);
//!
//! impl EncodableTo<Value> for Bytes {}
//!
//! impl Encoder<Value, Bytes> for Value {
//!     type Error = std::convert::Infallible;
//!
//!     fn encode(&self) -> Result<Bytes, Self::Error> {
//!         Ok(Bytes(vec![self.0]))
//!     }
//! }
//! ```

/// Converts `self` (of type `T`) into its representation `E`.
pub trait Encoder<T, E: EncodableTo<T>> {
    /// The error type returned when encoding fails.
    type Error;

    /// Encodes `self` into type `E`.
    ///
    /// # Errors
    ///
    /// Returns an error if `self` cannot be represented as `E`.
    fn encode(&self) -> Result<E, Self::Error>;
}

/// Marker trait indicating that `Self` is a valid encoding target for `T`.
pub trait EncodableTo<T> {}
