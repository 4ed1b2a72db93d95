//! Common types shared across `fieldcrypt` crates: the envelope wire format
//! and the error taxonomy.

pub mod envelope;
pub mod error;

pub use envelope::{Envelope, FormatVersion};
pub use error::CryptoError;
