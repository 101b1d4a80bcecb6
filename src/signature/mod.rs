//! The XML documents handed back in the completion data of a finished order.
//!
//! [signed_data] builds the `bankIdSignedData` fragment describing what the end user saw
//! and which relying party asked, and [envelope] wraps it in an XMLDSIG `Signature`
//! carrying the end-user certificate chain.

pub mod envelope;
pub mod random;
pub mod signed_data;

pub use envelope::signature_element;
pub use random::{OsRandom, RandomSource, SeededRandom};
pub use signed_data::{bankid_signed_data_element, FuncId, SignedDataError};
