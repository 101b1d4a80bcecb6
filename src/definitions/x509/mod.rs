//! Reading the certificates the simulator works with: the relying-party client
//! certificate, the end-user certificate and its issuers.

mod error;
pub mod subject;
pub mod x5chain;

pub use error::Error;
pub use x5chain::{Builder, CertificateWithDer, X5Chain};
