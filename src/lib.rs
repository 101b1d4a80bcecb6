//! A simulator for the relying-party API (v5.1) of BankID, for integration testing.
//!
//! Orders created with `auth` or `sign` play out according to a [scenario::Scenario]:
//! the default one is picked up by a configured test user and completes on the third
//! `collect`, returning completion data with a structurally correct (but unsigned) XML
//! signature.

pub mod completion;
pub mod config;
pub mod definitions;
pub mod order;
pub mod scenario;
pub mod server;
pub mod signature;

pub use config::Config;
