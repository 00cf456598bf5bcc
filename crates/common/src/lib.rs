//! Common types, protocol definitions, and errors shared across the portal crates.

pub mod error;
pub mod profile;
pub mod protocol;

pub use error::ServiceError;
pub use profile::SensitiveFields;
