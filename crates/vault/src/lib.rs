//! Sensitive-field protection for client profiles.
//!
//! - [`crypto`]: the field cipher and display masks.
//! - [`profile`]: bulk encrypt/decrypt/mask over [`common::SensitiveFields`].
//! - [`store`]: profile persistence behind the [`store::ProfileStore`] trait.
//!
//! # Invariants
//!
//! - **No key material or plaintext** in any log field, span attribute, or
//!   metric label. Diagnostics carry lengths and field names only.
//! - The store never sees plaintext of a field that went through
//!   [`crypto::FieldCipher::encrypt_profile_data`].

pub mod crypto;
pub mod profile;
pub mod store;

pub use crypto::{CipherError, FieldCipher};
pub use store::{MemoryProfileStore, PgProfileStore, ProfileStore, StoreError, StoredProfile};
