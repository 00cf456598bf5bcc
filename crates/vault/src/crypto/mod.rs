//! AES-256-GCM field encryption primitives and display masking.
//!
//! This module is intentionally free of database and HTTP dependencies.
//! It provides the encrypt/decrypt/mask operations used by the API and the
//! backfill job.
//!
//! # Encoded value format
//!
//! ```text
//! <base64(iv)>:<base64(tag)>:<base64(ciphertext)>
//! ```
//!
//! The IV is 16 random bytes, the tag is the 16-byte GCM authentication tag.
//! Anything that does not split into exactly three segments is treated as
//! legacy plaintext and passed through by [`FieldCipher::decrypt`].
//!
//! # Key derivation
//!
//! The key is the first 32 bytes of the configured passphrase. This is a plain
//! truncation, not a KDF, and is weaker than one. It must stay byte-for-byte
//! identical until a versioned key-rotation scheme exists, otherwise rows
//! written under the current scheme become unreadable.

pub mod cipher;
pub mod mask;

pub use cipher::{looks_encoded, CipherError, CipherKey, EncodedValue, FieldCipher, KEY_LEN};
pub use mask::mask_email;
