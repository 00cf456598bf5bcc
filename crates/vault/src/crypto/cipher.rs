//! AES-256-GCM encryption and decryption of individual string fields.
//!
//! **Algorithm:** AES-256-GCM with a 128-bit IV and a detached 128-bit tag.
//! The IV length is unusual for GCM (96 bits is the norm) but is what every
//! stored value already uses, so it is fixed here.
//!
//! **Nondeterministic by construction.** Every call to [`FieldCipher::encrypt`]
//! draws a fresh IV from the OS CSPRNG, so equal plaintexts never produce
//! equal encoded values. Do not compare encoded values to detect duplicates.

use std::fmt;

use aes_gcm::{
    aead::{
        consts::U16, generic_array::GenericArray, rand_core::RngCore, AeadInPlace, KeyInit,
        OsRng,
    },
    aes::Aes256,
    AesGcm,
};
use base64::{
    alphabet,
    engine::{general_purpose::STANDARD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use opentelemetry::{
    global,
    metrics::{Counter, Meter},
    KeyValue,
};
use thiserror::Error;
use tracing::{error, warn};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of the GCM initialisation vector (16 bytes = 128 bits).
pub const IV_LEN: usize = 16;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Minimum passphrase length, counted in characters.
pub const MIN_PASSPHRASE_CHARS: usize = 32;

/// Separator between the three encoded segments.
pub const SEPARATOR: char = ':';

/// Field name used in diagnostics when the caller did not supply one.
const UNNAMED_FIELD: &str = "unnamed";

type Aes256Gcm128 = AesGcm<Aes256, U16>;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// No passphrase was configured.
    #[error("encryption key is not configured")]
    MissingKey,

    /// The configured passphrase is shorter than [`MIN_PASSPHRASE_CHARS`].
    #[error("encryption key must be at least {MIN_PASSPHRASE_CHARS} characters, got {0}")]
    KeyTooShort(usize),

    /// The value does not split into exactly three segments.
    #[error("value is not an encoded field ({segments} segments)")]
    Malformed { segments: usize },

    /// A segment is not valid base64, the IV or tag has the wrong length, or
    /// the recovered plaintext is not UTF-8.
    #[error("encoded field could not be decoded")]
    Decode,

    /// Tag verification failed: wrong key, corrupted, or tampered data.
    #[error("authentication failed")]
    Authentication,

    /// AES-GCM encryption failed.
    #[error("aead operation failed")]
    AeadFailure,
}

impl CipherError {
    /// Metric label for decrypt failures.
    fn reason(&self) -> &'static str {
        match self {
            CipherError::Malformed { .. } => "malformed",
            CipherError::Decode => "decode",
            CipherError::Authentication => "authentication",
            CipherError::MissingKey | CipherError::KeyTooShort(_) => "config",
            CipherError::AeadFailure => "aead",
        }
    }
}

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Overwritten with zeroes on drop.
pub struct CipherKey(Box<[u8; KEY_LEN]>);

impl CipherKey {
    /// Derive the key from a passphrase by taking its first [`KEY_LEN`] UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::MissingKey`] for an empty passphrase and
    /// [`CipherError::KeyTooShort`] for one under [`MIN_PASSPHRASE_CHARS`] characters.
    pub fn from_passphrase(passphrase: &str) -> Result<Self, CipherError> {
        if passphrase.is_empty() {
            return Err(CipherError::MissingKey);
        }
        let chars = passphrase.chars().count();
        if chars < MIN_PASSPHRASE_CHARS {
            return Err(CipherError::KeyTooShort(chars));
        }
        // 32 characters are always at least 32 bytes.
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(&passphrase.as_bytes()[..KEY_LEN]);
        Ok(Self(buf))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey([REDACTED])")
    }
}

/// A parsed encoded field value.
///
/// The string representation is `<base64(iv)>:<base64(tag)>:<base64(ciphertext)>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedValue {
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl EncodedValue {
    /// Parse an encoded field string.
    ///
    /// Segments may use the standard or URL-safe base64 alphabet, with or
    /// without padding.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Malformed`] if the string does not have exactly
    /// three segments, and [`CipherError::Decode`] if a segment is not base64
    /// or the IV or tag has the wrong length.
    pub fn parse(s: &str) -> Result<Self, CipherError> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        if parts.len() != 3 {
            return Err(CipherError::Malformed {
                segments: parts.len(),
            });
        }
        let iv = decode_segment(parts[0])?;
        let tag = decode_segment(parts[1])?;
        let ciphertext = decode_segment(parts[2])?;

        Ok(Self {
            iv: iv.try_into().map_err(|_| CipherError::Decode)?,
            tag: tag.try_into().map_err(|_| CipherError::Decode)?,
            ciphertext,
        })
    }
}

impl fmt::Display for EncodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            STANDARD.encode(self.iv),
            STANDARD.encode(self.tag),
            STANDARD.encode(&self.ciphertext),
        )
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, CipherError> {
    STANDARD_LENIENT
        .decode(segment)
        .or_else(|_| URL_SAFE_LENIENT.decode(segment))
        .map_err(|_| CipherError::Decode)
}

/// Returns `true` if `value` already has the encoded shape: exactly three
/// non-empty segments made only of base64 alphabet characters.
///
/// This is a shape check only. It does not prove the value decrypts.
pub fn looks_encoded(value: &str) -> bool {
    let parts: Vec<&str> = value.split(SEPARATOR).collect();
    parts.len() == 3
        && parts.iter().all(|p| {
            !p.is_empty()
                && p.bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'-' | b'_' | b'='))
        })
}

/// Authenticated cipher for individual sensitive string fields.
///
/// Built once at startup and shared by reference (`Arc`). Immutable after
/// construction, so no locking is needed.
pub struct FieldCipher {
    aead: Aes256Gcm128,
    decrypt_failures: Counter<u64>,
}

impl FieldCipher {
    /// Build a cipher from the configured passphrase.
    ///
    /// # Errors
    ///
    /// See [`CipherKey::from_passphrase`].
    pub fn new(passphrase: &str) -> Result<Self, CipherError> {
        Self::from_key(&CipherKey::from_passphrase(passphrase)?)
    }

    /// Build a cipher from an already-derived key, reporting to the global
    /// meter provider.
    pub fn from_key(key: &CipherKey) -> Result<Self, CipherError> {
        Self::with_meter(key, &global::meter("vault"))
    }

    /// Build a cipher whose decrypt-failure counter is registered on `meter`.
    pub fn with_meter(key: &CipherKey, meter: &Meter) -> Result<Self, CipherError> {
        let aead = Aes256Gcm128::new_from_slice(key.as_bytes())
            .map_err(|_| CipherError::KeyTooShort(key.as_bytes().len()))?;
        let decrypt_failures = meter
            .u64_counter("field_cipher.decrypt_failures")
            .with_description("Encoded fields that could not be decrypted")
            .init();
        Ok(Self {
            aead,
            decrypt_failures,
        })
    }

    /// Encrypt a plaintext field.
    ///
    /// Empty input is returned unchanged. Otherwise a fresh random IV is
    /// generated, so repeated calls never return the same value.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::AeadFailure`] only if AES-GCM rejects the input,
    /// which requires a plaintext far larger than any string field.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .aead
            .encrypt_in_place_detached(GenericArray::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| CipherError::AeadFailure)?;

        let mut tag_bytes = [0u8; TAG_LEN];
        tag_bytes.copy_from_slice(&tag);

        Ok(EncodedValue {
            iv,
            tag: tag_bytes,
            ciphertext: buffer,
        }
        .to_string())
    }

    /// Decrypt an encoded field, failing open.
    ///
    /// Empty input, legacy plaintext (not three segments), and values that
    /// fail to decode or authenticate are all returned unchanged. Failures are
    /// logged and counted. Use [`FieldCipher::safe_decrypt`] where echoing the
    /// stored text back would be wrong.
    pub fn decrypt(&self, encoded: &str) -> String {
        self.decrypt_field(encoded, UNNAMED_FIELD)
    }

    /// [`FieldCipher::decrypt`] with a field name attached to diagnostics.
    pub fn decrypt_field(&self, encoded: &str, field: &str) -> String {
        if encoded.is_empty() {
            return String::new();
        }
        match self.open(encoded) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                self.record_failure(&e, encoded, field);
                encoded.to_owned()
            }
        }
    }

    /// Decrypt an encoded field, returning `None` on any failure.
    ///
    /// Empty input also yields `None`.
    pub fn safe_decrypt(&self, encoded: &str, field: &str) -> Option<String> {
        if encoded.is_empty() {
            return None;
        }
        match self.open(encoded) {
            Ok(plaintext) => Some(plaintext),
            Err(e) => {
                self.record_failure(&e, encoded, field);
                None
            }
        }
    }

    fn open(&self, encoded: &str) -> Result<String, CipherError> {
        let value = EncodedValue::parse(encoded)?;
        let mut buffer = value.ciphertext;
        self.aead
            .decrypt_in_place_detached(
                GenericArray::from_slice(&value.iv),
                b"",
                &mut buffer,
                GenericArray::from_slice(&value.tag),
            )
            .map_err(|_| CipherError::Authentication)?;
        String::from_utf8(buffer).map_err(|_| CipherError::Decode)
    }

    /// Log and count a decrypt failure. Only lengths and shape are recorded.
    fn record_failure(&self, err: &CipherError, encoded: &str, field: &str) {
        let reason = err.reason();
        self.decrypt_failures
            .add(1, &[KeyValue::new("reason", reason)]);

        match err {
            CipherError::Malformed { segments } => {
                warn!(
                    field_name = field,
                    segments,
                    input_len = encoded.len(),
                    "value is not encoded; treating as plaintext"
                );
            }
            _ => {
                let segment_lens: Vec<usize> =
                    encoded.split(SEPARATOR).map(str::len).collect();
                error!(
                    field_name = field,
                    reason,
                    input_len = encoded.len(),
                    has_separator = encoded.contains(SEPARATOR),
                    segment_lens = ?segment_lens,
                    "failed to decrypt field"
                );
            }
        }
    }
}

impl fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldCipher([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSPHRASE: &str = "0123456789abcdef0123456789abcdef-extra-ignored";

    fn cipher() -> FieldCipher {
        FieldCipher::new(PASSPHRASE).unwrap()
    }

    /// Flip one byte of the decoded segment at `index` and re-encode.
    fn tamper(encoded: &str, index: usize) -> String {
        let mut value = EncodedValue::parse(encoded).unwrap();
        match index {
            0 => value.iv[0] ^= 0xFF,
            1 => value.tag[5] ^= 0x01,
            _ => value.ciphertext[0] ^= 0xFF,
        }
        value.to_string()
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let c = cipher();
        for plaintext in ["123-45-6789", "a", "1 Main St, Apt 4", "contraseña ñ 🚀"] {
            let encoded = c.encrypt(plaintext).unwrap();
            assert_eq!(c.decrypt(&encoded), plaintext);
        }
    }

    #[test]
    fn encryption_is_nondeterministic() {
        let c = cipher();
        let a = c.encrypt("021000021").unwrap();
        let b = c.encrypt("021000021").unwrap();
        assert_ne!(a, b);
        assert_eq!(c.decrypt(&a), "021000021");
        assert_eq!(c.decrypt(&b), "021000021");
    }

    #[test]
    fn encoded_value_has_three_standard_base64_segments() {
        let c = cipher();
        let encoded = c.encrypt("hello").unwrap();
        let parts: Vec<&str> = encoded.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(STANDARD.decode(parts[0]).unwrap().len(), IV_LEN);
        assert_eq!(STANDARD.decode(parts[1]).unwrap().len(), TAG_LEN);
        assert_eq!(STANDARD.decode(parts[2]).unwrap().len(), "hello".len());
        assert!(looks_encoded(&encoded));
    }

    #[test]
    fn empty_values_pass_through() {
        let c = cipher();
        assert_eq!(c.encrypt("").unwrap(), "");
        assert_eq!(c.decrypt(""), "");
        assert_eq!(c.safe_decrypt("", "ssn"), None);
    }

    #[test]
    fn malformed_value_passes_through() {
        let c = cipher();
        assert_eq!(c.decrypt("not-encoded"), "not-encoded");
        assert_eq!(c.decrypt("a:b"), "a:b");
        assert_eq!(c.safe_decrypt("not-encoded", "ssn"), None);
    }

    #[test]
    fn three_segments_of_garbage_fail_open() {
        let c = cipher();
        assert_eq!(c.decrypt("x:y:z"), "x:y:z");
        assert_eq!(c.safe_decrypt("x:y:z", "address"), None);
    }

    #[test]
    fn tampered_segments_fail_authentication() {
        let c = cipher();
        let encoded = c.encrypt("tamper me").unwrap();
        for index in 0..3 {
            let bad = tamper(&encoded, index);
            assert_eq!(c.decrypt(&bad), bad, "segment {index}");
            assert_eq!(c.safe_decrypt(&bad, "ssn"), None, "segment {index}");
        }
    }

    #[test]
    fn wrong_key_fails_open() {
        let encoded = cipher().encrypt("secret").unwrap();
        let other = FieldCipher::new("ffffffffffffffffffffffffffffffff").unwrap();
        assert_eq!(other.decrypt(&encoded), encoded);
        assert_eq!(other.safe_decrypt(&encoded, "irs_password"), None);
    }

    #[test]
    fn only_first_32_bytes_of_passphrase_are_used() {
        let encoded = cipher().encrypt("secret").unwrap();
        let same_prefix = FieldCipher::new("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(same_prefix.decrypt(&encoded), "secret");
    }

    #[test]
    fn url_safe_unpadded_segments_are_accepted() {
        let c = cipher();
        let encoded = c.encrypt("url safe?>").unwrap();
        let value = EncodedValue::parse(&encoded).unwrap();
        let url = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let rewritten = format!(
            "{}:{}:{}",
            url.encode(value.iv),
            url.encode(value.tag),
            url.encode(&value.ciphertext)
        );
        assert_eq!(c.decrypt(&rewritten), "url safe?>");
    }

    #[test]
    fn rejects_missing_and_short_keys() {
        assert!(matches!(FieldCipher::new(""), Err(CipherError::MissingKey)));
        assert!(matches!(
            FieldCipher::new("too-short"),
            Err(CipherError::KeyTooShort(9))
        ));
    }

    #[test]
    fn parse_rejects_wrong_iv_length() {
        let short_iv = format!(
            "{}:{}:{}",
            STANDARD.encode([0u8; 12]),
            STANDARD.encode([0u8; TAG_LEN]),
            STANDARD.encode(b"x")
        );
        assert!(matches!(
            EncodedValue::parse(&short_iv),
            Err(CipherError::Decode)
        ));
    }

    #[test]
    fn looks_encoded_shape_check() {
        assert!(looks_encoded("AAAA:BBBB:CCCC"));
        assert!(looks_encoded("ab+/=:c-_d:e"));
        assert!(!looks_encoded("021000021"));
        assert!(!looks_encoded("john@example.com"));
        assert!(!looks_encoded("a::b"));
        assert!(!looks_encoded("a:b:c:d"));
        assert!(!looks_encoded("has space:b:c"));
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = CipherKey::from_passphrase(PASSPHRASE).unwrap();
        assert!(format!("{key:?}").contains("REDACTED"));
        assert!(format!("{:?}", cipher()).contains("REDACTED"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn decrypt_failures_are_counted_by_reason() {
        use opentelemetry::metrics::MeterProvider as _;
        use opentelemetry_sdk::{
            metrics::{data::Sum, PeriodicReader, SdkMeterProvider},
            runtime,
            testing::metrics::InMemoryMetricsExporter,
        };

        let exporter = InMemoryMetricsExporter::default();
        let reader = PeriodicReader::builder(exporter.clone(), runtime::Tokio).build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();

        let key = CipherKey::from_passphrase(PASSPHRASE).unwrap();
        let c = FieldCipher::with_meter(&key, &provider.meter("vault")).unwrap();
        let encoded = c.encrypt("123-45-6789").unwrap();

        // malformed: legacy plaintext passes through
        assert_eq!(c.decrypt_field("021000021", "bank_routing_number"), "021000021");
        // decode: a segment that is not base64
        assert_eq!(c.safe_decrypt("!!!!:AAAA:AAAA", "ssn"), None);
        // authentication: tampered ciphertext, counted on both paths
        let tampered = tamper(&encoded, 2);
        assert_eq!(c.decrypt_field(&tampered, "ssn"), tampered);
        assert_eq!(c.safe_decrypt(&tampered, "ssn"), None);
        // successes and empty input are not counted
        assert_eq!(c.decrypt(&encoded), "123-45-6789");
        assert_eq!(c.safe_decrypt("", "ssn"), None);

        provider.force_flush().unwrap();
        let exported = exporter.get_finished_metrics().unwrap();

        let mut totals = std::collections::BTreeMap::new();
        for resource in &exported {
            for scope in &resource.scope_metrics {
                for metric in scope
                    .metrics
                    .iter()
                    .filter(|m| m.name == "field_cipher.decrypt_failures")
                {
                    let sum = metric.data.as_any().downcast_ref::<Sum<u64>>().unwrap();
                    for point in &sum.data_points {
                        let reason = point
                            .attributes
                            .iter()
                            .find(|kv| kv.0.as_str() == "reason")
                            .map(|kv| kv.1.as_str().into_owned())
                            .unwrap();
                        totals.insert(reason, point.value);
                    }
                }
            }
        }

        assert_eq!(totals.get("malformed"), Some(&1));
        assert_eq!(totals.get("decode"), Some(&1));
        assert_eq!(totals.get("authentication"), Some(&2));
        assert_eq!(totals.len(), 3);
    }
}
