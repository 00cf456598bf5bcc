//! Masked display variants of sensitive fields.
//!
//! The `mask_*` methods decrypt through [`FieldCipher::decrypt`], so a value
//! that fails to decrypt is masked as if it were the plaintext.

use super::cipher::FieldCipher;

const SSN_PREFIX: &str = "***-**-";
const SSN_FULL_MASK: &str = "***-**-****";
const ACCOUNT_PREFIX: &str = "****";
const ACCOUNT_FULL_MASK: &str = "****";
const EMAIL_LOCAL_MASK: &str = "****";
const EMAIL_PLACEHOLDER: &str = "***@***";

/// Number of trailing characters kept visible.
const VISIBLE_TAIL: usize = 4;

impl FieldCipher {
    /// Mask an encoded SSN as `***-**-1234`.
    pub fn mask_ssn(&self, encoded: &str) -> Option<String> {
        self.mask_tail(encoded, "ssn", SSN_PREFIX, SSN_FULL_MASK)
    }

    /// Mask an encoded bank account number as `****1234`.
    pub fn mask_bank_account(&self, encoded: &str) -> Option<String> {
        self.mask_tail(encoded, "bank_account_number", ACCOUNT_PREFIX, ACCOUNT_FULL_MASK)
    }

    /// Mask an encoded routing number as `****1234`.
    pub fn mask_routing_number(&self, encoded: &str) -> Option<String> {
        self.mask_tail(encoded, "bank_routing_number", ACCOUNT_PREFIX, ACCOUNT_FULL_MASK)
    }

    fn mask_tail(&self, encoded: &str, field: &str, prefix: &str, full: &str) -> Option<String> {
        if encoded.is_empty() {
            return None;
        }
        let plaintext = self.decrypt_field(encoded, field);
        Some(match last_chars(&plaintext, VISIBLE_TAIL) {
            Some(tail) => format!("{prefix}{tail}"),
            None => full.to_owned(),
        })
    }
}

/// The last `n` characters of `s`, or `None` if it has fewer.
fn last_chars(s: &str, n: usize) -> Option<&str> {
    let count = s.chars().count();
    if count < n {
        return None;
    }
    s.char_indices().nth(count - n).map(|(i, _)| &s[i..])
}

/// Mask an email address as `jo****@example.com`.
///
/// This is a pure string transform; it does not decrypt. Up to two leading
/// characters of the local part survive and the domain is kept as is. Input
/// without an `@` or without a local part yields a fixed placeholder.
pub fn mask_email(email: &str) -> Option<String> {
    if email.is_empty() {
        return None;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Some(EMAIL_PLACEHOLDER.to_owned());
    };
    if local.is_empty() {
        return Some(EMAIL_PLACEHOLDER.to_owned());
    }
    let visible: String = local.chars().take(2).collect();
    Some(format!("{visible}{EMAIL_LOCAL_MASK}@{domain}"))
}
