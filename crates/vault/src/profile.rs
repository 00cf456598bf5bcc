//! Bulk cipher operations over the fixed set of sensitive profile fields.

use common::{protocol::MaskedProfileResponse, SensitiveFields};

use crate::crypto::{mask_email, CipherError, FieldCipher};
use crate::store::StoredProfile;

impl FieldCipher {
    /// Encrypt every present field. Absent fields stay absent.
    ///
    /// # Errors
    ///
    /// Propagates the first [`CipherError`] from [`FieldCipher::encrypt`].
    pub fn encrypt_profile_data(
        &self,
        fields: &SensitiveFields,
    ) -> Result<SensitiveFields, CipherError> {
        fields.try_map(|value| self.encrypt(value))
    }

    /// Decrypt every present field with the fail-open
    /// [`FieldCipher::decrypt_field`], tagging failures with the field name.
    pub fn decrypt_profile_data(&self, fields: &SensitiveFields) -> SensitiveFields {
        fields.map(|name, value| self.decrypt_field(value, name))
    }

    /// Build the masked summary view of a stored profile.
    pub fn masked_summary(&self, profile: &StoredProfile) -> MaskedProfileResponse {
        let f = &profile.fields;
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());

        MaskedProfileResponse {
            id: profile.id,
            ssn: f.ssn.as_deref().and_then(|v| self.mask_ssn(v)),
            bank_routing_number: f
                .bank_routing_number
                .as_deref()
                .and_then(|v| self.mask_routing_number(v)),
            bank_account_number: f
                .bank_account_number
                .as_deref()
                .and_then(|v| self.mask_bank_account(v)),
            portal_email: f
                .portal_email
                .as_deref()
                .and_then(|v| mask_email(&self.decrypt_field(v, "portal_email"))),
            has_address: present(&f.address),
            has_portal_credentials: present(&f.portal_email) && present(&f.portal_password),
            has_irs_credentials: present(&f.irs_username) && present(&f.irs_password),
            has_state_credentials: present(&f.state_username) && present(&f.state_password),
            updated_at: profile.updated_at,
        }
    }
}
