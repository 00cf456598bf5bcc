//! The fixed set of sensitive client-profile attributes.
//!
//! Each field is independently absent, legacy plaintext, or an encoded value.
//! Nothing here knows which; the vault crate decides.

use serde::{Deserialize, Serialize};

/// Sensitive attributes of a client profile.
///
/// `None` means "not supplied" and is omitted from JSON. Bulk operations over
/// this struct never fill in a field that was `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_routing_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account_number: Option<String>,
    /// Login email of the client's third-party tax-filing portal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_password: Option<String>,
    /// Tax-authority (IRS) portal credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irs_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irs_password: Option<String>,
    /// State tax portal credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_password: Option<String>,
}

impl SensitiveFields {
    /// Apply `f` to every present field, keeping absent fields absent.
    ///
    /// Stops at the first error.
    pub fn try_map<E, F>(&self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(&str) -> Result<String, E>,
    {
        let mut apply = |v: &Option<String>| v.as_deref().map(&mut f).transpose();
        Ok(Self {
            ssn: apply(&self.ssn)?,
            address: apply(&self.address)?,
            bank_routing_number: apply(&self.bank_routing_number)?,
            bank_account_number: apply(&self.bank_account_number)?,
            portal_email: apply(&self.portal_email)?,
            portal_password: apply(&self.portal_password)?,
            irs_username: apply(&self.irs_username)?,
            irs_password: apply(&self.irs_password)?,
            state_username: apply(&self.state_username)?,
            state_password: apply(&self.state_password)?,
        })
    }

    /// Infallible variant of [`SensitiveFields::try_map`]. The closure also
    /// receives the field's wire name.
    pub fn map<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&'static str, &str) -> String,
    {
        let mut apply =
            |name: &'static str, v: &Option<String>| v.as_deref().map(|s| f(name, s));
        Self {
            ssn: apply("ssn", &self.ssn),
            address: apply("address", &self.address),
            bank_routing_number: apply("bank_routing_number", &self.bank_routing_number),
            bank_account_number: apply("bank_account_number", &self.bank_account_number),
            portal_email: apply("portal_email", &self.portal_email),
            portal_password: apply("portal_password", &self.portal_password),
            irs_username: apply("irs_username", &self.irs_username),
            irs_password: apply("irs_password", &self.irs_password),
            state_username: apply("state_username", &self.state_username),
            state_password: apply("state_password", &self.state_password),
        }
    }

    /// Overwrite every field that is present in `update`; absent fields leave
    /// the current value untouched.
    pub fn apply_update(&mut self, update: &SensitiveFields) {
        fn set(slot: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                *slot = Some(v.clone());
            }
        }
        set(&mut self.ssn, &update.ssn);
        set(&mut self.address, &update.address);
        set(&mut self.bank_routing_number, &update.bank_routing_number);
        set(&mut self.bank_account_number, &update.bank_account_number);
        set(&mut self.portal_email, &update.portal_email);
        set(&mut self.portal_password, &update.portal_password);
        set(&mut self.irs_username, &update.irs_username);
        set(&mut self.irs_password, &update.irs_password);
        set(&mut self.state_username, &update.state_username);
        set(&mut self.state_password, &update.state_password);
    }

    /// Returns `true` if no field is present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
