//! Backfill: encrypt bank and portal-email columns still stored as plaintext.
//!
//! These three columns predate field encryption. Every other sensitive column
//! has always been written through the cipher and is left alone.
//!
//! The run is idempotent: a value that already has the encoded shape is never
//! touched, so a second run makes no updates. Records are processed one at a
//! time; a failure on one record is counted and the run moves on. There is no
//! rollback across records.

use common::SensitiveFields;
use tracing::{debug, error, info};
use vault::{
    crypto::{looks_encoded, CipherError},
    FieldCipher, ProfileStore, StoreError, StoredProfile,
};

/// Outcome counters for one backfill run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BackfillReport {
    /// `true` if any record could not be migrated.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Scan every stored profile and encrypt legacy plaintext columns.
///
/// # Errors
///
/// Returns [`StoreError`] only if the profiles cannot be listed at all.
/// Per-record failures are reported in [`BackfillReport::failed`].
pub async fn run(store: &dyn ProfileStore, cipher: &FieldCipher) -> Result<BackfillReport, StoreError> {
    let profiles = store.list().await?;
    info!(count = profiles.len(), "backfill scanning profiles");

    let mut report = BackfillReport::default();
    for profile in profiles {
        report.scanned += 1;

        let update = match plan_update(&profile, cipher) {
            Ok(Some(update)) => update,
            Ok(None) => {
                debug!(profile_id = %profile.id, "already encrypted");
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                error!(profile_id = %profile.id, error = %e, "failed to encrypt legacy field");
                report.failed += 1;
                continue;
            }
        };

        match store.save(profile.id, &update).await {
            Ok(_) => {
                info!(profile_id = %profile.id, "encrypted legacy fields");
                report.updated += 1;
            }
            Err(e) => {
                error!(profile_id = %profile.id, error = %e, "failed to save profile");
                report.failed += 1;
            }
        }
    }

    info!(
        scanned = report.scanned,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        "backfill complete"
    );
    Ok(report)
}

/// Build the partial update for one profile, or `None` if nothing needs
/// encrypting.
fn plan_update(
    profile: &StoredProfile,
    cipher: &FieldCipher,
) -> Result<Option<SensitiveFields>, CipherError> {
    let f = &profile.fields;
    let update = SensitiveFields {
        bank_routing_number: encrypt_if_plaintext(&f.bank_routing_number, cipher)?,
        bank_account_number: encrypt_if_plaintext(&f.bank_account_number, cipher)?,
        portal_email: encrypt_if_plaintext(&f.portal_email, cipher)?,
        ..Default::default()
    };
    Ok((!update.is_empty()).then_some(update))
}

fn encrypt_if_plaintext(
    value: &Option<String>,
    cipher: &FieldCipher,
) -> Result<Option<String>, CipherError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() && !looks_encoded(v) => cipher.encrypt(v).map(Some),
        _ => Ok(None),
    }
}
