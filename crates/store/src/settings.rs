//! Ledger settings store.
//!
//! The loaded settings are revision 1. Every update appends a revision;
//! earlier revisions stay readable.

use chrono::{DateTime, Utc};
use ledgerwise_shared::{ErrorKind, LedgerSettings};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Settings errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The field cannot change after startup.
    #[error("Setting {0} cannot be changed after startup")]
    ImmutableSetting(&'static str),

    /// The updated settings failed validation.
    #[error("Invalid settings: {0}")]
    Invalid(String),

    /// No such revision.
    #[error("Settings revision not found: {0}")]
    RevisionNotFound(u64),
}

impl SettingsError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ImmutableSetting(_) => "IMMUTABLE_SETTING",
            Self::Invalid(_) => "INVALID_SETTINGS",
            Self::RevisionNotFound(_) => "SETTINGS_REVISION_NOT_FOUND",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ImmutableSetting(_) | Self::Invalid(_) => ErrorKind::Validation,
            Self::RevisionNotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// One stored version of the settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsRevision {
    /// 1 for the settings loaded at startup.
    pub revision: u64,
    /// The settings.
    pub settings: LedgerSettings,
    /// When the revision was stored.
    pub recorded_at: DateTime<Utc>,
}

/// Append-only store of ledger settings revisions.
#[derive(Debug)]
pub struct SettingsStore {
    revisions: RwLock<Vec<SettingsRevision>>,
}

impl SettingsStore {
    /// Stores the startup settings as revision 1.
    ///
    /// # Errors
    ///
    /// `Invalid` if the settings fail validation.
    pub fn new(settings: LedgerSettings) -> Result<Self, SettingsError> {
        settings.validate().map_err(SettingsError::Invalid)?;
        Ok(Self {
            revisions: RwLock::new(vec![SettingsRevision {
                revision: 1,
                settings,
                recorded_at: Utc::now(),
            }]),
        })
    }

    /// Latest revision.
    #[must_use]
    pub fn current(&self) -> SettingsRevision {
        let revisions = self.revisions.read();
        // Never empty: `new` stores revision 1.
        revisions[revisions.len() - 1].clone()
    }

    /// Applies `change` to a copy of the latest settings and appends the result.
    ///
    /// # Errors
    ///
    /// `ImmutableSetting` if the home currency or precision changed, `Invalid`
    /// if the result fails validation. Nothing is stored on error.
    pub fn update<F>(&self, change: F) -> Result<SettingsRevision, SettingsError>
    where
        F: FnOnce(&mut LedgerSettings),
    {
        let mut revisions = self.revisions.write();
        let latest = &revisions[revisions.len() - 1];
        let mut settings = latest.settings.clone();
        change(&mut settings);

        if settings.home_currency != latest.settings.home_currency {
            return Err(SettingsError::ImmutableSetting("home_currency"));
        }
        if settings.precision != latest.settings.precision {
            return Err(SettingsError::ImmutableSetting("precision"));
        }
        settings.validate().map_err(SettingsError::Invalid)?;

        let revision = SettingsRevision {
            revision: latest.revision + 1,
            settings,
            recorded_at: Utc::now(),
        };
        revisions.push(revision.clone());
        info!(revision = revision.revision, "Ledger settings updated");
        Ok(revision)
    }

    /// A specific revision.
    ///
    /// # Errors
    ///
    /// `RevisionNotFound`.
    pub fn revision(&self, revision: u64) -> Result<SettingsRevision, SettingsError> {
        let revisions = self.revisions.read();
        usize::try_from(revision)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| revisions.get(index))
            .cloned()
            .ok_or(SettingsError::RevisionNotFound(revision))
    }

    /// Every revision, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<SettingsRevision> {
        self.revisions.read().clone()
    }
}
