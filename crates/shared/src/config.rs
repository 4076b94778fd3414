//! Application configuration management.
//!
//! Settings are layered from `config/default`, `config/{RUN_MODE}` and
//! `LEDGERWISE__*` environment variables. Every field has a default, so an
//! empty environment yields the demo ledger (INR home currency, two decimals).

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::CurrencyCode;

/// Largest supported minor-unit precision.
pub const MAX_PRECISION: u32 = 9;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ledger settings aggregate.
    #[serde(default)]
    pub ledger: LedgerSettings,
    /// Document listener configuration.
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// The ledger settings aggregate owned by one service instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Home (functional) currency; all balances are kept in it.
    #[serde(default = "default_home_currency")]
    pub home_currency: CurrencyCode,
    /// Decimal places of the minor unit.
    #[serde(default = "default_precision")]
    pub precision: u32,
    /// Company profile.
    #[serde(default)]
    pub company: CompanyProfile,
    /// Account codes the document translator posts to.
    #[serde(default)]
    pub posting_accounts: PostingAccounts,
    /// Stock policy defaults.
    #[serde(default)]
    pub inventory: InventoryPolicy,
    /// Events the document listener reports.
    #[serde(default = "default_notifications")]
    pub notifications: BTreeSet<NotificationEvent>,
}

fn default_home_currency() -> CurrencyCode {
    CurrencyCode("INR".to_string())
}

fn default_precision() -> u32 {
    2
}

fn default_notifications() -> BTreeSet<NotificationEvent> {
    BTreeSet::from([
        NotificationEvent::DocumentRejected,
        NotificationEvent::ConsistencyViolation,
    ])
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            home_currency: default_home_currency(),
            precision: default_precision(),
            company: CompanyProfile::default(),
            posting_accounts: PostingAccounts::default(),
            inventory: InventoryPolicy::default(),
            notifications: default_notifications(),
        }
    }
}

impl LedgerSettings {
    /// Checks the settings for values the ledger cannot work with.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.precision > MAX_PRECISION {
            return Err(format!(
                "precision {} exceeds the maximum of {MAX_PRECISION}",
                self.precision
            ));
        }
        if let (Some(start), Some(end)) = (
            self.company.financial_year_start,
            self.company.financial_year_end,
        ) && start >= end
        {
            return Err(format!(
                "financial year start {start} must be before its end {end}"
            ));
        }
        self.posting_accounts.validate()
    }
}

/// Company profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Legal name.
    #[serde(default = "default_company_name")]
    pub name: String,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Tax registration number (e.g. GSTIN).
    #[serde(default)]
    pub tax_number: Option<String>,
    /// First day of the financial year.
    #[serde(default)]
    pub financial_year_start: Option<NaiveDate>,
    /// Last day of the financial year.
    #[serde(default)]
    pub financial_year_end: Option<NaiveDate>,
}

fn default_company_name() -> String {
    "Demo Company".to_string()
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: default_company_name(),
            address: None,
            tax_number: None,
            financial_year_start: None,
            financial_year_end: None,
        }
    }
}

/// Chart-of-accounts codes used when translating documents into journal entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingAccounts {
    /// Cash in hand; debited by settled sales, credited by settled purchases.
    #[serde(default = "default_cash")]
    pub cash: String,
    /// Default bank account.
    #[serde(default = "default_bank")]
    pub bank: String,
    /// Accounts receivable.
    #[serde(default = "default_receivable")]
    pub receivable: String,
    /// Accounts payable.
    #[serde(default = "default_payable")]
    pub payable: String,
    /// Tax payable (output tax, offset by input tax).
    #[serde(default = "default_tax_payable")]
    pub tax_payable: String,
    /// Sales income.
    #[serde(default = "default_sales")]
    pub sales: String,
    /// Realised foreign exchange gain or loss.
    #[serde(default = "default_forex_gain_loss")]
    pub forex_gain_loss: String,
    /// Purchases expense.
    #[serde(default = "default_purchases")]
    pub purchases: String,
}

fn default_cash() -> String {
    "1001".to_string()
}

fn default_bank() -> String {
    "1002".to_string()
}

fn default_receivable() -> String {
    "1100".to_string()
}

fn default_payable() -> String {
    "2000".to_string()
}

fn default_tax_payable() -> String {
    "2100".to_string()
}

fn default_sales() -> String {
    "4001".to_string()
}

fn default_forex_gain_loss() -> String {
    "4900".to_string()
}

fn default_purchases() -> String {
    "5001".to_string()
}

impl Default for PostingAccounts {
    fn default() -> Self {
        Self {
            cash: default_cash(),
            bank: default_bank(),
            receivable: default_receivable(),
            payable: default_payable(),
            tax_payable: default_tax_payable(),
            sales: default_sales(),
            forex_gain_loss: default_forex_gain_loss(),
            purchases: default_purchases(),
        }
    }
}

impl PostingAccounts {
    fn validate(&self) -> Result<(), String> {
        let codes = [
            ("cash", &self.cash),
            ("bank", &self.bank),
            ("receivable", &self.receivable),
            ("payable", &self.payable),
            ("tax_payable", &self.tax_payable),
            ("sales", &self.sales),
            ("forex_gain_loss", &self.forex_gain_loss),
            ("purchases", &self.purchases),
        ];
        match codes.iter().find(|(_, code)| code.trim().is_empty()) {
            Some((name, _)) => Err(format!("posting account `{name}` has an empty code")),
            None => Ok(()),
        }
    }
}

/// Stock policy defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryPolicy {
    /// Whether newly registered products may go below zero stock.
    #[serde(default)]
    pub allow_backorders_by_default: bool,
}

/// Events the document listener can report to its subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A document was translated and posted.
    DocumentPosted,
    /// A document was rejected (validation, stock or rate failure).
    DocumentRejected,
    /// The consistency checker found a violated invariant.
    ConsistencyViolation,
}

/// Document listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Seconds between polls of the document source; 0 disables polling.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Attempts for a document whose failure is retryable.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Capacity of the notification channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_poll_interval() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_retries: default_max_retries(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or fails validation.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERWISE").separator("__"))
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.ledger.validate().map_err(config::ConfigError::Message)?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_describe_demo_ledger() {
        let settings = LedgerSettings::default();
        assert_eq!(settings.home_currency.as_str(), "INR");
        assert_eq!(settings.precision, 2);
        assert_eq!(settings.posting_accounts.cash, "1001");
        assert_eq!(settings.posting_accounts.sales, "4001");
        assert!(!settings.inventory.allow_backorders_by_default);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_without_sources_uses_defaults() {
        temp_env::with_vars_unset(["LEDGERWISE__LEDGER__HOME_CURRENCY"], || {
            let config = AppConfig::load().unwrap();
            assert_eq!(config.ledger, LedgerSettings::default());
            assert_eq!(config.worker.max_retries, 3);
        });
    }

    #[test]
    fn test_environment_overrides_home_currency() {
        temp_env::with_var("LEDGERWISE__LEDGER__HOME_CURRENCY", Some("usd"), || {
            let config = AppConfig::load().unwrap();
            assert_eq!(config.ledger.home_currency.as_str(), "USD");
        });
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: LedgerSettings =
            serde_json::from_str(r#"{"home_currency":"eur","posting_accounts":{"cash":"1000"}}"#)
                .unwrap();
        assert_eq!(settings.home_currency.as_str(), "EUR");
        assert_eq!(settings.posting_accounts.cash, "1000");
        assert_eq!(settings.posting_accounts.bank, "1002");
        assert_eq!(settings.precision, 2);
    }

    #[test]
    fn test_validate_rejects_excess_precision() {
        let settings = LedgerSettings {
            precision: 12,
            ..LedgerSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_financial_year() {
        let mut settings = LedgerSettings::default();
        settings.company.financial_year_start = NaiveDate::from_ymd_opt(2025, 4, 1);
        settings.company.financial_year_end = NaiveDate::from_ymd_opt(2025, 3, 31);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_posting_code() {
        let mut settings = LedgerSettings::default();
        settings.posting_accounts.receivable = "  ".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.contains("receivable"));
    }

    #[test]
    fn test_notification_defaults() {
        let settings = LedgerSettings::default();
        assert!(settings.notifications.contains(&NotificationEvent::DocumentRejected));
        assert!(!settings.notifications.contains(&NotificationEvent::DocumentPosted));
    }
}
