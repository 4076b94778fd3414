//! Document-to-ledger translation.

use ledgerwise_shared::config::PostingAccounts;
use ledgerwise_shared::types::{AccountId, DocumentId, to_minor_units};
use rust_decimal::Decimal;

use super::error::DocumentError;
use super::types::{
    BankTransaction, BankTransactionKind, Document, DocumentBody, DocumentKind, StockAdjustment,
    TradeDocument,
};
use super::valuation::TradeValuation;
use crate::chart::ChartOfAccounts;
use crate::currency::{CurrencyError, CurrencyService, ForexTransaction, RateSource};
use crate::inventory::{MovementKind, MovementRequest};
use crate::ledger::{JournalLine, NewJournalEntry};

/// Posting-account codes resolved against the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingAccountIds {
    /// Cash in hand.
    pub cash: AccountId,
    /// Default bank account.
    pub bank: AccountId,
    /// Accounts receivable.
    pub receivable: AccountId,
    /// Accounts payable.
    pub payable: AccountId,
    /// Tax payable.
    pub tax_payable: AccountId,
    /// Sales.
    pub sales: AccountId,
    /// Purchases.
    pub purchases: AccountId,
    /// Forex gain/loss.
    pub forex_gain_loss: AccountId,
}

impl PostingAccountIds {
    /// Looks up every configured code.
    ///
    /// # Errors
    ///
    /// `UnmappedAccount` for the first code missing from the chart.
    pub fn resolve(codes: &PostingAccounts, chart: &ChartOfAccounts) -> Result<Self, DocumentError> {
        let lookup = |code: &str| {
            chart
                .find_by_code(code)
                .map(|account| account.id)
                .ok_or_else(|| DocumentError::UnmappedAccount(code.to_string()))
        };
        Ok(Self {
            cash: lookup(&codes.cash)?,
            bank: lookup(&codes.bank)?,
            receivable: lookup(&codes.receivable)?,
            payable: lookup(&codes.payable)?,
            tax_payable: lookup(&codes.tax_payable)?,
            sales: lookup(&codes.sales)?,
            purchases: lookup(&codes.purchases)?,
            forex_gain_loss: lookup(&codes.forex_gain_loss)?,
        })
    }
}

/// Everything a document implies, before anything is posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    /// Source document.
    pub document_id: DocumentId,
    /// Document kind.
    pub kind: DocumentKind,
    /// Candidate journal entry; `None` for stock adjustments.
    pub entry: Option<NewJournalEntry>,
    /// Stock movements in item order.
    pub movements: Vec<MovementRequest>,
    /// Forex record for foreign-currency trade documents.
    pub forex: Option<ForexTransaction>,
}

type TradeEffects = (
    Option<NewJournalEntry>,
    Vec<MovementRequest>,
    Option<ForexTransaction>,
);

/// Builds candidate entries from documents.
#[derive(Debug, Clone)]
pub struct DocumentTranslator {
    precision: u32,
    accounts: PostingAccountIds,
}

impl DocumentTranslator {
    /// Creates a translator.
    #[must_use]
    pub const fn new(precision: u32, accounts: PostingAccountIds) -> Self {
        Self {
            precision,
            accounts,
        }
    }

    /// Resolved posting accounts.
    #[must_use]
    pub const fn accounts(&self) -> &PostingAccountIds {
        &self.accounts
    }

    /// Derives the ledger effects of `document`.
    ///
    /// # Errors
    ///
    /// Any `DocumentError`; no partial result is returned.
    pub fn derive<R: RateSource>(
        &self,
        document: &Document,
        rates: &R,
    ) -> Result<Derivation, DocumentError> {
        let (entry, movements, forex) = match &document.body {
            DocumentBody::SalesInvoice(trade) => self.trade(document, trade, rates, true)?,
            DocumentBody::PurchaseBill(trade) => self.trade(document, trade, rates, false)?,
            DocumentBody::BankTransaction(bank) => {
                (Some(self.bank(document, bank, rates)?), Vec::new(), None)
            }
            DocumentBody::StockAdjustment(adjustment) => {
                (None, adjustment_movements(document, adjustment)?, None)
            }
        };
        Ok(Derivation {
            document_id: document.id,
            kind: document.kind(),
            entry,
            movements,
            forex,
        })
    }

    fn trade<R: RateSource>(
        &self,
        document: &Document,
        trade: &TradeDocument,
        rates: &R,
        sale: bool,
    ) -> Result<TradeEffects, DocumentError> {
        let valuation = TradeValuation::value(document, trade, self.precision, rates)?;
        let accounts = &self.accounts;

        // Sales: counter debit, items credit. Purchases: the mirror image.
        let (counter, item_account, narration) = if sale {
            let counter = if trade.is_settled() { accounts.cash } else { accounts.receivable };
            (
                counter,
                accounts.sales,
                format!("Sales invoice {} to {}", document.number, trade.counterparty),
            )
        } else {
            let counter = if trade.is_settled() { accounts.cash } else { accounts.payable };
            (
                counter,
                accounts.purchases,
                format!("Purchase bill {} from {}", document.number, trade.counterparty),
            )
        };
        let on_counter_side = |account, amount| {
            if sale {
                JournalLine::debit(account, amount)
            } else {
                JournalLine::credit(account, amount)
            }
        };
        let on_item_side = |account, amount| {
            if sale {
                JournalLine::credit(account, amount)
            } else {
                JournalLine::debit(account, amount)
            }
        };

        let mut lines = vec![
            on_counter_side(counter, valuation.counter_amount())
                .with_memo(trade.counterparty.clone()),
        ];
        for item in &valuation.items {
            if !item.home_amount.is_zero() {
                lines.push(
                    on_item_side(item_account, item.home_amount)
                        .with_memo(item.description.clone()),
                );
            }
            if !item.home_tax.is_zero() {
                lines.push(
                    on_item_side(accounts.tax_payable, item.home_tax)
                        .with_memo(format!("Tax on {}", item.description)),
                );
            }
        }

        // A positive difference grows the counter side and balances on the item side.
        let difference = valuation.forex_difference();
        if difference > Decimal::ZERO {
            lines.push(
                on_item_side(accounts.forex_gain_loss, difference).with_memo("Exchange difference"),
            );
        } else if difference < Decimal::ZERO {
            lines.push(
                on_counter_side(accounts.forex_gain_loss, -difference)
                    .with_memo("Exchange difference"),
            );
        }

        let mut entry = NewJournalEntry::new(
            document.issued_at.date_naive(),
            narration,
            document.created_by,
            lines,
        );
        entry.source_document = Some(document.id);

        let (kind, sign) = if sale {
            (MovementKind::Sale, Decimal::NEGATIVE_ONE)
        } else {
            (MovementKind::Purchase, Decimal::ONE)
        };
        let movements = valuation
            .items
            .iter()
            .filter_map(|item| {
                item.product_id.map(|product_id| MovementRequest {
                    product_id,
                    kind,
                    quantity: item.quantity * sign,
                    date: document.issued_at.date_naive(),
                    document_id: Some(document.id),
                    reference: document.number.clone(),
                })
            })
            .collect();

        let forex = valuation.forex_transaction(document, trade);
        Ok((Some(entry), movements, forex))
    }

    fn bank<R: RateSource>(
        &self,
        document: &Document,
        bank: &BankTransaction,
        rates: &R,
    ) -> Result<NewJournalEntry, DocumentError> {
        if bank.amount <= Decimal::ZERO {
            return Err(DocumentError::InvalidDocument(
                "bank transaction amount must be positive".into(),
            ));
        }
        if to_minor_units(bank.amount, self.precision).is_none() {
            return Err(DocumentError::InvalidDocument(format!(
                "amount has more than {} decimal places",
                self.precision
            )));
        }
        let bank_account = bank.bank_account.unwrap_or(self.accounts.bank);
        if bank_account == bank.counter_account {
            return Err(DocumentError::InvalidDocument(
                "bank and counter account must differ".into(),
            ));
        }

        let rate = rates.rate_to_home(&bank.currency, document.issued_at)?;
        let amount = CurrencyService::convert(bank.amount, rate, self.precision).ok_or_else(|| {
            CurrencyError::ConversionOverflow {
                amount: bank.amount,
                currency: bank.currency.clone(),
            }
        })?;

        let (debit, credit) = match bank.kind {
            BankTransactionKind::Deposit => (bank_account, bank.counter_account),
            BankTransactionKind::Withdrawal | BankTransactionKind::Transfer => {
                (bank.counter_account, bank_account)
            }
        };
        let mut entry = NewJournalEntry::new(
            document.issued_at.date_naive(),
            format!("{} {}: {}", bank.kind, document.number, bank.description),
            document.created_by,
            vec![
                JournalLine::debit(debit, amount),
                JournalLine::credit(credit, amount),
            ],
        );
        entry.source_document = Some(document.id);
        Ok(entry)
    }
}

fn adjustment_movements(
    document: &Document,
    adjustment: &StockAdjustment,
) -> Result<Vec<MovementRequest>, DocumentError> {
    if adjustment.items.is_empty() {
        return Err(DocumentError::EmptyDocument);
    }
    adjustment
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if item.quantity.is_zero() {
                return Err(DocumentError::InvalidItem {
                    index,
                    reason: "quantity must not be zero".into(),
                });
            }
            Ok(MovementRequest {
                product_id: item.product_id,
                kind: MovementKind::Adjustment,
                quantity: item.quantity,
                date: document.issued_at.date_naive(),
                document_id: Some(document.id),
                reference: format!("{}: {}", document.number, item.reason),
            })
        })
        .collect()
}
