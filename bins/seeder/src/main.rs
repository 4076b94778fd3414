//! Demo ledger seeder.
//!
//! Builds a ledger from configuration, seeds the demo chart of accounts,
//! currencies and products, posts a handful of demo documents through the
//! document listener and prints the verified trial balance.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use ledgerwise_api::{Bookkeeper, DocumentListener, DocumentSource, InMemoryDocumentSource};
use ledgerwise_core::chart::{AccountType, NewAccount};
use ledgerwise_core::document::{
    AdjustmentItem, BankTransaction, BankTransactionKind, Document, DocumentBody, LineItem,
    PaymentStatus, StockAdjustment, TradeDocument,
};
use ledgerwise_shared::AppConfig;
use ledgerwise_shared::types::{AccountId, CurrencyCode, DocumentId, ProductId, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Demo chart: (code, name, type, parent code).
const CHART: &[(&str, &str, AccountType, Option<&str>)] = &[
    ("1000", "Current assets", AccountType::Asset, None),
    ("1001", "Cash in hand", AccountType::Asset, Some("1000")),
    ("1002", "Bank", AccountType::Asset, Some("1000")),
    ("1100", "Accounts receivable", AccountType::Asset, Some("1000")),
    ("2000", "Accounts payable", AccountType::Liability, None),
    ("2100", "Tax payable", AccountType::Liability, None),
    ("3000", "Owner's capital", AccountType::Equity, None),
    ("4001", "Sales", AccountType::Income, None),
    ("4900", "Exchange gain/loss", AccountType::Income, None),
    ("5001", "Purchases", AccountType::Expense, None),
];

/// Demo currencies and their rate to the home currency.
const CURRENCIES: &[(&str, Decimal)] = &[
    ("USD", dec!(83.25)),
    ("EUR", dec!(90.45)),
    ("GBP", dec!(105.8)),
];

struct Products {
    widget: ProductId,
    gadget: ProductId,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerwise=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let source = Arc::new(InMemoryDocumentSource::new());
    let bookkeeper = Arc::new(Bookkeeper::new(config.ledger.clone(), source.clone())?);
    let now = Utc::now();

    info!("Seeding chart of accounts...");
    seed_chart(&bookkeeper)?;

    info!("Seeding exchange rates...");
    seed_rates(&bookkeeper, now)?;

    info!("Seeding products...");
    let products = seed_products(&bookkeeper)?;

    info!("Seeding documents...");
    let capital = bookkeeper
        .chart()
        .account_by_code("3000")
        .context("capital account must be seeded")?;
    let ids = seed_documents(&source, &products, capital.id, now).await?;

    let listener = DocumentListener::new(Arc::clone(&bookkeeper), config.worker.clone());
    let cancel = listener.cancellation_token();
    let (sender, mut events, handle) = listener.spawn();
    let reporter = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            info!(event = %serde_json::to_string(&event).unwrap_or_default(), "Listener event");
        }
    });

    for id in ids {
        sender.send(id).await.context("Document listener stopped early")?;
    }
    tokio::time::timeout(Duration::from_secs(30), async {
        while !source.pending().await.unwrap_or_default().is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .context("Timed out waiting for documents to post")?;
    cancel.cancel();
    drop(sender);
    let stats = handle.await?;
    reporter.await?;
    info!(
        posted = stats.posted,
        rejected = stats.rejected,
        "Demo documents processed"
    );

    let today = now.date_naive();
    let trial_balance = bookkeeper.trial_balance(today)?;
    println!("{}", serde_json::to_string_pretty(&trial_balance)?);

    let outcome = bookkeeper.audit_task().spawn(today).await?;
    if !outcome.is_clean() {
        anyhow::bail!("Audit found problems: {outcome:?}");
    }
    info!(
        products_checked = outcome.products_checked,
        "Seeding complete, ledger verified"
    );
    Ok(())
}

fn seed_chart(bookkeeper: &Bookkeeper) -> anyhow::Result<()> {
    let chart = bookkeeper.chart();
    for &(code, name, account_type, parent) in CHART {
        let mut input = NewAccount::root(code, name, account_type);
        if let Some(parent) = parent {
            let parent = chart
                .account_by_code(parent)
                .with_context(|| format!("parent {parent} must be seeded before {code}"))?;
            input = input.under(parent.id);
        }
        chart.create_account(input)?;
    }
    Ok(())
}

fn seed_rates(bookkeeper: &Bookkeeper, now: DateTime<Utc>) -> anyhow::Result<()> {
    let valuation = bookkeeper.valuation();
    let effective = now - chrono::Duration::days(30);
    for &(code, rate) in CURRENCIES {
        valuation.record_rate(CurrencyCode::new(code)?, rate, effective)?;
    }
    // A later USD rate, so the settled export invoice shows an exchange gain.
    valuation.record_rate(
        CurrencyCode::new("USD")?,
        dec!(84.10),
        now - chrono::Duration::days(2),
    )?;
    Ok(())
}

fn seed_products(bookkeeper: &Bookkeeper) -> anyhow::Result<Products> {
    let inventory = bookkeeper.inventory();
    let products = Products {
        widget: ProductId::new(),
        gadget: ProductId::new(),
    };
    inventory.register(products.widget, "WIDGET-001", dec!(100))?;
    inventory.register(products.gadget, "GADGET-001", dec!(25))?;
    Ok(products)
}

async fn seed_documents(
    source: &InMemoryDocumentSource,
    products: &Products,
    capital: AccountId,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<DocumentId>> {
    let inr = CurrencyCode::new("INR")?;
    let usd = CurrencyCode::new("USD")?;
    let clerk = UserId::new();

    let document = |number: &str, days_ago: i64, body: DocumentBody| Document {
        id: DocumentId::new(),
        number: number.to_string(),
        issued_at: now - chrono::Duration::days(days_ago),
        created_by: clerk,
        body,
    };
    let line = |product_id: Option<ProductId>, description: &str, quantity, rate, tax| LineItem {
        product_id,
        description: description.to_string(),
        quantity,
        rate,
        tax,
    };

    let documents = vec![
        document(
            "BNK-0001",
            15,
            DocumentBody::BankTransaction(BankTransaction {
                bank_account: None,
                counter_account: capital,
                kind: BankTransactionKind::Deposit,
                currency: inr.clone(),
                amount: dec!(500000),
                description: "Opening capital".into(),
            }),
        ),
        document(
            "PB-0001",
            12,
            DocumentBody::PurchaseBill(TradeDocument {
                counterparty: "Acme Supplies".into(),
                currency: inr.clone(),
                items: vec![line(Some(products.gadget), "Gadget", dec!(10), dec!(1200), dec!(2160))],
                declared_total: dec!(14160),
                status: PaymentStatus::Unpaid,
                settled_at: None,
            }),
        ),
        document(
            "INV-0001",
            10,
            DocumentBody::SalesInvoice(TradeDocument {
                counterparty: "Globex".into(),
                currency: inr.clone(),
                items: vec![line(Some(products.widget), "Widget", dec!(5), dec!(2500), dec!(2250))],
                declared_total: dec!(14750),
                status: PaymentStatus::Unpaid,
                settled_at: None,
            }),
        ),
        document(
            "INV-0002",
            7,
            DocumentBody::SalesInvoice(TradeDocument {
                counterparty: "Initech Inc.".into(),
                currency: usd,
                items: vec![line(Some(products.widget), "Widget (export)", dec!(2), dec!(150), dec!(0))],
                declared_total: dec!(300),
                status: PaymentStatus::Paid,
                settled_at: Some(now - chrono::Duration::days(1)),
            }),
        ),
        document(
            "INV-0003",
            5,
            DocumentBody::SalesInvoice(TradeDocument {
                counterparty: "Globex".into(),
                currency: inr,
                items: vec![line(None, "Consulting", dec!(1), dec!(90000), dec!(18000))],
                // Deliberately wrong; the listener rejects it.
                declared_total: dec!(118000),
                status: PaymentStatus::Unpaid,
                settled_at: None,
            }),
        ),
        document(
            "ADJ-0001",
            3,
            DocumentBody::StockAdjustment(StockAdjustment {
                items: vec![AdjustmentItem {
                    product_id: products.gadget,
                    quantity: dec!(-1),
                    reason: "damaged in transit".into(),
                }],
            }),
        ),
    ];

    let mut ids = Vec::with_capacity(documents.len());
    for document in documents {
        ids.push(source.insert(document).await);
    }
    Ok(ids)
}
