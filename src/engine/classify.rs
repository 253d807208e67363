use anyhow::{Context, Result};
use chrono::NaiveDate;
use derive_getters::Getters;
use derive_new::new;
use regex::Regex;
use rust_decimal::Decimal;

use crate::models::{Transaction, TransactionType};

/// A raw ledger row as produced by the ingestion side: an optional
/// explicit type tag, a free-text label (stock symbol or business name),
/// and a signed amount. Quantity and notes may be absent.
#[derive(Clone, Debug, Getters, new)]
pub struct LedgerRow {
    date: NaiveDate,
    type_tag: Option<String>,
    label: String,
    quantity: Option<Decimal>,
    amount: Decimal,
    notes: Option<String>,
}

/// Maps heterogeneous ledger rows onto the canonical transaction types.
///
/// An explicit tag always wins. Without one, cash transactions are
/// recognised by label keywords and position transactions by a
/// ticker-shaped label, with the amount sign deciding Buy vs Sell.
/// Sign alone is never enough: a Dividend and a Sell are both
/// amount-positive but are not interchangeable.
pub struct Classifier {
    symbol_pattern: Regex,
    label_rules: Vec<(&'static str, TransactionType)>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        // Checked in order; "tax credit" must come before the bare "tax".
        let label_rules = vec![
            ("deposit", TransactionType::Deposit),
            ("dividend", TransactionType::Dividend),
            ("tax credit", TransactionType::TaxCredit),
            ("tax refund", TransactionType::TaxCredit),
            ("tax", TransactionType::TaxCharge),
            ("fee", TransactionType::Fee),
            ("commission", TransactionType::Fee),
        ];

        Self {
            symbol_pattern: Regex::new(r"^[A-Z]{1,5}(\.[A-Z]{1,2})?$")
                .expect("invalid symbol pattern"),
            label_rules,
        }
    }

    /// Classifies one row. Unrecognisable rows come back as an error so
    /// the caller can record them and keep replaying; a single bad row
    /// must never abort the whole reconstruction.
    pub fn classify(&self, account: &str, id: i64, row: &LedgerRow) -> Result<Transaction> {
        let transaction_type = match row.type_tag() {
            Some(tag) => TransactionType::parse_str(tag)
                .with_context(|| format!("Unrecognized type tag on row '{}'", row.label()))?,
            None => self.infer_type(row)?,
        };

        let symbol = if transaction_type.is_position() {
            Some(row.label().trim().to_string())
        } else {
            None
        };

        Ok(Transaction::new(
            id,
            account.to_string(),
            *row.date(),
            transaction_type,
            symbol,
            row.quantity().map(|q| q.abs()),
            *row.amount(),
            row.notes().clone(),
        ))
    }

    fn infer_type(&self, row: &LedgerRow) -> Result<TransactionType> {
        let label = row.label().trim();
        let lowered = label.to_lowercase();

        for (keyword, transaction_type) in &self.label_rules {
            if lowered.contains(keyword) {
                return Ok(*transaction_type);
            }
        }

        if self.symbol_pattern.is_match(label) {
            // Ledger convention: money leaves the account on a purchase.
            if row.amount().is_sign_negative() {
                return Ok(TransactionType::Buy);
            }
            return Ok(TransactionType::Sell);
        }

        Err(anyhow::anyhow!(
            "Label '{}' matches no classification rule",
            label
        ))
    }
}

/// Extracts an explicit per-share price from free-text notes, e.g.
/// "Quantity: 10, Price: $1,234.50". Absence is not an error; quantity
/// and amount stay authoritative.
pub fn notes_price(notes: &str) -> Option<Decimal> {
    let pattern = Regex::new(r"Price:\s*\$?([\d,]+\.?\d*)").ok()?;
    let captures = pattern.captures(notes)?;
    captures[1].replace(',', "").parse::<Decimal>().ok()
}
