use anyhow::Result;
use chrono::NaiveDate;
use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;
use strum_macros::EnumIter;

/// One immutable row of the brokerage ledger, already classified.
/// Never mutated by the engine; consumed in chronological order.
#[derive(Clone, Debug, Getters, new, PartialEq)]
pub struct Transaction {
    id: i64,
    account: String,
    date: NaiveDate,
    transaction_type: TransactionType,
    symbol: Option<String>,
    quantity: Option<Decimal>,
    amount: Decimal,
    notes: Option<String>,
}

impl Transaction {
    /// Amount with the sign a statement reader expects: purchases, fees
    /// and tax charges are outflows regardless of how the source stored
    /// them.
    pub fn display_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Buy | TransactionType::Fee | TransactionType::TaxCharge => {
                -self.amount.abs()
            }
            _ => self.amount,
        }
    }
}

#[derive(Clone, Copy, Debug, EnumIter, Eq, PartialEq)]
pub enum TransactionType {
    Buy,
    Sell,
    Deposit,
    Dividend,
    Fee,
    TaxCharge,
    TaxCredit,
}

impl TransactionType {
    pub fn parse_str(s: &str) -> Result<TransactionType> {
        match s {
            "Buy" => Ok(TransactionType::Buy),
            "Sell" => Ok(TransactionType::Sell),
            "Deposit" => Ok(TransactionType::Deposit),
            "Dividend" => Ok(TransactionType::Dividend),
            "Fee" => Ok(TransactionType::Fee),
            "Tax Charge" => Ok(TransactionType::TaxCharge),
            "Tax Credit" => Ok(TransactionType::TaxCredit),
            _ => Err(anyhow::anyhow!("Unknown transaction type '{}'", s)),
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            TransactionType::Buy => "Buy",
            TransactionType::Sell => "Sell",
            TransactionType::Deposit => "Deposit",
            TransactionType::Dividend => "Dividend",
            TransactionType::Fee => "Fee",
            TransactionType::TaxCharge => "Tax Charge",
            TransactionType::TaxCredit => "Tax Credit",
        }
    }

    /// Buy/Sell move shares; everything else only moves cash.
    pub fn is_position(&self) -> bool {
        matches!(self, TransactionType::Buy | TransactionType::Sell)
    }
}
