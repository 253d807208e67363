use chrono::NaiveDate;
use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;

use super::TransactionType;

/// A fully closed round trip: everything bought was sold again. Emitted
/// exactly once, when a symbol's open quantity returns to (near) zero.
#[derive(Clone, Debug, Getters, new, PartialEq)]
pub struct CompletedTrade {
    symbol: String,
    total_invested: Decimal,
    total_returns: Decimal,
    profit_loss: Decimal,
    first_buy_date: NaiveDate,
    last_sell_date: NaiveDate,
    legs: Vec<TradeLeg>,
}

/// One Buy or Sell in a position's trail. `profit_loss` is set on sells
/// only, against the FIFO cost basis of the shares consumed.
#[derive(Clone, Debug, Getters, new, PartialEq)]
pub struct TradeLeg {
    transaction_type: TransactionType,
    date: NaiveDate,
    quantity: Decimal,
    price: Option<Decimal>,
    amount: Decimal,
    profit_loss: Option<Decimal>,
}
