use chrono::NaiveDate;
use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::quote::PriceSource;

/// Cost-basis view of an open position, derived purely from the ledger.
/// `total_invested` covers only the shares still held, FIFO-attributed.
#[derive(Clone, Debug, Getters, new, PartialEq)]
pub struct HoldingBasis {
    symbol: String,
    quantity: Decimal,
    average_cost: Decimal,
    total_invested: Decimal,
    first_buy_date: NaiveDate,
    estimated: bool,
}

/// A holding enriched with a resolved price. Recomputed on every read;
/// persisted only as a cache that must stay reproducible from the ledger.
#[derive(Clone, Debug, Getters, new, PartialEq)]
pub struct Holding {
    symbol: String,
    quantity: Decimal,
    average_cost: Decimal,
    total_invested: Decimal,
    current_price: Decimal,
    market_value: Decimal,
    unrealized_gain_loss: Decimal,
    unrealized_gain_loss_percent: Decimal,
    price_source: PriceSource,
    first_buy_date: NaiveDate,
    estimated: bool,
}

impl Holding {
    /// Values a basis at `price`. When no market price is available the
    /// caller passes the average cost with `PriceSource::AverageCost`, so
    /// the holding stays in the totals instead of being dropped.
    pub fn from_basis(basis: &HoldingBasis, price: Decimal, source: PriceSource) -> Holding {
        let market_value = basis.quantity() * price;
        let unrealized = market_value - basis.total_invested();
        let unrealized_percent = if basis.total_invested().is_zero() {
            Decimal::ZERO
        } else {
            unrealized / basis.total_invested() * dec!(100)
        };

        Holding::new(
            basis.symbol().clone(),
            *basis.quantity(),
            *basis.average_cost(),
            *basis.total_invested(),
            price,
            market_value,
            unrealized,
            unrealized_percent,
            source,
            *basis.first_buy_date(),
            *basis.estimated(),
        )
    }
}
