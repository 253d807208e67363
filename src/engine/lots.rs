use std::collections::VecDeque;

use chrono::NaiveDate;
use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::Lot;

/// Quantities within this many units of zero count as a closed position.
/// Brokerage exports carry fractional-share rounding noise well below it.
pub const EPSILON: Decimal = dec!(0.001);

/// FIFO queue of open cost-basis lots for one symbol. Buys append to the
/// tail; sells consume strictly from the head, oldest lot first.
#[derive(Clone, Debug)]
pub struct LotBook {
    symbol: String,
    lots: VecDeque<Lot>,
}

/// What one sale did to the book. `oversold_by` is non-zero when the
/// ledger sold more than it ever bought; the book clamps at zero instead
/// of going negative.
#[derive(Clone, Debug, Getters, new, PartialEq)]
pub struct SellOutcome {
    quantity_consumed: Decimal,
    cost_basis_sold: Decimal,
    oversold_by: Decimal,
}

impl LotBook {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            lots: VecDeque::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn buy(&mut self, quantity: Decimal, unit_cost: Decimal, date: NaiveDate, estimated: bool) {
        self.lots.push_back(Lot::new(
            self.symbol.clone(),
            quantity,
            unit_cost,
            date,
            estimated,
        ));
    }

    /// Consumes `quantity` shares oldest-first and reports the cost basis
    /// of what was actually consumed.
    pub fn sell(&mut self, quantity: Decimal) -> SellOutcome {
        let mut to_close = quantity;
        let mut cost_basis_sold = Decimal::ZERO;
        let mut consumed = Decimal::ZERO;

        while to_close > Decimal::ZERO {
            let Some(lot) = self.lots.front_mut() else {
                break;
            };
            let before = *lot.quantity_remaining();
            let taken = before.min(to_close);
            cost_basis_sold += lot.consume(to_close);
            consumed += taken;
            to_close -= taken;

            if lot.quantity_remaining() <= &EPSILON {
                self.lots.pop_front();
            }
        }

        SellOutcome::new(consumed, cost_basis_sold, to_close)
    }

    pub fn quantity(&self) -> Decimal {
        self.lots
            .iter()
            .map(|lot| *lot.quantity_remaining())
            .sum()
    }

    /// Cost attributable to the shares still held. Fully consumed lots
    /// contribute nothing; there is no double counting.
    pub fn cost_basis(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.cost_remaining()).sum()
    }

    pub fn average_cost(&self) -> Decimal {
        let quantity = self.quantity();
        if quantity.is_zero() {
            return Decimal::ZERO;
        }
        self.cost_basis() / quantity
    }

    pub fn is_closed(&self) -> bool {
        self.quantity().abs() <= EPSILON
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn has_estimated_lots(&self) -> bool {
        self.lots.iter().any(|lot| *lot.estimated())
    }

    pub fn oldest_open_date(&self) -> Option<NaiveDate> {
        self.lots.front().map(|lot| *lot.opened_date())
    }

    pub fn clear(&mut self) {
        self.lots.clear();
    }
}
