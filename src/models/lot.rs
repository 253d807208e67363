use chrono::NaiveDate;
use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;

/// A batch of shares acquired together at one cost basis. Owned by the
/// lot book of a single symbol; shrinks as sales consume it oldest-first.
#[derive(Clone, Debug, Getters, new, PartialEq)]
pub struct Lot {
    symbol: String,
    quantity_remaining: Decimal,
    unit_cost: Decimal,
    opened_date: NaiveDate,
    estimated: bool,
}

impl Lot {
    /// Takes up to `quantity` shares out of the lot and returns the cost
    /// basis of what was actually consumed.
    pub fn consume(&mut self, quantity: Decimal) -> Decimal {
        let consumed = quantity.min(self.quantity_remaining);
        self.quantity_remaining -= consumed;
        consumed * self.unit_cost
    }

    pub fn cost_remaining(&self) -> Decimal {
        self.quantity_remaining * self.unit_cost
    }
}
