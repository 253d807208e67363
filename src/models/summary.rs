use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;

/// Portfolio-level totals. `cash_balance` reconciles deposits against
/// open cost basis, fees, taxes, dividends and completed-trade proceeds;
/// `return_percentage` is measured against total capital ever
/// contributed, so fully exited positions still count.
#[derive(Clone, Debug, Default, Getters, new, PartialEq)]
pub struct PortfolioSummary {
    total_invested: Decimal,
    current_value: Decimal,
    unrealized_gain_loss: Decimal,
    realized_gain_loss: Decimal,
    total_gain_loss: Decimal,
    return_percentage: Decimal,
    cash_balance: Decimal,
    total_deposits: Decimal,
    total_fees: Decimal,
    total_taxes: Decimal,
    total_dividends: Decimal,
    number_of_holdings: usize,
}

/// Cash flows of one calendar month, keyed "YYYY-MM".
#[derive(Clone, Debug, Getters, new, PartialEq)]
pub struct MonthlyPerformance {
    month: String,
    deposits: Decimal,
    invested: Decimal,
    returns: Decimal,
    fees: Decimal,
    dividends: Decimal,
}
