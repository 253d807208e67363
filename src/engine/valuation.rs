use std::collections::HashMap;

use chrono::Datelike;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::replay::ReplayOutcome;
use crate::models::{
    Holding, HoldingBasis, MonthlyPerformance, PortfolioSummary, PriceSource, Quote, Transaction,
    TransactionType,
};

/// Resolved quotes keyed by symbol, built for one valuation pass and
/// passed in explicitly. Never shared mutable state across requests.
pub type PriceMap = HashMap<String, Quote>;

/// Values each holding basis at its resolved price. A basis without a
/// usable market price is valued at its own average cost and tagged
/// `PriceSource::AverageCost`, so totals never silently drop a holding.
pub fn enrich_holdings(bases: &[HoldingBasis], prices: &PriceMap) -> Vec<Holding> {
    bases
        .iter()
        .map(|basis| {
            match prices
                .get(basis.symbol())
                .filter(|quote| quote.price() > &Decimal::ZERO)
            {
                Some(quote) => Holding::from_basis(basis, *quote.price(), *quote.source()),
                None => {
                    Holding::from_basis(basis, *basis.average_cost(), PriceSource::AverageCost)
                }
            }
        })
        .collect()
}

/// Combines valued holdings with the replay's cash accumulators into the
/// portfolio summary. The cash balance nets deposits against the open
/// cost basis, fees, taxes, dividends and completed-trade round trips;
/// the return percentage is measured against total capital ever
/// contributed so fully exited positions still move the ratio.
pub fn summarize(replay: &ReplayOutcome, holdings: &[Holding]) -> PortfolioSummary {
    let total_invested: Decimal = holdings.iter().map(|h| *h.total_invested()).sum();
    let current_value: Decimal = holdings.iter().map(|h| *h.market_value()).sum();
    let unrealized: Decimal = holdings.iter().map(|h| *h.unrealized_gain_loss()).sum();
    let realized = *replay.realized_gain_loss();
    let total_gain_loss = unrealized + realized;

    let capital_contributed =
        replay.total_deposits() - replay.total_fees() - replay.total_taxes();
    let return_percentage = if capital_contributed > Decimal::ZERO {
        total_gain_loss / capital_contributed * dec!(100)
    } else {
        Decimal::ZERO
    };

    let completed_returns: Decimal = replay
        .completed_trades()
        .iter()
        .map(|t| *t.total_returns())
        .sum();
    let completed_cost: Decimal = replay
        .completed_trades()
        .iter()
        .map(|t| *t.total_invested())
        .sum();

    let cash_balance = replay.total_deposits() - total_invested - replay.total_fees()
        - replay.total_taxes()
        + replay.total_dividends()
        + completed_returns
        - completed_cost;

    PortfolioSummary::new(
        total_invested,
        current_value,
        unrealized,
        realized,
        total_gain_loss,
        return_percentage,
        cash_balance,
        *replay.total_deposits(),
        *replay.total_fees(),
        *replay.total_taxes(),
        *replay.total_dividends(),
        holdings.len(),
    )
}

/// Aggregates deposits, invested cash, sale returns, fees and dividends
/// by calendar month, sorted ascending.
pub fn monthly_performance(transactions: &[Transaction]) -> Vec<MonthlyPerformance> {
    let mut months: HashMap<String, (Decimal, Decimal, Decimal, Decimal, Decimal)> =
        HashMap::new();

    for transaction in transactions {
        let key = format!(
            "{:04}-{:02}",
            transaction.date().year(),
            transaction.date().month()
        );
        let entry = months.entry(key).or_default();
        let amount = *transaction.amount();

        match transaction.transaction_type() {
            TransactionType::Deposit => entry.0 += amount.abs(),
            TransactionType::Buy => entry.1 += amount.abs(),
            TransactionType::Sell => entry.2 += amount,
            TransactionType::Fee => entry.3 += amount.abs(),
            TransactionType::Dividend => entry.4 += amount,
            _ => {}
        }
    }

    let mut result: Vec<MonthlyPerformance> = months
        .into_iter()
        .map(|(month, (deposits, invested, returns, fees, dividends))| {
            MonthlyPerformance::new(month, deposits, invested, returns, fees, dividends)
        })
        .collect();
    result.sort_by(|a, b| a.month().cmp(b.month()));
    result
}
