use std::collections::BTreeMap;

use chrono::NaiveDate;
use derive_getters::Getters;
use log::warn;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::classify::notes_price;
use crate::engine::lots::{EPSILON, LotBook};
use crate::models::{CompletedTrade, HoldingBasis, TradeLeg, Transaction, TransactionType};

/// Unit price assumed when a position row carries no quantity and no
/// parseable notes price. The share count derived from it is a rough
/// estimate and the resulting lots are flagged as such.
pub const DEFAULT_ASSUMED_UNIT_PRICE: Decimal = dec!(100);

/// Everything a full chronological replay of one account's ledger
/// produces: open holdings with FIFO cost bases, completed round trips,
/// account-level cash accumulators, and audit flags for anything the
/// replay had to work around.
#[derive(Clone, Debug, Default, Getters)]
pub struct ReplayOutcome {
    holdings: Vec<HoldingBasis>,
    completed_trades: Vec<CompletedTrade>,
    realized_gain_loss: Decimal,
    total_deposits: Decimal,
    total_fees: Decimal,
    total_taxes: Decimal,
    total_dividends: Decimal,
    anomalies: Vec<String>,
}

/// Per-symbol state while the ledger is being replayed. Reset whenever
/// the position closes, so a later re-entry starts a fresh trail.
struct PositionReplay {
    book: LotBook,
    legs: Vec<TradeLeg>,
    buy_cost: Decimal,
    sell_proceeds: Decimal,
    realized: Decimal,
    first_buy_date: Option<NaiveDate>,
}

impl PositionReplay {
    fn new(symbol: &str) -> Self {
        Self {
            book: LotBook::new(symbol),
            legs: Vec::new(),
            buy_cost: Decimal::ZERO,
            sell_proceeds: Decimal::ZERO,
            realized: Decimal::ZERO,
            first_buy_date: None,
        }
    }

    fn reset(&mut self) {
        self.book.clear();
        self.legs.clear();
        self.buy_cost = Decimal::ZERO;
        self.sell_proceeds = Decimal::ZERO;
        self.realized = Decimal::ZERO;
        self.first_buy_date = None;
    }
}

/// Replays classified transactions in chronological order. Lot order
/// correctness depends on strict per-symbol sequencing, so this is a
/// single pass; distinct symbols share no state beyond the cash
/// accumulators.
pub fn replay(transactions: &[Transaction]) -> ReplayOutcome {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| a.date().cmp(b.date()).then(a.id().cmp(b.id())));

    let mut positions: BTreeMap<String, PositionReplay> = BTreeMap::new();
    let mut outcome = ReplayOutcome::default();

    for transaction in &sorted {
        match transaction.transaction_type() {
            TransactionType::Buy => process_buy(&mut positions, &mut outcome, transaction),
            TransactionType::Sell => process_sell(&mut positions, &mut outcome, transaction),
            TransactionType::Deposit => outcome.total_deposits += transaction.amount().abs(),
            TransactionType::Dividend => outcome.total_dividends += *transaction.amount(),
            TransactionType::Fee => outcome.total_fees += transaction.amount().abs(),
            TransactionType::TaxCharge => outcome.total_taxes += transaction.amount().abs(),
            TransactionType::TaxCredit => outcome.total_taxes -= transaction.amount().abs(),
        }
    }

    for position in positions.values() {
        let quantity = position.book.quantity();
        if quantity <= EPSILON {
            continue;
        }
        outcome.holdings.push(HoldingBasis::new(
            position.book.symbol().to_string(),
            quantity,
            position.book.average_cost(),
            position.book.cost_basis(),
            position.first_buy_date.unwrap_or_default(),
            position.book.has_estimated_lots(),
        ));
    }

    outcome
}

fn process_buy(
    positions: &mut BTreeMap<String, PositionReplay>,
    outcome: &mut ReplayOutcome,
    transaction: &Transaction,
) {
    let Some(symbol) = transaction.symbol() else {
        outcome
            .anomalies
            .push(format!("Buy without symbol (row {})", transaction.id()));
        return;
    };

    let (quantity, estimated) = resolve_quantity(transaction, outcome);
    if quantity <= Decimal::ZERO {
        outcome.anomalies.push(format!(
            "Buy of {} with non-positive quantity (row {})",
            symbol,
            transaction.id()
        ));
        return;
    }

    let cost = transaction.amount().abs();
    let unit_cost = cost / quantity;

    let position = positions
        .entry(symbol.clone())
        .or_insert_with(|| PositionReplay::new(symbol));

    position
        .book
        .buy(quantity, unit_cost, *transaction.date(), estimated);
    position.buy_cost += cost;
    if position.first_buy_date.is_none() {
        position.first_buy_date = Some(*transaction.date());
    }

    let leg_price = transaction
        .notes()
        .as_deref()
        .and_then(notes_price)
        .unwrap_or(unit_cost);
    position.legs.push(TradeLeg::new(
        TransactionType::Buy,
        *transaction.date(),
        quantity,
        Some(leg_price),
        cost,
        None,
    ));
}

fn process_sell(
    positions: &mut BTreeMap<String, PositionReplay>,
    outcome: &mut ReplayOutcome,
    transaction: &Transaction,
) {
    let Some(symbol) = transaction.symbol() else {
        outcome
            .anomalies
            .push(format!("Sell without symbol (row {})", transaction.id()));
        return;
    };

    let Some(position) = positions.get_mut(symbol) else {
        warn!("Sell of {} without any prior buy, skipping", symbol);
        outcome
            .anomalies
            .push(format!("Sell of {} without prior Buy", symbol));
        return;
    };
    if position.book.is_empty() {
        warn!("Sell of {} against an empty lot book, skipping", symbol);
        outcome
            .anomalies
            .push(format!("Sell of {} without prior Buy", symbol));
        return;
    }

    let (quantity, _estimated) = resolve_quantity(transaction, outcome);
    if quantity <= Decimal::ZERO {
        outcome.anomalies.push(format!(
            "Sell of {} with non-positive quantity (row {})",
            symbol,
            transaction.id()
        ));
        return;
    }

    let proceeds = transaction.amount().abs();
    let sell = position.book.sell(quantity);

    if sell.oversold_by() > &Decimal::ZERO {
        warn!(
            "Oversold {}: sell of {} exceeded tracked shares by {}, clamped to zero",
            symbol,
            quantity,
            sell.oversold_by()
        );
        outcome.anomalies.push(format!(
            "Oversold {} by {} shares (row {})",
            symbol,
            sell.oversold_by(),
            transaction.id()
        ));
    }

    let profit_loss = proceeds - sell.cost_basis_sold();
    position.realized += profit_loss;
    position.sell_proceeds += proceeds;

    let leg_price = transaction
        .notes()
        .as_deref()
        .and_then(notes_price)
        .unwrap_or_else(|| proceeds / quantity);
    position.legs.push(TradeLeg::new(
        TransactionType::Sell,
        *transaction.date(),
        quantity,
        Some(leg_price),
        proceeds,
        Some(profit_loss),
    ));

    if position.book.is_closed() {
        let trade = CompletedTrade::new(
            symbol.clone(),
            position.buy_cost,
            position.sell_proceeds,
            position.realized,
            position.first_buy_date.unwrap_or(*transaction.date()),
            *transaction.date(),
            std::mem::take(&mut position.legs),
        );
        outcome.realized_gain_loss += *trade.profit_loss();
        outcome.completed_trades.push(trade);
        position.reset();
    }
}

/// Share count for a position row. The quantity field is authoritative;
/// when it is missing the count is estimated from the amount and either
/// the notes price or a documented fallback, and flagged so downstream
/// consumers can surface the reduced confidence.
fn resolve_quantity(transaction: &Transaction, outcome: &mut ReplayOutcome) -> (Decimal, bool) {
    if let Some(quantity) = transaction.quantity() {
        if quantity > &Decimal::ZERO {
            return (quantity.abs(), false);
        }
    }

    let assumed = transaction
        .notes()
        .as_deref()
        .and_then(notes_price)
        .filter(|price| price > &Decimal::ZERO)
        .unwrap_or(DEFAULT_ASSUMED_UNIT_PRICE);
    let estimate = transaction.amount().abs() / assumed;

    warn!(
        "Row {} has no quantity; estimated {} shares from amount at assumed unit price {}",
        transaction.id(),
        estimate,
        assumed
    );
    outcome.anomalies.push(format!(
        "Estimated quantity for {} (row {})",
        transaction.symbol().as_deref().unwrap_or("?"),
        transaction.id()
    ));

    (estimate, true)
}
