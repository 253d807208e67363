use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use csv::Reader;
use derive_getters::Getters;
use derive_new::new;
use log::{info, warn};
use rust_decimal::Decimal;
use sqlx::{Pool, Sqlite};

use crate::api::{HistoryRefresh, PriceResolver};
use crate::db;
use crate::engine::classify::{Classifier, LedgerRow};
use crate::engine::replay::{ReplayOutcome, replay};
use crate::engine::valuation::{enrich_holdings, monthly_performance, summarize};
use crate::models::{
    CompletedTrade, Holding, HoldingBasis, MonthlyPerformance, PortfolioSummary, Transaction,
};

const RECENT_TRANSACTIONS_LIMIT: i64 = 10;

/// One screenful of portfolio state, assembled in a single pass so all
/// of its parts reflect the same ledger snapshot.
#[derive(Clone, Debug, Getters, new)]
pub struct DashboardData {
    holdings: Vec<Holding>,
    summary: PortfolioSummary,
    completed_trades: Vec<CompletedTrade>,
    monthly: Vec<MonthlyPerformance>,
    recent_transactions: Vec<Transaction>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Getters, new, PartialEq)]
pub struct RebuildReport {
    holdings_migrated: u64,
    total_holdings: usize,
}

#[derive(Clone, Debug, Getters, new, PartialEq)]
pub struct ImportReport {
    imported: u64,
    skipped: u64,
}

/// Ties the ledger store, the replay engine and the price resolver
/// together. The ledger is the single source of truth throughout; the
/// holdings table is only ever treated as a disposable cache of it.
pub struct PortfolioService {
    pool: Pool<Sqlite>,
    resolver: PriceResolver,
}

impl PortfolioService {
    pub fn new(pool: Pool<Sqlite>, resolver: PriceResolver) -> Self {
        Self { pool, resolver }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Full reconstruction from the ledger. Every read path funnels
    /// through here so cached and derived holdings can never disagree
    /// about the derivation itself.
    pub async fn derive(&self, account: &str) -> Result<ReplayOutcome> {
        let account = validate_account(account)?;
        let transactions = db::read::fetch_transactions(&self.pool, account).await?;
        Ok(replay(&transactions))
    }

    /// Holdings bases for an account: the cached projection when one
    /// exists, otherwise derived from the ledger on the spot.
    pub async fn holdings(&self, account: &str) -> Result<Vec<HoldingBasis>> {
        let account = validate_account(account)?;
        let cached = db::read::fetch_cached_holdings(&self.pool, account).await?;
        if !cached.is_empty() {
            return Ok(cached);
        }
        Ok(self.derive(account).await?.holdings().clone())
    }

    /// Discards the cached holdings and rewrites them from a fresh
    /// replay. Running it twice in a row changes nothing.
    pub async fn rebuild(&self, account: &str) -> Result<RebuildReport> {
        let account = validate_account(account)?;
        let outcome = self.derive(account).await?;

        for anomaly in outcome.anomalies() {
            warn!("Replay anomaly for '{}': {}", account, anomaly);
        }

        let migrated = db::write::replace_holdings(&self.pool, account, outcome.holdings()).await?;
        info!(
            "Rebuilt holdings cache for '{}': {} positions",
            account, migrated
        );

        Ok(RebuildReport::new(migrated, outcome.holdings().len()))
    }

    /// Everything the summary view needs: valued holdings, the account
    /// summary, completed round trips, monthly aggregates and the most
    /// recent ledger rows.
    pub async fn dashboard(&self, account: &str) -> Result<DashboardData> {
        let account = validate_account(account)?;
        let transactions = db::read::fetch_transactions(&self.pool, account).await?;
        let outcome = replay(&transactions);

        let symbols: Vec<String> = outcome
            .holdings()
            .iter()
            .map(|basis| basis.symbol().clone())
            .collect();
        let prices = self.resolver.resolve_many(&symbols).await;

        let holdings = enrich_holdings(outcome.holdings(), &prices);
        let summary = summarize(&outcome, &holdings);
        let monthly = monthly_performance(&transactions);
        let recent =
            db::read::fetch_recent_transactions(&self.pool, account, RECENT_TRANSACTIONS_LIMIT)
                .await?;

        Ok(DashboardData::new(
            holdings,
            summary,
            outcome.completed_trades().clone(),
            monthly,
            recent,
            outcome.anomalies().clone(),
        ))
    }

    /// Tops up the stored daily history for every open holding. One
    /// symbol failing leaves the rest of the batch untouched.
    pub async fn update_prices(&self, account: &str) -> Result<Vec<HistoryRefresh>> {
        let account = validate_account(account)?;
        let bases = self.holdings(account).await?;

        let mut refreshes = Vec::with_capacity(bases.len());
        for basis in &bases {
            match self.resolver.ensure_history(basis.symbol()).await {
                Ok(refresh) => refreshes.push(refresh),
                Err(err) => warn!(
                    "History refresh failed for '{}': {:#}",
                    basis.symbol(),
                    err
                ),
            }
        }
        Ok(refreshes)
    }

    /// Imports raw ledger rows from a CSV file with columns
    /// date,type,label,quantity,amount,notes. Rows the classifier cannot
    /// place are logged and skipped rather than aborting the import.
    pub async fn import_csv(&self, account: &str, path: &str) -> Result<ImportReport> {
        let account = validate_account(account)?;
        let mut reader = Reader::from_path(path)
            .with_context(|| format!("Failed to open CSV file at path: {}", path))?;
        let classifier = Classifier::new();

        let mut imported = 0u64;
        let mut skipped = 0u64;

        for (row_idx, record) in reader.records().enumerate() {
            let rec = record
                .with_context(|| format!("Failed to read CSV record at row {}", row_idx + 1))?;

            if rec.len() < 5 {
                bail!(
                    "Invalid CSV format at row {}: expected at least 5 columns, found {}",
                    row_idx + 1,
                    rec.len()
                );
            }

            let date = NaiveDate::parse_from_str(&rec[0], "%Y-%m-%d").with_context(|| {
                format!("Failed to parse date '{}' at row {}", &rec[0], row_idx + 1)
            })?;

            let type_tag = match rec[1].trim() {
                "" => None,
                tag => Some(tag.to_string()),
            };

            let quantity = match rec[3].trim() {
                "" => None,
                raw => Some(raw.parse::<Decimal>().with_context(|| {
                    format!("Failed to parse quantity '{}' at row {}", raw, row_idx + 1)
                })?),
            };

            let amount = rec[4].parse::<Decimal>().with_context(|| {
                format!("Failed to parse amount '{}' at row {}", &rec[4], row_idx + 1)
            })?;

            let notes = rec.get(5).map(str::trim).filter(|n| !n.is_empty());

            let row = LedgerRow::new(
                date,
                type_tag,
                rec[2].to_string(),
                quantity,
                amount,
                notes.map(str::to_string),
            );

            // The id on the classified value is provisional; the store
            // assigns the real one on insert.
            let transaction = match classifier.classify(account, 0, &row) {
                Ok(transaction) => transaction,
                Err(err) => {
                    warn!("Skipping unclassifiable row {}: {:#}", row_idx + 1, err);
                    skipped += 1;
                    continue;
                }
            };

            db::write::insert_transaction(&self.pool, &transaction).await?;
            imported += 1;
        }

        info!(
            "Imported {} transactions for '{}' ({} skipped)",
            imported, account, skipped
        );
        Ok(ImportReport::new(imported, skipped))
    }
}

/// Account scope is required on every operation; an empty scope would
/// silently mix ledgers.
fn validate_account(account: &str) -> Result<&str> {
    let trimmed = account.trim();
    if trimmed.is_empty() {
        bail!("Account must not be empty");
    }
    Ok(trimmed)
}
