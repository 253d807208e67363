use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate, Weekday};
use derive_getters::Getters;
use derive_new::new;
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use sqlx::{Pool, Sqlite};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep, timeout};

use super::av::AlphaVantageProvider;
use super::provider::PriceProvider;
use super::yahoo::YahooProvider;
use crate::db;
use crate::engine::valuation::PriceMap;
use crate::models::{Candle, PriceSource, Quote};

const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// How far back the historical store is kept complete.
pub const HISTORY_DAYS_BACK: i64 = 365;

/// Enforces a provider's minimum spacing between calls. One gate per
/// provider; independent providers are never throttled by each other.
struct RateGate {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateGate {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

struct GatedProvider {
    provider: Arc<dyn PriceProvider>,
    gate: RateGate,
}

/// Outcome of one symbol's historical refresh.
#[derive(Clone, Debug, Getters, new, PartialEq)]
pub struct HistoryRefresh {
    symbol: String,
    records_inserted: u64,
    api_call_made: bool,
    provider: Option<&'static str>,
}

/// Resolves prices by walking a provider chain in priority order:
/// live providers first, then the last stored quote. A provider only
/// succeeds with a strictly positive price; anything else falls through
/// to the next tier and is never fatal for the batch. The terminal
/// average-cost approximation is applied by the valuator, where the
/// holding's cost basis lives.
pub struct PriceResolver {
    providers: Vec<GatedProvider>,
    pool: Pool<Sqlite>,
    call_timeout: Duration,
}

impl PriceResolver {
    pub fn new(pool: Pool<Sqlite>, providers: Vec<Arc<dyn PriceProvider>>) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| GatedProvider {
                gate: RateGate::new(provider.min_interval()),
                provider,
            })
            .collect();

        Self {
            providers,
            pool,
            call_timeout: CALL_TIMEOUT,
        }
    }

    /// Yahoo first, Alpha Vantage second when a key is configured.
    pub fn with_default_providers(pool: Pool<Sqlite>) -> Result<Self> {
        let client = Client::builder().timeout(CALL_TIMEOUT).build()?;

        let mut providers: Vec<Arc<dyn PriceProvider>> =
            vec![Arc::new(YahooProvider::new(client.clone()))];

        match std::env::var("ALPHA_VANTAGE_API_KEY") {
            Ok(api_key) => {
                providers.push(Arc::new(AlphaVantageProvider::new(client, api_key)));
            }
            Err(_) => warn!("ALPHA_VANTAGE_API_KEY not set, secondary quote provider disabled"),
        }

        Ok(Self::new(pool, providers))
    }

    /// Current price for one symbol, or `None` when every tier fails.
    pub async fn resolve_quote(&self, symbol: &str) -> Option<Quote> {
        if let Some(quote) = self.live_quote(symbol).await {
            return Some(quote);
        }

        match db::read::latest_stored_quote(&self.pool, symbol).await {
            Ok(Some(quote)) => {
                debug!("Using stored quote for {} from {}", symbol, quote.as_of());
                Some(quote)
            }
            Ok(None) => None,
            Err(err) => {
                warn!("Stored quote lookup failed for {}: {:#}", symbol, err);
                None
            }
        }
    }

    /// Resolves a batch. Symbols are probed sequentially so one batch
    /// cannot exceed a provider's burst limit.
    pub async fn resolve_many(&self, symbols: &[String]) -> PriceMap {
        let mut prices = PriceMap::new();
        for symbol in symbols {
            if let Some(quote) = self.resolve_quote(symbol).await {
                prices.insert(symbol.clone(), quote);
            }
        }
        prices
    }

    async fn live_quote(&self, symbol: &str) -> Option<Quote> {
        for gated in &self.providers {
            gated.gate.wait().await;
            match timeout(self.call_timeout, gated.provider.current_quote(symbol)).await {
                Ok(Ok(quote)) if quote.price() > &Decimal::ZERO => {
                    debug!(
                        "{} resolved {} at {}",
                        gated.provider.id(),
                        symbol,
                        quote.price()
                    );
                    return Some(quote);
                }
                Ok(Ok(quote)) => warn!(
                    "{} returned non-positive price {} for {}, trying next provider",
                    gated.provider.id(),
                    quote.price(),
                    symbol
                ),
                Ok(Err(err)) => warn!(
                    "{} failed for {}: {:#}, trying next provider",
                    gated.provider.id(),
                    symbol,
                    err
                ),
                Err(_) => warn!(
                    "{} timed out for {}, trying next provider",
                    gated.provider.id(),
                    symbol
                ),
            }
        }
        None
    }

    /// Tops up the stored daily history for a symbol. When every
    /// business day in the window is already present no external call
    /// is made at all; otherwise the provider chain is walked and only
    /// the missing dates are inserted.
    pub async fn ensure_history(&self, symbol: &str) -> Result<HistoryRefresh> {
        let end = Local::now().date_naive();
        let start = end - chrono::Duration::days(HISTORY_DAYS_BACK);

        let missing = self.missing_dates(symbol, start, end).await?;
        if missing.is_empty() {
            debug!("History for {} already complete, skipping fetch", symbol);
            return Ok(HistoryRefresh::new(symbol.to_string(), 0, false, None));
        }

        for gated in &self.providers {
            gated.gate.wait().await;
            let candles =
                match timeout(self.call_timeout, gated.provider.daily_history(symbol, start)).await
                {
                    Ok(Ok(candles)) if !candles.is_empty() => candles,
                    Ok(Ok(_)) => {
                        warn!("{} returned empty history for {}", gated.provider.id(), symbol);
                        continue;
                    }
                    Ok(Err(err)) => {
                        warn!(
                            "{} history failed for {}: {:#}",
                            gated.provider.id(),
                            symbol,
                            err
                        );
                        continue;
                    }
                    Err(_) => {
                        warn!("{} history timed out for {}", gated.provider.id(), symbol);
                        continue;
                    }
                };

            let to_insert: Vec<Candle> = candles
                .into_iter()
                .filter(|candle| missing.contains(candle.date()))
                .collect();
            let source = PriceSource::parse_str(gated.provider.id())?;
            let inserted = db::write::upsert_candles(&self.pool, symbol, &to_insert, source).await?;

            return Ok(HistoryRefresh::new(
                symbol.to_string(),
                inserted,
                true,
                Some(gated.provider.id()),
            ));
        }

        warn!("All providers failed to deliver history for {}", symbol);
        Ok(HistoryRefresh::new(symbol.to_string(), 0, true, None))
    }

    /// Stored candles for the window, date-sorted ascending.
    pub async fn history(&self, symbol: &str, start: NaiveDate) -> Result<Vec<Candle>> {
        db::read::stored_candles(&self.pool, symbol, start).await
    }

    /// Business days in the window with no stored quote. Weekends are
    /// skipped; exchange holidays will always look missing, which only
    /// costs an occasional redundant fetch.
    async fn missing_dates(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashSet<NaiveDate>> {
        let existing = db::read::stored_quote_dates(&self.pool, symbol, start, end).await?;

        let mut missing = HashSet::new();
        let mut day = start;
        while day <= end {
            let weekday = day.weekday();
            if weekday != Weekday::Sat && weekday != Weekday::Sun && !existing.contains(&day) {
                missing.insert(day);
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        Ok(missing)
    }
}
