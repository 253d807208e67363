use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Candle, Quote};

/// The shape every external quote source must expose. The resolver
/// depends only on this trait, so providers are swappable and tests can
/// substitute scripted ones.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn id(&self) -> &'static str;

    /// Minimum spacing between two calls against this provider. The
    /// resolver enforces it; providers just declare their limit.
    fn min_interval(&self) -> Duration;

    async fn current_quote(&self, symbol: &str) -> Result<Quote>;

    /// Daily candles from `start` to today, date-sorted ascending.
    async fn daily_history(&self, symbol: &str, start: NaiveDate) -> Result<Vec<Candle>>;
}
