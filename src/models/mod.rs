pub mod completed_trade;
pub mod holding;
pub mod lot;
pub mod quote;
pub mod summary;
pub mod transaction;

pub use completed_trade::{CompletedTrade, TradeLeg};
pub use holding::{Holding, HoldingBasis};
pub use lot::Lot;
pub use quote::{Candle, PriceSource, Quote};
pub use summary::{MonthlyPerformance, PortfolioSummary};
pub use transaction::{Transaction, TransactionType};
