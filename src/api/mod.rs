pub mod av;
pub mod av_dto;
pub mod provider;
pub mod resolver;
pub mod utils;
pub mod yahoo;
pub mod yahoo_dto;

pub use provider::PriceProvider;
pub use resolver::{HistoryRefresh, PriceResolver};
