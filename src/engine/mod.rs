pub mod classify;
pub mod lots;
pub mod replay;
pub mod valuation;

pub use classify::{Classifier, LedgerRow};
pub use lots::{EPSILON, LotBook};
pub use replay::{ReplayOutcome, replay};
