mod classify;
mod replay;
mod valuation;
