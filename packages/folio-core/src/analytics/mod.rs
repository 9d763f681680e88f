//! Portfolio analytics.
//!
//! Risk statistics derived from reconstructed value series and the ledger:
//! Sortino ratio, beta vs. a benchmark, net exposure, sector concentration.
//! Every function here is a pure function of its inputs.

mod stats;

pub use stats::{beta, net_exposure, sector_shares, sortino};
