//! Portfolio valuation engine.
//!
//! Reconstructs the portfolio's value over time in two layers:
//!
//! - **Balance reconstruction**: starting balance + cash transactions ->
//!   running cash balance per trading session
//! - **Position valuation**: per-position mark-to-market contribution
//!   overlaid on the cash balance

mod balance;
mod positions;

pub use balance::reconstruct_balance;
pub use positions::{position_contribution, value_positions};
