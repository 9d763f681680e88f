//! Scalar risk statistics.

use crate::series::DailySeries;
use crate::types::{Direction, SectorShare};
use crate::{Error, Result};

/// Calculate the Sortino ratio of a return series.
///
/// # Arguments
///
/// * `returns` - Period returns (e.g. 0.01 for 1%)
/// * `target` - Downside threshold; returns strictly below it count as downside
/// * `risk_free_rate` - Per-period risk-free rate subtracted from the mean
///
/// # Returns
///
/// `(mean(returns) - risk_free_rate) / stddev(downside)`, where the
/// denominator is the population standard deviation of the downside subset.
/// Returns `f64::NAN` (the documented sentinel) when the series is empty,
/// the downside subset is empty, or the downside has zero variance.
pub fn sortino(returns: &[f64], target: f64, risk_free_rate: f64) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;

    let downside: Vec<f64> = returns.iter().filter(|&&r| r < target).copied().collect();
    if downside.is_empty() {
        return f64::NAN;
    }

    let n = downside.len() as f64;
    let downside_mean = downside.iter().sum::<f64>() / n;
    let variance = downside
        .iter()
        .map(|r| (r - downside_mean).powi(2))
        .sum::<f64>()
        / n;
    let downside_std = variance.sqrt();

    if downside_std <= 0.0 {
        return f64::NAN;
    }

    (mean - risk_free_rate) / downside_std
}

/// Calculate beta: the OLS slope of portfolio returns regressed on benchmark
/// returns, over the overlapping dates only.
///
/// Returns `f64::NAN` when fewer than two dates overlap or the benchmark
/// returns have zero variance.
pub fn beta(portfolio_returns: &DailySeries, benchmark_returns: &DailySeries) -> f64 {
    let pairs = portfolio_returns.join_inner(benchmark_returns);
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_p = pairs.iter().map(|(p, _)| p).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (p, b) in &pairs {
        covariance += (p - mean_p) * (b - mean_b);
        variance += (b - mean_b).powi(2);
    }

    if variance <= 0.0 {
        return f64::NAN;
    }

    covariance / variance
}

/// Calculate net exposure: signed notional over total balance.
///
/// # Arguments
///
/// * `legs` - Per-position (quantity x price) notional and direction
/// * `total_balance` - Total portfolio value to normalize by
///
/// # Returns
///
/// `sum(notional * sign) / total_balance`, or `f64::NAN` when the total
/// balance is not positive.
pub fn net_exposure(legs: &[(f64, Direction)], total_balance: f64) -> f64 {
    if total_balance <= 0.0 {
        return f64::NAN;
    }

    legs.iter()
        .map(|(notional, direction)| notional * direction.sign())
        .sum::<f64>()
        / total_balance
}

/// Normalize per-position sector weights into shares summing to 1.0.
///
/// Weights for the same sector merge, preserving first-seen order. A zero
/// total weight cannot be normalized and fails with
/// [`Error::DegenerateStatistic`].
pub fn sector_shares(weights: &[(String, f64)]) -> Result<Vec<SectorShare>> {
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total == 0.0 {
        return Err(Error::DegenerateStatistic(
            "total sector weight is zero".to_string(),
        ));
    }

    let mut shares: Vec<SectorShare> = Vec::new();
    for (name, weight) in weights {
        match shares.iter_mut().find(|s| &s.name == name) {
            Some(share) => share.share += weight / total,
            None => shares.push(SectorShare {
                name: name.clone(),
                share: weight / total,
            }),
        }
    }

    Ok(shares)
}
