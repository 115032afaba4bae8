use crate::data::PositionTable;
use crate::metrics::timeseries::{calculate_equity_curve, max_drawdown};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::info;

//gross-of-cost summary of a strategy's portfolio returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub total_return_pct: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub exposure: f64,
    pub num_rebalances: usize,
    pub num_periods: usize,
}

impl SummaryMetrics {
    //calculate summary metrics from per-row portfolio returns and the positions behind them
    pub fn from_returns(
        timestamps: &[DateTime<Utc>],
        returns: &[f64],
        positions: &PositionTable,
        initial_balance: f64,
    ) -> Self {
        let equity_curve = calculate_equity_curve(timestamps, returns, initial_balance);
        let final_balance = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_balance);

        let total_return_pct = if initial_balance != 0.0 {
            (final_balance - initial_balance) / initial_balance
        } else {
            0.0
        };

        //calculate cagr
        let cagr = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(last)) if initial_balance > 0.0 => {
                let years = (last.timestamp - first.timestamp).num_days() as f64 / 365.25;
                if years > 0.0 && final_balance > 0.0 {
                    (final_balance / initial_balance).powf(1.0 / years) - 1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        SummaryMetrics {
            initial_balance,
            final_balance,
            total_return_pct,
            cagr,
            max_drawdown: max_drawdown(&equity_curve),
            sharpe_ratio: calculate_sharpe_ratio(returns),
            sortino_ratio: calculate_sortino_ratio(returns),
            exposure: calculate_exposure(positions),
            num_rebalances: count_rebalances(positions),
            num_periods: returns.len(),
        }
    }

    //logs the metrics for one strategy
    pub fn log_summary(&self, code: &str) {
        info!(
            "{}: total return {:.2}%, CAGR {:.2}%, max drawdown {:.2}%",
            code,
            self.total_return_pct * 100.0,
            self.cagr * 100.0,
            self.max_drawdown * 100.0
        );
        info!(
            "{}: sharpe {:.3}, sortino {:.3}, exposure {:.2}%, {} rebalances over {} periods",
            code,
            self.sharpe_ratio,
            self.sortino_ratio,
            self.exposure * 100.0,
            self.num_rebalances,
            self.num_periods
        );
    }
}

fn calculate_sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.mean();
    let std_dev = returns.std_dev();

    if !std_dev.is_finite() || std_dev == 0.0 {
        return 0.0;
    }

    //annualize assuming daily returns
    (mean / std_dev) * (252.0_f64).sqrt()
}

fn calculate_sortino_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.mean();

    //downside deviation over negative returns only
    let negative_returns: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();

    if negative_returns.len() < 2 {
        return 0.0;
    }

    let downside_dev = negative_returns.std_dev();

    if !downside_dev.is_finite() || downside_dev == 0.0 {
        return 0.0;
    }

    (mean / downside_dev) * (252.0_f64).sqrt()
}

//share of rows holding any non-zero position
fn calculate_exposure(positions: &PositionTable) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }

    let in_market = (0..positions.len())
        .filter(|&row| {
            positions
                .row(row)
                .iter()
                .any(|(_, v)| v.is_some_and(|p| p != 0.0))
        })
        .count();

    in_market as f64 / positions.len() as f64
}

//rows whose positions differ from the row before, starting from flat
fn count_rebalances(positions: &PositionTable) -> usize {
    let mut previous: Vec<f64> = vec![0.0; positions.width()];
    let mut count = 0;

    for row in 0..positions.len() {
        let current: Vec<f64> = positions
            .row(row)
            .iter()
            .map(|(_, v)| v.unwrap_or(0.0))
            .collect();
        if current != previous {
            count += 1;
        }
        previous = current;
    }

    count
}
