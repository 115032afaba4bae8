use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//a point in the equity curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub drawdown: f64,
    pub returns: f64,
}

impl EquityPoint {
    pub fn new(timestamp: DateTime<Utc>, equity: f64, drawdown: f64, returns: f64) -> Self {
        EquityPoint {
            timestamp,
            equity,
            drawdown,
            returns,
        }
    }
}

//compounds per-period portfolio returns into an equity curve with drawdowns
pub fn calculate_equity_curve(
    timestamps: &[DateTime<Utc>],
    returns: &[f64],
    initial_balance: f64,
) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(timestamps.len());
    let mut peak = initial_balance;
    let mut equity = initial_balance;

    for (&timestamp, &ret) in timestamps.iter().zip(returns.iter()) {
        equity *= 1.0 + ret;

        //update peak
        if equity > peak {
            peak = equity;
        }

        let drawdown = if peak > 0.0 {
            (peak - equity) / peak
        } else {
            0.0
        };

        curve.push(EquityPoint::new(timestamp, equity, drawdown, ret));
    }

    curve
}

//calculates maximum drawdown from equity curve
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    equity_curve
        .iter()
        .map(|point| point.drawdown)
        .fold(0.0, f64::max)
}
