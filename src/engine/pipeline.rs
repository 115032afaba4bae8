use crate::config::StrategyConfig;
use crate::data::{PositionTable, PriceTable, ReturnSeries, SignalTable, WeightTable};
use crate::engine::allocation::weights_from_signals;
use crate::error::Result;
use crate::instrument::SecuritiesMaster;
use crate::metrics::SummaryMetrics;
use crate::schedule::schedule;
use crate::signal::generate_signals;
use rayon::prelude::*;
use tracing::{debug, info};

//starting balance the summary compounds from
pub const INITIAL_BALANCE: f64 = 1.0;

//every table produced by one strategy run
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub code: String,
    pub signals: SignalTable,
    pub weights: WeightTable,
    pub positions: PositionTable,
    pub returns: ReturnSeries,
    //sum of the per-instrument returns in each row
    pub portfolio_returns: Vec<f64>,
    pub summary: SummaryMetrics,
}

//signals held over each rebalance period, on the price index, not yet delayed
pub fn signals_from_prices(
    prices: &PriceTable,
    config: &StrategyConfig,
    master: &dyn SecuritiesMaster,
) -> Result<SignalTable> {
    let rule = config.rebalance_rule()?;
    let raw = generate_signals(prices, config, master)?;
    let held = schedule(&raw, rule, 0, prices.index())?;
    debug!("{}: signals held {} over {} rows", config.code, rule, held.len());
    Ok(held)
}

pub fn positions_from_weights(weights: &WeightTable, execution_delay: usize) -> PositionTable {
    weights.shift(execution_delay)
}

//per-instrument return earned by yesterday's position over today's price change
//missing prices or positions contribute nothing
pub fn gross_returns(prices: &PriceTable, positions: &PositionTable) -> ReturnSeries {
    let changes = prices.pct_change(1);
    positions
        .shift(1)
        .combine(&changes, |position, change| {
            Some(position.unwrap_or(0.0) * change.unwrap_or(0.0))
        })
}

fn portfolio_returns(returns: &ReturnSeries) -> Vec<f64> {
    (0..returns.len())
        .map(|row| returns.row(row).iter().filter_map(|(_, v)| *v).sum())
        .collect()
}

//runs one configuration end to end against its own universe
pub fn run_strategy(prices: &PriceTable, config: &StrategyConfig) -> Result<StrategyRun> {
    run_strategy_with(prices, config, &config.universe)
}

pub fn run_strategy_with(
    prices: &PriceTable,
    config: &StrategyConfig,
    master: &dyn SecuritiesMaster,
) -> Result<StrategyRun> {
    config.validate()?;

    let signals = signals_from_prices(prices, config, master)?;
    let weights = weights_from_signals(&signals, config.weight_scheme);
    let positions = positions_from_weights(&weights, config.execution_delay);
    let returns = gross_returns(prices, &positions);
    let portfolio_returns = portfolio_returns(&returns);
    let summary = SummaryMetrics::from_returns(
        returns.index(),
        &portfolio_returns,
        &positions,
        INITIAL_BALANCE,
    );

    info!(
        "{}: {} rows, {} instruments, {} rebalances",
        config.code,
        positions.len(),
        positions.width(),
        summary.num_rebalances
    );

    Ok(StrategyRun {
        code: config.code.clone(),
        signals,
        weights,
        positions,
        returns,
        portfolio_returns,
        summary,
    })
}

//runs independent configurations in parallel, results in configuration order
pub fn run_many(prices: &PriceTable, configs: &[StrategyConfig]) -> Vec<Result<StrategyRun>> {
    configs
        .par_iter()
        .map(|config| run_strategy(prices, config))
        .collect()
}
