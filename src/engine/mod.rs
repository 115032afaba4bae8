pub mod allocation;
pub mod pipeline;

pub use allocation::{weights_from_signals, WeightScheme};
pub use pipeline::{
    gross_returns, positions_from_weights, run_many, run_strategy, run_strategy_with,
    signals_from_prices, StrategyRun, INITIAL_BALANCE,
};
