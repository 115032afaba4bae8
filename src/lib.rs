//a Rust-based cross-sectional momentum signal pipeline for currency and equity-index strategies

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod instrument;
pub mod metrics;
pub mod schedule;
pub mod signal;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        BenchmarkGate, ConfigError, Cutoff, RankSource, SignalMode, StrategyConfig, StrategyFile,
    };
    pub use crate::data::{
        load_prices_csv, write_table_csv, PositionTable, PriceTable, ReturnSeries, SignalTable,
        TableError, TimeTable, WeightTable,
    };
    pub use crate::engine::{
        gross_returns, positions_from_weights, run_many, run_strategy, signals_from_prices,
        weights_from_signals, StrategyRun, WeightScheme,
    };
    pub use crate::error::FlowError;
    pub use crate::instrument::{SecuritiesMaster, Universe};
    pub use crate::metrics::{calculate_equity_curve, EquityPoint, SummaryMetrics};
    pub use crate::schedule::{schedule, RebalanceRule};
    pub use crate::signal::{compute_return, generate_signals, rank_and_signal, TieBreak};
}
