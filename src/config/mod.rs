pub mod strategy_config;

pub use strategy_config::{
    validate_pct, validate_window, BenchmarkGate, ConfigError, Cutoff, RankSource, SignalMode,
    StrategyConfig, StrategyFile,
};
