use crate::engine::allocation::WeightScheme;
use crate::instrument::{Universe, CURRENCY_PAIRS, FLOW_INDICES, SNP500, WORLD_INDICES};
use crate::schedule::RebalanceRule;
use crate::signal::rank::TieBreak;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

//caller contract violations, raised before any table is computed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    InvalidWindow { field: String },
    #[error("{field} must be in (0, 1], got {value}")]
    InvalidCutoff { field: String, value: f64 },
    #[error("{field} must select at least one instrument")]
    InvalidCount { field: String },
    #[error("Unknown rebalance rule: {0}")]
    UnknownRebalanceRule(String),
    #[error("Benchmark gate needs a benchmark identifier")]
    MissingBenchmark,
    #[error("Strategy code must not be empty")]
    MissingCode,
}

//checks a percentile cutoff lies in (0, 1]
pub fn validate_pct(field: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidCutoff {
            field: field.to_string(),
            value,
        })
    }
}

//checks a lookback window is positive
pub fn validate_window(field: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidWindow {
            field: field.to_string(),
        });
    }
    Ok(())
}

//how many instruments land in each bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cutoff {
    //fraction of the ranked population, compared against rank / count
    Percentile { top: f64, bottom: f64 },
    //fixed number of names per side, compared against the ordinal rank
    Count { top: usize, bottom: usize },
}

impl Cutoff {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Cutoff::Percentile { top, bottom } => {
                validate_pct("top_pct", top)?;
                validate_pct("bottom_pct", bottom)
            }
            Cutoff::Count { top, bottom } => {
                if top == 0 {
                    return Err(ConfigError::InvalidCount {
                        field: "top".to_string(),
                    });
                }
                if bottom == 0 {
                    return Err(ConfigError::InvalidCount {
                        field: "bottom".to_string(),
                    });
                }
                Ok(())
            }
        }
    }
}

//how the long and short buckets become a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMode {
    //long the winners, short the losers
    LongShort,
    //long the winners only
    LongOnly,
    //short the losers only
    ShortOnly,
    //long the losers
    Reversal,
}

//which return series is ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankSource {
    //cash/fx instruments ranked on their own returns
    Currency,
    //universe indices other than the benchmark ranked on their own returns
    Index,
    //each currency pair ranked by the return of its linked equity index
    LinkedIndex,
}

//zeroes every signal while the benchmark trend is zero or negative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkGate {
    pub benchmark: String,
    pub window_days: usize,
    #[serde(default)]
    pub delay_days: usize,
}

//one configured instance of the momentum pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub code: String,

    //instrument tables
    pub universe: Universe,

    //return lookback and reporting delay
    pub alpha_days: usize,
    #[serde(default)]
    pub alpha_delay_days: usize,

    //ranking
    pub cutoff: Cutoff,
    pub mode: SignalMode,
    pub rank_source: RankSource,
    #[serde(default)]
    pub tie_break: TieBreak,

    //gates
    #[serde(default)]
    pub require_positive_return: bool,
    #[serde(default)]
    pub benchmark_gate: Option<BenchmarkGate>,

    //scheduling and allocation
    pub rebalance: String,
    #[serde(default = "default_execution_delay")]
    pub execution_delay: usize,
    #[serde(default)]
    pub weight_scheme: WeightScheme,
}

fn default_execution_delay() -> usize {
    1
}

impl StrategyConfig {
    //fails fast on the first invalid setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.code.trim().is_empty() {
            return Err(ConfigError::MissingCode);
        }
        validate_window("alpha_days", self.alpha_days)?;
        self.cutoff.validate()?;
        self.rebalance_rule()?;

        if let Some(gate) = &self.benchmark_gate {
            if gate.benchmark.trim().is_empty() {
                return Err(ConfigError::MissingBenchmark);
            }
            validate_window("benchmark_gate.window_days", gate.window_days)?;
        }

        Ok(())
    }

    //parsed rebalance rule
    pub fn rebalance_rule(&self) -> Result<RebalanceRule, ConfigError> {
        self.rebalance.parse()
    }

    //ranks fx pairs on their own 5-day return and goes long the bottom quartile
    pub fn currency_momentum() -> Self {
        StrategyConfig {
            code: "currency_momentum".to_string(),
            universe: Universe::from_pairs(CURRENCY_PAIRS, &[]),
            alpha_days: 5,
            alpha_delay_days: 0,
            cutoff: Cutoff::Percentile {
                top: 0.25,
                bottom: 0.25,
            },
            mode: SignalMode::Reversal,
            rank_source: RankSource::Currency,
            tie_break: TieBreak::Average,
            require_positive_return: false,
            benchmark_gate: None,
            rebalance: "W".to_string(),
            execution_delay: 1,
            weight_scheme: WeightScheme::EqualPerSide,
        }
    }

    //ranks fx pairs by their national index's 10-day return, long the top quartile
    //while the pair itself is rising and the s&p 500 trend is positive
    pub fn currency_flow() -> Self {
        StrategyConfig {
            code: "trading_currency_flow".to_string(),
            universe: Universe::from_pairs(CURRENCY_PAIRS, FLOW_INDICES),
            alpha_days: 10,
            alpha_delay_days: 0,
            cutoff: Cutoff::Percentile {
                top: 0.25,
                bottom: 0.25,
            },
            mode: SignalMode::LongOnly,
            rank_source: RankSource::LinkedIndex,
            tie_break: TieBreak::Average,
            require_positive_return: true,
            benchmark_gate: Some(BenchmarkGate {
                benchmark: SNP500.to_string(),
                window_days: 20,
                delay_days: 10,
            }),
            rebalance: "W".to_string(),
            execution_delay: 1,
            weight_scheme: WeightScheme::EqualPerSide,
        }
    }

    //holds the three national indices with the best 252-day return, rebalanced daily
    pub fn index_top_n() -> Self {
        StrategyConfig {
            code: "index_top_n".to_string(),
            universe: Universe::from_pairs(CURRENCY_PAIRS, WORLD_INDICES),
            alpha_days: 252,
            alpha_delay_days: 0,
            cutoff: Cutoff::Count { top: 3, bottom: 3 },
            mode: SignalMode::LongOnly,
            rank_source: RankSource::Index,
            tie_break: TieBreak::First,
            require_positive_return: false,
            benchmark_gate: None,
            rebalance: "D".to_string(),
            execution_delay: 1,
            weight_scheme: WeightScheme::EqualPerSide,
        }
    }

    //load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: StrategyConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

//a set of strategies evaluated over the same price table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyFile {
    //ids the securities master reports as cash; empty keeps every universe pair
    #[serde(default)]
    pub cash_ids: BTreeSet<String>,
    pub strategies: Vec<StrategyConfig>,
}

impl Default for StrategyFile {
    fn default() -> Self {
        StrategyFile {
            cash_ids: BTreeSet::new(),
            strategies: vec![
                StrategyConfig::currency_momentum(),
                StrategyConfig::currency_flow(),
                StrategyConfig::index_top_n(),
            ],
        }
    }
}

impl StrategyFile {
    //load and validate every strategy in a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        info!("Loading strategies from {}", path.display());

        let contents = std::fs::read_to_string(path)?;
        let file: StrategyFile = serde_json::from_str(&contents)?;
        for strategy in &file.strategies {
            strategy.validate()?;
        }
        Ok(file)
    }

    //save strategies to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    //strategies with their universes filtered against the known cash instruments
    pub fn resolved_strategies(&self) -> Vec<StrategyConfig> {
        self.strategies
            .iter()
            .map(|strategy| {
                let mut strategy = strategy.clone();
                if !self.cash_ids.is_empty() {
                    //only linked-index ranking needs an index to map onto a currency
                    strategy.universe = match strategy.rank_source {
                        RankSource::LinkedIndex => strategy.universe.filtered(&self.cash_ids),
                        RankSource::Currency | RankSource::Index => {
                            strategy.universe.with_known_cash(&self.cash_ids)
                        }
                    };
                }
                strategy
            })
            .collect()
    }
}
