use crate::config::{ConfigError, RankSource, StrategyConfig};
use crate::data::{PriceTable, ReturnSeries, SignalTable};
use crate::instrument::SecuritiesMaster;
use crate::signal::builder::{bucket, compose, gate_by_benchmark, gate_positive};
use crate::signal::returns::compute_return;
use std::collections::HashMap;
use tracing::{debug, warn};

//returns of the ranked population, keyed by the ids that will carry the signal
fn ranked_returns(
    prices: &PriceTable,
    config: &StrategyConfig,
    master: &dyn SecuritiesMaster,
) -> Result<ReturnSeries, ConfigError> {
    let window = config.alpha_days;
    let delay = config.alpha_delay_days;
    let benchmark = config.benchmark_gate.as_ref().map(|gate| gate.benchmark.as_str());

    match config.rank_source {
        RankSource::Currency => {
            let cash: Vec<&str> = prices.ids().filter(|id| master.is_cash(id)).collect();
            compute_return(window, delay, &prices.select(cash))
        }
        RankSource::Index => {
            let indices: Vec<&str> = config
                .universe
                .index_ids()
                .filter(|id| !master.is_cash(id) && Some(*id) != benchmark)
                .collect();
            compute_return(window, delay, &prices.select(indices))
        }
        RankSource::LinkedIndex => {
            let mut index_to_fx: HashMap<String, String> = HashMap::new();
            for fx in prices.ids().filter(|id| master.is_cash(id)) {
                match master.linked_index(fx) {
                    Some(index) if prices.contains(index) => {
                        index_to_fx.insert(index.to_string(), fx.to_string());
                    }
                    Some(index) => {
                        warn!("Index {} linked to {} is not in the price table", index, fx);
                    }
                    None => {}
                }
            }

            let indices = prices.select(index_to_fx.keys().map(String::as_str));
            let returns = compute_return(window, delay, &indices)?;

            //keep a stable column order: the currency order of the price table
            let renamed = returns.rename(&index_to_fx);
            let order: Vec<&str> = prices
                .ids()
                .filter(|id| renamed.contains(id))
                .collect();
            Ok(renamed.select(order))
        }
    }
}

//runs one strategy configuration from prices to an unscheduled signal table
pub fn generate_signals(
    prices: &PriceTable,
    config: &StrategyConfig,
    master: &dyn SecuritiesMaster,
) -> Result<SignalTable, ConfigError> {
    config.validate()?;

    let returns = ranked_returns(prices, config, master)?;
    debug!(
        "{}: ranking {} instruments over {} rows",
        config.code,
        returns.width(),
        returns.len()
    );

    let buckets = bucket(&returns, config.cutoff, config.tie_break)?;
    let mut signals = compose(&buckets, config.mode);

    //the signal ids' own returns must also be rising
    if config.require_positive_return {
        let own = prices.select(signals.ids());
        let own_returns = compute_return(config.alpha_days, config.alpha_delay_days, &own)?;
        signals = gate_positive(&signals, &own_returns);
    }

    if let Some(gate) = &config.benchmark_gate {
        let benchmark = prices.select([gate.benchmark.as_str()]);
        let trend = compute_return(gate.window_days, gate.delay_days, &benchmark)?;
        signals = gate_by_benchmark(&signals, &trend, &gate.benchmark);
    }

    Ok(signals)
}
