use crate::config::{validate_pct, ConfigError, Cutoff, SignalMode};
use crate::data::{RankTable, ReturnSeries, SignalTable};
use crate::signal::rank::{rank_table, TieBreak};
use tracing::warn;

//rank-based buckets need a comparison population
pub const MIN_RANKED: usize = 2;

//long and short indicator tables (1.0 in the bucket, 0.0 otherwise)
#[derive(Debug, Clone, PartialEq)]
pub struct Buckets {
    pub longs: SignalTable,
    pub shorts: SignalTable,
}

//1.0 where rank <= threshold, 0.0 elsewhere
//rows with fewer than MIN_RANKED ranked instruments and unranked cells are flat
pub fn threshold(ranks: &RankTable, limit: f64) -> SignalTable {
    let counts = ranks.row_counts();
    ranks.map_cells(|row, rank| {
        let qualifies = counts[row] >= MIN_RANKED && rank.is_some_and(|r| r <= limit);
        Some(if qualifies { 1.0 } else { 0.0 })
    })
}

//net signal from percentile rank tables: long indicator minus short indicator
pub fn build_signal(
    rank_desc: &RankTable,
    rank_asc: &RankTable,
    top_pct: f64,
    bottom_pct: f64,
) -> Result<SignalTable, ConfigError> {
    validate_pct("top_pct", top_pct)?;
    validate_pct("bottom_pct", bottom_pct)?;

    let buckets = Buckets {
        longs: threshold(rank_desc, top_pct),
        shorts: threshold(rank_asc, bottom_pct),
    };
    Ok(compose(&buckets, SignalMode::LongShort))
}

//ranks returns and splits them into long and short buckets
pub fn bucket(
    returns: &ReturnSeries,
    cutoff: Cutoff,
    tie_break: TieBreak,
) -> Result<Buckets, ConfigError> {
    cutoff.validate()?;

    let buckets = match cutoff {
        Cutoff::Percentile { top, bottom } => Buckets {
            longs: threshold(&rank_table(returns, false, tie_break, true), top),
            shorts: threshold(&rank_table(returns, true, tie_break, true), bottom),
        },
        Cutoff::Count { top, bottom } => Buckets {
            longs: threshold(&rank_table(returns, false, tie_break, false), top as f64),
            shorts: threshold(&rank_table(returns, true, tie_break, false), bottom as f64),
        },
    };

    Ok(buckets)
}

//turns buckets into a signal table according to the mode
pub fn compose(buckets: &Buckets, mode: SignalMode) -> SignalTable {
    let indicator = |v: Option<f64>| v.unwrap_or(0.0);
    match mode {
        SignalMode::LongShort => buckets
            .longs
            .combine(&buckets.shorts, |l, s| Some(indicator(l) - indicator(s))),
        SignalMode::LongOnly => buckets.longs.map_values(|l| Some(indicator(l))),
        SignalMode::ShortOnly => buckets.shorts.map_values(|s| Some(0.0 - indicator(s))),
        SignalMode::Reversal => buckets.shorts.map_values(|s| Some(indicator(s))),
    }
}

//keeps a signal only where the gate return for the same instrument is strictly positive
//instruments or rows absent from the gate are flat
pub fn gate_positive(signals: &SignalTable, gate_returns: &ReturnSeries) -> SignalTable {
    for id in signals.ids().filter(|id| !gate_returns.contains(id)) {
        warn!("No gate return for {}, signal forced flat", id);
    }

    signals.combine(gate_returns, |signal, gate| {
        signal.map(|s| if gate.is_some_and(|g| g > 0.0) { s } else { 0.0 })
    })
}

//zeroes every signal in rows where the benchmark return is zero or negative
//rows without a benchmark return yet pass through unchanged
//an unknown benchmark id flattens everything
pub fn gate_by_benchmark(
    signals: &SignalTable,
    benchmark_returns: &ReturnSeries,
    benchmark: &str,
) -> SignalTable {
    if !benchmark_returns.contains(benchmark) {
        warn!("Benchmark {} not in price table, all signals forced flat", benchmark);
        return signals.map_values(|signal| signal.map(|_| 0.0));
    }

    signals.combine_with_series(benchmark_returns, benchmark, |signal, trend| {
        signal.map(|s| if trend.is_some_and(|t| t <= 0.0) { 0.0 } else { s })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeTable;
    use crate::signal::rank::rank_and_signal;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn days(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    fn table(values: &[(&str, Vec<Option<f64>>)]) -> TimeTable {
        let len = values.first().map(|(_, v)| v.len()).unwrap_or(0);
        TimeTable::with_columns(days(len), values.iter().map(|(id, v)| (id.to_string(), v.clone())))
            .unwrap()
    }

    fn longs_in_row(signals: &SignalTable, row: usize) -> usize {
        signals
            .row(row)
            .into_iter()
            .filter(|(_, v)| *v == Some(1.0))
            .count()
    }

    #[test]
    fn test_quartile_of_four_flags_one() {
        let returns = table(&[
            ("A", vec![Some(0.4)]),
            ("B", vec![Some(0.3)]),
            ("C", vec![Some(0.2)]),
            ("D", vec![Some(0.1)]),
        ]);
        let (desc, asc) = rank_and_signal(&returns, 0.25, 0.25, TieBreak::Average).unwrap();
        let signals = build_signal(&desc, &asc, 0.25, 0.25).unwrap();

        assert_eq!(longs_in_row(&signals, 0), 1);
        assert_eq!(signals.value(0, "A"), Some(1.0));
        assert_eq!(signals.value(0, "D"), Some(-1.0));
        assert_eq!(signals.value(0, "B"), Some(0.0));
    }

    #[test]
    fn test_quartile_of_three_flags_none() {
        //1/3 > 0.25: the cutoff is compared directly, never rounded up
        let returns = table(&[
            ("A", vec![Some(0.3)]),
            ("B", vec![Some(0.2)]),
            ("C", vec![Some(0.1)]),
        ]);
        let (desc, asc) = rank_and_signal(&returns, 0.25, 0.25, TieBreak::Average).unwrap();
        let signals = build_signal(&desc, &asc, 0.25, 0.25).unwrap();

        assert_eq!(longs_in_row(&signals, 0), 0);
        assert!(signals.row(0).iter().all(|(_, v)| *v == Some(0.0)));
    }

    #[test]
    fn test_single_instrument_is_flat() {
        let returns = table(&[("A", vec![Some(0.3), Some(0.3)]), ("B", vec![None, Some(0.1)])]);
        let (desc, asc) = rank_and_signal(&returns, 1.0, 1.0, TieBreak::Average).unwrap();
        let signals = build_signal(&desc, &asc, 0.5, 0.5).unwrap();

        assert_eq!(signals.value(0, "A"), Some(0.0));
        assert_eq!(signals.value(0, "B"), Some(0.0));
        assert_eq!(signals.value(1, "A"), Some(1.0));
        assert_eq!(signals.value(1, "B"), Some(-1.0));
    }

    #[test]
    fn test_ties_share_average_rank() {
        //two equal leaders both sit at 1.5/4 = 0.375
        let returns = table(&[
            ("A", vec![Some(0.3)]),
            ("B", vec![Some(0.3)]),
            ("C", vec![Some(0.1)]),
            ("D", vec![Some(0.0)]),
        ]);
        let buckets = bucket(
            &returns,
            Cutoff::Percentile { top: 0.25, bottom: 0.25 },
            TieBreak::Average,
        )
        .unwrap();
        assert_eq!(longs_in_row(&buckets.longs, 0), 0);

        let buckets = bucket(
            &returns,
            Cutoff::Percentile { top: 0.25, bottom: 0.25 },
            TieBreak::First,
        )
        .unwrap();
        assert_eq!(buckets.longs.value(0, "A"), Some(1.0));
        assert_eq!(buckets.longs.value(0, "B"), Some(0.0));
    }

    #[test]
    fn test_count_cutoff() {
        let returns = table(&[
            ("A", vec![Some(0.5)]),
            ("B", vec![Some(0.4)]),
            ("C", vec![Some(0.3)]),
            ("D", vec![Some(0.2)]),
            ("E", vec![Some(0.1)]),
        ]);
        let buckets = bucket(&returns, Cutoff::Count { top: 2, bottom: 1 }, TieBreak::Average).unwrap();
        let signals = compose(&buckets, SignalMode::LongShort);

        assert_eq!(signals.value(0, "A"), Some(1.0));
        assert_eq!(signals.value(0, "B"), Some(1.0));
        assert_eq!(signals.value(0, "C"), Some(0.0));
        assert_eq!(signals.value(0, "E"), Some(-1.0));
    }

    #[test]
    fn test_compose_modes() {
        let buckets = Buckets {
            longs: table(&[("A", vec![Some(1.0)]), ("B", vec![Some(0.0)])]),
            shorts: table(&[("A", vec![Some(0.0)]), ("B", vec![Some(1.0)])]),
        };

        let long_only = compose(&buckets, SignalMode::LongOnly);
        assert_eq!(long_only.column("B").unwrap(), &[Some(0.0)]);

        let short_only = compose(&buckets, SignalMode::ShortOnly);
        assert_eq!(short_only.column("A").unwrap(), &[Some(0.0)]);
        assert!(short_only.value(0, "A").unwrap().is_sign_positive());
        assert_eq!(short_only.column("B").unwrap(), &[Some(-1.0)]);

        let reversal = compose(&buckets, SignalMode::Reversal);
        assert_eq!(reversal.column("A").unwrap(), &[Some(0.0)]);
        assert_eq!(reversal.column("B").unwrap(), &[Some(1.0)]);
    }

    #[test]
    fn test_gate_positive() {
        let signals = table(&[
            ("A", vec![Some(1.0), Some(1.0), Some(1.0)]),
            ("B", vec![Some(1.0), Some(1.0), Some(1.0)]),
        ]);
        let gate = table(&[("A", vec![Some(0.1), Some(0.0), None])]);
        let gated = gate_positive(&signals, &gate);

        assert_eq!(gated.column("A").unwrap(), &[Some(1.0), Some(0.0), Some(0.0)]);
        //absent from the gate operand, never a spurious signal
        assert_eq!(gated.column("B").unwrap(), &[Some(0.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_gate_by_benchmark() {
        let signals = table(&[
            ("A", vec![Some(1.0), Some(-1.0), Some(1.0), Some(1.0)]),
            ("B", vec![Some(0.0), Some(1.0), Some(1.0), Some(-1.0)]),
        ]);
        let benchmark = table(&[("SPX", vec![Some(0.02), Some(0.01), Some(-0.01), None])]);
        let gated = gate_by_benchmark(&signals, &benchmark, "SPX");

        //row 3 has no benchmark return yet and keeps its signals
        assert_eq!(gated.column("A").unwrap(), &[Some(1.0), Some(-1.0), Some(0.0), Some(1.0)]);
        assert_eq!(gated.column("B").unwrap(), &[Some(0.0), Some(1.0), Some(0.0), Some(-1.0)]);
    }

    #[test]
    fn test_benchmark_warmup_rows_pass_through() {
        let signals = table(&[("A", vec![Some(1.0), Some(1.0), Some(1.0)])]);
        let benchmark = table(&[("SPX", vec![None, None, Some(0.0)])]);
        let gated = gate_by_benchmark(&signals, &benchmark, "SPX");
        assert_eq!(gated.column("A").unwrap(), &[Some(1.0), Some(1.0), Some(0.0)]);
    }

    #[test]
    fn test_unknown_benchmark_flattens_everything() {
        let signals = table(&[("A", vec![Some(1.0), Some(-1.0)])]);
        let benchmark = table(&[("OTHER", vec![Some(0.5), Some(0.5)])]);
        let gated = gate_by_benchmark(&signals, &benchmark, "SPX");
        assert_eq!(gated.column("A").unwrap(), &[Some(0.0), Some(0.0)]);
    }
}
