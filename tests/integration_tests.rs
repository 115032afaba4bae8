use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use flowrank::prelude::*;
use flowrank::signal::{bucket, build_signal};
use std::io::Write;

fn days(n: usize) -> Vec<DateTime<Utc>> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n).map(|i| start + Duration::days(i as i64)).collect()
}

fn abc_universe() -> Universe {
    Universe::from_pairs(&[("alpha", "A"), ("beta", "B"), ("gamma", "C")], &[])
}

//five-day returns on the last row: A +50%, B +10%, C -20%
fn abc_prices() -> PriceTable {
    TimeTable::with_columns(
        days(6),
        [
            ("A", vec![Some(100.0), Some(104.0), Some(111.0), Some(120.0), Some(135.0), Some(150.0)]),
            ("B", vec![Some(50.0), Some(51.0), Some(52.0), Some(53.0), Some(54.0), Some(55.0)]),
            ("C", vec![Some(10.0), Some(9.5), Some(9.0), Some(8.8), Some(8.4), Some(8.0)]),
        ],
    )
    .unwrap()
}

fn abc_config() -> StrategyConfig {
    StrategyConfig {
        code: "abc".to_string(),
        universe: abc_universe(),
        alpha_days: 5,
        alpha_delay_days: 0,
        cutoff: Cutoff::Percentile {
            top: 0.34,
            bottom: 0.34,
        },
        mode: SignalMode::LongOnly,
        rank_source: RankSource::Currency,
        tie_break: TieBreak::Average,
        require_positive_return: false,
        benchmark_gate: None,
        rebalance: "D".to_string(),
        execution_delay: 1,
        weight_scheme: WeightScheme::EqualPerSide,
    }
}

#[test]
fn test_end_to_end_flags_only_the_leader() {
    let prices = abc_prices();
    let returns = compute_return(5, 0, &prices).unwrap();

    assert!((returns.value(5, "A").unwrap() - 0.5).abs() < 1e-12);
    assert!((returns.value(5, "B").unwrap() - 0.1).abs() < 1e-12);
    assert!((returns.value(5, "C").unwrap() + 0.2).abs() < 1e-12);

    let signals = generate_signals(&prices, &abc_config(), &abc_universe()).unwrap();

    //rows 0..4 have no five-day return and stay flat
    for row in 0..5 {
        assert!(signals.row(row).iter().all(|(_, v)| *v == Some(0.0)));
    }
    assert_eq!(signals.value(5, "A"), Some(1.0));
    assert_eq!(signals.value(5, "B"), Some(0.0));
    assert_eq!(signals.value(5, "C"), Some(0.0));

    //the long-short table from the raw rank tables agrees on the long side
    let (desc, asc) = rank_and_signal(&returns, 0.34, 0.34, TieBreak::Average).unwrap();
    let net = build_signal(&desc, &asc, 0.34, 0.34).unwrap();
    assert_eq!(net.value(5, "A"), Some(1.0));
    assert_eq!(net.value(5, "B"), Some(0.0));
    assert_eq!(net.value(5, "C"), Some(-1.0));
}

#[test]
fn test_zero_lagged_price_never_poisons_ranks() {
    let prices = TimeTable::with_columns(
        days(3),
        [
            ("A", vec![Some(0.0), Some(1.0), Some(2.0)]),
            ("B", vec![Some(1.0), Some(2.0), Some(2.0)]),
            ("C", vec![Some(1.0), Some(1.0), Some(1.0)]),
        ],
    )
    .unwrap();
    let returns = compute_return(1, 0, &prices).unwrap();

    assert_eq!(returns.value(1, "A"), None);
    assert!(returns
        .columns()
        .all(|(_, values)| values.iter().flatten().all(|v| v.is_finite())));

    //A is unranked on row 1, so B and C are ranked among themselves
    let buckets = bucket(
        &returns,
        Cutoff::Percentile {
            top: 0.5,
            bottom: 0.5,
        },
        TieBreak::Average,
    )
    .unwrap();
    assert_eq!(buckets.longs.value(1, "A"), Some(0.0));
    assert_eq!(buckets.longs.value(1, "B"), Some(1.0));
    assert_eq!(buckets.shorts.value(1, "C"), Some(1.0));
}

#[test]
fn test_weekly_rebalance_over_ten_business_days() {
    let index: Vec<DateTime<Utc>> = days(12)
        .into_iter()
        .filter(|t| t.weekday().number_from_monday() <= 5)
        .collect();
    assert_eq!(index.len(), 10);

    //daily signals flip every day
    let daily: Vec<Option<f64>> = (0..10)
        .map(|i| Some(if i % 2 == 0 { 1.0 } else { -1.0 }))
        .collect();
    let signals = TimeTable::with_columns(index.clone(), [("A", daily)]).unwrap();

    let rule: RebalanceRule = "W".parse().unwrap();
    let positions = schedule(&signals, rule, 1, &index).unwrap();

    //friday 2024-01-05 (row 4) closes week one with +1; week two's label lies after the data
    let expected = vec![
        None,
        None,
        None,
        None,
        None,
        None,
        Some(1.0),
        Some(1.0),
        Some(1.0),
        Some(1.0),
    ];
    assert_eq!(positions.column("A").unwrap(), &expected[..]);
}

#[test]
fn test_csv_and_config_round_trip() {
    let dir = tempfile::tempdir().unwrap();

    let prices_path = dir.path().join("prices.csv");
    let mut file = std::fs::File::create(&prices_path).unwrap();
    writeln!(file, "timestamp,symbol,close").unwrap();
    let prices = abc_prices();
    for (row, timestamp) in prices.index().iter().enumerate() {
        for (id, value) in prices.row(row) {
            writeln!(file, "{},{},{}", timestamp.format("%Y-%m-%d"), id, value.unwrap()).unwrap();
        }
    }
    drop(file);

    let config_path = dir.path().join("strategies.json");
    let strategy_file = StrategyFile {
        cash_ids: Default::default(),
        strategies: vec![abc_config()],
    };
    strategy_file.to_json_file(&config_path).unwrap();

    let loaded_prices = load_prices_csv(&prices_path).unwrap();
    let loaded_file = StrategyFile::from_json_file(&config_path).unwrap();
    assert_eq!(loaded_prices, prices);
    assert_eq!(loaded_file, strategy_file);

    let runs = run_many(&loaded_prices, &loaded_file.resolved_strategies());
    let run = runs.into_iter().next().unwrap().unwrap();
    assert_eq!(run.code, "abc");
    assert_eq!(run.weights.value(5, "A"), Some(1.0));
    //the row 5 weight is executed one step later, past the end of the data
    assert!(run.positions.row(5).iter().all(|(_, v)| *v == Some(0.0)));

    let out = dir.path().join("abc_signals.csv");
    write_table_csv(&run.signals, &out).unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "timestamp,A,B,C");
    assert_eq!(lines.len(), 7);
    assert!(lines[6].ends_with(",1,0,0"));
}

#[test]
fn test_presets_run_on_their_own_universe() {
    //a synthetic month covering every preset currency
    let index = days(30);
    let mut prices = TimeTable::new(index.clone()).unwrap();
    for (i, (_, fx)) in flowrank::instrument::CURRENCY_PAIRS.iter().enumerate() {
        let drift = 1.0 + (i as f64 - 10.0) / 1000.0;
        let values = (0..index.len())
            .map(|t| Some(100.0 * drift.powi(t as i32)))
            .collect();
        prices.insert_column(*fx, values).unwrap();
    }

    let run = run_strategy(&prices, &StrategyConfig::currency_momentum()).unwrap();
    assert_eq!(run.positions.len(), 30);
    assert!(run
        .weights
        .columns()
        .all(|(_, values)| values.iter().all(|v| v.is_some_and(|w| w >= 0.0))));
}
