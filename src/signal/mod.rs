pub mod builder;
pub mod generator;
pub mod rank;
pub mod returns;

pub use builder::{
    bucket, build_signal, compose, gate_by_benchmark, gate_positive, threshold, Buckets,
    MIN_RANKED,
};
pub use generator::generate_signals;
pub use rank::{rank_and_signal, rank_table, rank_values, TieBreak};
pub use returns::compute_return;
