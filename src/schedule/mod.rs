pub mod rebalance;
pub mod scheduler;

pub use rebalance::RebalanceRule;
pub use scheduler::{reindex_ffill, resample_last, schedule};
