pub mod universe;

pub use universe::{
    SecuritiesMaster, Universe, CURRENCY_PAIRS, FLOW_INDICES, SNP500, WORLD_INDICES,
};
