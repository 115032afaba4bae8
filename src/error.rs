use crate::config::ConfigError;
use crate::data::TableError;
use thiserror::Error;

//errors surfaced by the pipeline stages
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid table: {0}")]
    Table(#[from] TableError),
}

pub type Result<T> = std::result::Result<T, FlowError>;
