pub mod loader;
pub mod table;

pub use loader::{load_prices_csv, parse_timestamp, write_table_csv};
pub use table::{
    PositionTable, PriceTable, RankTable, ReturnSeries, SignalTable, TableError, TimeTable,
    WeightTable,
};
