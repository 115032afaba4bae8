use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Timestamps must be strictly increasing: row {row} ({timestamp}) is not after its predecessor")]
    UnsortedIndex { row: usize, timestamp: DateTime<Utc> },
    #[error("Column {id} has {len} values but the index has {expected} timestamps")]
    LengthMismatch {
        id: String,
        len: usize,
        expected: usize,
    },
}

//time-indexed table: ordered timestamps x instrument columns
//a cell is None when there is no observation, never NaN or infinite
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeTable {
    index: Vec<DateTime<Utc>>,
    columns: IndexMap<String, Vec<Option<f64>>>,
}

//the same shape carries every stage of the pipeline
pub type PriceTable = TimeTable;
pub type ReturnSeries = TimeTable;
pub type RankTable = TimeTable;
pub type SignalTable = TimeTable;
pub type WeightTable = TimeTable;
pub type PositionTable = TimeTable;

//maps non-finite values to the missing marker
pub fn finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

impl TimeTable {
    //creates an empty table over a validated index
    pub fn new(index: Vec<DateTime<Utc>>) -> Result<Self, TableError> {
        for (row, pair) in index.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(TableError::UnsortedIndex {
                    row: row + 1,
                    timestamp: pair[1],
                });
            }
        }

        Ok(TimeTable {
            index,
            columns: IndexMap::new(),
        })
    }

    //assembles a table from parts the caller already knows to be consistent
    pub(crate) fn from_parts(
        index: Vec<DateTime<Utc>>,
        columns: IndexMap<String, Vec<Option<f64>>>,
    ) -> Self {
        debug_assert!(index.windows(2).all(|pair| pair[0] < pair[1]));
        debug_assert!(columns.values().all(|values| values.len() == index.len()));
        TimeTable { index, columns }
    }

    //creates a table from an index and a set of columns
    pub fn with_columns<I, S>(index: Vec<DateTime<Utc>>, columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Vec<Option<f64>>)>,
        S: Into<String>,
    {
        let mut table = TimeTable::new(index)?;
        for (id, values) in columns {
            table.insert_column(id, values)?;
        }
        Ok(table)
    }

    //pivots (timestamp, id, value) records into a table
    //a later record for the same cell overwrites an earlier one
    pub fn from_long_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (DateTime<Utc>, String, f64)>,
    {
        let mut cells: IndexMap<String, BTreeMap<DateTime<Utc>, f64>> = IndexMap::new();
        let mut stamps: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();

        for (timestamp, id, value) in rows {
            stamps.insert(timestamp, 0);
            cells.entry(id).or_default().insert(timestamp, value);
        }

        for (row, slot) in stamps.values_mut().enumerate() {
            *slot = row;
        }

        let index: Vec<DateTime<Utc>> = stamps.keys().copied().collect();
        let columns = cells
            .into_iter()
            .map(|(id, observations)| {
                let mut values = vec![None; index.len()];
                for (timestamp, value) in observations {
                    if let Some(&row) = stamps.get(&timestamp) {
                        values[row] = finite(value);
                    }
                }
                (id, values)
            })
            .collect();

        TimeTable { index, columns }
    }

    //adds or replaces a column, non-finite values become missing
    pub fn insert_column(
        &mut self,
        id: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), TableError> {
        let id = id.into();
        if values.len() != self.index.len() {
            return Err(TableError::LengthMismatch {
                id,
                len: values.len(),
                expected: self.index.len(),
            });
        }

        let values = values.into_iter().map(|v| v.and_then(finite)).collect();
        self.columns.insert(id, values);
        Ok(())
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    //number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    //number of instrument columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.columns.contains_key(id)
    }

    pub fn column(&self, id: &str) -> Option<&[Option<f64>]> {
        self.columns.get(id).map(Vec::as_slice)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.columns
            .iter()
            .map(|(id, values)| (id.as_str(), values.as_slice()))
    }

    //returns the cell at (row, id), None if either is absent
    pub fn value(&self, row: usize, id: &str) -> Option<f64> {
        self.columns.get(id).and_then(|values| values.get(row).copied().flatten())
    }

    //returns the cell at an exact timestamp
    pub fn value_at(&self, timestamp: DateTime<Utc>, id: &str) -> Option<f64> {
        let row = self.index.binary_search(&timestamp).ok()?;
        self.value(row, id)
    }

    //returns one row as (id, value) pairs in column order
    pub fn row(&self, row: usize) -> Vec<(&str, Option<f64>)> {
        self.columns
            .iter()
            .map(|(id, values)| (id.as_str(), values.get(row).copied().flatten()))
            .collect()
    }

    //builds a new table over the same index, column by column
    fn map_columns<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&[Option<f64>]) -> Vec<Option<f64>>,
    {
        let columns = self
            .columns
            .iter()
            .map(|(id, values)| (id.clone(), f(values)))
            .collect();

        TimeTable {
            index: self.index.clone(),
            columns,
        }
    }

    //moves every value n rows later, the first n rows become missing
    pub fn shift(&self, n: usize) -> Self {
        self.map_columns(|values| {
            let len = values.len();
            let mut shifted = vec![None; len];
            if n < len {
                shifted[n..].copy_from_slice(&values[..len - n]);
            }
            shifted
        })
    }

    //percentage change over n rows, missing when either side is absent or the base is zero
    pub fn pct_change(&self, n: usize) -> Self {
        self.map_columns(|values| {
            values
                .iter()
                .enumerate()
                .map(|(i, current)| {
                    if i < n {
                        return None;
                    }
                    match (current, values[i - n]) {
                        (Some(now), Some(past)) if past != 0.0 => finite((now - past) / past),
                        _ => None,
                    }
                })
                .collect()
        })
    }

    //carries the last present value forward in every column
    pub fn ffill(&self) -> Self {
        self.map_columns(|values| {
            let mut last = None;
            values
                .iter()
                .map(|value| {
                    if value.is_some() {
                        last = *value;
                    }
                    last
                })
                .collect()
        })
    }

    //applies a function to every cell
    pub fn map_values<F>(&self, f: F) -> Self
    where
        F: Fn(Option<f64>) -> Option<f64>,
    {
        self.map_columns(|values| values.iter().map(|v| f(*v).and_then(finite)).collect())
    }

    //applies a function to every cell, with the row number
    pub fn map_cells<F>(&self, f: F) -> Self
    where
        F: Fn(usize, Option<f64>) -> Option<f64>,
    {
        self.map_columns(|values| {
            values
                .iter()
                .enumerate()
                .map(|(row, v)| f(row, *v).and_then(finite))
                .collect()
        })
    }

    //builds a table with the same shape from a function of (row, column position)
    pub fn map_positions<F>(&self, f: F) -> Self
    where
        F: Fn(usize, usize) -> Option<f64>,
    {
        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(column, (id, values))| {
                let mapped = (0..values.len())
                    .map(|row| f(row, column).and_then(finite))
                    .collect();
                (id.clone(), mapped)
            })
            .collect();

        TimeTable {
            index: self.index.clone(),
            columns,
        }
    }

    //number of present cells in each row
    pub fn row_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.index.len()];
        for values in self.columns.values() {
            for (count, value) in counts.iter_mut().zip(values) {
                if value.is_some() {
                    *count += 1;
                }
            }
        }
        counts
    }

    //keeps the requested columns in the requested order, absent ids are skipped
    pub fn select<'a, I>(&self, ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let columns = ids
            .into_iter()
            .filter_map(|id| self.columns.get(id).map(|values| (id.to_string(), values.clone())))
            .collect();

        TimeTable {
            index: self.index.clone(),
            columns,
        }
    }

    //relabels columns through a mapping, unmapped columns keep their id
    //if two columns land on the same id the later one wins
    pub fn rename(&self, mapping: &HashMap<String, String>) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(id, values)| {
                let renamed = mapping.get(id).cloned().unwrap_or_else(|| id.clone());
                (renamed, values.clone())
            })
            .collect();

        TimeTable {
            index: self.index.clone(),
            columns,
        }
    }

    //combines this table with another cell by cell
    //output keeps this table's index and columns; the other operand is aligned by timestamp
    //and contributes None where it has no such row or column
    pub fn combine<F>(&self, other: &TimeTable, f: F) -> Self
    where
        F: Fn(Option<f64>, Option<f64>) -> Option<f64>,
    {
        let same_index = self.index == other.index;
        let columns = self
            .columns
            .iter()
            .map(|(id, values)| {
                let combined = values
                    .iter()
                    .enumerate()
                    .map(|(row, value)| {
                        let rhs = if same_index {
                            other.value(row, id)
                        } else {
                            other.value_at(self.index[row], id)
                        };
                        f(*value, rhs).and_then(finite)
                    })
                    .collect();
                (id.clone(), combined)
            })
            .collect();

        TimeTable {
            index: self.index.clone(),
            columns,
        }
    }

    //combines every column of this table with a single column of another table
    //rows where the other table has no observation pass None
    pub fn combine_with_series<F>(&self, other: &TimeTable, other_id: &str, f: F) -> Self
    where
        F: Fn(Option<f64>, Option<f64>) -> Option<f64>,
    {
        let same_index = self.index == other.index;
        let series: Vec<Option<f64>> = (0..self.index.len())
            .map(|row| {
                if same_index {
                    other.value(row, other_id)
                } else {
                    other.value_at(self.index[row], other_id)
                }
            })
            .collect();

        self.map_columns(|values| {
            values
                .iter()
                .zip(series.iter())
                .map(|(value, gate)| f(*value, *gate).and_then(finite))
                .collect()
        })
    }
}
