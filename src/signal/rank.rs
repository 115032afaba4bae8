use crate::config::{validate_pct, ConfigError};
use crate::data::{RankTable, ReturnSeries};
use serde::{Deserialize, Serialize};

//how equal values share ordinal ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    //ties get the mean of the ranks they span
    #[default]
    Average,
    //ties get the lowest rank they span
    Min,
    //ties get the highest rank they span
    Max,
    //ties are ranked in column order
    First,
}

//ranks one cross-section of (column, value) pairs, returns (column, rank) with ranks starting at 1
pub fn rank_values(values: &[(usize, f64)], ascending: bool, tie_break: TieBreak) -> Vec<(usize, f64)> {
    let mut order: Vec<(usize, f64)> = values.to_vec();
    //stable, so equal values keep column order
    if ascending {
        order.sort_by(|a, b| a.1.total_cmp(&b.1));
    } else {
        order.sort_by(|a, b| b.1.total_cmp(&a.1));
    }

    let mut ranks = Vec::with_capacity(order.len());
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && order[end].1 == order[start].1 {
            end += 1;
        }

        //positions start..end hold one group of equal values, 1-based ranks start+1..=end
        for (offset, &(column, _)) in order[start..end].iter().enumerate() {
            let rank = match tie_break {
                TieBreak::Average => (start + 1 + end) as f64 / 2.0,
                TieBreak::Min => (start + 1) as f64,
                TieBreak::Max => end as f64,
                TieBreak::First => (start + offset + 1) as f64,
            };
            ranks.push((column, rank));
        }
        start = end;
    }

    ranks
}

//ranks every row of a return table across instruments with a present value
//with pct the rank is divided by the number of ranked instruments in that row
pub fn rank_table(
    returns: &ReturnSeries,
    ascending: bool,
    tie_break: TieBreak,
    pct: bool,
) -> RankTable {
    let ids: Vec<&str> = returns.ids().collect();
    let mut ranked: Vec<Vec<Option<f64>>> = vec![vec![None; returns.len()]; ids.len()];

    for row in 0..returns.len() {
        let present: Vec<(usize, f64)> = ids
            .iter()
            .enumerate()
            .filter_map(|(column, id)| returns.value(row, id).map(|v| (column, v)))
            .collect();

        let count = present.len() as f64;
        for (column, rank) in rank_values(&present, ascending, tie_break) {
            ranked[column][row] = Some(if pct { rank / count } else { rank });
        }
    }

    returns.map_positions(|row, column| ranked[column][row])
}

//percentile ranks in both directions: best performer closest to 0 in the first table,
//worst performer closest to 0 in the second
pub fn rank_and_signal(
    returns: &ReturnSeries,
    top_pct: f64,
    bottom_pct: f64,
    tie_break: TieBreak,
) -> Result<(RankTable, RankTable), ConfigError> {
    validate_pct("top_pct", top_pct)?;
    validate_pct("bottom_pct", bottom_pct)?;

    let descending = rank_table(returns, false, tie_break, true);
    let ascending = rank_table(returns, true, tie_break, true);
    Ok((descending, ascending))
}
