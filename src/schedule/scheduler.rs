use crate::data::{PositionTable, SignalTable, TableError, TimeTable};
use crate::schedule::rebalance::RebalanceRule;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

//one row per rebalance period, holding each column's last present value in that period
//periods run from the first to the last observed one; periods without rows stay missing
pub fn resample_last(signals: &SignalTable, rule: RebalanceRule) -> SignalTable {
    let (Some(&first), Some(&last)) = (signals.index().first(), signals.index().last()) else {
        return TimeTable::from_parts(
            Vec::new(),
            signals.ids().map(|id| (id.to_string(), Vec::new())).collect(),
        );
    };

    let mut labels = vec![rule.label(first)];
    let last_label = rule.label(last);
    while let Some(&current) = labels.last() {
        if current >= last_label {
            break;
        }
        match rule.next_label(current) {
            Some(next) if next > current => labels.push(next),
            _ => break,
        }
    }

    //period slot of every source row, rows and labels are both sorted
    let mut slots = Vec::with_capacity(signals.len());
    let mut slot = 0;
    for &timestamp in signals.index() {
        let label = rule.label(timestamp);
        while slot + 1 < labels.len() && labels[slot] < label {
            slot += 1;
        }
        slots.push(slot);
    }

    let columns: IndexMap<String, Vec<Option<f64>>> = signals
        .columns()
        .map(|(id, values)| {
            let mut sampled = vec![None; labels.len()];
            for (value, &slot) in values.iter().zip(&slots) {
                if value.is_some() {
                    sampled[slot] = *value;
                }
            }
            (id.to_string(), sampled)
        })
        .collect();

    debug!(
        "Resampled {} rows into {} {} periods",
        signals.len(),
        labels.len(),
        rule
    );

    TimeTable::from_parts(labels, columns)
}

//carries each sparse row forward onto the target index
//a target timestamp takes the row with the latest label at or before it
pub fn reindex_ffill(
    sparse: &SignalTable,
    target_index: &[DateTime<Utc>],
) -> Result<SignalTable, TableError> {
    let mut table = TimeTable::new(target_index.to_vec())?;

    let labels = sparse.index();
    let mut source_rows: Vec<Option<usize>> = Vec::with_capacity(target_index.len());
    let mut next = 0;
    for &timestamp in target_index {
        while next < labels.len() && labels[next] <= timestamp {
            next += 1;
        }
        source_rows.push(next.checked_sub(1));
    }

    for (id, values) in sparse.columns() {
        let carried = source_rows
            .iter()
            .map(|row| row.and_then(|row| values[row]))
            .collect();
        table.insert_column(id, carried)?;
    }

    Ok(table)
}

//holds signals over each rebalance period and lags them by the execution delay
pub fn schedule(
    signals: &SignalTable,
    rule: RebalanceRule,
    execution_delay_steps: usize,
    target_index: &[DateTime<Utc>],
) -> Result<PositionTable, TableError> {
    let sparse = resample_last(signals, rule);
    let held = reindex_ffill(&sparse, target_index)?;
    Ok(held.shift(execution_delay_steps))
}
