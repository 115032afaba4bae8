use crate::data::{SignalTable, WeightTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

//how a row of signals becomes portfolio weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightScheme {
    //each long gets 1/n_long, each short -1/n_short
    #[default]
    EqualPerSide,
    //signal over the row's gross signal, weights sum to 1 in absolute value
    EqualGross,
}

//weights for one row of signals, missing signals are flat
fn row_weights(signals: &[f64], scheme: WeightScheme) -> Vec<f64> {
    match scheme {
        WeightScheme::EqualPerSide => {
            let longs = signals.iter().filter(|s| **s > 0.0).count();
            let shorts = signals.iter().filter(|s| **s < 0.0).count();
            signals
                .iter()
                .map(|&s| {
                    if s > 0.0 {
                        1.0 / longs as f64
                    } else if s < 0.0 {
                        -1.0 / shorts as f64
                    } else {
                        0.0
                    }
                })
                .collect()
        }
        WeightScheme::EqualGross => {
            let gross: f64 = signals.iter().map(|s| s.abs()).sum();
            if gross == 0.0 {
                return vec![0.0; signals.len()];
            }
            signals.iter().map(|s| s / gross).collect()
        }
    }
}

//allocates every row of a signal table
pub fn weights_from_signals(signals: &SignalTable, scheme: WeightScheme) -> WeightTable {
    debug!(
        "Allocating {} rows x {} instruments with {:?}",
        signals.len(),
        signals.width(),
        scheme
    );

    let ids: Vec<&str> = signals.ids().collect();
    let rows: Vec<Vec<f64>> = (0..signals.len())
        .map(|row| {
            let values: Vec<f64> = ids
                .iter()
                .map(|id| signals.value(row, id).unwrap_or(0.0))
                .collect();
            row_weights(&values, scheme)
        })
        .collect();

    signals.map_positions(|row, column| Some(rows[row][column]))
}
