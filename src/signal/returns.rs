use crate::config::{validate_window, ConfigError};
use crate::data::{PriceTable, ReturnSeries};
use tracing::debug;

//lagged percentage return over window_days, forward filled, then delayed by delay_days
//fill happens before the delay, so the first window_days + delay_days rows stay missing
pub fn compute_return(
    window_days: usize,
    delay_days: usize,
    prices: &PriceTable,
) -> Result<ReturnSeries, ConfigError> {
    validate_window("window_days", window_days)?;

    debug!(
        "Computing {}-day returns delayed {} for {} instruments",
        window_days,
        delay_days,
        prices.width()
    );

    Ok(prices.pct_change(window_days).ffill().shift(delay_days))
}
