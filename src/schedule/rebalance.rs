use crate::config::ConfigError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use std::fmt;
use std::str::FromStr;

//calendar period a signal is held for before it may change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceRule {
    Daily,
    //week ending on the anchor day
    Weekly { anchor: Weekday },
    Monthly,
    Quarterly,
    Annual,
}

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("MON", Weekday::Mon),
    ("TUE", Weekday::Tue),
    ("WED", Weekday::Wed),
    ("THU", Weekday::Thu),
    ("FRI", Weekday::Fri),
    ("SAT", Weekday::Sat),
    ("SUN", Weekday::Sun),
];

//last calendar day of a month, None only at the edge of chrono's range
fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

impl RebalanceRule {
    //end date of the period that contains date
    pub fn period_end(&self, date: NaiveDate) -> NaiveDate {
        let end = match self {
            RebalanceRule::Daily => Some(date),
            RebalanceRule::Weekly { anchor } => {
                let ahead = (7 + anchor.num_days_from_monday() - date.weekday().num_days_from_monday()) % 7;
                date.checked_add_signed(Duration::days(ahead as i64))
            }
            RebalanceRule::Monthly => month_end(date.year(), date.month()),
            RebalanceRule::Quarterly => {
                let last_month = ((date.month() - 1) / 3 + 1) * 3;
                month_end(date.year(), last_month)
            }
            RebalanceRule::Annual => NaiveDate::from_ymd_opt(date.year(), 12, 31),
        };
        end.unwrap_or(date)
    }

    //label of the period containing timestamp: its end date at midnight utc
    pub fn label(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        self.period_end(timestamp.date_naive())
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or(timestamp)
    }

    //label of the period right after the one ending at end
    pub fn next_label(&self, end: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let next_day = end.date_naive().succ_opt()?;
        let next_end = self.period_end(next_day);
        Some(next_end.and_hms_opt(0, 0, 0)?.and_utc())
    }
}

impl FromStr for RebalanceRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_uppercase();
        let rule = match token.as_str() {
            "D" => RebalanceRule::Daily,
            "W" => RebalanceRule::Weekly {
                anchor: Weekday::Sun,
            },
            "M" => RebalanceRule::Monthly,
            "Q" => RebalanceRule::Quarterly,
            "A" | "Y" => RebalanceRule::Annual,
            other => {
                let anchor = other
                    .strip_prefix("W-")
                    .and_then(|day| WEEKDAYS.iter().find(|(name, _)| *name == day))
                    .map(|(_, weekday)| *weekday)
                    .ok_or_else(|| ConfigError::UnknownRebalanceRule(s.to_string()))?;
                RebalanceRule::Weekly { anchor }
            }
        };
        Ok(rule)
    }
}

impl fmt::Display for RebalanceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceRule::Daily => write!(f, "D"),
            RebalanceRule::Weekly {
                anchor: Weekday::Sun,
            } => write!(f, "W"),
            RebalanceRule::Weekly { anchor } => {
                let name = WEEKDAYS
                    .iter()
                    .find(|(_, weekday)| weekday == anchor)
                    .map(|(name, _)| *name)
                    .unwrap_or("SUN");
                write!(f, "W-{}", name)
            }
            RebalanceRule::Monthly => write!(f, "M"),
            RebalanceRule::Quarterly => write!(f, "Q"),
            RebalanceRule::Annual => write!(f, "A"),
        }
    }
}
