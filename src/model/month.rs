use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Calendar month as stored on salary records ("January" .. "December").
///
/// Records carry the month *name*, so sorting by the stored string does not
/// give calendar order. Everything that needs chronology goes through
/// [`Month::index`].
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// Zero-based calendar index (January = 0).
    pub fn index(self) -> u32 {
        Month::iter().position(|m| m == self).unwrap_or(0) as u32
    }

    /// One-based month number (January = 1), used in archive entry names.
    pub fn number(self) -> u32 {
        self.index() + 1
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Month::iter().nth(index as usize)
    }
}

/// Calendar index for a month name coming straight out of the database.
/// Unknown names sort first, matching the original's `-1` sentinel.
pub fn month_order(name: &str) -> i32 {
    name.parse::<Month>().map(|m| m.index() as i32).unwrap_or(-1)
}

/// The trailing `n` calendar periods ending at `today`, newest first.
pub fn last_n_periods(n: u32, today: NaiveDate) -> Vec<(Month, i32)> {
    let mut periods = Vec::with_capacity(n as usize);
    let mut index = today.month0();
    let mut year = today.year();
    for _ in 0..n {
        // from_index cannot miss for index < 12
        if let Some(month) = Month::from_index(index) {
            periods.push((month, year));
        }
        if index == 0 {
            index = 11;
            year -= 1;
        } else {
            index -= 1;
        }
    }
    periods
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_twelve_month_names() {
        for (i, name) in [
            "January",
            "February",
            "March",
            "April",
            "May",
            "June",
            "July",
            "August",
            "September",
            "October",
            "November",
            "December",
        ]
        .iter()
        .enumerate()
        {
            let month: Month = name.parse().expect("month name");
            assert_eq!(month.index(), i as u32);
            assert_eq!(month.to_string(), *name);
            assert_eq!(Month::from_index(i as u32), Some(month));
        }
    }

    #[test]
    fn rejects_unknown_month_names() {
        assert!("Janvier".parse::<Month>().is_err());
        assert_eq!(month_order("Janvier"), -1);
        assert_eq!(month_order("December"), 11);
    }

    #[test]
    fn number_is_one_based() {
        assert_eq!(Month::January.number(), 1);
        assert_eq!(Month::December.number(), 12);
    }

    #[test]
    fn trailing_window_crosses_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        let periods = last_n_periods(3, today);
        assert_eq!(
            periods,
            vec![
                (Month::February, 2025),
                (Month::January, 2025),
                (Month::December, 2024),
            ]
        );
    }

    #[test]
    fn trailing_window_full_year() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let periods = last_n_periods(12, today);
        assert_eq!(periods.len(), 12);
        assert_eq!(periods[0], (Month::June, 2025));
        assert_eq!(periods[11], (Month::July, 2024));
    }
}
