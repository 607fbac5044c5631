use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use snafu::prelude::*;

use crate::rank::io_sheet::SheetRow;
use crate::rank::{InvalidParametersSnafu, RankResult};

/// The period a run covers.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Period {
    /// The last `n` days, up to now.
    TrailingDays(u32),
    Month { year: i32, month: u32 },
    Year(i32),
}

impl Period {
    pub fn window(&self, now: DateTime<Utc>) -> RankResult<Window> {
        match *self {
            Period::TrailingDays(days) => Ok(Window {
                start: now - Duration::days(days as i64),
                end: now,
            }),
            Period::Month { year, month } => {
                let first = ymd(year, month)?;
                let next = if month == 12 {
                    ymd(year + 1, 1)?
                } else {
                    ymd(year, month + 1)?
                };
                Ok(Window::covering(first, next))
            }
            Period::Year(year) => Ok(Window::covering(ymd(year, 1)?, ymd(year + 1, 1)?)),
        }
    }

    pub fn worksheet_title(&self, now: DateTime<Utc>) -> String {
        match *self {
            Period::TrailingDays(days) => format!("{}_{}-days", now.format("%Y-%m-%d"), days),
            Period::Month { year, month } => format!("{:04}-{:02}", year, month),
            Period::Year(year) => format!("{:04}", year),
        }
    }
}

fn ymd(year: i32, month: u32) -> RankResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).context(InvalidParametersSnafu {
        message: format!("{}-{} is not a valid month", year, month),
    })
}

pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// An open interval of time: both bounds are excluded.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Window {
        Window { start, end }
    }

    // Every day from `first` (included) to `next` (excluded). The start is moved
    // one second back so that rows dated on `first` pass the open bound.
    fn covering(first: NaiveDate, next: NaiveDate) -> Window {
        Window {
            start: midnight_utc(first) - Duration::seconds(1),
            end: midnight_utc(next),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at > self.start && at < self.end
    }

    /// Rows are dated by day; a row stands for midnight UTC of its date.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(midnight_utc(date))
    }

    pub fn filter<'a>(&self, rows: &'a [SheetRow]) -> Vec<&'a SheetRow> {
        rows.iter().filter(|r| self.contains_date(r.date)).collect()
    }
}
