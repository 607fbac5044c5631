use log::{debug, info};

use chrono::{DateTime, Duration, Utc};

use crate::rank::commands::{placeholder, Command, AGGREGATE_WORKSHEET};
use crate::rank::io_sheet::{parse_sheet, ParsedSheet, SheetLayout, SheetSource, DATE_FORMAT};
use crate::rank::shutdown::Shutdown;
use crate::rank::window::midnight_utc;
use crate::rank::RankResult;

pub const DELETED_COLUMN: &str = "deleted";
// The column letter of `deleted`: after the date and the 50 rank columns.
const DELETED_COLUMN_LETTER: &str = "AZ";
const AGGREGATE_RANK_COLUMNS: usize = 50;

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CleanupParams {
    pub source: SheetSource,
    pub days: u32,
}

/// Retires the dated worksheets older than `days`, marking their aggregate
/// rows as deleted.
pub async fn run_cleanup(
    params: &CleanupParams,
    client: &reqwest::Client,
    now: DateTime<Utc>,
    shutdown: &Shutdown,
) -> RankResult<Vec<Command>> {
    let text = params.source.read_text(client, shutdown).await?;
    let layout = SheetLayout::ranks(AGGREGATE_RANK_COLUMNS).with_trailing(DELETED_COLUMN);
    let sheet = parse_sheet(text.as_bytes(), &layout)?;
    let cutoff = now - Duration::days(params.days as i64);
    info!("run_cleanup: removing worksheets dated before {}", cutoff);
    Ok(cleanup_commands(&sheet, cutoff))
}

/// In sheet order, for every live row older than `cutoff`: mark the row, then
/// remove its worksheet. The placeholder always closes the list.
pub fn cleanup_commands(sheet: &ParsedSheet, cutoff: DateTime<Utc>) -> Vec<Command> {
    let mut res: Vec<Command> = Vec::new();
    for row in sheet.rows.iter() {
        if midnight_utc(row.date) >= cutoff {
            continue;
        }
        let deleted = row.trailing.first().map(|c| c.trim()).unwrap_or_default();
        if !deleted.is_empty() {
            debug!("cleanup_commands: line {} already deleted", row.line);
            continue;
        }
        let title = row.date.format(DATE_FORMAT).to_string();
        res.push(Command::update_data(
            AGGREGATE_WORKSHEET,
            &format!(
                "{}!{}{}",
                AGGREGATE_WORKSHEET, DELETED_COLUMN_LETTER, row.line
            ),
            vec![vec!["X".to_string()]],
        ));
        res.push(Command::remove_worksheet(&title));
    }
    info!("cleanup_commands: {} worksheets to remove", res.len() / 2);
    res.push(placeholder());
    res
}
