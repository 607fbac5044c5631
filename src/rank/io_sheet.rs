// Primitives for reading the ballot sheet.

use log::{debug, info, warn};
use std::fs;
use std::io::Read;

use chrono::NaiveDate;
use snafu::prelude::*;

use crate::rank::shutdown::Shutdown;
use crate::rank::{
    CsvLineParseSnafu, EmptySheetSnafu, FetchingSheetSnafu, HeaderLengthSnafu,
    HeaderMismatchSnafu, OpeningSheetSnafu, RankResult,
};

pub const DATE_COLUMN: &str = "Date";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The exact header a sheet must have: the date column, the rank columns
/// `"1"` to `"n"`, then some named trailing columns.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SheetLayout {
    pub rank_columns: usize,
    pub trailing: Vec<String>,
}

impl SheetLayout {
    pub fn ranks(rank_columns: usize) -> SheetLayout {
        SheetLayout {
            rank_columns,
            trailing: vec![],
        }
    }

    pub fn with_trailing(mut self, name: &str) -> SheetLayout {
        self.trailing.push(name.to_string());
        self
    }

    pub fn expected_header(&self) -> Vec<String> {
        let mut res: Vec<String> = vec![DATE_COLUMN.to_string()];
        res.extend((1..=self.rank_columns).map(|i| i.to_string()));
        res.extend(self.trailing.iter().cloned());
        res
    }

    fn check_header(&self, header: &csv::StringRecord) -> RankResult<()> {
        let expected = self.expected_header();
        ensure!(
            header.len() == expected.len(),
            HeaderLengthSnafu {
                expected: expected.len(),
                found: header.len()
            }
        );
        for (column, (exp, found)) in expected.iter().zip(header.iter()).enumerate() {
            ensure!(
                exp == found,
                HeaderMismatchSnafu {
                    column,
                    expected: exp,
                    found
                }
            );
        }
        Ok(())
    }
}

/// A dated row of the sheet.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SheetRow {
    /// The row number in the sheet, starting at 1 with the header.
    pub line: usize,
    pub date: NaiveDate,
    /// The cells of the rank columns, in column order.
    pub choices: Vec<String>,
    /// The cells of the trailing columns.
    pub trailing: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedSheet {
    pub rows: Vec<SheetRow>,
    /// The number of rows dropped because their date could not be read.
    pub dropped: usize,
}

/// Reads the whole sheet. The header must match `layout` exactly; rows with an
/// unreadable date are skipped and counted.
pub fn parse_sheet<R: Read>(input: R, layout: &SheetLayout) -> RankResult<ParsedSheet> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(input);
    let mut records = rdr.into_records();

    let header = records
        .next()
        .context(EmptySheetSnafu {})?
        .context(CsvLineParseSnafu { lineno: 1_usize })?;
    debug!("parse_sheet: header: {:?}", header);
    layout.check_header(&header)?;

    let mut rows: Vec<SheetRow> = Vec::new();
    let mut dropped: usize = 0;
    for (idx, line_r) in records.enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let raw_date = line.get(0).unwrap_or_default();
        let date = match NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT) {
            Ok(d) => d,
            Err(e) => {
                debug!(
                    "parse_sheet: line {}: skipping unreadable date {:?}: {}",
                    lineno, raw_date, e
                );
                dropped += 1;
                continue;
            }
        };
        let cells: Vec<String> = line.iter().skip(1).map(|s| s.to_string()).collect();
        let (choices, trailing) = cells.split_at(layout.rank_columns);
        rows.push(SheetRow {
            line: lineno,
            date,
            choices: choices.to_vec(),
            trailing: trailing.to_vec(),
        });
    }

    if dropped > 0 {
        warn!("parse_sheet: dropped {} rows with an unreadable date", dropped);
    }
    info!("parse_sheet: read {} dated rows", rows.len());
    Ok(ParsedSheet { rows, dropped })
}

/// Where the sheet comes from.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SheetSource {
    /// The CSV export of a spreadsheet page.
    Remote { url: String },
    File { path: String },
}

impl SheetSource {
    pub async fn read_text(
        &self,
        client: &reqwest::Client,
        shutdown: &Shutdown,
    ) -> RankResult<String> {
        match self {
            SheetSource::File { path } => {
                info!("Attempting to read sheet file {:?}", path);
                fs::read_to_string(path).context(OpeningSheetSnafu { path })
            }
            SheetSource::Remote { url } => {
                info!("Fetching sheet {:?}", url);
                shutdown.guard(fetch_text(client, url)).await
            }
        }
    }
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> RankResult<String> {
    let res = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .context(FetchingSheetSnafu { url })?;
    res.text().await.context(FetchingSheetSnafu { url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::test_support::{header, line};
    use crate::rank::RankError;

    fn text(lines: &[String]) -> String {
        lines.join("\n")
    }

    #[test]
    fn expected_header_shape() {
        let h = SheetLayout::ranks(3).with_trailing("deleted").expected_header();
        assert_eq!(h, vec!["Date", "1", "2", "3", "deleted"]);
        assert_eq!(SheetLayout::ranks(50).expected_header().len(), 51);
    }

    #[test]
    fn reads_rows_and_splits_columns() {
        let t = text(&[
            header(&["deleted"]),
            line("2024-03-01", &["13", "", "822"], &[""]),
            line("2024-03-02", &["9209"], &["X"]),
        ]);
        let layout = SheetLayout::ranks(50).with_trailing("deleted");
        let sheet = parse_sheet(t.as_bytes(), &layout).unwrap();
        assert_eq!(sheet.dropped, 0);
        assert_eq!(sheet.rows.len(), 2);
        let first = &sheet.rows[0];
        assert_eq!(first.line, 2);
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(first.choices.len(), 50);
        assert_eq!(&first.choices[..3], &["13", "", "822"]);
        assert_eq!(first.trailing, vec![""]);
        assert_eq!(sheet.rows[1].line, 3);
        assert_eq!(sheet.rows[1].trailing, vec!["X"]);
    }

    #[test]
    fn unreadable_dates_are_counted_and_skipped() {
        let t = text(&[
            header(&[]),
            line("yesterday", &["13"], &[]),
            line("2024-03-02", &["13"], &[]),
            line("2024/03/03", &["13"], &[]),
        ]);
        let sheet = parse_sheet(t.as_bytes(), &SheetLayout::ranks(50)).unwrap();
        assert_eq!(sheet.dropped, 2);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].line, 3);
    }

    #[test]
    fn header_with_wrong_length() {
        let t = text(&[header(&["deleted"])]);
        let res = parse_sheet(t.as_bytes(), &SheetLayout::ranks(50));
        assert!(matches!(
            res,
            Err(RankError::HeaderLength {
                expected: 51,
                found: 52
            })
        ));
    }

    #[test]
    fn header_with_wrong_name() {
        let t = "Date,1,3\n2024-03-01,13,822";
        let res = parse_sheet(t.as_bytes(), &SheetLayout::ranks(2));
        match res {
            Err(RankError::HeaderMismatch {
                column,
                expected,
                found,
            }) => {
                assert_eq!(column, 2);
                assert_eq!(expected, "2");
                assert_eq!(found, "3");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn empty_input() {
        let res = parse_sheet("".as_bytes(), &SheetLayout::ranks(2));
        assert!(matches!(res, Err(RankError::EmptySheet {})));
    }

    #[test]
    fn short_row_is_an_error() {
        let t = "Date,1,2\n2024-03-01,13";
        let res = parse_sheet(t.as_bytes(), &SheetLayout::ranks(2));
        assert!(matches!(res, Err(RankError::CsvLineParse { lineno: 2, .. })));
    }

    #[tokio::test]
    async fn reads_local_files() {
        let path = std::env::temp_dir().join(format!("gamerank-sheet-{}.csv", std::process::id()));
        fs::write(&path, "Date,1\n2024-03-01,13\n").unwrap();
        let source = SheetSource::File {
            path: path.display().to_string(),
        };
        let (_tx, shutdown) = Shutdown::channel();
        let t = source
            .read_text(&reqwest::Client::new(), &shutdown)
            .await
            .unwrap();
        fs::remove_file(&path).unwrap();
        let sheet = parse_sheet(t.as_bytes(), &SheetLayout::ranks(1)).unwrap();
        assert_eq!(sheet.rows[0].choices, vec!["13"]);
    }
}
