use log::{debug, info, warn};

use schulze_voting::*;
use snafu::{prelude::*, Snafu};

use chrono::{DateTime, Utc};

use crate::args::{Args, CleanupArgs, Command as CliCommand, RankArgs, SheetArgs};

pub mod ballots;
pub mod catalog;
pub mod cleanup;
pub mod commands;
pub mod config_reader;
pub mod enrich;
pub mod hotness;
pub mod io_sheet;
pub mod shutdown;
pub mod window;

use crate::rank::ballots::{discover_candidates, row_to_ballot};
use crate::rank::catalog::{BggCatalog, CatalogLookup, CatalogSettings};
use crate::rank::commands::{placeholder, render_output, table_range, Command};
use crate::rank::config_reader::*;
use crate::rank::enrich::{enrich, ranking_table, EnrichedRow};
use crate::rank::io_sheet::{parse_sheet, SheetLayout, SheetSource};
use crate::rank::shutdown::Shutdown;
use crate::rank::window::Period;

pub const DEFAULT_DAYS: u32 = 14;
pub const DEFAULT_TOP: usize = 50;
pub const MAX_TOP: usize = 100;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RankError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error serializing the commands"))]
    SerializingJson { source: serde_json::Error },

    #[snafu(display("Error opening sheet file {path}"))]
    OpeningSheet {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error fetching sheet from {url}"))]
    FetchingSheet { source: reqwest::Error, url: String },
    #[snafu(display("Error reading sheet line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("The sheet has no header row"))]
    EmptySheet {},
    #[snafu(display("The header needs to have exactly {expected} items but has {found}"))]
    HeaderLength { expected: usize, found: usize },
    #[snafu(display("Headers do not match at column {column}: {expected:?} => {found:?}"))]
    HeaderMismatch {
        column: usize,
        expected: String,
        found: String,
    },

    #[snafu(display("Candidate {candidate:?} is not a catalog id"))]
    CandidateId {
        source: std::num::ParseIntError,
        candidate: String,
    },
    #[snafu(display("Error building the catalog client"))]
    CatalogClient { source: reqwest::Error },
    #[snafu(display("Catalog request to {url} failed"))]
    CatalogRequest { source: reqwest::Error, url: String },
    #[snafu(display("Could not decode the catalog response"))]
    CatalogXml { source: quick_xml::DeError },
    #[snafu(display("Could not decode the catalog response"))]
    CatalogJson { source: serde_json::Error },
    #[snafu(display("Unexpected catalog response: {message}"))]
    CatalogResponse { message: String },

    #[snafu(display("The run was cancelled"))]
    Cancelled {},

    #[snafu(display("Voting error"))]
    Voting { source: VotingErrors },

    #[snafu(display("Invalid run parameters: {message}"))]
    InvalidParameters { message: String },
}

pub type RankResult<T> = Result<T, RankError>;

const RANKING_LAYOUT_COLUMNS: usize = 50;

/// Everything the ranking flow needs, once the command line and the
/// configuration file have been merged.
#[derive(Debug, Clone)]
pub struct RankParams {
    pub source: SheetSource,
    pub period: Period,
    pub top: usize,
    pub batch_size: usize,
}

impl RankParams {
    pub fn resolve(ra: &RankArgs, config: &RunConfig) -> RankResult<RankParams> {
        let period = match (ra.year, ra.month) {
            (Some(year), Some(month)) => Period::Month { year, month },
            (Some(year), None) => Period::Year(year),
            (None, Some(_)) => {
                return InvalidParametersSnafu {
                    message: "--month requires --year",
                }
                .fail()
            }
            (None, None) => Period::TrailingDays(clamp_days(
                ra.days.or(config.days).unwrap_or(DEFAULT_DAYS),
                7,
                500,
            )),
        };
        let top = ra
            .top
            .or(config.top)
            .unwrap_or(DEFAULT_TOP)
            .clamp(1, MAX_TOP);
        Ok(RankParams {
            source: sheet_source(&ra.sheet, config)?,
            period,
            top,
            batch_size: config.batch_size(),
        })
    }
}

fn clamp_days(days: u32, min: u32, max: u32) -> u32 {
    if days < min || days > max {
        warn!("days {} outside of [{}, {}], clamping", days, min, max);
    }
    days.clamp(min, max)
}

pub(crate) fn sheet_source(sa: &SheetArgs, config: &RunConfig) -> RankResult<SheetSource> {
    if let Some(path) = &sa.input {
        return Ok(SheetSource::File { path: path.clone() });
    }
    let document = sa
        .document_id
        .clone()
        .or_else(|| config.document_id.clone())
        .filter(|d| !d.is_empty())
        .context(InvalidParametersSnafu {
            message: "a document id (--document-id or DOCUMENT_ID) or an --input file is required",
        })?;
    let page = sa.page_id.or(config.page_id).unwrap_or(0);
    Ok(SheetSource::Remote {
        url: sheet_url(&config.sheet_url_template(), &document, page),
    })
}

/// Runs the whole ranking flow and returns the commands to emit.
pub async fn run_ranking(
    params: &RankParams,
    client: &reqwest::Client,
    catalog: &dyn CatalogLookup,
    now: DateTime<Utc>,
    shutdown: &Shutdown,
) -> RankResult<Vec<Command>> {
    let text = params.source.read_text(client, shutdown).await?;
    rank_sheet(&text, params, catalog, now, shutdown).await
}

/// The ranking flow past the fetch: parse, filter, rank, select, enrich, build.
pub async fn rank_sheet(
    text: &str,
    params: &RankParams,
    catalog: &dyn CatalogLookup,
    now: DateTime<Utc>,
    shutdown: &Shutdown,
) -> RankResult<Vec<Command>> {
    let sheet = parse_sheet(text.as_bytes(), &SheetLayout::ranks(RANKING_LAYOUT_COLUMNS))?;
    let window = params.period.window(now)?;
    let rows = window.filter(&sheet.rows);
    info!(
        "rank_sheet: {} of {} rows inside {:?}",
        rows.len(),
        sheet.rows.len(),
        window
    );

    let candidates = discover_candidates(&rows);
    let ballots: Vec<Ballot> = rows.iter().map(|row| row_to_ballot(row)).collect();
    let result = run_schulze(&candidates, &ballots).context(VotingSnafu {})?;

    let selected = result.top(params.top);
    debug!("rank_sheet: selected {} candidates", selected.len());

    let enriched = enrich(catalog, selected, params.batch_size, shutdown).await?;
    Ok(ranking_commands(
        &params.period.worksheet_title(now),
        &enriched,
    ))
}

/// Commands creating one worksheet holding the ranking table.
///
/// An empty ranking only produces the placeholder command.
pub fn ranking_commands(title: &str, rows: &[EnrichedRow]) -> Vec<Command> {
    if rows.is_empty() {
        info!("ranking_commands: nothing to write");
        return vec![placeholder()];
    }
    let data = ranking_table(rows);
    vec![
        Command::add_worksheet(title),
        Command::update_data(title, &table_range(title, data.len()), data),
    ]
}

/// Entry point for every subcommand. The returned string is only printed if
/// the whole run succeeded.
pub async fn run_command(args: &Args, shutdown: &Shutdown) -> RankResult<String> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => RunConfig::default(),
    };
    debug!("run_command: config: {:?}", config);

    let settings = CatalogSettings::resolve(&config, args.token.clone());
    let catalog = BggCatalog::new(&settings)?;
    let client = reqwest::Client::builder()
        .timeout(settings.timeout)
        .build()
        .context(CatalogClientSnafu {})?;
    let now = Utc::now();

    let commands = match &args.command {
        CliCommand::Rank(ra) => {
            let params = RankParams::resolve(ra, &config)?;
            info!("run_command: ranking with {:?}", params);
            run_ranking(&params, &client, &catalog, now, shutdown).await?
        }
        CliCommand::Hotness => {
            hotness::run_hotness(&catalog, config.batch_size(), now, shutdown).await?
        }
        CliCommand::Cleanup(ca) => {
            let params = cleanup_params(ca, &config)?;
            cleanup::run_cleanup(&params, &client, now, shutdown).await?
        }
    };

    // Nothing is emitted if the shutdown arrived after the last remote call.
    shutdown.check()?;
    let delimiter = sha256::digest(format!("{:?}", Utc::now()));
    render_output(&commands, &delimiter)
}

fn cleanup_params(ca: &CleanupArgs, config: &RunConfig) -> RankResult<cleanup::CleanupParams> {
    Ok(cleanup::CleanupParams {
        source: sheet_source(&ca.sheet, config)?,
        days: clamp_days(ca.days.or(config.days).unwrap_or(DEFAULT_DAYS), 7, 90),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::catalog::CatalogItem;
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every lookup with `Game <id>` and records the requested batches.
    #[derive(Default)]
    pub struct FakeCatalog {
        pub calls: Mutex<Vec<Vec<u64>>>,
    }

    impl FakeCatalog {
        pub fn calls(&self) -> Vec<Vec<u64>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogLookup for FakeCatalog {
        async fn things(&self, ids: &[u64]) -> RankResult<Vec<CatalogItem>> {
            self.calls.lock().unwrap().push(ids.to_vec());
            Ok(ids
                .iter()
                .map(|id| CatalogItem {
                    id: *id,
                    name: format!("Game {}", id),
                })
                .collect())
        }
    }

    pub fn header(extra: &[&str]) -> String {
        let mut cols: Vec<String> = vec!["Date".to_string()];
        cols.extend((1..=50).map(|i| i.to_string()));
        cols.extend(extra.iter().map(|s| s.to_string()));
        cols.join(",")
    }

    /// A sheet line with the given choices, padded to the 50 rank columns.
    pub fn line(date: &str, choices: &[&str], extra: &[&str]) -> String {
        let mut cols: Vec<String> = vec![date.to_string()];
        cols.extend(choices.iter().map(|s| s.to_string()));
        cols.resize(51, "".to_string());
        cols.extend(extra.iter().map(|s| s.to_string()));
        cols.join(",")
    }
}
