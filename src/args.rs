use clap::{Parser, Subcommand};

/// Ranks board games from the ballots collected in a spreadsheet and prints the
/// spreadsheet commands that publish the result.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. Command line options take
    /// precedence over the values in this file.
    #[clap(short, long, value_parser, global = true)]
    pub config: Option<String>,

    /// (optional) The token sent to the catalog API. Without it, requests are
    /// unauthenticated.
    #[clap(long, env = "BGG_TOKEN", hide_env_values = true, value_parser, global = true)]
    pub token: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Ranks the games of the ballot sheet over a period.
    Rank(RankArgs),
    /// Publishes the current hotness list and appends it to the ballot sheet.
    Hotness,
    /// Removes the worksheets of old hotness lists.
    Cleanup(CleanupArgs),
}

/// Where to read the ballot sheet from.
#[derive(clap::Args, Debug, Clone)]
pub struct SheetArgs {
    /// The document id to get the data from.
    #[clap(long, env = "DOCUMENT_ID", value_parser)]
    pub document_id: Option<String>,

    /// (default 0) The page id in the document.
    #[clap(long, value_parser)]
    pub page_id: Option<u32>,

    /// (file path, optional) Reads the sheet from a local CSV file instead of
    /// downloading it.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RankArgs {
    #[clap(flatten)]
    pub sheet: SheetArgs,

    /// (default 14, between 7 and 500) Number of days to get the report for,
    /// counted back from now.
    #[clap(long, value_parser, conflicts_with = "year")]
    pub days: Option<u32>,

    /// Ranks over a calendar year instead of the last days.
    #[clap(long, value_parser)]
    pub year: Option<i32>,

    /// (1-12) Restricts --year to one month.
    #[clap(long, value_parser, requires = "year")]
    pub month: Option<u32>,

    /// (default 50, between 1 and 100) How many games to publish.
    #[clap(long, value_parser)]
    pub top: Option<usize>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CleanupArgs {
    #[clap(flatten)]
    pub sheet: SheetArgs,

    /// (default 14, between 7 and 90) Worksheets older than this number of days are removed.
    #[clap(long, value_parser)]
    pub days: Option<u32>,
}
