use log::debug;
use std::fs;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::rank::{OpeningJsonSnafu, ParsingJsonSnafu, RankResult};

pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_SHEET_URL_TEMPLATE: &str = "http://spreadsheets.google.com/feeds/download/spreadsheets/Export?key={document}&exportFormat=csv&gid={page}";
pub const DEFAULT_CATALOG_API: &str = "https://boardgamegeek.com/xmlapi2";
pub const DEFAULT_HOTNESS_URL: &str =
    "https://api.geekdo.com/api/hotness?geeksite=boardgame&objecttype=thing&showcount={count}";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(rename = "apiBase")]
    pub api_base: Option<String>,
    #[serde(rename = "hotnessUrl")]
    pub hotness_url: Option<String>,
    pub token: Option<String>,
    #[serde(rename = "timeoutMs")]
    pub timeout_ms: Option<u64>,
}

/// The optional configuration file. Every field may be omitted.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "documentId")]
    pub document_id: Option<String>,
    #[serde(rename = "pageId")]
    pub page_id: Option<u32>,
    pub days: Option<u32>,
    pub top: Option<usize>,
    #[serde(rename = "batchSize")]
    pub batch_size: Option<usize>,
    #[serde(rename = "sheetUrlTemplate")]
    pub sheet_url_template: Option<String>,
    pub catalog: Option<CatalogConfig>,
}

impl RunConfig {
    pub fn batch_size(&self) -> usize {
        self.batch_size
            .filter(|b| *b > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn sheet_url_template(&self) -> String {
        self.sheet_url_template
            .clone()
            .unwrap_or_else(|| DEFAULT_SHEET_URL_TEMPLATE.to_string())
    }

    pub fn catalog(&self) -> CatalogConfig {
        self.catalog.clone().unwrap_or_default()
    }
}

pub fn read_config(path: &str) -> RankResult<RunConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> RankResult<RunConfig> {
    let config: RunConfig = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    debug!("parse_config: {:?}", config);
    Ok(config)
}

/// Fills the `{document}` and `{page}` placeholders of the export locator.
pub fn sheet_url(template: &str, document: &str, page: u32) -> String {
    template
        .replace("{document}", document)
        .replace("{page}", &page.to_string())
}
