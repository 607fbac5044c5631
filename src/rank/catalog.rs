//! The remote game catalog (BoardGameGeek).

use log::{debug, info, warn};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::rank::config_reader::*;
use crate::rank::{
    CatalogClientSnafu, CatalogJsonSnafu, CatalogRequestSnafu, CatalogResponseSnafu,
    CatalogXmlSnafu, RankResult,
};

/// The canonical id and display name of a game.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CatalogItem {
    pub id: u64,
    pub name: String,
}

/// An entry of the hotness list.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HotItem {
    pub id: u64,
    pub name: String,
    /// Movement since the previous list.
    pub delta: i64,
}

#[async_trait]
pub trait CatalogLookup {
    /// Resolves a bounded number of ids. Items are returned in request order.
    async fn things(&self, ids: &[u64]) -> RankResult<Vec<CatalogItem>>;
}

/// Connection settings, after merging the configuration file and the command line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CatalogSettings {
    pub api_base: String,
    pub hotness_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl CatalogSettings {
    pub fn resolve(config: &RunConfig, token: Option<String>) -> CatalogSettings {
        let cc = config.catalog();
        CatalogSettings {
            api_base: cc
                .api_base
                .unwrap_or_else(|| DEFAULT_CATALOG_API.to_string())
                .trim_end_matches('/')
                .to_string(),
            hotness_url: cc
                .hotness_url
                .unwrap_or_else(|| DEFAULT_HOTNESS_URL.to_string()),
            token: token.or(cc.token).filter(|t| !t.is_empty()),
            timeout: Duration::from_millis(cc.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
        }
    }
}

pub struct BggCatalog {
    client: reqwest::Client,
    settings: CatalogSettings,
}

impl BggCatalog {
    pub fn new(settings: &CatalogSettings) -> RankResult<BggCatalog> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context(CatalogClientSnafu {})?;
        if settings.token.is_none() {
            info!("BggCatalog: no token configured, using unauthenticated requests");
        }
        Ok(BggCatalog {
            client,
            settings: settings.clone(),
        })
    }

    async fn get_text(&self, url: &str) -> RankResult<String> {
        let mut req = self.client.get(url);
        if let Some(token) = &self.settings.token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let res = req
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .context(CatalogRequestSnafu { url })?;
        res.text().await.context(CatalogRequestSnafu { url })
    }

    /// The current hotness list, at most `count` entries, best first.
    pub async fn hot_items(&self, count: usize) -> RankResult<Vec<HotItem>> {
        let url = self
            .settings
            .hotness_url
            .replace("{count}", &count.to_string());
        let body = self.get_text(&url).await?;
        let mut items = parse_hotness(&body)?;
        items.truncate(count);
        Ok(items)
    }
}

#[async_trait]
impl CatalogLookup for BggCatalog {
    async fn things(&self, ids: &[u64]) -> RankResult<Vec<CatalogItem>> {
        let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let url = format!("{}/thing?id={}", self.settings.api_base, joined.join(","));
        debug!("BggCatalog::things: {}", url);
        let body = self.get_text(&url).await?;
        parse_things(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ThingsXml {
    #[serde(rename = "item", default)]
    items: Vec<ThingXml>,
}

#[derive(Debug, Deserialize)]
struct ThingXml {
    #[serde(rename = "@id")]
    id: u64,
    #[serde(rename = "name", default)]
    names: Vec<NameXml>,
}

#[derive(Debug, Deserialize)]
struct NameXml {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(rename = "@value")]
    value: String,
}

/// Reads a `thing` response. Items keep the order of the document.
pub fn parse_things(body: &str) -> RankResult<Vec<CatalogItem>> {
    let doc: ThingsXml = quick_xml::de::from_str(body).context(CatalogXmlSnafu {})?;
    Ok(doc
        .items
        .into_iter()
        .map(|thing| {
            let primary = thing
                .names
                .iter()
                .find(|n| n.kind == "primary")
                .or_else(|| thing.names.first());
            let name = match primary {
                Some(n) => n.value.clone(),
                None => {
                    warn!("parse_things: item {} has no name", thing.id);
                    String::new()
                }
            };
            CatalogItem { id: thing.id, name }
        })
        .collect())
}

/// Reads a hotness response: `{"items": [{"objectid": .., "name": .., "delta": ..}]}`.
pub fn parse_hotness(body: &str) -> RankResult<Vec<HotItem>> {
    let json: JSValue = serde_json::from_str(body).context(CatalogJsonSnafu {})?;
    let items = json
        .get("items")
        .and_then(|v| v.as_array())
        .context(CatalogResponseSnafu {
            message: "hotness response is missing the items array",
        })?;

    let mut res: Vec<HotItem> = Vec::with_capacity(items.len());
    for item in items {
        let id = item
            .get("objectid")
            .or_else(|| item.get("id"))
            .and_then(read_json_u64)
            .context(CatalogResponseSnafu {
                message: format!("hotness item without an id: {}", item),
            })?;
        let name = item
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let delta = item.get("delta").and_then(read_json_i64).unwrap_or(0);
        res.push(HotItem { id, name, delta });
    }
    Ok(res)
}

fn read_json_u64(x: &JSValue) -> Option<u64> {
    match x {
        JSValue::Number(n) => n.as_u64(),
        JSValue::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn read_json_i64(x: &JSValue) -> Option<i64> {
    match x {
        JSValue::Number(n) => n.as_i64(),
        JSValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
