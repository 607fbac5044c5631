use log::info;

use chrono::{DateTime, Utc};

use crate::rank::catalog::{BggCatalog, CatalogItem, HotItem};
use crate::rank::commands::{placeholder, table_range, Command, AGGREGATE_WORKSHEET};
use crate::rank::enrich::{game_link, lookup_in_batches};
use crate::rank::shutdown::Shutdown;
use crate::rank::RankResult;

/// The length of the hotness list, and of each row appended to the aggregate.
pub const HOT_LIST_SIZE: usize = 50;

/// Snapshots the hotness list: a dated worksheet with the list, and one row
/// appended to the aggregate worksheet that later runs read as a ballot.
pub async fn run_hotness(
    catalog: &BggCatalog,
    batch_size: usize,
    now: DateTime<Utc>,
    shutdown: &Shutdown,
) -> RankResult<Vec<Command>> {
    let hot = shutdown.guard(catalog.hot_items(HOT_LIST_SIZE)).await?;
    info!("run_hotness: {} hot items", hot.len());
    if hot.is_empty() {
        return Ok(hotness_commands(&[], &[], now));
    }
    let ids: Vec<u64> = hot.iter().map(|h| h.id).collect();
    let things = lookup_in_batches(catalog, &ids, batch_size, shutdown).await?;
    Ok(hotness_commands(&hot, &things, now))
}

/// `things` holds the catalog entries of `hot`, in the same order.
pub fn hotness_commands(hot: &[HotItem], things: &[CatalogItem], now: DateTime<Utc>) -> Vec<Command> {
    if hot.is_empty() {
        return vec![placeholder()];
    }
    let today = now.format("%Y-%m-%d").to_string();

    let mut data: Vec<Vec<String>> = vec![["Rank", "BGGID", "Change", "Link", "Name"]
        .iter()
        .map(|s| s.to_string())
        .collect()];
    let mut aggregate: Vec<String> = vec![today.clone()];
    for (idx, (item, thing)) in hot.iter().zip(things.iter()).enumerate() {
        data.push(vec![
            (idx + 1).to_string(),
            item.id.to_string(),
            item.delta.to_string(),
            game_link(item.id),
            thing.name.clone(),
        ]);
        aggregate.push(item.id.to_string());
    }

    vec![
        Command::add_worksheet(&today),
        Command::update_data(&today, &table_range(&today, data.len()), data),
        Command::append_data(AGGREGATE_WORKSHEET, vec![aggregate]),
    ]
}
