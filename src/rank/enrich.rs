//! Attaches catalog names to the selected candidates.

use log::{debug, info};

use schulze_voting::RankedCandidate;
use snafu::prelude::*;

use crate::rank::catalog::{CatalogItem, CatalogLookup};
use crate::rank::shutdown::Shutdown;
use crate::rank::{CandidateIdSnafu, CatalogResponseSnafu, RankResult};

pub const GAME_LINK_PREFIX: &str = "https://boardgamegeek.com/boardgame/";

/// One line of the ranking table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EnrichedRow {
    /// 1-based position in the whole ranking.
    pub rank: usize,
    pub id: u64,
    pub wins: u32,
    pub link: String,
    pub name: String,
}

impl EnrichedRow {
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.rank.to_string(),
            self.id.to_string(),
            self.wins.to_string(),
            self.link.clone(),
            self.name.clone(),
        ]
    }
}

pub fn game_link(id: u64) -> String {
    format!("{}{}/", GAME_LINK_PREFIX, id)
}

/// The table written to the worksheet: a header line, then one line per row.
pub fn ranking_table(rows: &[EnrichedRow]) -> Vec<Vec<String>> {
    let mut res: Vec<Vec<String>> = vec![["Rank", "BGGID", "Wins", "Link", "Name"]
        .iter()
        .map(|s| s.to_string())
        .collect()];
    res.extend(rows.iter().map(|r| r.to_cells()));
    res
}

/// Consecutive slices of at most `max` elements. The last one may be shorter.
pub fn split_batches<T>(items: &[T], max: usize) -> Vec<&[T]> {
    items.chunks(max.max(1)).collect()
}

/// Candidate names are catalog ids. All of them are checked before any lookup.
pub fn parse_candidate_ids(selected: &[RankedCandidate]) -> RankResult<Vec<u64>> {
    selected
        .iter()
        .map(|c| {
            c.name.trim().parse::<u64>().context(CandidateIdSnafu {
                candidate: c.name.clone(),
            })
        })
        .collect()
}

/// Looks ids up one batch at a time, never more than one call in flight.
///
/// The result has exactly one item per id, in the order of `ids`.
pub async fn lookup_in_batches(
    catalog: &dyn CatalogLookup,
    ids: &[u64],
    batch_size: usize,
    shutdown: &Shutdown,
) -> RankResult<Vec<CatalogItem>> {
    let batches = split_batches(ids, batch_size);
    let mut res: Vec<CatalogItem> = Vec::with_capacity(ids.len());
    for (idx, batch) in batches.iter().enumerate() {
        debug!(
            "lookup_in_batches: batch {}/{}: {} ids",
            idx + 1,
            batches.len(),
            batch.len()
        );
        let items = shutdown.guard(catalog.things(batch)).await?;
        ensure!(
            items.len() == batch.len(),
            CatalogResponseSnafu {
                message: format!(
                    "asked for {} items, received {}",
                    batch.len(),
                    items.len()
                ),
            }
        );
        res.extend(items);
    }
    Ok(res)
}

/// Resolves the selected candidates into table rows, keeping their order.
pub async fn enrich(
    catalog: &dyn CatalogLookup,
    selected: &[RankedCandidate],
    batch_size: usize,
    shutdown: &Shutdown,
) -> RankResult<Vec<EnrichedRow>> {
    if selected.is_empty() {
        return Ok(vec![]);
    }
    let ids = parse_candidate_ids(selected)?;
    let items = lookup_in_batches(catalog, &ids, batch_size, shutdown).await?;
    info!("enrich: resolved {} candidates", items.len());

    // The catalog may answer with the canonical id of a renamed or merged game.
    Ok(selected
        .iter()
        .zip(items.into_iter())
        .enumerate()
        .map(|(idx, (cand, item))| EnrichedRow {
            rank: idx + 1,
            id: item.id,
            wins: cand.wins,
            link: game_link(item.id),
            name: item.name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::test_support::FakeCatalog;
    use crate::rank::RankError;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::watch;

    fn candidates(names: &[String]) -> Vec<RankedCandidate> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| RankedCandidate {
                name: name.clone(),
                index,
                wins: (names.len() - index - 1) as u32,
            })
            .collect()
    }

    #[test]
    fn batches_keep_order() {
        let items: Vec<u32> = (0..45).collect();
        let batches = split_batches(&items, 20);
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
        assert_eq!(batches[2][0], 40);
        assert!(split_batches(&items[..0], 20).is_empty());
        assert_eq!(split_batches(&items[..3], 0).len(), 3);
    }

    #[test]
    fn table_layout() {
        let rows = vec![EnrichedRow {
            rank: 1,
            id: 13,
            wins: 4,
            link: game_link(13),
            name: "CATAN".to_string(),
        }];
        let t = ranking_table(&rows);
        assert_eq!(t.len(), 2);
        assert_eq!(t[0], vec!["Rank", "BGGID", "Wins", "Link", "Name"]);
        assert_eq!(
            t[1],
            vec!["1", "13", "4", "https://boardgamegeek.com/boardgame/13/", "CATAN"]
        );
    }

    #[tokio::test]
    async fn forty_five_candidates_take_three_calls() {
        let names: Vec<String> = (100..145).map(|i| i.to_string()).collect();
        let selected = candidates(&names);
        let catalog = FakeCatalog::default();
        let (_tx, shutdown) = Shutdown::channel();
        let rows = enrich(&catalog, &selected, 20, &shutdown).await.unwrap();

        let sizes: Vec<usize> = catalog.calls().iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
        assert_eq!(rows.len(), 45);
        for (idx, row) in rows.iter().enumerate() {
            assert_eq!(row.rank, idx + 1);
            assert_eq!(row.id, 100 + idx as u64);
            assert_eq!(row.name, format!("Game {}", 100 + idx));
        }
        // Ranks continue across batches.
        assert_eq!(rows[20].rank, 21);
        assert_eq!(rows[44].wins, 0);
    }

    #[tokio::test]
    async fn nothing_selected_no_call() {
        let catalog = FakeCatalog::default();
        let (_tx, shutdown) = Shutdown::channel();
        let rows = enrich(&catalog, &[], 20, &shutdown).await.unwrap();
        assert!(rows.is_empty());
        assert!(catalog.calls().is_empty());
    }

    #[tokio::test]
    async fn bad_id_fails_before_any_call() {
        let names = vec!["13".to_string(), "822".to_string(), "x1".to_string()];
        let catalog = FakeCatalog::default();
        let (_tx, shutdown) = Shutdown::channel();
        let res = enrich(&catalog, &candidates(&names), 2, &shutdown).await;
        match res {
            Err(RankError::CandidateId { candidate, .. }) => assert_eq!(candidate, "x1"),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(catalog.calls().is_empty());
    }

    #[tokio::test]
    async fn cancelled_before_the_first_call() {
        let names = vec!["13".to_string()];
        let catalog = FakeCatalog::default();
        let (tx, shutdown) = Shutdown::channel();
        tx.send(true).unwrap();
        let res = enrich(&catalog, &candidates(&names), 20, &shutdown).await;
        assert!(matches!(res, Err(RankError::Cancelled {})));
        assert!(catalog.calls().is_empty());
    }

    /// Never answers; flips the shutdown switch on its first call.
    struct StuckCatalog {
        trigger: watch::Sender<bool>,
    }

    #[async_trait]
    impl CatalogLookup for StuckCatalog {
        async fn things(&self, _ids: &[u64]) -> RankResult<Vec<CatalogItem>> {
            let _ = self.trigger.send(true);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn cancelled_while_in_flight() {
        let names = vec!["13".to_string(), "822".to_string()];
        let (tx, shutdown) = Shutdown::channel();
        let catalog = StuckCatalog { trigger: tx };
        let res = enrich(&catalog, &candidates(&names), 1, &shutdown).await;
        assert!(matches!(res, Err(RankError::Cancelled {})));
    }

    /// Answers with the canonical id `1000 + id`.
    struct CanonicalCatalog {}

    #[async_trait]
    impl CatalogLookup for CanonicalCatalog {
        async fn things(&self, ids: &[u64]) -> RankResult<Vec<CatalogItem>> {
            Ok(ids
                .iter()
                .map(|id| CatalogItem {
                    id: 1000 + id,
                    name: format!("Game {}", 1000 + id),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn rows_use_the_canonical_id() {
        let names = vec!["1".to_string(), "2".to_string()];
        let (_tx, shutdown) = Shutdown::channel();
        let rows = enrich(&CanonicalCatalog {}, &candidates(&names), 20, &shutdown)
            .await
            .unwrap();
        assert_eq!(rows[0].id, 1001);
        assert_eq!(rows[0].link, "https://boardgamegeek.com/boardgame/1001/");
        assert_eq!(rows[0].name, "Game 1001");
        assert_eq!(rows[1].id, 1002);
        assert_eq!(rows[1].rank, 2);
    }

    /// Drops the last item of every answer.
    struct ShortCatalog {}

    #[async_trait]
    impl CatalogLookup for ShortCatalog {
        async fn things(&self, ids: &[u64]) -> RankResult<Vec<CatalogItem>> {
            Ok(ids[..ids.len() - 1]
                .iter()
                .map(|id| CatalogItem {
                    id: *id,
                    name: "short".to_string(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn short_answer_is_an_error() {
        let names = vec!["13".to_string(), "822".to_string()];
        let (_tx, shutdown) = Shutdown::channel();
        let res = enrich(&ShortCatalog {}, &candidates(&names), 20, &shutdown).await;
        assert!(matches!(res, Err(RankError::CatalogResponse { .. })));
    }
}
