/*!
Schulze (beatpath) ranking.

The entry point is [`run_schulze`], or the [`builder::Builder`] for collecting
ballots incrementally. See the [`manual`] for the conventions used when
ballots are incomplete and when candidates cannot be separated.
*/
pub mod builder;
mod config;
pub mod manual;

use log::{debug, info, warn};

use std::collections::HashMap;

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(usize);

// A ballot resolved against the candidate index. Only ranked candidates are kept.
#[derive(Eq, PartialEq, Debug, Clone)]
struct BallotInternal {
    ranks: Vec<(CandidateId, u32)>,
}

/// Ranks the candidates with the Schulze method.
///
/// Arguments:
/// * `candidates` the candidates, in the order used to break ties. Names must be unique.
/// * `ballots` the ballots. Every name they rank must be in `candidates`.
///
/// The result contains every candidate exactly once. Candidates are ordered by
/// decreasing number of wins, and candidates with the same number of wins keep
/// the order of `candidates`.
pub fn run_schulze(
    candidates: &[String],
    ballots: &[Ballot],
) -> Result<RankingResult, VotingErrors> {
    info!(
        "run_schulze: Processing {:?} ballots over {:?} candidates",
        ballots.len(),
        candidates.len()
    );

    let index = candidate_index(candidates)?;
    let checked = checks(ballots, &index)?;
    debug!("run_schulze: {:?} ballots with at least one ranking", checked.len());

    let preferences = compute_preferences(&checked, candidates.len());
    let strengths = compute_strongest_paths(&preferences);
    let ranking = order_candidates(candidates, &strengths);

    let tied_at_top = match ranking.as_slice() {
        [first, second, ..] => {
            strengths.get(first.index, second.index) <= strengths.get(second.index, first.index)
        }
        _ => false,
    };
    if tied_at_top {
        warn!(
            "run_schulze: {:?} and {:?} are tied, the tie is broken by candidate order",
            ranking[0].name, ranking[1].name
        );
    }

    for (pos, rc) in ranking.iter().enumerate() {
        debug!("run_schulze: {:>4} {} ({} wins)", pos + 1, rc.name, rc.wins);
    }

    Ok(RankingResult {
        ranking,
        preferences,
        strengths,
        tied_at_top,
    })
}

fn candidate_index(candidates: &[String]) -> Result<HashMap<&str, CandidateId>, VotingErrors> {
    let mut index: HashMap<&str, CandidateId> = HashMap::new();
    for (idx, name) in candidates.iter().enumerate() {
        if index.insert(name.as_str(), CandidateId(idx)).is_some() {
            return Err(VotingErrors::DuplicateCandidate(name.clone()));
        }
    }
    Ok(index)
}

// Resolves the names of the ballots. Empty ballots carry no preference and are dropped.
fn checks(
    ballots: &[Ballot],
    index: &HashMap<&str, CandidateId>,
) -> Result<Vec<BallotInternal>, VotingErrors> {
    let mut res: Vec<BallotInternal> = Vec::new();
    for ballot in ballots.iter() {
        let mut ranks: Vec<(CandidateId, u32)> = Vec::with_capacity(ballot.len());
        for (name, rank) in ballot.iter() {
            let cid = index
                .get(name.as_str())
                .ok_or_else(|| VotingErrors::UnknownCandidate(name.clone()))?;
            // Ballot only holds ranks >= 1.
            ranks.push((*cid, *rank));
        }
        if !ranks.is_empty() {
            res.push(BallotInternal { ranks });
        }
    }
    Ok(res)
}

// Cell (a, b): number of ballots ranking a strictly better than b. Both must be ranked.
fn compute_preferences(ballots: &[BallotInternal], size: usize) -> PairwiseMatrix {
    let mut d = PairwiseMatrix::new(size);
    for ballot in ballots.iter() {
        for (a, rank_a) in ballot.ranks.iter() {
            for (b, rank_b) in ballot.ranks.iter() {
                if rank_a < rank_b {
                    d.incr(a.0, b.0);
                }
            }
        }
    }
    d
}

// Widest path closure over the defeat graph.
fn compute_strongest_paths(d: &PairwiseMatrix) -> PairwiseMatrix {
    let size = d.size();
    let mut p = PairwiseMatrix::new(size);
    for i in 0..size {
        for j in 0..size {
            if i != j && d.get(i, j) > d.get(j, i) {
                p.set(i, j, d.get(i, j));
            }
        }
    }

    for k in 0..size {
        for i in 0..size {
            if i == k {
                continue;
            }
            for j in 0..size {
                if j == i || j == k {
                    continue;
                }
                let through_k = p.get(i, k).min(p.get(k, j));
                if through_k > p.get(i, j) {
                    p.set(i, j, through_k);
                }
            }
        }
    }
    p
}

fn order_candidates(candidates: &[String], p: &PairwiseMatrix) -> Vec<RankedCandidate> {
    let size = candidates.len();
    let mut res: Vec<RankedCandidate> = candidates
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let wins = (0..size)
                .filter(|&j| j != i && p.get(i, j) > p.get(j, i))
                .count() as u32;
            RankedCandidate {
                name: name.clone(),
                index: i,
                wins,
            }
        })
        .collect();
    // Stable: equal win counts keep the candidate order.
    res.sort_by(|a, b| b.wins.cmp(&a.wins));
    res
}
