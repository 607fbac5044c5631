// ********* Input data structures ***********

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// The ranked preferences of one voter.
///
/// A ballot maps a candidate name to a positive rank (1 is the most preferred).
/// Candidates that do not appear in a ballot are unranked: they are neither
/// preferred nor dispreferred to anyone by this ballot. In particular, they are
/// *not* treated as being ranked last.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Ballot {
    ranks: BTreeMap<String, u32>,
}

impl Ballot {
    pub fn new() -> Ballot {
        Ballot::default()
    }

    /// Builds a ballot from choices listed in order of preference.
    ///
    /// Every non-empty choice receives its 1-based position among the
    /// non-empty choices. Empty strings are skipped and do not consume a
    /// position. If a name appears more than once, its first (best) position
    /// is kept.
    ///
    /// ```
    /// use schulze_voting::Ballot;
    ///
    /// let b = Ballot::from_ordered_choices(&["", "13", "", "822", "13"]);
    /// assert_eq!(b.rank_of("13"), Some(1));
    /// assert_eq!(b.rank_of("822"), Some(2));
    /// assert_eq!(b.len(), 2);
    /// ```
    pub fn from_ordered_choices<S: AsRef<str>>(choices: &[S]) -> Ballot {
        let mut ranks: BTreeMap<String, u32> = BTreeMap::new();
        let mut position: u32 = 0;
        for choice in choices.iter().map(|c| c.as_ref().trim()) {
            if choice.is_empty() {
                continue;
            }
            position += 1;
            ranks.entry(choice.to_string()).or_insert(position);
        }
        Ballot { ranks }
    }

    /// Sets the rank of a candidate. Ranks start at 1.
    pub fn insert(&mut self, candidate: &str, rank: u32) -> Result<(), VotingErrors> {
        if rank == 0 {
            return Err(VotingErrors::InvalidRank {
                candidate: candidate.to_string(),
                rank,
            });
        }
        self.ranks.insert(candidate.to_string(), rank);
        Ok(())
    }

    pub fn rank_of(&self, candidate: &str) -> Option<u32> {
        self.ranks.get(candidate).cloned()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, u32> {
        self.ranks.iter()
    }
}

// ******** Output data structures *********

/// A square matrix of counts indexed by candidate position.
///
/// Cell `(a, b)` refers to candidate `a` against candidate `b`, where the
/// positions are those of the candidate list given to the ranker.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairwiseMatrix {
    size: usize,
    cells: Vec<u64>,
}

impl PairwiseMatrix {
    pub(crate) fn new(size: usize) -> PairwiseMatrix {
        PairwiseMatrix {
            size,
            cells: vec![0; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, a: usize, b: usize) -> u64 {
        self.cells[a * self.size + b]
    }

    pub(crate) fn set(&mut self, a: usize, b: usize, value: u64) {
        self.cells[a * self.size + b] = value;
    }

    pub(crate) fn incr(&mut self, a: usize, b: usize) {
        self.cells[a * self.size + b] += 1;
    }
}

/// One entry of the final order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedCandidate {
    pub name: String,
    /// Position of the candidate in the input candidate list.
    pub index: usize,
    /// Number of other candidates this candidate strictly beats on strongest paths.
    pub wins: u32,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankingResult {
    /// All the candidates, best first.
    pub ranking: Vec<RankedCandidate>,
    /// Number of ballots preferring `a` over `b`.
    pub preferences: PairwiseMatrix,
    /// Strength of the strongest path from `a` to `b`.
    pub strengths: PairwiseMatrix,
    /// True when the first two candidates could only be separated by the tie-break.
    pub tied_at_top: bool,
}

impl RankingResult {
    /// The first `count` entries of the ranking (all of them if fewer exist).
    pub fn top(&self, count: usize) -> &[RankedCandidate] {
        &self.ranking[..count.min(self.ranking.len())]
    }
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    /// A ballot ranks a name that is not part of the candidate list.
    UnknownCandidate(String),
    /// The candidate list contains the same name twice.
    DuplicateCandidate(String),
    InvalidRank { candidate: String, rank: u32 },
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::UnknownCandidate(name) => {
                write!(f, "ballot ranks unknown candidate {:?}", name)
            }
            VotingErrors::DuplicateCandidate(name) => {
                write!(f, "candidate {:?} is declared more than once", name)
            }
            VotingErrors::InvalidRank { candidate, rank } => {
                write!(f, "invalid rank {} for candidate {:?}", rank, candidate)
            }
        }
    }
}
