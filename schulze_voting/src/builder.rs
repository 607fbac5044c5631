pub use crate::config::*;

use std::collections::HashSet;

/// A builder for collecting ballots before running the ranking.
///
/// The candidate list is fixed up front; every ballot added later is checked
/// against it.
///
/// ```
/// pub use schulze_voting::builder::Builder;
/// # use schulze_voting::VotingErrors;
///
/// let mut builder = Builder::new()
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ranking(&["Anna".to_string(), "".to_string(), "Bob".to_string()])?;
/// builder.add_ranking(&["Bob".to_string()])?;
/// builder.add_ranking(&["Anna".to_string(), "Bob".to_string()])?;
///
/// let result = builder.run()?;
/// assert_eq!(result.ranking[0].name, "Anna");
///
/// # Ok::<(), VotingErrors>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    pub(crate) _candidates: Vec<String>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn candidates(self, cands: &[String]) -> Result<Builder, VotingErrors> {
        let mut seen: HashSet<&str> = HashSet::new();
        for name in cands.iter() {
            if !seen.insert(name.as_str()) {
                return Err(VotingErrors::DuplicateCandidate(name.clone()));
            }
        }
        Ok(Builder {
            _candidates: cands.to_vec(),
            _ballots: self._ballots,
        })
    }

    /// Adds a ballot given as a list of choices in order of preference.
    ///
    /// Empty choices are skipped, see [`Ballot::from_ordered_choices`].
    pub fn add_ranking(&mut self, choices: &[String]) -> Result<(), VotingErrors> {
        self.add_ballot(Ballot::from_ordered_choices(choices))
    }

    pub fn add_ballot(&mut self, ballot: Ballot) -> Result<(), VotingErrors> {
        if let Some((name, _)) = ballot
            .iter()
            .find(|(name, _)| !self._candidates.contains(name))
        {
            return Err(VotingErrors::UnknownCandidate(name.clone()));
        }
        self._ballots.push(ballot);
        Ok(())
    }

    pub fn num_ballots(&self) -> usize {
        self._ballots.len()
    }

    pub fn run(&self) -> Result<RankingResult, VotingErrors> {
        crate::run_schulze(&self._candidates, &self._ballots)
    }
}
