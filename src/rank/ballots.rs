use log::debug;
use std::collections::HashSet;

use schulze_voting::Ballot;

use crate::rank::io_sheet::SheetRow;

/// All the distinct names found in the rank columns of the rows.
///
/// Names are returned in the order in which they are first seen, row by row and
/// then column by column. The ranking uses this order to break ties, so it must
/// not depend on anything but the rows. Empty cells are not candidates.
pub fn discover_candidates(rows: &[&SheetRow]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for row in rows.iter() {
        for choice in row.choices.iter().map(|c| c.trim()) {
            if !choice.is_empty() && seen.insert(choice) {
                res.push(choice.to_string());
            }
        }
    }
    debug!("discover_candidates: {} candidates", res.len());
    res
}

/// The ballot of one row: each named candidate gets its position among the
/// non-empty cells. Candidates the row does not name stay unranked.
pub fn row_to_ballot(row: &SheetRow) -> Ballot {
    let ballot = Ballot::from_ordered_choices(&row.choices);
    debug!(
        "row_to_ballot: line {}: {} ranked candidates",
        row.line,
        ballot.len()
    );
    ballot
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(line: usize, choices: &[&str]) -> SheetRow {
        SheetRow {
            line,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            choices: choices.iter().map(|s| s.to_string()).collect(),
            trailing: vec![],
        }
    }

    #[test]
    fn candidates_in_first_seen_order() {
        let rows = vec![row(2, &["822", "", "13"]), row(3, &["13", "9209", " 822 "])];
        let refs: Vec<&SheetRow> = rows.iter().collect();
        assert_eq!(discover_candidates(&refs), vec!["822", "13", "9209"]);
    }

    #[test]
    fn no_rows_no_candidates() {
        assert!(discover_candidates(&[]).is_empty());
        let rows = vec![row(2, &["", ""])];
        let refs: Vec<&SheetRow> = rows.iter().collect();
        assert!(discover_candidates(&refs).is_empty());
    }

    #[test]
    fn positions_skip_blank_cells() {
        let b = row_to_ballot(&row(2, &["", "13", "", "822", ""]));
        assert_eq!(b.rank_of("13"), Some(1));
        assert_eq!(b.rank_of("822"), Some(2));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn absent_candidates_are_unranked() {
        let b = row_to_ballot(&row(2, &["13"]));
        assert_eq!(b.rank_of("822"), None);
    }

    #[test]
    fn repeated_candidate_keeps_its_best_position() {
        let b = row_to_ballot(&row(2, &["13", "822", "13"]));
        assert_eq!(b.rank_of("13"), Some(1));
        assert_eq!(b.rank_of("822"), Some(2));
    }
}
