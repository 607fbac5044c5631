/*!

This is the long-form manual for `schulze_voting` and `gamerank`.

## The ranking method

Ballots are ranked lists of candidates. The ranking follows the Schulze method:

1. For every ordered pair of candidates `(a, b)`, count the ballots that rank
   `a` strictly better than `b`. This is the preference matrix `d`.
2. `a` defeats `b` when `d[a][b] > d[b][a]`. The strength of that defeat is
   `d[a][b]` (the "winning votes" convention).
3. The strength of a path is the strength of its weakest defeat. `p[a][b]` is
   the strength of the strongest path from `a` to `b`, or 0 if there is none.
4. `a` is ranked above `b` when `p[a][b] > p[b][a]`. The number of wins of a
   candidate is the number of other candidates it is ranked above in this sense.

The final order sorts candidates by decreasing number of wins. This order is
compatible with step 4: the Schulze relation is transitive, so a candidate that
beats another also beats everyone that one beats.

## Incomplete ballots

A ballot does not need to rank every candidate.

| ballot        | A over B | B over A | A over C | C over A |
|---------------|----------|----------|----------|----------|
| `A, B`        | 1        |          |          |          |
| `C`           |          |          |          |          |
| `B, , A`      |          | 1        |          |          |

A candidate that does not appear on a ballot is *unranked* on that ballot. An
unranked candidate takes part in no pair for that ballot: it is neither
preferred nor dispreferred to anyone. This is different from ranking it last,
which would give every ranked candidate a preference over it.

Blank positions do not consume a rank: `B, , A` ranks `B` first and `A`
second. When a name is repeated on a ballot, its first position is kept.

## Ties

Two candidates with the same number of wins are kept in the order in which
the candidates were given to the ranker. `gamerank` gives the candidates in the
order in which they are first seen when reading the sheet (row by row, then
column by column), so that running twice over the same sheet always produces
the same output. [`crate::RankingResult::tied_at_top`] reports when the first
place itself was decided this way.

## Degenerate inputs

- No candidate: the ranking is empty. This is not an error.
- One candidate: it is first, with 0 wins.
- No ballot with any preference: all candidates tie and keep their input order.

 */
