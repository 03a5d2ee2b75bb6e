/*!
Statewide summaries of election results reported by county.

The library takes cleaned county-level [`ResultRecord`]s and produces one
[`RaceSummary`] per race: the statewide total of each candidate, their share of
the vote, the winner, the margin of victory and whether the race is tied.

It works in two steps:
- [`builder::Builder`] (or [`builder::group_records`]) groups the records by race
  and by candidate
- [`summarize_race`] (or [`summarize_races`]) reduces each race to its summary

```
use election_summary::*;

let record = |county: &str, party: &str, last: &str, votes: u64| ResultRecord {
    date: "2012-11-06".to_string(),
    office: "President".to_string(),
    office_slug: "president".to_string(),
    district: None,
    county: county.to_string(),
    party: party.to_string(),
    candidate: CandidateName::Split { first: "Joe".to_string(), last: last.to_string() },
    votes,
};
let records = vec![
    record("Arlington", "DEM", "Smith", 2000),
    record("Arlington", "REP", "Doe", 1000),
];

let summaries = tally_records(&records, &TallyRules::DEFAULT_RULES)?;
let president = summaries.values().next().unwrap();
assert_eq!(president.total_votes, 3000);
assert_eq!(president.winner().unwrap().key.name, "Smith, Joe");

# Ok::<(), TallyErrors>(())
```

See the [`manual`] for the details of the rules.
*/

pub mod builder;
mod config;
pub mod manual;

use log::{debug, info};
use rust_decimal::RoundingStrategy;

use std::collections::HashMap;

pub use crate::config::*;
pub use rust_decimal::Decimal;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);

    fn checked_add(self, rhs: VoteCount) -> Option<VoteCount> {
        self.0.checked_add(rhs.0).map(VoteCount)
    }
}

// A candidate reduced to its statewide total.
#[derive(Eq, PartialEq, Debug, Clone)]
struct CandidateTotal {
    key: CandidateKey,
    name: CandidateName,
    votes: VoteCount,
}

/// Computes `part / total` as a percentage, rounded to `decimal_places`.
///
/// Midpoints are rounded away from zero. A zero total yields zero instead of
/// failing.
pub fn percent(part: u64, total: u64, decimal_places: u32) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    let pct = Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(total);
    pct.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
}

/// Summarizes one race.
///
/// Arguments:
/// * `race` the grouped county results of the race
/// * `rules` the rules that govern the summary. Only the number of decimal places
/// is relevant at this stage.
///
/// A race with a single candidate is won by that candidate, without margin.
/// When the two top candidates have the same total, the race is a tie and nobody wins.
pub fn summarize_race(race: RaceAggregate, rules: &TallyRules) -> Result<RaceSummary, TallyErrors> {
    check_decimal_places(rules.decimal_places)?;
    let RaceAggregate {
        key,
        date,
        office_slug,
        candidates,
    } = race;
    debug!(
        "summarize_race: race {}: {} candidates",
        key,
        candidates.len()
    );
    if candidates.is_empty() {
        return Err(TallyErrors::EmptyRace { race: key });
    }

    let mut totals: Vec<CandidateTotal> = Vec::new();
    for (ckey, results) in candidates {
        let votes = statewide_total(&results.counties).ok_or(TallyErrors::VoteOverflow {
            race: key.clone(),
        })?;
        debug!("summarize_race: race {}: {} -> {:?}", key, ckey, votes);
        totals.push(CandidateTotal {
            key: ckey,
            name: results.name,
            votes,
        });
    }

    let mut total_votes = VoteCount::EMPTY;
    for ct in totals.iter() {
        total_votes = total_votes
            .checked_add(ct.votes)
            .ok_or(TallyErrors::VoteOverflow { race: key.clone() })?;
    }

    // Decreasing votes, then the candidate key to keep the order deterministic.
    totals.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.key.cmp(&b.key)));

    let dp = rules.decimal_places;
    let (tie, winner_margin) = match totals.as_slice() {
        [first, second, ..] if first.votes == second.votes => (true, None),
        [first, second, ..] => (
            false,
            Some(percent(
                first.votes.0 - second.votes.0,
                total_votes.0,
                dp,
            )),
        ),
        // Unopposed
        _ => (false, None),
    };

    let candidates: Vec<CandidateSummary> = totals
        .into_iter()
        .enumerate()
        .map(|(idx, ct)| {
            let is_winner = idx == 0 && !tie;
            CandidateSummary {
                vote_pct: percent(ct.votes.0, total_votes.0, dp),
                key: ct.key,
                name: ct.name,
                votes: ct.votes.0,
                winner: is_winner,
                margin_of_victory: if is_winner { winner_margin } else { None },
            }
        })
        .collect();

    let summary = RaceSummary {
        key,
        date,
        office_slug,
        total_votes: total_votes.0,
        tie,
        candidates,
    };
    match summary.winner() {
        Some(w) => info!(
            "Race {}: {} votes, winner {} ({} votes, margin {:?})",
            summary.key, summary.total_votes, w.key, w.votes, w.margin_of_victory
        ),
        None => info!(
            "Race {}: {} votes, no winner (tie)",
            summary.key, summary.total_votes
        ),
    }
    Ok(summary)
}

/// Summarizes all the races. Races are independent from each other.
///
/// The first race that cannot be summarized fails the whole batch.
pub fn summarize_races(
    races: HashMap<RaceKey, RaceAggregate>,
    rules: &TallyRules,
) -> Result<HashMap<RaceKey, RaceSummary>, TallyErrors> {
    info!("Summarizing {} races", races.len());
    let mut res: HashMap<RaceKey, RaceSummary> = HashMap::new();
    for (key, race) in races {
        let summary = summarize_race(race, rules)?;
        res.insert(key, summary);
    }
    Ok(res)
}

/// Groups the records and summarizes every race.
pub fn tally_records(
    records: &[ResultRecord],
    rules: &TallyRules,
) -> Result<HashMap<RaceKey, RaceSummary>, TallyErrors> {
    info!("Processing {} county results", records.len());
    check_decimal_places(rules.decimal_places)?;
    let races = builder::group_records(records, rules)?;
    summarize_races(races, rules)
}

fn statewide_total(counties: &[CountyVotes]) -> Option<VoteCount> {
    counties
        .iter()
        .try_fold(VoteCount::EMPTY, |acc, cv| acc.checked_add(VoteCount(cv.votes)))
}

fn check_decimal_places(decimal_places: u32) -> Result<(), TallyErrors> {
    if decimal_places > TallyRules::MAX_DECIMAL_PLACES {
        return Err(TallyErrors::InvalidPrecision { decimal_places });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(county: &str, party: &str, last: &str, votes: u64) -> ResultRecord {
        ResultRecord {
            date: "2012-11-06".to_string(),
            office: "President".to_string(),
            office_slug: "president".to_string(),
            district: None,
            county: county.to_string(),
            party: party.to_string(),
            candidate: CandidateName::Split {
                first: "Joe".to_string(),
                last: last.to_string(),
            },
            votes,
        }
    }

    fn president(records: &[ResultRecord]) -> RaceSummary {
        let mut summaries = tally_records(records, &TallyRules::DEFAULT_RULES).unwrap();
        assert_eq!(summaries.len(), 1);
        summaries
            .remove(&RaceKey {
                office: "President".to_string(),
                district: None,
            })
            .unwrap()
    }

    fn candidate<'a>(race: &'a RaceSummary, last: &str) -> &'a CandidateSummary {
        race.candidates
            .iter()
            .find(|c| c.name.last_name() == last)
            .unwrap()
    }

    #[test]
    fn percent_rounding() {
        assert_eq!(percent(50, 100, 2), dec("50"));
        assert_eq!(percent(1, 3, 2), dec("33.33"));
        assert_eq!(percent(2, 3, 2), dec("66.67"));
        assert_eq!(percent(1, 8, 2), dec("12.5"));
        // Midpoint: 0.125 -> 0.13
        assert_eq!(percent(1, 800, 2), dec("0.13"));
        assert_eq!(percent(2, 3, 0), dec("67"));
        assert_eq!(percent(2, 3, 4), dec("66.6667"));
        assert_eq!(percent(0, 0, 2), Decimal::ZERO);
        assert_eq!(percent(u64::MAX, u64::MAX, 2), dec("100"));
    }

    #[test]
    fn two_counties_winner() {
        init();
        let race = president(&[
            record("A", "DEM", "Smith", 2000),
            record("A", "GOP", "Doe", 1000),
            record("B", "DEM", "Smith", 100),
            record("B", "GOP", "Doe", 50),
        ]);
        assert_eq!(race.total_votes, 3150);
        assert!(!race.tie);
        assert_eq!(race.outcome(), RaceOutcome::Winner);

        let smith = candidate(&race, "Smith");
        assert_eq!(smith.votes, 2100);
        assert!(smith.winner);
        assert_eq!(smith.vote_pct, dec("66.67"));
        assert_eq!(smith.margin_of_victory, Some(dec("33.33")));

        let doe = candidate(&race, "Doe");
        assert_eq!(doe.votes, 1050);
        assert!(!doe.winner);
        assert_eq!(doe.vote_pct, dec("33.33"));
        assert_eq!(doe.margin_of_victory, None);

        assert_eq!(race.candidates[0].key.name, "Smith, Joe");
        assert_eq!(race.winner(), Some(smith));
    }

    #[test]
    fn tie_race() {
        init();
        let race = president(&[
            record("A", "DEM", "Smith", 2000),
            record("A", "GOP", "Doe", 2000),
        ]);
        assert!(race.tie);
        assert_eq!(race.outcome(), RaceOutcome::Tie);
        assert!(race.candidates.iter().all(|c| !c.winner));
        assert!(race.candidates.iter().all(|c| c.margin_of_victory.is_none()));
        assert_eq!(race.winner(), None);
        // Equal totals are ordered by candidate key.
        assert_eq!(race.candidates[0].key.party, "DEM");
        assert_eq!(race.candidates[1].key.party, "GOP");
    }

    #[test]
    fn tie_for_second_place_still_has_winner() {
        let race = president(&[
            record("A", "DEM", "Smith", 50),
            record("A", "GOP", "Doe", 25),
            record("A", "LIB", "Roe", 25),
        ]);
        assert!(!race.tie);
        let smith = candidate(&race, "Smith");
        assert!(smith.winner);
        assert_eq!(smith.margin_of_victory, Some(dec("25")));
        assert_eq!(race.candidates[1].key.party, "GOP");
        assert_eq!(race.candidates[2].key.party, "LIB");
    }

    #[test]
    fn single_candidate() {
        let race = president(&[record("A", "DEM", "Smith", 500)]);
        assert!(!race.tie);
        assert_eq!(race.outcome(), RaceOutcome::Unopposed);
        let smith = &race.candidates[0];
        assert!(smith.winner);
        assert_eq!(smith.margin_of_victory, None);
        assert_eq!(smith.vote_pct, dec("100"));
    }

    #[test]
    fn zero_votes() {
        let race = president(&[record("A", "DEM", "Smith", 0)]);
        assert_eq!(race.total_votes, 0);
        assert_eq!(race.candidates[0].vote_pct, Decimal::ZERO);
        assert!(race.candidates[0].winner);

        let race = president(&[record("A", "DEM", "Smith", 0), record("A", "GOP", "Doe", 0)]);
        assert!(race.tie);
        assert!(race.candidates.iter().all(|c| c.vote_pct == Decimal::ZERO));
    }

    #[test]
    fn zero_vote_candidate_has_zero_pct() {
        let race = president(&[record("A", "DEM", "Smith", 10), record("A", "GOP", "Doe", 0)]);
        assert_eq!(candidate(&race, "Doe").vote_pct, Decimal::ZERO);
        assert_eq!(candidate(&race, "Smith").margin_of_victory, Some(dec("100")));
    }

    #[test]
    fn totals_and_percentages_add_up() {
        let records = vec![
            record("A", "DEM", "Smith", 1234),
            record("A", "GOP", "Doe", 999),
            record("A", "LIB", "Roe", 17),
            record("B", "DEM", "Smith", 3),
            record("B", "GOP", "Doe", 4001),
            record("C", "GRN", "Poe", 77),
        ];
        let input_total: u64 = records.iter().map(|r| r.votes).sum();
        let race = president(&records);
        assert_eq!(race.total_votes, input_total);
        assert_eq!(
            race.candidates.iter().map(|c| c.votes).sum::<u64>(),
            input_total
        );
        let pct_sum: Decimal = race.candidates.iter().map(|c| c.vote_pct).sum();
        let tolerance = dec("0.005") * Decimal::from(race.candidates.len() as u64);
        assert!((pct_sum - Decimal::ONE_HUNDRED).abs() <= tolerance);

        let winners: Vec<&CandidateSummary> = race.candidates.iter().filter(|c| c.winner).collect();
        assert_eq!(winners.len(), 1);
        let max_votes = race.candidates.iter().map(|c| c.votes).max().unwrap();
        assert_eq!(winners[0].votes, max_votes);
        assert_eq!(winners[0].name.last_name(), "Doe");
    }

    #[test]
    fn summarize_is_idempotent() {
        let records = vec![
            record("A", "DEM", "Smith", 3),
            record("A", "GOP", "Doe", 3),
            record("A", "LIB", "Roe", 3),
            record("B", "GRN", "Poe", 1),
        ];
        let races = builder::group_records(&records, &TallyRules::DEFAULT_RULES).unwrap();
        let race = races.values().next().unwrap().clone();
        let first = summarize_race(race.clone(), &TallyRules::DEFAULT_RULES).unwrap();
        let second = summarize_race(race, &TallyRules::DEFAULT_RULES).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_race_fails() {
        let key = RaceKey {
            office: "Governor".to_string(),
            district: None,
        };
        let race = RaceAggregate::new(key.clone(), "2013-11-05", "governor");
        let res = summarize_race(race, &TallyRules::DEFAULT_RULES);
        assert_eq!(res, Err(TallyErrors::EmptyRace { race: key }));
    }

    #[test]
    fn overflow_fails() {
        let res = tally_records(
            &[
                record("A", "DEM", "Smith", u64::MAX),
                record("A", "GOP", "Doe", 1),
            ],
            &TallyRules::DEFAULT_RULES,
        );
        assert!(matches!(res, Err(TallyErrors::VoteOverflow { .. })));
    }

    #[test]
    fn explicit_precision() {
        let rules = TallyRules {
            decimal_places: 4,
            ..TallyRules::DEFAULT_RULES
        };
        let res = tally_records(
            &[record("A", "DEM", "Smith", 2), record("A", "GOP", "Doe", 1)],
            &rules,
        )
        .unwrap();
        let race = res.values().next().unwrap();
        assert_eq!(race.candidates[0].vote_pct, dec("66.6667"));
        assert_eq!(race.candidates[0].margin_of_victory, Some(dec("33.3333")));

        let rules = TallyRules {
            decimal_places: 29,
            ..TallyRules::DEFAULT_RULES
        };
        let res = tally_records(&[record("A", "DEM", "Smith", 2)], &rules);
        assert_eq!(
            res,
            Err(TallyErrors::InvalidPrecision { decimal_places: 29 })
        );
    }

    #[test]
    fn several_races() {
        let mut governor = record("A", "DEM", "Smith", 5);
        governor.office = "Governor".to_string();
        governor.office_slug = "governor".to_string();
        let summaries = tally_records(
            &[record("A", "DEM", "Smith", 2), record("A", "GOP", "Doe", 1), governor],
            &TallyRules::DEFAULT_RULES,
        )
        .unwrap();
        assert_eq!(summaries.len(), 2);
        let gov = summaries
            .get(&RaceKey {
                office: "Governor".to_string(),
                district: None,
            })
            .unwrap();
        assert_eq!(gov.outcome(), RaceOutcome::Unopposed);
        assert_eq!(gov.office_slug, "governor");
    }
}
