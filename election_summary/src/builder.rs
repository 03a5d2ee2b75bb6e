pub use crate::config::*;

use log::{debug, warn};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Groups county-level records into races and candidates.
///
/// ```
/// use election_summary::builder::Builder;
/// use election_summary::*;
/// # use election_summary::TallyErrors;
///
/// let mut builder = Builder::new(&TallyRules::DEFAULT_RULES)?;
/// builder.add_record(&ResultRecord {
///     date: "2012-11-06".to_string(),
///     office: "President".to_string(),
///     office_slug: "president".to_string(),
///     district: None,
///     county: "Arlington".to_string(),
///     party: "DEM".to_string(),
///     candidate: CandidateName::Split { first: "Joe".to_string(), last: "Smith".to_string() },
///     votes: 2000,
/// })?;
/// let races = builder.build();
/// assert_eq!(races.len(), 1);
///
/// # Ok::<(), TallyErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: TallyRules,
    pub(crate) _races: HashMap<RaceKey, RaceAggregate>,
    pub(crate) _num_records: usize,
}

impl Builder {
    pub fn new(rules: &TallyRules) -> Result<Builder, TallyErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _races: HashMap::new(),
            _num_records: 0,
        })
    }

    /// Adds one county result.
    ///
    /// Fails if the record lacks a race or candidate key, or if the county
    /// already reported for this candidate and duplicates are rejected.
    pub fn add_record(&mut self, record: &ResultRecord) -> Result<(), TallyErrors> {
        let index = self._num_records;
        self._num_records += 1;
        check_record(record, index)?;

        let mode = self._rules.duplicate_county_mode;
        let race_key = record.race_key();
        let candidate_key = record.candidate_key();

        let race = self.race_entry(race_key.clone(), &record.date, &record.office_slug);
        if race.date != record.date {
            warn!(
                "add_record: record #{}: race {} already dated {:?}, ignoring date {:?}",
                index, race_key, race.date, record.date
            );
        }
        let candidate = race.candidate_entry(candidate_key.clone(), &record.candidate);

        let existing_idx = candidate
            .counties
            .iter()
            .position(|cv| cv.county == record.county);
        match existing_idx {
            None => {
                candidate.counties.push(CountyVotes {
                    county: record.county.clone(),
                    votes: record.votes,
                });
            }
            Some(_) if mode == DuplicateCountyMode::Reject => {
                return Err(TallyErrors::DuplicateCounty {
                    race: race_key,
                    candidate: candidate_key,
                    county: record.county.clone(),
                });
            }
            Some(idx) => {
                let existing = &mut candidate.counties[idx];
                debug!(
                    "add_record: race {}: county {} reported again for {}, accumulating {} votes",
                    race_key, record.county, candidate_key, record.votes
                );
                existing.votes = existing
                    .votes
                    .checked_add(record.votes)
                    .ok_or(TallyErrors::VoteOverflow { race: race_key })?;
            }
        }
        Ok(())
    }

    pub fn add_records(&mut self, records: &[ResultRecord]) -> Result<(), TallyErrors> {
        for record in records.iter() {
            self.add_record(record)?;
        }
        Ok(())
    }

    /// Returns the race for this key, creating it on first sight.
    ///
    /// The date and office slug are only used when the race is created.
    pub fn race_entry(&mut self, key: RaceKey, date: &str, office_slug: &str) -> &mut RaceAggregate {
        match self._races.entry(key) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                debug!("race_entry: new race {}", e.key());
                let race = RaceAggregate::new(e.key().clone(), date, office_slug);
                e.insert(race)
            }
        }
    }

    pub fn num_races(&self) -> usize {
        self._races.len()
    }

    pub fn build(self) -> HashMap<RaceKey, RaceAggregate> {
        self._races
    }
}

impl RaceAggregate {
    pub fn new(key: RaceKey, date: &str, office_slug: &str) -> RaceAggregate {
        RaceAggregate {
            key,
            date: date.to_string(),
            office_slug: office_slug.to_string(),
            candidates: HashMap::new(),
        }
    }

    /// Returns the results of this candidate, creating an empty list on first sight.
    pub fn candidate_entry(
        &mut self,
        key: CandidateKey,
        name: &CandidateName,
    ) -> &mut CandidateResults {
        match self.candidates.entry(key) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                debug!("candidate_entry: race {}: new candidate {}", self.key, e.key());
                e.insert(CandidateResults {
                    name: name.clone(),
                    counties: Vec::new(),
                })
            }
        }
    }
}

/// Groups all the records in one pass.
pub fn group_records(
    records: &[ResultRecord],
    rules: &TallyRules,
) -> Result<HashMap<RaceKey, RaceAggregate>, TallyErrors> {
    let mut builder = Builder::new(rules)?;
    builder.add_records(records)?;
    Ok(builder.build())
}

fn check_record(record: &ResultRecord, index: usize) -> Result<(), TallyErrors> {
    let reason = if record.office.trim().is_empty() {
        Some("missing office label")
    } else if record.party.trim().is_empty() {
        Some("missing candidate party")
    } else if record.candidate.is_blank() {
        Some("missing candidate name")
    } else if record.county.trim().is_empty() {
        Some("missing county name")
    } else {
        None
    };
    match reason {
        Some(r) => Err(TallyErrors::MalformedRecord {
            index,
            race: record.race_key(),
            record: Box::new(record.clone()),
            reason: r.to_string(),
        }),
        None => Ok(()),
    }
}
