use rust_decimal::Decimal;

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

// ********* Input data structures ***********

/// The name of a candidate, as produced by the cleaning step.
///
/// Candidates are identified by [`CandidateName::display_name`], so
/// `Full("Smith")` and `Split { first: "", last: "Smith" }` are the same
/// candidate. The grouper keeps the name of the first record it sees for a
/// candidate.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum CandidateName {
    /// A name that could not be split into first and last name.
    Full(String),
    /// A name given as separate first and last names.
    Split { first: String, last: String },
}

impl CandidateName {
    /// The name used to identify the candidate: `Last, First` or the full name.
    pub fn display_name(&self) -> String {
        match self {
            CandidateName::Full(name) => name.clone(),
            CandidateName::Split { first, last } if first.is_empty() => last.clone(),
            CandidateName::Split { first, last } => format!("{}, {}", last, first),
        }
    }

    pub fn last_name(&self) -> &str {
        match self {
            CandidateName::Full(name) => name.as_str(),
            CandidateName::Split { last, .. } => last.as_str(),
        }
    }

    /// Empty when the name was never split.
    pub fn first_name(&self) -> &str {
        match self {
            CandidateName::Full(_) => "",
            CandidateName::Split { first, .. } => first.as_str(),
        }
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.display_name().trim().is_empty()
    }
}

/// One row of county-level results, already cleaned.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultRecord {
    /// The contest date. It is passed through without interpretation.
    pub date: String,
    /// The cleaned office label.
    pub office: String,
    pub office_slug: String,
    /// Only present for district-based offices.
    pub district: Option<u32>,
    pub county: String,
    pub party: String,
    pub candidate: CandidateName,
    pub votes: u64,
}

impl ResultRecord {
    pub fn race_key(&self) -> RaceKey {
        RaceKey {
            office: self.office.clone(),
            district: self.district,
        }
    }

    pub fn candidate_key(&self) -> CandidateKey {
        CandidateKey {
            party: self.party.clone(),
            name: self.candidate.display_name(),
        }
    }
}

/// Identifies a contest: one office, and one district for district-based offices.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct RaceKey {
    pub office: String,
    pub district: Option<u32>,
}

impl Display for RaceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.district {
            Some(district) => write!(f, "{}-{}", self.office, district),
            None => write!(f, "{}", self.office),
        }
    }
}

/// Identifies a candidate within a race.
///
/// The party is part of the key so that two candidates sharing a name in the
/// same race are kept apart.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct CandidateKey {
    pub party: String,
    pub name: String,
}

impl Display for CandidateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.party, self.name)
    }
}

// ******** Grouped data structures *********

/// The votes reported by one county for one candidate.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountyVotes {
    pub county: String,
    pub votes: u64,
}

/// All the county contributions of one candidate, in reporting order.
///
/// Invariant: a county appears at most once.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateResults {
    pub name: CandidateName,
    pub counties: Vec<CountyVotes>,
}

/// A race with the county results of all its candidates, as built by the grouper.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RaceAggregate {
    pub key: RaceKey,
    pub date: String,
    pub office_slug: String,
    pub candidates: HashMap<CandidateKey, CandidateResults>,
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateSummary {
    pub key: CandidateKey,
    pub name: CandidateName,
    /// Sum of all the county contributions.
    pub votes: u64,
    /// Share of the racewide total, in percent.
    pub vote_pct: Decimal,
    pub winner: bool,
    /// Only set for the winner of a contested race, in percentage points.
    pub margin_of_victory: Option<Decimal>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RaceOutcome {
    /// The top candidate has strictly more votes than the second one.
    Winner,
    /// A single candidate ran.
    Unopposed,
    /// The two top candidates have the same number of votes.
    Tie,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RaceSummary {
    pub key: RaceKey,
    pub date: String,
    pub office_slug: String,
    pub total_votes: u64,
    pub tie: bool,
    /// Sorted by decreasing number of votes, then by candidate key.
    pub candidates: Vec<CandidateSummary>,
}

impl RaceSummary {
    pub fn outcome(&self) -> RaceOutcome {
        if self.tie {
            RaceOutcome::Tie
        } else if self.candidates.len() == 1 {
            RaceOutcome::Unopposed
        } else {
            RaceOutcome::Winner
        }
    }

    pub fn winner(&self) -> Option<&CandidateSummary> {
        self.candidates.iter().find(|c| c.winner)
    }
}

/// Errors that prevent the records from being grouped or summarized.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyErrors {
    /// A record lacks a usable race or candidate key.
    /// `index` is the position of the record in the input sequence.
    MalformedRecord {
        index: usize,
        race: RaceKey,
        record: Box<ResultRecord>,
        reason: String,
    },
    /// A county reported twice for the same candidate under the `Reject` policy.
    DuplicateCounty {
        race: RaceKey,
        candidate: CandidateKey,
        county: String,
    },
    /// A race without candidates reached the summarizer.
    EmptyRace { race: RaceKey },
    /// The vote totals of a race do not fit in 64 bits.
    VoteOverflow { race: RaceKey },
    InvalidPrecision { decimal_places: u32 },
}

impl Error for TallyErrors {}

impl Display for TallyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErrors::MalformedRecord {
                index,
                race,
                record,
                reason,
            } => write!(
                f,
                "malformed record #{} in race {}: {} ({:?})",
                index,
                race,
                reason,
                record
            ),
            TallyErrors::DuplicateCounty {
                race,
                candidate,
                county,
            } => write!(
                f,
                "race {}: county {} reported twice for candidate {}",
                race, county, candidate
            ),
            TallyErrors::EmptyRace { race } => write!(f, "race {} has no candidates", race),
            TallyErrors::VoteOverflow { race } => write!(f, "race {}: vote count overflow", race),
            TallyErrors::InvalidPrecision { decimal_places } => write!(
                f,
                "cannot round percentages to {} decimal places (maximum is {})",
                decimal_places,
                TallyRules::MAX_DECIMAL_PLACES
            ),
        }
    }
}

// ********* Configuration **********

/// What to do when a county reports more than once for the same candidate.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DuplicateCountyMode {
    /// Sum the contributions into the existing county entry.
    Accumulate,
    /// Fail with `TallyErrors::DuplicateCounty`.
    Reject,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyRules {
    /// Number of decimal places kept for percentages and margins.
    pub decimal_places: u32,
    pub duplicate_county_mode: DuplicateCountyMode,
}

impl TallyRules {
    pub const DEFAULT_DECIMAL_PLACES: u32 = 2;
    pub const MAX_DECIMAL_PLACES: u32 = 28;

    pub const DEFAULT_RULES: TallyRules = TallyRules {
        decimal_places: TallyRules::DEFAULT_DECIMAL_PLACES,
        duplicate_county_mode: DuplicateCountyMode::Accumulate,
    };
}

impl Default for TallyRules {
    fn default() -> Self {
        TallyRules::DEFAULT_RULES
    }
}
