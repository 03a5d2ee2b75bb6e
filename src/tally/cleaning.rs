// Cleaning of the raw rows: names, parties, offices and vote counts.

use crate::tally::*;

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CleanOffice {
    pub office: String,
    pub office_slug: String,
    pub district: Option<u32>,
}

/// Splits `Last, First` into its parts. Names without a comma are kept whole.
pub fn split_name(raw: &str) -> CandidateName {
    match raw.split_once(',') {
        Some((last, first)) => CandidateName::Split {
            first: first.trim().to_string(),
            last: last.trim().to_string(),
        },
        None => CandidateName::Full(raw.trim().to_string()),
    }
}

pub fn clean_party(party: &str) -> String {
    let party = party.trim().to_uppercase();
    if party.starts_with("GOP") {
        "REP".to_string()
    } else if party.starts_with("DEM") {
        "DEM".to_string()
    } else {
        party
    }
}

pub fn slugify(office: &str) -> String {
    office.trim().replace('.', "").replace(' ', "-").to_lowercase()
}

/// Normalizes the office label.
///
/// House seats are written `U.S. Rep - <district>` in the raw results. The district
/// column, when filled, takes precedence over the district found in the label.
/// The presidential race is statewide and never has a district.
pub fn clean_office(office: &str, district: Option<&str>) -> Result<CleanOffice, String> {
    if office.trim().is_empty() {
        return Err("missing office label".to_string());
    }
    if office.contains("Pres") {
        return Ok(CleanOffice {
            office: office.trim().to_string(),
            office_slug: "president".to_string(),
            district: None,
        });
    }
    let explicit_district = match district {
        Some(d) => Some(parse_district(d)?),
        None => None,
    };
    let res = if office.contains("Rep") {
        let district = match explicit_district {
            Some(d) => d,
            None => match office.rsplit_once('-') {
                Some((_, d)) => parse_district(d)?,
                None => return Err(format!("missing district for office {:?}", office)),
            },
        };
        CleanOffice {
            office: "U.S. House of Representatives".to_string(),
            office_slug: "us-house".to_string(),
            district: Some(district),
        }
    } else {
        CleanOffice {
            office: office.trim().to_string(),
            office_slug: slugify(office),
            district: explicit_district,
        }
    };
    Ok(res)
}

fn parse_district(s: &str) -> Result<u32, String> {
    s.trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid district {:?}", s.trim()))
}

/// Parses a non-negative vote count. Thousands separators are accepted.
pub fn parse_votes(s: &str) -> Result<u64, String> {
    let digits: String = s.trim().chars().filter(|c| *c != ',').collect();
    if digits.starts_with('-') {
        return Err(format!("negative vote count {:?}", s.trim()));
    }
    digits
        .parse::<u64>()
        .map_err(|_| format!("invalid vote count {:?}", s.trim()))
}

/// Converts a raw row into a record for the tally.
pub fn clean_row(row: &ParsedRow) -> BTallyResult<ResultRecord> {
    let malformed = |reason: String| {
        Box::new(TallyError::MalformedRow {
            path: row.source.clone(),
            lineno: row.lineno,
            reason,
        })
    };
    let office = clean_office(&row.office, row.district.as_deref()).map_err(malformed)?;
    let votes = parse_votes(&row.votes).map_err(malformed)?;
    let missing = if row.party.trim().is_empty() {
        Some("missing candidate party")
    } else if row.candidate.trim().is_empty() {
        Some("missing candidate name")
    } else if row.county.trim().is_empty() {
        Some("missing county name")
    } else {
        None
    };
    if let Some(reason) = missing {
        return Err(malformed(reason.to_string()));
    }
    let record = ResultRecord {
        date: row.date.clone(),
        office: office.office,
        office_slug: office.office_slug,
        district: office.district,
        county: row.county.trim().to_string(),
        party: clean_party(&row.party),
        candidate: split_name(&row.candidate),
        votes,
    };
    debug!("clean_row: {:?} -> {:?}", row, record);
    Ok(record)
}
