// Writers for the race summaries.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;
use serde_json::json;
use serde_json::Value as JSValue;

use crate::tally::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> TallyResult<OutputFormat> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => UnknownOutputFormatSnafu { format: s }.fail(),
        }
    }

    pub fn from_path(path: &str) -> OutputFormat {
        let is_json = Path::new(path)
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            OutputFormat::Json
        } else {
            OutputFormat::Csv
        }
    }
}

const CSV_COLUMNS: [&str; 13] = [
    "date",
    "office",
    "office_slug",
    "district",
    "last_name",
    "first_name",
    "party",
    "all_votes",
    "votes",
    "vote_pct",
    "winner",
    "margin_of_vic",
    "tie_race",
];

// One line of the CSV output, in the order of CSV_COLUMNS.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    date: &'a str,
    office: &'a str,
    office_slug: &'a str,
    district: String,
    last_name: &'a str,
    first_name: &'a str,
    party: &'a str,
    all_votes: u64,
    votes: u64,
    vote_pct: String,
    winner: &'static str,
    margin_of_vic: String,
    tie_race: &'static str,
}

fn flag(b: bool) -> &'static str {
    if b {
        "X"
    } else {
        ""
    }
}

// The values are already rounded, this only pads with zeros.
fn format_decimal(d: &Decimal, decimal_places: u32) -> String {
    format!("{:.*}", decimal_places as usize, d)
}

/// The races in a stable order: by office, then district.
pub fn sorted_summaries(summaries: &HashMap<RaceKey, RaceSummary>) -> Vec<&RaceSummary> {
    let mut res: Vec<&RaceSummary> = summaries.values().collect();
    res.sort_by(|a, b| a.key.cmp(&b.key));
    res
}

pub fn write_csv<W: Write>(
    summaries: &[&RaceSummary],
    decimal_places: u32,
    writer: W,
) -> BTallyResult<()> {
    // The header is written even when there is no race.
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    wtr.write_record(CSV_COLUMNS).context(CsvWriteSnafu {})?;
    for race in summaries.iter() {
        let district = race.key.district.map(|d| d.to_string()).unwrap_or_default();
        for cand in race.candidates.iter() {
            let row = SummaryRow {
                date: &race.date,
                office: &race.key.office,
                office_slug: &race.office_slug,
                district: district.clone(),
                last_name: cand.name.last_name(),
                first_name: cand.name.first_name(),
                party: &cand.key.party,
                all_votes: race.total_votes,
                votes: cand.votes,
                vote_pct: format_decimal(&cand.vote_pct, decimal_places),
                winner: flag(cand.winner),
                margin_of_vic: cand
                    .margin_of_victory
                    .map(|m| format_decimal(&m, decimal_places))
                    .unwrap_or_default(),
                tie_race: flag(race.tie),
            };
            wtr.serialize(row).context(CsvWriteSnafu {})?;
        }
    }
    wtr.flush().context(WritingOutputSnafu { path: "csv output" })?;
    Ok(())
}

pub fn summary_json(summaries: &[&RaceSummary], decimal_places: u32) -> JSValue {
    let mut races: Vec<JSValue> = Vec::new();
    for race in summaries.iter() {
        let candidates: Vec<JSValue> = race
            .candidates
            .iter()
            .map(|cand| {
                json!({
                    "lastName": cand.name.last_name(),
                    "firstName": cand.name.first_name(),
                    "party": cand.key.party,
                    "votes": cand.votes,
                    "votePct": format_decimal(&cand.vote_pct, decimal_places),
                    "winner": cand.winner,
                    "marginOfVictory": cand.margin_of_victory.map(|m| format_decimal(&m, decimal_places)),
                })
            })
            .collect();
        races.push(json!({
            "date": race.date,
            "office": race.key.office,
            "officeSlug": race.office_slug,
            "district": race.key.district,
            "allVotes": race.total_votes,
            "tieRace": race.tie,
            "candidates": candidates,
        }));
    }
    json!({ "races": races })
}

/// Renders all the summaries in the requested format.
pub fn render(
    summaries: &HashMap<RaceKey, RaceSummary>,
    format: OutputFormat,
    decimal_places: u32,
) -> BTallyResult<String> {
    let sorted = sorted_summaries(summaries);
    match format {
        OutputFormat::Csv => {
            let mut buf: Vec<u8> = Vec::new();
            write_csv(&sorted, decimal_places, &mut buf)?;
            Ok(String::from_utf8_lossy(&buf).to_string())
        }
        OutputFormat::Json => {
            let js = summary_json(&sorted, decimal_places);
            let pretty = serde_json::to_string_pretty(&js).context(ParsingJsonSnafu {})?;
            Ok(pretty + "\n")
        }
    }
}

/// Writes the rendered summary to a file, or to the standard output when no path is given.
pub fn write_output(rendered: &str, out: Option<&str>) -> BTallyResult<()> {
    match out {
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(path, rendered).context(WritingOutputSnafu { path })?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context(WritingOutputSnafu { path: "stdout" })?;
        }
    }
    Ok(())
}
