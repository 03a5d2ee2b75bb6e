use std::path::Path;

use crate::tally::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// The position of each column in the header row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnIndexes {
    date: usize,
    office: usize,
    district: Option<usize>,
    county: usize,
    candidate: usize,
    party: usize,
    votes: usize,
}

impl ColumnIndexes {
    /// Column names are matched without regard to case or surrounding spaces.
    pub fn from_header(header: &[String], path: &str) -> BTallyResult<ColumnIndexes> {
        let find = |name: &str| -> Option<usize> {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| -> BTallyResult<usize> {
            Ok(find(name).context(MissingColumnSnafu { column: name, path })?)
        };
        let cols = ColumnIndexes {
            date: required("date")?,
            office: required("office")?,
            district: find("district"),
            county: required("county")?,
            candidate: required("candidate")?,
            party: required("party")?,
            votes: required("votes")?,
        };
        debug!("from_header: {:?} -> {:?}", header, cols);
        Ok(cols)
    }

    pub fn parsed_row(&self, cells: &[String], path: &str, lineno: u64) -> BTallyResult<ParsedRow> {
        let get = |idx: usize| -> BTallyResult<String> {
            let cell = cells.get(idx).with_context(|| MalformedRowSnafu {
                path,
                lineno,
                reason: format!("expected at least {} columns, found {}", idx + 1, cells.len()),
            })?;
            Ok(cell.trim().to_string())
        };
        let district = match self.district {
            Some(idx) => Some(get(idx)?).filter(|d| !d.is_empty()),
            None => None,
        };
        Ok(ParsedRow {
            source: simplify_file_name(path),
            lineno,
            date: get(self.date)?,
            office: get(self.office)?,
            district,
            county: get(self.county)?,
            candidate: get(self.candidate)?,
            party: get(self.party)?,
            votes: get(self.votes)?,
        })
    }
}
