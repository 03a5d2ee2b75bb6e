// Primitives for reading CSV files.

use std::fs::File;
use std::io::Read;

use crate::tally::{io_common::ColumnIndexes, *};

pub fn read_csv_results(path: &str) -> BTallyResult<Vec<ParsedRow>> {
    let file = File::open(path).context(OpeningFileSnafu { path })?;
    read_csv_rows(file, path)
}

/// Reads county results from any CSV source. The first row is the header.
pub fn read_csv_rows<R: Read>(rdr: R, path: &str) -> BTallyResult<Vec<ParsedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(rdr);

    let header: Vec<String> = reader
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1u64 })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let cols = ColumnIndexes::from_header(&header, path)?;

    let mut res: Vec<ParsedRow> = Vec::new();
    for (idx, line_r) in reader.records().enumerate() {
        // Header is line 1
        let default_lineno = idx as u64 + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path,
            lineno: default_lineno,
        })?;
        let lineno = line.position().map(|p| p.line()).unwrap_or(default_lineno);
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            debug!("read_csv_rows: {}: skipping empty line {}", path, lineno);
            continue;
        }
        let row = cols.parsed_row(&cells, path, lineno)?;
        debug!("read_csv_rows: lineno: {:?} row: {:?}", lineno, row);
        res.push(row);
    }
    Ok(res)
}
