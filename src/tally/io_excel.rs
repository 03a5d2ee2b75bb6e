use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::tally::{io_common::ColumnIndexes, *};

/// Reads county results from an Excel spreadsheet.
///
/// The worksheet is the first one unless a name is given. The first row is the header.
pub fn read_excel_results(path: &str, worksheet_name: Option<&str>) -> BTallyResult<Vec<ParsedRow>> {
    let wrange = get_range(path, worksheet_name)?;
    read_range(&wrange, path)
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> BTallyResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

pub fn read_range(wrange: &Range<DataType>, path: &str) -> BTallyResult<Vec<ParsedRow>> {
    let mut iter = wrange.rows();
    let header_cells = iter.next().context(EmptyExcelSnafu { path })?;
    let header = read_cells(header_cells, 1)?;
    debug!("read_range: header: {:?}", header);
    let cols = ColumnIndexes::from_header(&header, path)?;

    let mut res: Vec<ParsedRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // Header is line 1
        let lineno = idx as u64 + 2;
        let cells = read_cells(row, lineno)?;
        if cells.iter().all(|c| c.trim().is_empty()) {
            debug!("read_range: {}: skipping empty row {}", path, lineno);
            continue;
        }
        let pr = cols.parsed_row(&cells, path, lineno)?;
        debug!("read_range: row: {:?}", pr);
        res.push(pr);
    }
    Ok(res)
}

fn read_cells(row: &[DataType], lineno: u64) -> BTallyResult<Vec<String>> {
    row.iter().map(|cell| read_cell(cell, lineno)).collect()
}

// Integral numbers are written without a fractional part so that vote counts and
// districts read from numeric cells parse like their text counterparts.
fn read_cell(cell: &DataType, lineno: u64) -> BTallyResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Empty => Ok("".to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        _ => Err(Box::new(TallyError::ExcelWrongCellType {
            lineno,
            content: format!("{:?}", cell),
        })),
    }
}
