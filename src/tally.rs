use log::{debug, info, warn};

use election_summary::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use text_diff::print_diff;

use crate::args::Args;
use crate::tally::config_reader::*;
use crate::tally::output::OutputFormat;

pub mod cleaning;
pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod output;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The spreadsheet {path} has no data"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Line {lineno}: could not understand cell {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing the summary to {path}: {source}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error reading CSV file {path} at line {lineno}: {source}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: u64,
    },
    #[snafu(display("Error writing CSV: {source}"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("Missing column {column} in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("{path}, line {lineno}: {reason}"))]
    MalformedRow {
        path: String,
        lineno: u64,
        reason: String,
    },
    #[snafu(display("Unknown input type {input_type:?} (expected csv or xlsx)"))]
    UnknownInputType { input_type: String },
    #[snafu(display("Unknown output format {format:?} (expected csv or json)"))]
    UnknownOutputFormat { format: String },
    #[snafu(display("Unknown duplicate county mode {mode:?} (expected accumulate or reject)"))]
    UnknownDuplicateCountyMode { mode: String },
    #[snafu(display("Could not read decimalPlaces in the configuration"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("No input: pass --input or list fileSources in the configuration"))]
    MissingInput {},
    #[snafu(display("Cannot summarize the results: {source}"))]
    Summary { source: TallyErrors },
    #[snafu(display("Difference detected between calculated summary and reference summary {path}"))]
    ReferenceMismatch { path: String },
}

pub type TallyResult<T> = Result<T, TallyError>;
pub type BTallyResult<T> = Result<T, Box<TallyError>>;

/// A row of county results, as read from the input files.
/// This is before any cleaning of names, parties and offices.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedRow {
    /// Where the row comes from, for error messages.
    pub source: String,
    pub lineno: u64,
    pub date: String,
    pub office: String,
    pub district: Option<String>,
    pub county: String,
    pub candidate: String,
    pub party: String,
    pub votes: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Xlsx,
}

impl InputType {
    pub fn parse(s: &str) -> TallyResult<InputType> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(InputType::Csv),
            "xlsx" | "excel" => Ok(InputType::Xlsx),
            _ => UnknownInputTypeSnafu { input_type: s }.fail(),
        }
    }

    /// Spreadsheets are recognized by their extension, anything else is read as CSV.
    pub fn from_path(path: &str) -> InputType {
        let is_excel = Path::new(path)
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
            .unwrap_or(false);
        if is_excel {
            InputType::Xlsx
        } else {
            InputType::Csv
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct InputSource {
    pub path: String,
    pub input_type: InputType,
    pub excel_worksheet_name: Option<String>,
}

/// Everything needed for one run, after merging the configuration file and the flags.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunSettings {
    pub inputs: Vec<InputSource>,
    /// `None` writes to the standard output.
    pub out: Option<String>,
    pub output_format: OutputFormat,
    pub reference: Option<String>,
    pub rules: TallyRules,
}

/// Combines the configuration file (if any) with the command line flags.
/// The flags take precedence.
pub fn build_settings(args: &Args) -> BTallyResult<RunSettings> {
    let config: Option<(TallyConfig, PathBuf)> = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            Some((config, root))
        }
        None => None,
    };
    if let Some(name) = config
        .as_ref()
        .and_then(|(c, _)| c.output_settings.contest_name.as_ref())
    {
        info!("Contest: {}", name);
    }

    let inputs: Vec<InputSource> = if let Some(input) = &args.input {
        let input_type = match &args.input_type {
            Some(s) => InputType::parse(s)?,
            None => InputType::from_path(input),
        };
        vec![InputSource {
            path: input.clone(),
            input_type,
            excel_worksheet_name: args.excel_worksheet_name.clone(),
        }]
    } else if let Some((config, root)) = &config {
        let mut res: Vec<InputSource> = Vec::new();
        for source in config.file_sources.iter() {
            let path = resolve_path(root, &source.file_path);
            let input_type = match &source.provider {
                Some(p) => InputType::parse(p)?,
                None => InputType::from_path(&path),
            };
            res.push(InputSource {
                path,
                input_type,
                excel_worksheet_name: args
                    .excel_worksheet_name
                    .clone()
                    .or_else(|| source.excel_worksheet_name.clone()),
            });
        }
        res
    } else {
        Vec::new()
    };
    if inputs.is_empty() {
        return Err(Box::new(TallyError::MissingInput {}));
    }

    let out: Option<String> = match (&args.out, &config) {
        (Some(o), _) => Some(o.clone()),
        (None, Some((config, root))) => config
            .output_settings
            .output_path
            .as_ref()
            .map(|p| match p.as_str() {
                "" | "stdout" => p.clone(),
                _ => resolve_path(root, p),
            }),
        (None, None) => None,
    }
    .filter(|o| !o.is_empty() && o != "stdout");

    let configured_format = args.output_format.clone().or_else(|| {
        config
            .as_ref()
            .and_then(|(c, _)| c.output_settings.output_format.clone())
    });
    let output_format = match configured_format {
        Some(f) => OutputFormat::parse(&f)?,
        None => out
            .as_deref()
            .map(OutputFormat::from_path)
            .unwrap_or(OutputFormat::Csv),
    };

    let mut rules = match &config {
        Some((c, _)) => c.rules.tally_rules()?,
        None => TallyRules::DEFAULT_RULES,
    };
    if let Some(dp) = args.decimal_places {
        rules.decimal_places = dp;
    }
    if args.reject_duplicate_counties {
        rules.duplicate_county_mode = DuplicateCountyMode::Reject;
    }

    let settings = RunSettings {
        inputs,
        out,
        output_format,
        reference: args.reference.clone(),
        rules,
    };
    debug!("build_settings: {:?}", settings);
    Ok(settings)
}

fn resolve_path(root: &Path, file_path: &str) -> String {
    let p: PathBuf = [root, Path::new(file_path)].iter().collect();
    p.as_path().display().to_string()
}

fn read_rows(input: &InputSource) -> BTallyResult<Vec<ParsedRow>> {
    info!("Attempting to read results file {:?}", input.path);
    match input.input_type {
        InputType::Csv => io_csv::read_csv_results(&input.path),
        InputType::Xlsx => {
            io_excel::read_excel_results(&input.path, input.excel_worksheet_name.as_deref())
        }
    }
}

/// Reads and cleans all the inputs, in order.
pub fn load_records(inputs: &[InputSource]) -> BTallyResult<Vec<ResultRecord>> {
    let mut records: Vec<ResultRecord> = Vec::new();
    for input in inputs.iter() {
        let rows = read_rows(input)?;
        info!("Read {} rows from {:?}", rows.len(), input.path);
        for row in rows.iter() {
            records.push(cleaning::clean_row(row)?);
        }
    }
    Ok(records)
}

pub fn run_summary(settings: &RunSettings) -> BTallyResult<()> {
    let records = load_records(&settings.inputs)?;

    let summaries = tally_records(&records, &settings.rules).context(SummarySnafu {})?;
    info!("Summarized {} races", summaries.len());

    let rendered = output::render(
        &summaries,
        settings.output_format,
        settings.rules.decimal_places,
    )?;
    output::write_output(&rendered, settings.out.as_deref())?;

    // The reference summary, if provided for comparison
    if let Some(reference) = &settings.reference {
        check_reference(&rendered, reference)?;
    }
    Ok(())
}

/// Compares the rendered summary with a reference file, ignoring line endings
/// and trailing whitespace.
pub fn check_reference(rendered: &str, reference_path: &str) -> BTallyResult<()> {
    let reference = fs::read_to_string(reference_path).context(OpeningFileSnafu {
        path: reference_path,
    })?;
    let reference = normalize(&reference);
    let computed = normalize(rendered);
    if reference != computed {
        warn!("Found differences with the reference summary {}", reference_path);
        print_diff(reference.as_str(), computed.as_str(), "\n");
        return Err(Box::new(TallyError::ReferenceMismatch {
            path: reference_path.to_string(),
        }));
    }
    info!("The summary matches the reference {}", reference_path);
    Ok(())
}

fn normalize(s: &str) -> String {
    s.lines()
        .map(|l| l.trim_end())
        .collect::<Vec<&str>>()
        .join("\n")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_data(name: &str) -> String {
        let test_dir = option_env!("ELEXSUM_TEST_DIR")
            .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"));
        format!("{}/{}", test_dir, name)
    }

    fn args() -> Args {
        Args {
            config: None,
            input: None,
            input_type: None,
            out: None,
            output_format: None,
            reference: None,
            decimal_places: None,
            reject_duplicate_counties: false,
            excel_worksheet_name: None,
            verbose: false,
        }
    }

    #[test]
    fn sample_results_match_reference() {
        let inputs = vec![InputSource {
            path: test_data("sample_results.csv"),
            input_type: InputType::Csv,
            excel_worksheet_name: None,
        }];
        let records = load_records(&inputs).unwrap();
        assert_eq!(records.len(), 8);
        let summaries = tally_records(&records, &TallyRules::DEFAULT_RULES).unwrap();
        assert_eq!(summaries.len(), 4);
        let rendered = output::render(&summaries, OutputFormat::Csv, 2).unwrap();
        check_reference(&rendered, &test_data("sample_summary.csv")).unwrap();
    }

    #[test]
    fn reference_mismatch_fails() {
        let inputs = vec![InputSource {
            path: test_data("sample_results.csv"),
            input_type: InputType::Csv,
            excel_worksheet_name: None,
        }];
        let records = load_records(&inputs).unwrap();
        let summaries = tally_records(&records, &TallyRules::DEFAULT_RULES).unwrap();
        // Different precision, different output.
        let rendered = output::render(&summaries, OutputFormat::Csv, 3).unwrap();
        let res = check_reference(&rendered, &test_data("sample_summary.csv"));
        assert!(matches!(
            res.map_err(|e| *e),
            Err(TallyError::ReferenceMismatch { .. })
        ));
    }

    #[test]
    fn settings_from_config() {
        let mut a = args();
        a.config = Some(test_data("sample_config.json"));
        let settings = build_settings(&a).unwrap();
        assert_eq!(settings.inputs.len(), 1);
        assert_eq!(settings.inputs[0].path, test_data("sample_results.csv"));
        assert_eq!(settings.inputs[0].input_type, InputType::Csv);
        assert_eq!(settings.out, None);
        assert_eq!(settings.output_format, OutputFormat::Json);
        assert_eq!(settings.rules.decimal_places, 1);
        assert_eq!(
            settings.rules.duplicate_county_mode,
            DuplicateCountyMode::Reject
        );
    }

    #[test]
    fn flags_override_config() {
        let mut a = args();
        a.config = Some(test_data("sample_config.json"));
        a.input = Some("other.xlsx".to_string());
        a.output_format = Some("csv".to_string());
        a.decimal_places = Some(3);
        let settings = build_settings(&a).unwrap();
        assert_eq!(
            settings.inputs,
            vec![InputSource {
                path: "other.xlsx".to_string(),
                input_type: InputType::Xlsx,
                excel_worksheet_name: None,
            }]
        );
        assert_eq!(settings.output_format, OutputFormat::Csv);
        assert_eq!(settings.rules.decimal_places, 3);
    }

    #[test]
    fn settings_without_config() {
        let mut a = args();
        a.input = Some("results.csv".to_string());
        a.out = Some("summary.json".to_string());
        a.reject_duplicate_counties = true;
        let settings = build_settings(&a).unwrap();
        assert_eq!(settings.inputs[0].input_type, InputType::Csv);
        assert_eq!(settings.out, Some("summary.json".to_string()));
        assert_eq!(settings.output_format, OutputFormat::Json);
        assert_eq!(settings.rules.decimal_places, 2);
        assert_eq!(
            settings.rules.duplicate_county_mode,
            DuplicateCountyMode::Reject
        );

        let res = build_settings(&args());
        assert!(matches!(
            res.map_err(|e| *e),
            Err(TallyError::MissingInput {})
        ));
    }

    #[test]
    fn input_types() {
        assert_eq!(InputType::parse("CSV").unwrap(), InputType::Csv);
        assert_eq!(InputType::parse("xlsx").unwrap(), InputType::Xlsx);
        assert!(InputType::parse("ods").is_err());
        assert_eq!(InputType::from_path("a/b.XLSX"), InputType::Xlsx);
        assert_eq!(InputType::from_path("a/b.txt"), InputType::Csv);
    }
}
