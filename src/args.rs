use clap::Parser;

/// This program computes statewide election summaries from county-level results.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the input files, the output and the rules.
    /// See the manual for the format of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) The county results. Setting this option overrides the file sources
    /// that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx, default inferred from the file extension) The type of the input.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path, 'stdout' or empty) Where the summary is written. Setting this option overrides
    /// the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (csv or json, default csv) The format of the summary.
    #[clap(long, value_parser)]
    pub output_format: Option<String>,

    /// (file path) A reference summary. If provided, the program will check that the
    /// computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default 2) The number of decimal places of the vote percentages and margins.
    #[clap(long, value_parser)]
    pub decimal_places: Option<u32>,

    /// If passed as an argument, a county reporting twice for the same candidate is an error
    /// instead of being added up.
    #[clap(long, takes_value = false)]
    pub reject_duplicate_counties: bool,

    /// (default: the first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
