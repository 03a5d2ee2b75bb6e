use crate::tally::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "outputFormat")]
    pub output_format: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    /// `csv` or `xlsx`. Inferred from the file extension when missing.
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryRules {
    #[serde(rename = "decimalPlaces")]
    _decimal_places: Option<JSValue>,
    #[serde(rename = "duplicateCountyMode")]
    pub duplicate_county_mode: Option<String>,
}

impl SummaryRules {
    pub fn decimal_places(&self) -> TallyResult<Option<u32>> {
        match &self._decimal_places {
            None => Ok(None),
            x => read_js_int(x).map(Some),
        }
    }

    /// The rules for the library, starting from the default rules.
    pub fn tally_rules(&self) -> BTallyResult<TallyRules> {
        let mut rules = TallyRules::DEFAULT_RULES;
        if let Some(dp) = self.decimal_places()? {
            rules.decimal_places = dp;
        }
        if let Some(mode) = &self.duplicate_county_mode {
            rules.duplicate_county_mode = match mode.as_str() {
                "accumulate" => DuplicateCountyMode::Accumulate,
                "reject" => DuplicateCountyMode::Reject,
                _ => return UnknownDuplicateCountyModeSnafu { mode }.fail().map_err(Box::new),
            };
        }
        Ok(rules)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "fileSources", default)]
    pub file_sources: Vec<FileSource>,
    #[serde(default)]
    pub rules: SummaryRules,
}

pub fn read_config(path: &str) -> BTallyResult<TallyConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    debug!("read_config: read content: {:?}", contents);
    let config: TallyConfig = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    info!("config: {:?}", config);
    Ok(config)
}

// Numbers may be written as JSON numbers or as strings.
fn read_js_int(x: &Option<JSValue>) -> TallyResult<u32> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .and_then(|x| u32::try_from(x).ok())
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.trim().parse::<u32>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None::<u32>.context(ParsingJsonNumberSnafu {}),
    }
}
