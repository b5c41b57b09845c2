use crate::rank::io_common::InputType;
use crate::rank::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    pub title: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "generateChart")]
    pub generate_chart: Option<bool>,
}

/// The description of the run, as written in the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub title: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "scoringMode")]
    pub scoring_mode: String,
    pub participants: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "nameColumnIndex")]
    _name_column_index: Option<JSValue>,
    #[serde(rename = "firstRatingColumnIndex")]
    _first_rating_column_index: Option<JSValue>,
}

impl FileSource {
    pub fn new(file_path: String) -> FileSource {
        FileSource {
            provider: None,
            file_path,
            excel_worksheet_name: None,
            _name_column_index: None,
            _first_rating_column_index: None,
        }
    }

    /// 0-based index of the column with the rater names. The first column by default.
    pub fn name_column_index(&self) -> RankResult<usize> {
        match &self._name_column_index {
            None => Ok(0),
            x => Ok(read_js_int(x)? - 1),
        }
    }

    /// 0-based index of the first column with ratings. The column after the names by default.
    pub fn first_rating_column_index(&self) -> RankResult<usize> {
        match &self._first_rating_column_index {
            None => Ok(self.name_column_index()? + 1),
            x => Ok(read_js_int(x)? - 1),
        }
    }

    /// The declared provider, or the one matching the extension of the file.
    pub fn input_type(&self) -> RankResult<InputType> {
        match &self.provider {
            Some(p) => InputType::from_provider(p),
            None => InputType::from_path(&self.file_path),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankRules {
    #[serde(rename = "scoringMode")]
    pub scoring_mode: Option<String>,
    #[serde(rename = "pairCoverage")]
    pub pair_coverage: Option<String>,
    #[serde(rename = "updateSchedule")]
    pub update_schedule: Option<String>,
    #[serde(rename = "selfWeight")]
    pub self_weight: Option<JSValue>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "ratingFileSource")]
    pub rating_file_source: FileSource,
    #[serde(default)]
    pub rules: RankRules,
}

impl RankConfig {
    /// The configuration used when only a rating file is given.
    pub fn for_input(file_path: String) -> RankConfig {
        RankConfig {
            output_settings: OutputSettings::default(),
            rating_file_source: FileSource::new(file_path),
            rules: RankRules::default(),
        }
    }
}

pub fn read_config(path: &str) -> RankResult<RankConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: RankConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> RankResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn validate_rules(rules: &RankRules) -> RankResult<AggregationRules> {
    let defaults = AggregationRules::DEFAULT_RULES;
    let res = AggregationRules {
        scoring_mode: match rules.scoring_mode.as_deref() {
            None => defaults.scoring_mode,
            Some("pairwiseElo") | Some("elo") => ScoringMode::PairwiseElo,
            Some("weightedAverage") | Some("weighted") => ScoringMode::WeightedAverage,
            Some(x) => {
                whatever!("Unknown scoring mode {:?}", x)
            }
        },
        pair_coverage: match rules.pair_coverage.as_deref() {
            None => defaults.pair_coverage,
            Some("orderedPairs") => PairCoverage::OrderedPairs,
            Some("unorderedPairs") => PairCoverage::UnorderedPairs,
            Some(x) => {
                whatever!("Unknown pair coverage {:?}", x)
            }
        },
        update_schedule: match rules.update_schedule.as_deref() {
            None => defaults.update_schedule,
            Some("simultaneous") => UpdateSchedule::Simultaneous,
            Some("sequential") => UpdateSchedule::Sequential,
            Some(x) => {
                whatever!("Unknown update schedule {:?}", x)
            }
        },
        self_weight: match &rules.self_weight {
            None => defaults.self_weight,
            Some(JSValue::Number(n)) => match n.as_f64() {
                Some(w) => w,
                None => whatever!("Cannot read selfWeight {:?}", n),
            },
            Some(JSValue::String(s)) => match s.parse::<f64>() {
                Ok(w) => w,
                Err(_) => whatever!("Cannot read selfWeight {:?}", s),
            },
            Some(x) => {
                whatever!("Cannot read selfWeight {:?}", x)
            }
        },
    };
    Ok(res)
}

// Reads a 1-based column index: a number, a numeric string or Excel column letters.
fn read_js_int(x: &Option<JSValue>) -> RankResult<usize> {
    let idx = match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {})?,
        // Parsing the Excel-style columns: A = 1, Z = 26, AA = 27
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => s
            .to_ascii_uppercase()
            .chars()
            .try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?
                    .checked_add(c as usize - 'A' as usize + 1)
            })
            .context(ParsingJsonNumberSnafu {})?,
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {})?,
        _ => None.context(ParsingJsonNumberSnafu {})?,
    };
    if idx == 0 {
        return Err(RankError::ParsingJsonNumber {});
    }
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_indexes() {
        assert_eq!(read_js_int(&Some(json!(2))).unwrap(), 2);
        assert_eq!(read_js_int(&Some(json!("3"))).unwrap(), 3);
        assert_eq!(read_js_int(&Some(json!("b"))).unwrap(), 2);
        assert_eq!(read_js_int(&Some(json!("AA"))).unwrap(), 27);
        assert!(read_js_int(&Some(json!(0))).is_err());
        assert!(read_js_int(&Some(json!("B2"))).is_err());
        assert!(read_js_int(&None).is_err());
        assert!(matches!(
            read_js_int(&Some(json!("ZZZZZZZZZZZZZZZZ"))),
            Err(RankError::ParsingJsonNumber {})
        ));
    }

    #[test]
    fn file_source_defaults() {
        let src = FileSource::new("ratings.csv".to_string());
        assert_eq!(src.name_column_index().unwrap(), 0);
        assert_eq!(src.first_rating_column_index().unwrap(), 1);
        assert_eq!(src.input_type().unwrap(), InputType::Csv);
    }

    #[test]
    fn parse_full_config() {
        let js = r#"{
            "outputSettings": {"title": "Review", "generateChart": true},
            "ratingFileSource": {"provider": "excel", "filePath": "r.xlsx",
                                 "nameColumnIndex": "B", "firstRatingColumnIndex": 4,
                                 "excelWorksheetName": "Sheet2"},
            "rules": {"scoringMode": "weightedAverage", "selfWeight": "0.4",
                      "pairCoverage": "unorderedPairs", "updateSchedule": "sequential"}
        }"#;
        let config: RankConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.output_settings.title, Some("Review".to_string()));
        assert_eq!(config.output_settings.generate_chart, Some(true));
        let src = &config.rating_file_source;
        assert_eq!(src.name_column_index().unwrap(), 1);
        assert_eq!(src.first_rating_column_index().unwrap(), 3);
        assert_eq!(src.input_type().unwrap(), InputType::Excel);
        assert_eq!(src.excel_worksheet_name, Some("Sheet2".to_string()));

        let rules = validate_rules(&config.rules).unwrap();
        assert_eq!(rules.scoring_mode, ScoringMode::WeightedAverage);
        assert_eq!(rules.pair_coverage, PairCoverage::UnorderedPairs);
        assert_eq!(rules.update_schedule, UpdateSchedule::Sequential);
        assert_eq!(rules.self_weight, 0.4);
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config: RankConfig =
            serde_json::from_str(r#"{"ratingFileSource": {"filePath": "r.csv"}}"#).unwrap();
        assert_eq!(config.output_settings, OutputSettings::default());
        let rules = validate_rules(&config.rules).unwrap();
        assert_eq!(rules, AggregationRules::DEFAULT_RULES);
    }

    #[test]
    fn unknown_rules_are_rejected() {
        let rules = RankRules {
            scoring_mode: Some("glicko".to_string()),
            ..RankRules::default()
        };
        assert!(matches!(
            validate_rules(&rules),
            Err(RankError::Whatever { .. })
        ));
        let rules = RankRules {
            self_weight: Some(json!(true)),
            ..RankRules::default()
        };
        assert!(validate_rules(&rules).is_err());
    }
}
