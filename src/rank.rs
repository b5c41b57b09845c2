use log::{debug, info, warn};

use peer_rating::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::rank::chart::build_chart_js;
use crate::rank::config_reader::*;
use crate::rank::io_common::InputType;

pub mod chart;
pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RankError {
    #[snafu(display("Error opening workbook {path}"))]
    OpeningWorkbook {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("The workbook does not contain any data"))]
    EmptyWorkbook {},
    #[snafu(display("Cannot find worksheet {name}"))]
    MissingWorksheet { name: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error serializing {path} to JSON"))]
    SerializingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Expected a column index (number or Excel column letters)"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a line of the CSV file"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("The rating file has no header row with the participant names"))]
    MissingHeader {},
    #[snafu(display("No rating file was provided (use --input or --config)"))]
    MissingInput {},
    #[snafu(display("Unknown input type {provider:?} (expected csv or excel)"))]
    UnknownProvider { provider: String },
    #[snafu(display("Line {lineno}: the ratings of {rater:?} were already given"))]
    DuplicateRaterRow { rater: String, lineno: usize },
    #[snafu(display("Line {lineno}: the row of {rater:?} has more ratings than participants"))]
    RowTooLong { rater: String, lineno: usize },
    #[snafu(display("Invalid ratings: {source}"))]
    InvalidRatings { source: ValidationError },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RankResult<T> = Result<T, RankError>;

/// Rounds to two decimals, for display and serialization.
pub fn round_2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn scoring_mode_name(mode: ScoringMode) -> &'static str {
    match mode {
        ScoringMode::PairwiseElo => "pairwiseElo",
        ScoringMode::WeightedAverage => "weightedAverage",
    }
}

fn results_to_json(results: &[ParticipantResult]) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for r in results.iter() {
        let mut js = json!({
            "rank": r.rank,
            "name": r.name,
            "selfRating": round_2(r.self_rating),
            "othersAverageRating": round_2(r.others_average_rating),
            "eloRating": round_2(r.elo_rating),
            "difference": round_2(r.difference),
        });
        if let Some(elo) = r.pairwise_elo {
            js["pairwiseElo"] = json!(round_2(elo));
        }
        l.push(js);
    }
    l
}

pub fn build_summary_js(
    settings: &OutputSettings,
    rules: &AggregationRules,
    results: &[ParticipantResult],
) -> JSValue {
    let c = OutputConfig {
        title: settings.title.clone(),
        date: settings.date.clone(),
        scoring_mode: scoring_mode_name(rules.scoring_mode).to_string(),
        participants: results.len(),
    };
    json!({
        "config": c,
        "results": results_to_json(results) })
}

/// The ranked table, as printed for the user.
pub fn format_table(results: &[ParticipantResult]) -> String {
    let name_width = results
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);
    let mut lines: Vec<String> = vec![format!(
        "{:>4}  {:<width$}  {:>6}  {:>6}  {:>10}  {:>10}",
        "Rank",
        "Name",
        "Self",
        "Others",
        "Score",
        "Difference",
        width = name_width
    )];
    for r in results.iter() {
        lines.push(format!(
            "{:>4}  {:<width$}  {:>6.2}  {:>6.2}  {:>10.2}  {:>10.2}",
            r.rank,
            r.name,
            r.self_rating,
            r.others_average_rating,
            r.elo_rating,
            r.difference,
            width = name_width
        ));
    }
    lines.join("\n")
}

fn read_rating_data(root_path: Option<&Path>, cfs: &FileSource) -> RankResult<RatingMatrix> {
    let p: PathBuf = match root_path {
        Some(root) => root.join(&cfs.file_path),
        None => PathBuf::from(&cfs.file_path),
    };
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read rating file {:?}", p2);
    let sheet = match cfs.input_type()? {
        InputType::Csv => io_csv::read_csv_ratings(&p2, cfs)?,
        InputType::Excel => io_excel::read_excel_ratings(&p2, cfs)?,
    };
    io_common::assemble_matrix(&sheet)
}

fn write_json<T: Serialize + ?Sized>(path: &str, js: &T) -> RankResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(SerializingJsonSnafu { path })?;
    if path == "stdout" {
        println!("{}", pretty);
    } else {
        info!("Writing {:?}", path);
        fs::write(path, pretty).context(WritingOutputSnafu { path })?;
    }
    Ok(())
}

/// Compares a summary with a stored one. On mismatch, the differences are printed.
pub fn check_reference(summary: &JSValue, reference_path: &str) -> RankResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("check_reference: reference: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {
            path: reference_path,
        })?;
    let pretty_js_summary = serde_json::to_string_pretty(summary).context(SerializingJsonSnafu {
        path: "summary",
    })?;
    if pretty_js_summary_ref != pretty_js_summary {
        warn!("Found differences with the reference summary");
        print_diff(
            pretty_js_summary_ref.as_str(),
            pretty_js_summary.as_str(),
            "\n",
        );
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("The summary matches the reference {:?}", reference_path);
    Ok(())
}

// The configuration file, if any, completed with the command line flags.
fn load_config(args: &Args) -> RankResult<(RankConfig, Option<PathBuf>)> {
    let (mut config, mut root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, Some(root))
        }
        None => {
            let file_path = args.input.clone().context(MissingInputSnafu {})?;
            (RankConfig::for_input(file_path), None)
        }
    };

    if let (Some(input), Some(_)) = (&args.input, &args.config) {
        // A path given on the command line is relative to the working directory.
        config.rating_file_source.file_path = input.clone();
        root = None;
    }
    if let Some(input_type) = &args.input_type {
        config.rating_file_source.provider = Some(input_type.clone());
    }
    if let Some(worksheet) = &args.excel_worksheet_name {
        config.rating_file_source.excel_worksheet_name = Some(worksheet.clone());
    }
    if let Some(mode) = &args.mode {
        config.rules.scoring_mode = Some(mode.clone());
    }
    Ok((config, root))
}

// Where the chart goes: the --chart flag, or outputDirectory when generateChart is set.
fn chart_path(explicit: &Option<String>, settings: &OutputSettings) -> Option<String> {
    if explicit.is_none() && !settings.generate_chart.unwrap_or(false) {
        return None;
    }
    let res = output_path(explicit, &settings.output_directory, "chart.json");
    if res.is_none() {
        warn!("generateChart is set but there is no outputDirectory and no --chart location: no chart is written");
    }
    res
}

fn output_path(explicit: &Option<String>, dir: &Option<String>, file_name: &str) -> Option<String> {
    match (explicit, dir) {
        (Some(p), _) => Some(p.clone()),
        (None, Some(d)) => Some(Path::new(d).join(file_name).display().to_string()),
        (None, None) => None,
    }
}

/// Reads the ratings, ranks the participants and writes all the requested outputs.
pub fn run_ranking(args: &Args) -> RankResult<Vec<ParticipantResult>> {
    let (config, root) = load_config(args)?;
    info!("config: {:?}", config);

    let rules = validate_rules(&config.rules)?;

    let matrix = read_rating_data(root.as_deref(), &config.rating_file_source)?;
    debug!("matrix: {:?}", matrix);

    let results = compute_ranking(&matrix, &rules).context(InvalidRatingsSnafu {})?;

    println!("{}", format_table(&results));

    let summary_js = build_summary_js(&config.output_settings, &rules, &results);

    let settings = &config.output_settings;
    if let Some(out) = output_path(&args.out, &settings.output_directory, "summary.json") {
        write_json(&out, &summary_js)?;
    }

    if let Some(chart_out) = chart_path(&args.chart, settings) {
        write_json(&chart_out, &build_chart_js(&results))?;
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(&summary_js, reference_path)?;
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_path(name: &str) -> String {
        format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn args() -> Args {
        Args {
            config: None,
            reference: None,
            out: None,
            chart: None,
            input: None,
            input_type: None,
            excel_worksheet_name: None,
            mode: None,
            verbose: false,
        }
    }

    #[test]
    fn round_2_keeps_two_decimals() {
        assert_eq!(round_2(1398.815936), 1398.82);
        assert_eq!(round_2(19.0 / 3.0), 6.33);
        assert_eq!(round_2(9.0), 9.0);
        assert_eq!(round_2(-0.125), -0.13);
    }

    #[test]
    fn staff_config_matches_reference() {
        let a = Args {
            config: Some(test_path("staff_config.json")),
            reference: Some(test_path("staff_expected_summary.json")),
            ..args()
        };
        let results = run_ranking(&a).unwrap();
        assert_eq!(results[0].name, "Chloe");
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let a = Args {
            config: Some(test_path("staff_config.json")),
            reference: Some(test_path("staff_wrong_summary.json")),
            ..args()
        };
        assert!(matches!(
            run_ranking(&a),
            Err(RankError::Whatever { .. })
        ));
    }

    #[test]
    fn input_flag_without_config() {
        let a = Args {
            input: Some(test_path("staff_ratings_shuffled.csv")),
            mode: Some("weightedAverage".to_string()),
            ..args()
        };
        let results = run_ranking(&a).unwrap();
        let order: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["Chloe", "Asha", "Ben", "Dev"]);
        assert!(results.iter().all(|r| r.pairwise_elo.is_none()));
    }

    #[test]
    fn missing_input_is_reported() {
        assert!(matches!(run_ranking(&args()), Err(RankError::MissingInput {})));
    }

    #[test]
    fn invalid_matrix_is_reported() {
        let a = Args {
            input: Some(test_path("missing_cell.csv")),
            ..args()
        };
        match run_ranking(&a) {
            Err(RankError::InvalidRatings {
                source: ValidationError::MissingRating { rater, ratee },
            }) => {
                assert_eq!(rater, "Ben");
                assert_eq!(ratee, "Chloe");
            }
            x => panic!("unexpected outcome {:?}", x),
        }

        let a = Args {
            input: Some(test_path("unreadable_cell.csv")),
            ..args()
        };
        assert!(matches!(
            run_ranking(&a),
            Err(RankError::InvalidRatings {
                source: ValidationError::UnreadableRating { .. }
            })
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let a = Args {
            input: Some(test_path("staff_config.json")),
            ..args()
        };
        assert!(matches!(
            run_ranking(&a),
            Err(RankError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn chart_location() {
        let with_chart = |dir: Option<&str>| OutputSettings {
            output_directory: dir.map(|d| d.to_string()),
            generate_chart: Some(true),
            ..OutputSettings::default()
        };
        assert_eq!(chart_path(&None, &OutputSettings::default()), None);
        assert_eq!(
            chart_path(&Some("c.json".to_string()), &OutputSettings::default()),
            Some("c.json".to_string())
        );
        assert_eq!(
            chart_path(&None, &with_chart(Some("out"))),
            Some(Path::new("out").join("chart.json").display().to_string())
        );
        // Requested, but nowhere to write it: logged as a warning.
        assert_eq!(chart_path(&None, &with_chart(None)), None);
        assert_eq!(
            chart_path(&Some("stdout".to_string()), &with_chart(None)),
            Some("stdout".to_string())
        );
    }

    #[test]
    fn output_errors() {
        let mut not_json: HashMap<(u8, u8), u8> = HashMap::new();
        not_json.insert((1, 2), 3);
        assert!(matches!(
            write_json("unused.json", &not_json),
            Err(RankError::SerializingJson { .. })
        ));
        assert!(matches!(
            write_json("/nonexistent/dir/summary.json", &json!({})),
            Err(RankError::WritingOutput { .. })
        ));
    }

    #[test]
    fn summary_layout() {
        let names: Vec<String> = vec!["A".to_string(), "B".to_string()];
        let m = RatingMatrix::from_scores(&names, &[vec![5.0, 5.0], vec![5.0, 5.0]]);
        let results = compute_ranking(&m, &AggregationRules::DEFAULT_RULES).unwrap();
        let js = build_summary_js(&OutputSettings::default(), &AggregationRules::DEFAULT_RULES, &results);
        assert_eq!(js["config"]["scoringMode"], json!("pairwiseElo"));
        assert_eq!(js["config"]["participants"], json!(2));
        assert_eq!(js["config"]["title"], JSValue::Null);
        let rs = js["results"].as_array().unwrap();
        assert_eq!(rs.len(), 2);
        assert_eq!(rs[0]["rank"], json!(1));
        assert_eq!(rs[1]["rank"], json!(1));
        assert_eq!(rs[0]["eloRating"], json!(1215.0));
        assert_eq!(rs[0]["pairwiseElo"], json!(1500.0));
        assert_eq!(rs[0]["difference"], json!(1210.0));
    }

    #[test]
    fn table_has_one_line_per_participant() {
        let names: Vec<String> = vec!["Asha".to_string(), "Benedict".to_string()];
        let m = RatingMatrix::from_scores(&names, &[vec![8.0, 6.0], vec![9.0, 7.0]]);
        let results = compute_ranking(&m, &AggregationRules::DEFAULT_RULES).unwrap();
        let table = format_table(&results);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Rank  Name    "));
        assert!(lines[1].trim_start().starts_with("1  "));
        assert!(table.contains("Benedict"));
    }
}
