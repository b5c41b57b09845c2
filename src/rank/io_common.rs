// Primitives shared by the readers.

use std::path::Path;

use peer_rating::builder::Builder;

use crate::rank::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Excel,
}

impl InputType {
    pub fn from_provider(provider: &str) -> RankResult<InputType> {
        match provider.to_lowercase().as_str() {
            "csv" => Ok(InputType::Csv),
            "excel" | "xlsx" | "xls" | "ods" => Ok(InputType::Excel),
            _ => UnknownProviderSnafu { provider }.fail(),
        }
    }

    /// Only CSV and Excel files are accepted.
    pub fn from_path(path: &str) -> RankResult<InputType> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        match ext.to_lowercase().as_str() {
            "csv" => Ok(InputType::Csv),
            "xlsx" | "xls" | "ods" => Ok(InputType::Excel),
            _ => UnknownProviderSnafu {
                provider: format!(".{}", ext),
            }
            .fail(),
        }
    }
}

/// One line of ratings, as found in a file.
#[derive(PartialEq, Debug, Clone)]
pub struct ParsedRow {
    /// 1-based line number in the file, for error messages.
    pub lineno: usize,
    pub rater: String,
    pub cells: Vec<RatingCell>,
}

/// The content of a rating file before it is turned into a matrix.
#[derive(PartialEq, Debug, Clone)]
pub struct ParsedSheet {
    /// The names in the header, in column order.
    pub ratees: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

/// Reads the content of a text cell.
pub fn parse_cell(content: &str) -> RatingCell {
    let s = content.trim();
    if s.is_empty() {
        return RatingCell::Blank;
    }
    match s.parse::<f64>() {
        Ok(x) => RatingCell::Score(x),
        Err(_) => RatingCell::Unreadable(s.to_string()),
    }
}

/// Builds the rating matrix out of the rows of a file.
///
/// The participants are the names of the header. Rows are matched to their
/// rater by name, so they can come in any order. Missing cells are left blank:
/// the aggregation reports them.
pub fn assemble_matrix(sheet: &ParsedSheet) -> RankResult<RatingMatrix> {
    let num_participants = sheet.ratees.len();
    let mut builder = Builder::new(&AggregationRules::DEFAULT_RULES)
        .and_then(|b| b.participants(&sheet.ratees))
        .context(InvalidRatingsSnafu {})?;

    let mut seen_raters: Vec<&str> = Vec::new();
    for row in sheet.rows.iter() {
        let all_blank = row.cells.iter().all(|c| *c == RatingCell::Blank);
        if row.rater.is_empty() && all_blank {
            debug!("assemble_matrix: skipping empty line {}", row.lineno);
            continue;
        }
        if seen_raters.contains(&row.rater.as_str()) {
            return DuplicateRaterRowSnafu {
                rater: row.rater.clone(),
                lineno: row.lineno,
            }
            .fail();
        }
        seen_raters.push(row.rater.as_str());

        let mut cells: Vec<RatingCell> = row.cells.clone();
        if cells.len() > num_participants {
            let has_extra = cells[num_participants..]
                .iter()
                .any(|c| *c != RatingCell::Blank);
            if has_extra {
                return RowTooLongSnafu {
                    rater: row.rater.clone(),
                    lineno: row.lineno,
                }
                .fail();
            }
            cells.truncate(num_participants);
        }
        cells.resize(num_participants, RatingCell::Blank);
        debug!("assemble_matrix: line {}: {} {:?}", row.lineno, row.rater, cells);
        builder
            .add_row(&row.rater, &cells)
            .context(InvalidRatingsSnafu {})?;
    }

    let missing = builder.pending_raters();
    if !missing.is_empty() {
        info!("assemble_matrix: incomplete ratings from {:?}", missing);
    }
    Ok(builder.matrix())
}
