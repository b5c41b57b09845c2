// Primitives for reading CSV files.

use std::io::Read;

use crate::rank::{
    io_common::{parse_cell, ParsedRow, ParsedSheet},
    *,
};

pub fn read_csv_ratings(path: &str, cfs: &FileSource) -> RankResult<ParsedSheet> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    read_csv_records(rdr, cfs)
}

pub fn read_csv_records<R: Read>(rdr: csv::Reader<R>, cfs: &FileSource) -> RankResult<ParsedSheet> {
    let name_idx = cfs.name_column_index()?;
    let start_col = cfs.first_rating_column_index()?;

    let mut records = rdr.into_records();
    let header = records
        .next()
        .context(MissingHeaderSnafu {})?
        .context(CsvLineParseSnafu {})?;
    debug!("read_csv_records: header: {:?}", header);

    let mut ratees: Vec<String> = header
        .iter()
        .skip(start_col)
        .map(|s| s.trim().to_string())
        .collect();
    // Spreadsheet exports often carry empty trailing columns.
    while ratees.last().map(|s| s.is_empty()).unwrap_or(false) {
        ratees.pop();
    }
    if ratees.is_empty() {
        return MissingHeaderSnafu {}.fail();
    }

    let mut rows: Vec<ParsedRow> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let rater = line.get(name_idx).unwrap_or("").trim().to_string();
        let cells: Vec<RatingCell> = line.iter().skip(start_col).map(parse_cell).collect();
        debug!(
            "read_csv_records: lineno: {:?} rater: {:?} cells: {:?}",
            lineno, rater, cells
        );
        rows.push(ParsedRow {
            lineno,
            rater,
            cells,
        });
    }
    Ok(ParsedSheet { ratees, rows })
}
