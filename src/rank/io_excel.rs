use calamine::{open_workbook_auto, DataType, Range, Reader};

use crate::rank::{
    io_common::{parse_cell, ParsedRow, ParsedSheet},
    *,
};

pub fn read_excel_ratings(path: &str, cfs: &FileSource) -> RankResult<ParsedSheet> {
    let wrange = get_range(path, cfs)?;
    read_range(&wrange, cfs)
}

pub fn read_range(wrange: &Range<DataType>, cfs: &FileSource) -> RankResult<ParsedSheet> {
    let name_idx = cfs.name_column_index()?;
    let start_col = cfs.first_rating_column_index()?;

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyWorkbookSnafu {})?;
    debug!("read_range: header: {:?}", header);

    let mut ratees: Vec<String> = header
        .iter()
        .skip(start_col)
        .map(|c| cell_to_string(c).trim().to_string())
        .collect();
    while ratees.last().map(|s| s.is_empty()).unwrap_or(false) {
        ratees.pop();
    }
    if ratees.is_empty() {
        return MissingHeaderSnafu {}.fail();
    }

    let mut rows: Vec<ParsedRow> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        let rater = row
            .get(name_idx)
            .map(|c| cell_to_string(c).trim().to_string())
            .unwrap_or_default();
        let cells: Vec<RatingCell> = row.iter().skip(start_col).map(read_cell).collect();
        debug!(
            "read_range: lineno: {:?} rater: {:?} cells: {:?}",
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

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => "".to_string(),
        x => x.to_string(),
    }
}

fn read_cell(cell: &DataType) -> RatingCell {
    match cell {
        DataType::Float(f) => RatingCell::Score(*f),
        DataType::Int(i) => RatingCell::Score(*i as f64),
        DataType::String(s) => parse_cell(s),
        DataType::Empty => RatingCell::Blank,
        x => RatingCell::Unreadable(format!("{:?}", x)),
    }
}

fn get_range(path: &str, cfs: &FileSource) -> RankResult<Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, &worksheet_name_o
    );
    let mut workbook = open_workbook_auto(path).context(OpeningWorkbookSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name.clone(),
            })?
            .context(OpeningWorkbookSnafu { path })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyWorkbookSnafu {})?
            .context(OpeningWorkbookSnafu { path })?;
        Ok(wrange)
    }
}
