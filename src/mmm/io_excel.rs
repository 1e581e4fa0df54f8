// Primitives for reading Excel uploads.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use snafu::prelude::*;

use crate::mmm::*;

pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> BMmmResult<RawTable> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header_cells = iter.next().context(EmptyExcelSnafu {})?;
    let header: Vec<String> = header_cells
        .iter()
        .enumerate()
        .map(|(idx, c)| read_cell(c, 1, idx))
        .collect::<MmmResult<Vec<String>>>()?;
    debug!("read_excel_table: header: {:?}", header);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // The header is the first line.
        let lineno = (idx + 2) as u64;
        let cells = row
            .iter()
            .enumerate()
            .map(|(col, c)| read_cell(c, lineno, col))
            .collect::<MmmResult<Vec<String>>>()?;
        rows.push(cells);
    }
    debug!("read_excel_table: {} rows", rows.len());
    Ok(RawTable::from_rows(&header, &rows))
}

/// The text of a cell, as it would appear in a CSV export.
fn read_cell(cell: &DataType, lineno: u64, col: usize) -> MmmResult<String> {
    match cell {
        DataType::String(s) => Ok(s.trim().to_string()),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Bool(b) => Ok(b.to_string()),
        // Dates are kept as Excel serial numbers.
        DataType::DateTime(f) => Ok(f.to_string()),
        DataType::Empty => Ok(String::new()),
        other => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("column {}: {:?}", col + 1, other),
        }
        .fail(),
    }
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> BMmmResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_table: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(name) = worksheet_name {
        let wrange = workbook
            .worksheet_range(name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?;
        return Ok(wrange);
    }
    let all_worksheets = workbook.worksheets();
    match all_worksheets.as_slice() {
        [] => Err(Box::new(MmmError::EmptyExcel {})),
        [(name, wrange)] => {
            debug!("read_excel_table: using worksheet {:?}", name);
            Ok(wrange.clone())
        }
        _ => Err(Box::new(MmmError::MissingWorksheetName {
            path: path.to_string(),
        })),
    }
}
