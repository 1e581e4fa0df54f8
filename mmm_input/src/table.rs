//! The uploaded table, as read by the loaders.

use log::debug;

/// A named column of raw cells.
#[derive(Eq, PartialEq, Debug, Clone)]
struct Column {
    name: String,
    cells: Vec<String>,
}

/// An uploaded table: rows are observations (time, and possibly geography),
/// columns are named series.
///
/// The cells are kept as text. They are only interpreted as numbers when a
/// column gets registered in the input builder, so that a free-form column
/// (dates, geo names, comments) never prevents loading the upload.
///
/// Columns built with `from_columns` may have different lengths; this is only
/// caught when the dataset is built.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    columns: Vec<Column>,
}

impl RawTable {
    /// Builds a table from a header and a list of rows.
    ///
    /// Missing trailing cells in a row are treated as empty cells and extra
    /// cells beyond the header are dropped.
    pub fn from_rows(header: &[String], rows: &[Vec<String>]) -> RawTable {
        let columns = header
            .iter()
            .enumerate()
            .map(|(idx, name)| Column {
                name: name.clone(),
                cells: rows
                    .iter()
                    .map(|row| row.get(idx).cloned().unwrap_or_default())
                    .collect(),
            })
            .collect();
        let table = RawTable { columns };
        debug!(
            "from_rows: {} columns, {} rows",
            table.columns.len(),
            table.n_rows()
        );
        table
    }

    /// Builds a table column by column.
    pub fn from_columns(columns: Vec<(String, Vec<String>)>) -> RawTable {
        RawTable {
            columns: columns
                .into_iter()
                .map(|(name, cells)| Column { name, cells })
                .collect(),
        }
    }

    /// The column names, in the order of the upload.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// The cells of a column. If the name is repeated in the header, the first
    /// column with that name wins.
    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.cells.as_slice())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// The number of observations (the length of the longest column).
    pub fn n_rows(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    /// The first rows of the table, for previews.
    pub fn head(&self, n: usize) -> Vec<Vec<&str>> {
        (0..self.n_rows().min(n))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| c.cells.get(row).map(|s| s.as_str()).unwrap_or(""))
                    .collect()
            })
            .collect()
    }
}
