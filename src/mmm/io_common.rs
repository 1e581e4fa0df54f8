use std::path::Path;

use snafu::prelude::*;

use crate::mmm::*;

/// The supported upload formats.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputProvider {
    Csv,
    Excel,
}

impl InputProvider {
    /// The explicit input type wins, otherwise the extension of the file decides.
    pub fn detect(path: &str, input_type: Option<&str>) -> MmmResult<InputProvider> {
        let input_type = match input_type {
            Some(t) => t.to_ascii_lowercase(),
            None => Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("csv")
                .to_ascii_lowercase(),
        };
        match input_type.as_str() {
            "csv" => Ok(InputProvider::Csv),
            "excel" | "xlsx" => Ok(InputProvider::Excel),
            _ => UnknownInputTypeSnafu { input_type }.fail(),
        }
    }
}

/// Logs the first rows of an upload.
pub fn log_preview(table: &RawTable, n: usize) {
    info!(
        "Preview of uploaded data ({} rows): {:?}",
        table.n_rows(),
        table.column_names()
    );
    for row in table.head(n) {
        info!("  {}", row.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_provider() {
        assert_eq!(
            InputProvider::detect("data/upload.csv", None).unwrap(),
            InputProvider::Csv
        );
        assert_eq!(
            InputProvider::detect("data/upload.XLSX", None).unwrap(),
            InputProvider::Excel
        );
        assert_eq!(
            InputProvider::detect("data/upload", None).unwrap(),
            InputProvider::Csv
        );
        assert_eq!(
            InputProvider::detect("data/upload.txt", Some("excel")).unwrap(),
            InputProvider::Excel
        );
        assert!(matches!(
            InputProvider::detect("data/upload.parquet", None),
            Err(MmmError::UnknownInputType { input_type }) if input_type == "parquet"
        ));
    }
}
