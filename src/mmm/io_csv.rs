// Primitives for reading CSV uploads.

use snafu::prelude::*;

use crate::mmm::*;

pub fn read_csv_table(path: &str) -> BMmmResult<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_table: header: {:?}", header);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        rows.push(line.iter().map(|s| s.to_string()).collect());
    }
    debug!("read_csv_table: {} rows", rows.len());
    Ok(RawTable::from_rows(&header, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> String {
        let p = std::env::temp_dir().join(format!("mmmrun-{}-{}", std::process::id(), name));
        fs::write(&p, contents).unwrap();
        p.display().to_string()
    }

    #[test]
    fn read_upload() {
        let p = write_temp(
            "read_upload.csv",
            "conversions, tv_spend ,control_1\n10,1.5,0\n12, 2 ,1\n",
        );
        let t = read_csv_table(&p).unwrap();
        assert_eq!(
            t.column_names(),
            vec!["conversions", "tv_spend", "control_1"]
        );
        assert_eq!(t.n_rows(), 2);
        assert_eq!(
            t.column("tv_spend"),
            Some(vec!["1.5".to_string(), "2".to_string()].as_slice())
        );
        let _ = fs::remove_file(p);
    }

    #[test]
    fn ragged_lines_are_refused() {
        let p = write_temp("ragged.csv", "conversions,tv_spend\n10,1\n12\n");
        let e = read_csv_table(&p).unwrap_err();
        assert!(matches!(*e, MmmError::CsvLineParse { lineno: 3, .. }));
        let _ = fs::remove_file(p);
    }

    #[test]
    fn missing_file() {
        let e = read_csv_table("/nonexistent/upload.csv").unwrap_err();
        assert!(matches!(*e, MmmError::OpeningCsv { .. }));
    }
}
