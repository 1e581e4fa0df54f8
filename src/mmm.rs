use log::{debug, info, warn};

use mmm_input::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::mmm::config_reader::*;
use crate::mmm::engine_cmd::CommandEngine;
use crate::mmm::io_common::{log_preview, InputProvider};

pub mod config_reader;
pub mod engine_cmd;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;

/// The name of the report offered for download when nothing else is asked.
const DEFAULT_REPORT_PATH: &str = "meridian_mmm_summary.html";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MmmError {
    #[snafu(display("Error opening CSV file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },

    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file has no data"))]
    EmptyExcel {},
    #[snafu(display(
        "The Excel file {path} has several worksheets, the worksheet name must be provided"
    ))]
    MissingWorksheetName { path: String },
    #[snafu(display("Unexpected cell on line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },

    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("No input file: use --input or the dataSource section of --config"))]
    MissingInput {},
    #[snafu(display("Unknown input type {input_type:?}"))]
    UnknownInputType { input_type: String },
    #[snafu(display("Unknown KPI type {kpi_type:?} (expected revenue or non_revenue)"))]
    UnknownKpiType { kpi_type: String },

    #[snafu(display("The uploaded data cannot be used"))]
    InvalidDataset { source: DatasetError },
    #[snafu(display("The modeling engine failed"))]
    Modeling { source: EngineError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type MmmResult<T> = Result<T, MmmError>;
pub type BMmmResult<T> = Result<T, Box<MmmError>>;

/// All the settings of one run, after merging the command line and the
/// configuration file.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub input_path: String,
    pub provider: InputProvider,
    pub excel_worksheet_name: Option<String>,
    pub options: BuilderOptions,
    pub sampling: SamplingSettings,
    pub engine: Option<EngineSettings>,
    pub report_path: PathBuf,
    pub summary_path: Option<String>,
    pub reference_path: Option<String>,
}

fn resolve_settings(args: &Args, config: Option<(RunConfig, PathBuf)>) -> MmmResult<RunSettings> {
    let (config, root) = match config {
        Some((c, root)) => (c, Some(root)),
        None => (RunConfig::default(), None),
    };
    // Relative paths in the configuration are relative to its directory.
    let in_root = |p: &str| -> String {
        match &root {
            Some(r) => r.join(p).display().to_string(),
            None => p.to_string(),
        }
    };

    let source = config.data_source.clone();
    let input_path = match (&args.input, &source) {
        (Some(p), _) => p.clone(),
        (None, Some(ds)) => in_root(&ds.file_path),
        (None, None) => return MissingInputSnafu {}.fail(),
    };
    let input_type = args
        .input_type
        .clone()
        .or_else(|| source.as_ref().and_then(|ds| ds.provider.clone()));
    let provider = InputProvider::detect(&input_path, input_type.as_deref())?;
    let excel_worksheet_name = args
        .excel_worksheet_name
        .clone()
        .or_else(|| source.and_then(|ds| ds.excel_worksheet_name));

    let model = config.model_settings.unwrap_or_default();
    let kpi_type_s = args
        .kpi_type
        .clone()
        .or(model.kpi_type)
        .unwrap_or_else(|| KpiType::NonRevenue.to_string());
    let kpi_type = KpiType::parse(&kpi_type_s).context(UnknownKpiTypeSnafu {
        kpi_type: kpi_type_s.clone(),
    })?;
    let mut options = BuilderOptions::new(kpi_type);
    if let Some(col) = args.kpi_column.clone().or(model.default_kpi_column) {
        options = options.with_kpi_column(&col);
    }
    if let Some(col) = args
        .revenue_per_kpi_column
        .clone()
        .or(model.default_revenue_per_kpi_column)
    {
        options = options.with_revenue_per_kpi_column(&col);
    }

    let output = config.output_settings.unwrap_or_default();
    let report_path = match (&args.report, &output.report_path) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(p)) => PathBuf::from(in_root(p)),
        (None, None) => PathBuf::from(DEFAULT_REPORT_PATH),
    };
    let summary_path = args
        .out
        .clone()
        .or_else(|| output.summary_path.as_deref().map(in_root));

    let engine = match (&args.engine_command, config.engine) {
        (Some(cmd), Some(e)) => Some(EngineSettings {
            command: cmd.clone(),
            ..e
        }),
        (Some(cmd), None) => Some(EngineSettings {
            command: cmd.clone(),
            args: Vec::new(),
        }),
        (None, e) => e,
    };

    Ok(RunSettings {
        input_path,
        provider,
        excel_worksheet_name,
        options,
        sampling: config.sampling_settings.unwrap_or_default(),
        engine,
        report_path,
        summary_path,
        reference_path: args.reference.clone(),
    })
}

fn read_upload(settings: &RunSettings) -> BMmmResult<RawTable> {
    info!(
        "Attempting to read upload {:?} ({:?})",
        settings.input_path, settings.provider
    );
    let table = match settings.provider {
        InputProvider::Csv => io_csv::read_csv_table(&settings.input_path)?,
        InputProvider::Excel => io_excel::read_excel_table(
            &settings.input_path,
            settings.excel_worksheet_name.as_deref(),
        )?,
    };
    log_preview(&table, 5);
    Ok(table)
}

/// A short description of a model input, used to check uploads.
pub fn build_summary_js(dataset: &ModelInputDataset) -> JSValue {
    let channels: Vec<JSValue> = dataset
        .channels()
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "spend": c.spend.column,
                "impressions": c.impressions.as_ref().map(|s| s.column.clone()),
            })
        })
        .collect();
    let controls: Vec<String> = dataset.controls().iter().map(|s| s.column.clone()).collect();
    json!({
        "kpiType": dataset.kpi_type().to_string(),
        "observations": dataset.n_observations(),
        "kpi": dataset.kpi().column,
        "revenuePerKpi": dataset.revenue_per_kpi().map(|s| s.column.clone()),
        "population": dataset.population().map(|s| s.column.clone()),
        "time": dataset.time().map(|l| l.column.clone()),
        "geo": dataset.geo().map(|l| l.column.clone()),
        "controls": controls,
        "channels": channels,
    })
}

fn write_summary(path: &str, pretty_js: &str) -> MmmResult<()> {
    if path == "stdout" {
        println!("{}", pretty_js);
        return Ok(());
    }
    info!("Writing summary to {:?}", path);
    fs::write(path, pretty_js).context(WritingOutputSnafu { path })
}

fn check_reference(reference_path: &str, pretty_js: &str) -> MmmResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_ref.as_str(), pretty_js, "\n");
        whatever!("Difference detected between the model input and the reference summary")
    }
    Ok(())
}

/// Runs one upload, from the file to the report.
pub fn run_report(args: &Args) -> BMmmResult<()> {
    let config = match &args.config {
        Some(p) => {
            let config = read_config(p)?;
            let root = Path::new(p)
                .parent()
                .map(|r| r.to_path_buf())
                .unwrap_or_default();
            Some((config, root))
        }
        None => None,
    };
    let settings = resolve_settings(args, config)?;
    info!("settings: {:?}", settings);

    let table = read_upload(&settings)?;
    let dataset =
        assemble_from_table(&table, &settings.options).context(InvalidDatasetSnafu {})?;

    let summary_js = build_summary_js(&dataset);
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    if let Some(p) = &settings.summary_path {
        write_summary(p, &pretty_js)?;
    }
    if let Some(p) = &settings.reference_path {
        check_reference(p, &pretty_js)?;
    }

    match &settings.engine {
        Some(engine_settings) => {
            let engine = CommandEngine::new(engine_settings, &settings.sampling, &settings.report_path);
            let handle = engine
                .fit_and_report(&dataset)
                .context(ModelingSnafu {})?;
            println!(
                "Model run complete! The summary report is available at {}",
                handle.path.display()
            );
        }
        None => {
            info!("No engine command provided, stopping after the checks");
            if settings.summary_path.is_none() {
                println!("{}", pretty_js);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata")
    }

    fn test_path(lpath: &str) -> String {
        test_dir().join(lpath).display().to_string()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mmmrun-{}-{}", std::process::id(), name))
    }

    fn args_for(input: &str) -> Args {
        Args {
            input: Some(test_path(input)),
            ..Args::default()
        }
    }

    #[test]
    fn basic_upload_matches_reference() {
        let _ = env_logger::builder().is_test(true).try_init();
        let args = Args {
            reference: Some(test_path("basic/expected_summary.json")),
            ..args_for("basic/upload.csv")
        };
        run_report(&args).unwrap();
    }

    #[test]
    fn config_file_matches_reference() {
        let args = Args {
            config: Some(test_path("basic/config.json")),
            reference: Some(test_path("basic/expected_summary.json")),
            ..Args::default()
        };
        run_report(&args).unwrap();
    }

    #[test]
    fn revenue_kpi_differs_from_reference() {
        let args = Args {
            kpi_type: Some("revenue".to_string()),
            reference: Some(test_path("basic/expected_summary.json")),
            ..args_for("basic/upload.csv")
        };
        let e = run_report(&args).unwrap_err();
        assert!(matches!(*e, MmmError::Whatever { .. }));
    }

    #[test]
    fn summary_is_written() {
        let out = temp_path("summary.json");
        let args = Args {
            out: Some(out.display().to_string()),
            ..args_for("basic/upload.csv")
        };
        run_report(&args).unwrap();
        let written: JSValue =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        let expected = read_summary(&test_path("basic/expected_summary.json")).unwrap();
        assert_eq!(written, expected);
        let _ = fs::remove_file(out);
    }

    #[test]
    fn upload_without_channels() {
        let e = run_report(&args_for("no_channels/upload.csv")).unwrap_err();
        assert!(matches!(
            *e,
            MmmError::InvalidDataset {
                source: DatasetError::NoMediaChannels {}
            }
        ));
    }

    #[test]
    fn upload_with_negative_spend() {
        let e = run_report(&args_for("negative_spend/upload.csv")).unwrap_err();
        match *e {
            MmmError::InvalidDataset {
                source: DatasetError::InvalidValue { column, row, .. },
            } => {
                assert_eq!(column, "search_spend");
                assert_eq!(row, 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn upload_without_revenue_column() {
        let e = run_report(&args_for("revenue_kpi/upload.csv")).unwrap_err();
        assert!(matches!(
            *e,
            MmmError::InvalidDataset {
                source: DatasetError::MissingColumn { .. }
            }
        ));

        let args = Args {
            kpi_type: Some("revenue".to_string()),
            kpi_column: Some("revenue".to_string()),
            reference: Some(test_path("revenue_kpi/expected_summary.json")),
            ..args_for("revenue_kpi/upload.csv")
        };
        run_report(&args).unwrap();
    }

    #[test]
    fn settings_from_config() {
        let config_path = test_path("basic/config.json");
        let config = read_config(&config_path).unwrap();
        let settings = resolve_settings(&Args::default(), Some((config, test_dir().join("basic"))))
            .unwrap();
        assert_eq!(settings.input_path, test_path("basic/upload.csv"));
        assert_eq!(settings.provider, InputProvider::Csv);
        assert_eq!(settings.options.kpi_type, KpiType::NonRevenue);
        assert_eq!(settings.sampling.n_chains, 2);
        assert_eq!(settings.sampling.n_keep, 500);
        assert_eq!(settings.report_path, test_dir().join("basic/report.html"));
        assert!(settings.engine.is_none());
    }

    #[test]
    fn command_line_overrides_config() {
        let config = read_config(&test_path("basic/config.json")).unwrap();
        let args = Args {
            kpi_type: Some("revenue".to_string()),
            report: Some("elsewhere.html".to_string()),
            engine_command: Some("fit_model".to_string()),
            ..args_for("negative_spend/upload.csv")
        };
        let settings = resolve_settings(&args, Some((config, test_dir().join("basic")))).unwrap();
        assert_eq!(settings.input_path, test_path("negative_spend/upload.csv"));
        assert_eq!(settings.options.kpi_type, KpiType::Revenue);
        assert_eq!(settings.report_path, PathBuf::from("elsewhere.html"));
        assert_eq!(
            settings.engine.map(|e| e.command),
            Some("fit_model".to_string())
        );
    }

    #[test]
    fn settings_errors() {
        assert!(matches!(
            resolve_settings(&Args::default(), None),
            Err(MmmError::MissingInput {})
        ));
        let args = Args {
            kpi_type: Some("profit".to_string()),
            ..args_for("basic/upload.csv")
        };
        assert!(matches!(
            resolve_settings(&args, None),
            Err(MmmError::UnknownKpiType { .. })
        ));
        let settings = resolve_settings(&args_for("basic/upload.csv"), None).unwrap();
        assert_eq!(settings.report_path, PathBuf::from(DEFAULT_REPORT_PATH));
        assert_eq!(settings.sampling, SamplingSettings::default());
    }

    #[cfg(unix)]
    #[test]
    fn engine_command_produces_the_report() {
        let report = temp_path("report.html");
        let config = RunConfig {
            engine: Some(EngineSettings {
                command: "sh".to_string(),
                args: vec!["-c".to_string(), "cp \"$0\" \"$1\"".to_string()],
            }),
            ..RunConfig::default()
        };
        let args = Args {
            report: Some(report.display().to_string()),
            ..args_for("basic/upload.csv")
        };
        let settings = resolve_settings(&args, Some((config, test_dir()))).unwrap();
        let table = read_upload(&settings).unwrap();
        let dataset = assemble_from_table(&table, &settings.options).unwrap();
        let engine = CommandEngine::new(
            settings.engine.as_ref().unwrap(),
            &settings.sampling,
            &settings.report_path,
        );
        let handle = engine.fit_and_report(&dataset).unwrap();
        assert_eq!(handle.path, report);

        // The engine was handed the request.
        let request: JSValue =
            serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(request["samplingSettings"]["nPriorDraws"], json!(300));
        assert_eq!(request["dataset"]["kpi"]["column"], json!("conversions"));
        let _ = fs::remove_file(report);
        let _ = fs::remove_file(engine.request_path());
    }
}
