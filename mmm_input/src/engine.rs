//! The seam with the modeling engine, and the convention-driven assembly of
//! an upload into a dataset.

use std::path::PathBuf;

use log::{debug, info};
use snafu::ResultExt;

use crate::builder::InputBuilder;
use crate::config::BuilderOptions;
use crate::conventions::resolve_columns;
use crate::dataset::ModelInputDataset;
use crate::error::*;
use crate::table::RawTable;

/// Where the engine left its report.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportHandle {
    pub path: PathBuf,
}

/// A modeling engine: it samples the model on a dataset and renders a report.
///
/// The call is synchronous and opaque. Retries, timeouts and cancellation are
/// the engine's business.
pub trait ModelEngine {
    fn fit_and_report(&self, dataset: &ModelInputDataset) -> Result<ReportHandle, EngineError>;
}

/// Assembles a dataset from an upload, following the naming conventions.
///
/// The optional signals are only registered when the upload carries them:
/// the revenue per KPI, the population, the controls, and the time and geo
/// coordinates. The channels are those declared by the `<channel>_spend`
/// columns.
pub fn assemble_from_table(
    table: &RawTable,
    options: &BuilderOptions,
) -> DatasetResult<ModelInputDataset> {
    let resolved = resolve_columns(&table.column_names());
    info!(
        "assemble_from_table: channels: {:?} controls: {:?}",
        resolved.channel_names(),
        resolved.control_columns
    );

    let mut builder = InputBuilder::new(options).with_kpi(table)?;

    if table.has_column(&options.default_revenue_per_kpi_column) {
        builder = builder.with_revenue_per_kpi(table)?;
    }
    if table.has_column(&options.population_column) {
        builder = builder.with_population(table)?;
    }
    if !resolved.control_columns.is_empty() {
        builder = builder.with_controls(table, &resolved.control_columns)?;
    }
    if table.has_column(&options.time_column) {
        builder = builder.with_coordinates(table)?;
    }
    debug!(
        "assemble_from_table: impressions: {:?}",
        resolved.impression_columns()
    );

    builder
        .with_media(
            table,
            &resolved.impression_columns(),
            &resolved.spend_columns(),
            &resolved.channel_names(),
        )?
        .build()
}

/// Runs a complete upload: assembly, then modeling.
pub fn run_pipeline(
    table: &RawTable,
    options: &BuilderOptions,
    engine: &dyn ModelEngine,
) -> Result<ReportHandle, PipelineError> {
    let dataset = assemble_from_table(table, options).context(AssemblySnafu {})?;
    info!(
        "run_pipeline: handing {} observations to the engine",
        dataset.n_observations()
    );
    let handle = engine.fit_and_report(&dataset).context(ModelingSnafu {})?;
    info!("run_pipeline: report at {}", handle.path.display());
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KpiType;
    use snafu::whatever;
    use std::cell::RefCell;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn table(cols: &[(&str, &[&str])]) -> RawTable {
        RawTable::from_columns(
            cols.iter()
                .map(|(name, cells)| (name.to_string(), strings(cells)))
                .collect(),
        )
    }

    /// Remembers the channels of the datasets it was given.
    struct RecordingEngine {
        seen: RefCell<Vec<Vec<String>>>,
    }

    impl ModelEngine for RecordingEngine {
        fn fit_and_report(
            &self,
            dataset: &ModelInputDataset,
        ) -> Result<ReportHandle, EngineError> {
            self.seen.borrow_mut().push(dataset.channel_names());
            Ok(ReportHandle {
                path: PathBuf::from("summary_output.html"),
            })
        }
    }

    struct FailingEngine {}

    impl ModelEngine for FailingEngine {
        fn fit_and_report(&self, _: &ModelInputDataset) -> Result<ReportHandle, EngineError> {
            whatever!("sampler diverged")
        }
    }

    fn upload() -> RawTable {
        table(&[
            ("time", &["2024-01-01", "2024-01-08", "2024-01-15"]),
            ("conversions", &["10", "12", "9"]),
            ("revenue_per_conversion", &["2", "2", "2"]),
            ("population", &["500", "500", "500"]),
            ("control_price", &["1.1", "1.2", "1.0"]),
            ("tv_spend", &["100", "120", "90"]),
            ("tv_impression", &["1000", "1100", "950"]),
            ("search_spend", &["10", "0", "5"]),
        ])
    }

    #[test]
    fn assemble_everything_present() {
        let _ = env_logger::builder().is_test(true).try_init();
        let ds = assemble_from_table(&upload(), &BuilderOptions::default()).unwrap();
        assert_eq!(ds.channel_names(), strings(&["tv", "search"]));
        assert!(ds.channel("tv").unwrap().impressions.is_some());
        assert!(ds.channel("search").unwrap().impressions.is_none());
        assert_eq!(ds.controls()[0].column, "control_price");
        assert!(ds.population().is_some());
        assert!(ds.revenue_per_kpi().is_some());
        assert_eq!(ds.time().map(|l| l.values.len()), Some(3));
        assert!(ds.geo().is_none());
    }

    #[test]
    fn assemble_minimal_upload() {
        let t = table(&[("conversions", &["1", "2"]), ("tv_spend", &["3", "4"])]);
        let ds = assemble_from_table(&t, &BuilderOptions::new(KpiType::Revenue)).unwrap();
        assert!(ds.controls().is_empty());
        assert!(ds.population().is_none());
        assert!(ds.time().is_none());

        // A non-revenue kpi cannot be monetized without its revenue column.
        assert!(matches!(
            assemble_from_table(&t, &BuilderOptions::new(KpiType::NonRevenue)),
            Err(DatasetError::MissingColumn { column, .. }) if column == "revenue_per_conversion"
        ));
    }

    #[test]
    fn assemble_without_channels() {
        let t = table(&[
            ("conversions", &["1", "2"]),
            ("revenue_per_conversion", &["3", "4"]),
        ]);
        assert_eq!(
            assemble_from_table(&t, &BuilderOptions::default()),
            Err(DatasetError::NoMediaChannels {})
        );
    }

    #[test]
    fn pipeline_hands_the_dataset_over() {
        let engine = RecordingEngine {
            seen: RefCell::new(Vec::new()),
        };
        let handle = run_pipeline(&upload(), &BuilderOptions::default(), &engine).unwrap();
        assert_eq!(handle.path, PathBuf::from("summary_output.html"));
        assert_eq!(*engine.seen.borrow(), vec![strings(&["tv", "search"])]);
    }

    #[test]
    fn pipeline_failures() {
        let engine = RecordingEngine {
            seen: RefCell::new(Vec::new()),
        };
        let t = table(&[("conversions", &["1"]), ("tv_spend", &["-1"])]);
        let res = run_pipeline(&t, &BuilderOptions::new(KpiType::Revenue), &engine);
        assert!(matches!(
            res,
            Err(PipelineError::Assembly {
                source: DatasetError::InvalidValue { .. }
            })
        ));
        // No modeling attempt on a failed build.
        assert!(engine.seen.borrow().is_empty());

        let res = run_pipeline(&upload(), &BuilderOptions::default(), &FailingEngine {});
        match res {
            Err(e @ PipelineError::Modeling { .. }) => {
                assert_eq!(
                    e.to_string(),
                    "the modeling engine failed: sampler diverged"
                );
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
