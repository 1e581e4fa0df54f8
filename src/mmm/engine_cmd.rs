// Runs the modeling engine as an external program.

use std::process::Command;

use mmm_input::{EngineError, ModelEngine, ModelInputDataset, ReportHandle};
use snafu::whatever;

use crate::mmm::*;

/// A modeling engine running in its own process.
///
/// The program receives two extra arguments: the path of a JSON request with
/// the dataset and the sampling settings, and the path of the HTML report it
/// should write.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    command: String,
    args: Vec<String>,
    sampling: SamplingSettings,
    report_path: PathBuf,
}

impl CommandEngine {
    pub fn new(
        settings: &EngineSettings,
        sampling: &SamplingSettings,
        report_path: &Path,
    ) -> CommandEngine {
        CommandEngine {
            command: settings.command.clone(),
            args: settings.args.clone(),
            sampling: *sampling,
            report_path: report_path.to_path_buf(),
        }
    }

    /// The request is written next to the report.
    pub fn request_path(&self) -> PathBuf {
        self.report_path.with_extension("request.json")
    }

    fn write_request(&self, dataset: &ModelInputDataset) -> Result<PathBuf, EngineError> {
        let request = json!({
            "samplingSettings": self.sampling,
            "dataset": dataset,
        });
        let contents = match serde_json::to_string(&request) {
            Ok(c) => c,
            Err(e) => return Err(engine_error("cannot serialize the model input", e)),
        };
        let path = self.request_path();
        if let Err(e) = fs::write(&path, contents) {
            return Err(engine_error(
                &format!("cannot write the request {}", path.display()),
                e,
            ));
        }
        Ok(path)
    }
}

impl ModelEngine for CommandEngine {
    fn fit_and_report(&self, dataset: &ModelInputDataset) -> Result<ReportHandle, EngineError> {
        let request_path = self.write_request(dataset)?;
        info!(
            "Running the engine {:?} on {} (sampling: {:?})",
            self.command,
            request_path.display(),
            self.sampling
        );
        let status = Command::new(&self.command)
            .args(&self.args)
            .arg(&request_path)
            .arg(&self.report_path)
            .status();
        let status = match status {
            Ok(s) => s,
            Err(e) => {
                return Err(engine_error(
                    &format!("cannot start the engine {:?}", self.command),
                    e,
                ))
            }
        };
        if !status.success() {
            whatever!("the engine {:?} exited with {}", self.command, status)
        }
        if !self.report_path.exists() {
            whatever!(
                "the engine {:?} did not write the report {}",
                self.command,
                self.report_path.display()
            )
        }
        Ok(ReportHandle {
            path: self.report_path.clone(),
        })
    }
}

fn engine_error<E: std::error::Error + 'static>(message: &str, e: E) -> EngineError {
    EngineError::Whatever {
        message: message.to_string(),
        source: Some(Box::new(e)),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use mmm_input::{assemble_from_table, BuilderOptions, KpiType, RawTable};

    fn dataset() -> ModelInputDataset {
        let t = RawTable::from_columns(vec![
            ("conversions".to_string(), vec!["1".to_string()]),
            ("tv_spend".to_string(), vec!["2".to_string()]),
        ]);
        assemble_from_table(&t, &BuilderOptions::new(KpiType::Revenue)).unwrap()
    }

    fn engine(name: &str, command: &str, args: &[&str]) -> CommandEngine {
        let report = std::env::temp_dir().join(format!(
            "mmmrun-{}-{}.html",
            std::process::id(),
            name
        ));
        CommandEngine::new(
            &EngineSettings {
                command: command.to_string(),
                args: args.iter().map(|s| s.to_string()).collect(),
            },
            &SamplingSettings::DEFAULT,
            &report,
        )
    }

    #[test]
    fn request_next_to_report() {
        let e = engine("naming", "true", &[]);
        assert!(e.request_path().display().to_string().ends_with("naming.request.json"));
    }

    #[test]
    fn failing_engine() {
        let e = engine("failing", "false", &[]);
        let err = e.fit_and_report(&dataset()).unwrap_err();
        assert!(err.to_string().contains("exited with"));
        let _ = fs::remove_file(e.request_path());
    }

    #[test]
    fn engine_without_report() {
        let e = engine("no_report", "true", &[]);
        let err = e.fit_and_report(&dataset()).unwrap_err();
        assert!(err.to_string().contains("did not write the report"));
        let _ = fs::remove_file(e.request_path());
    }

    #[test]
    fn missing_engine() {
        let e = engine("missing", "/nonexistent/fit_model", &[]);
        let err = e.fit_and_report(&dataset()).unwrap_err();
        assert!(err.to_string().starts_with("cannot start the engine"));
        let _ = fs::remove_file(e.request_path());
    }
}
