use snafu::prelude::*;

use crate::mmm::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    /// csv or excel. If missing, it is inferred from the file extension.
    pub provider: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(rename = "kpiType")]
    pub kpi_type: Option<String>,
    #[serde(rename = "defaultKpiColumn")]
    pub default_kpi_column: Option<String>,
    #[serde(rename = "defaultRevenuePerKpiColumn")]
    pub default_revenue_per_kpi_column: Option<String>,
}

/// The sampling schedule forwarded to the engine.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    #[serde(rename = "nPriorDraws")]
    pub n_prior_draws: u32,
    #[serde(rename = "nChains")]
    pub n_chains: u32,
    #[serde(rename = "nAdapt")]
    pub n_adapt: u32,
    #[serde(rename = "nBurnin")]
    pub n_burnin: u32,
    #[serde(rename = "nKeep")]
    pub n_keep: u32,
}

impl SamplingSettings {
    pub const DEFAULT: SamplingSettings = SamplingSettings {
        n_prior_draws: 300,
        n_chains: 2,
        n_adapt: 500,
        n_burnin: 300,
        n_keep: 500,
    };
}

impl Default for SamplingSettings {
    fn default() -> Self {
        SamplingSettings::DEFAULT
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportPath")]
    pub report_path: Option<String>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    pub command: String,
    /// Passed to the command before the request and report paths.
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "dataSource")]
    pub data_source: Option<DataSource>,
    #[serde(rename = "modelSettings")]
    pub model_settings: Option<ModelSettings>,
    #[serde(rename = "samplingSettings")]
    pub sampling_settings: Option<SamplingSettings>,
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    pub engine: Option<EngineSettings>,
}

pub fn read_config(path: &str) -> MmmResult<RunConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: RunConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> MmmResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
