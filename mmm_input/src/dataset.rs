use log::debug;
use serde::Serialize;
use snafu::ensure;

use crate::config::KpiType;
use crate::error::*;

/// A numeric series, along with the column it was read from.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct Series {
    pub column: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A series of observation labels (time periods or geographies).
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct Labels {
    pub column: String,
    pub values: Vec<String>,
}

/// The media data of one channel.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct ChannelSeries {
    pub name: String,
    pub spend: Series,
    pub impressions: Option<Series>,
}

/// Everything that goes into a model input dataset, before validation.
#[derive(PartialEq, Debug, Clone)]
pub(crate) struct DatasetParts {
    pub kpi_type: KpiType,
    pub kpi: Series,
    pub revenue_per_kpi: Option<Series>,
    pub population: Option<Series>,
    pub controls: Vec<Series>,
    pub channels: Vec<ChannelSeries>,
    pub time: Option<Labels>,
    pub geo: Option<Labels>,
}

/// The input handed to the modeling engine.
///
/// It is a self-contained snapshot: it owns all its series and does not refer
/// to the uploaded table anymore. It can only be obtained through
/// `InputBuilder::build`, and cannot be modified afterwards.
///
/// Invariants:
/// - all the series have the same number of observations
/// - there is at least one channel
/// - the spend of every channel is non-negative
#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInputDataset {
    kpi_type: KpiType,
    kpi: Series,
    revenue_per_kpi: Option<Series>,
    population: Option<Series>,
    controls: Vec<Series>,
    channels: Vec<ChannelSeries>,
    time: Option<Labels>,
    geo: Option<Labels>,
}

impl ModelInputDataset {
    pub(crate) fn new(parts: DatasetParts) -> DatasetResult<ModelInputDataset> {
        ensure!(!parts.channels.is_empty(), NoMediaChannelsSnafu {});

        let expected = parts.kpi.len();
        let mut lengths: Vec<(&str, usize)> = Vec::new();
        for s in parts
            .revenue_per_kpi
            .iter()
            .chain(parts.population.iter())
            .chain(parts.controls.iter())
        {
            lengths.push((s.column.as_str(), s.len()));
        }
        for ch in parts.channels.iter() {
            lengths.push((ch.spend.column.as_str(), ch.spend.len()));
            if let Some(imp) = &ch.impressions {
                lengths.push((imp.column.as_str(), imp.len()));
            }
        }
        for l in parts.time.iter().chain(parts.geo.iter()) {
            lengths.push((l.column.as_str(), l.values.len()));
        }
        for (column, found) in lengths {
            ensure!(
                found == expected,
                MisalignedSeriesSnafu {
                    column,
                    expected,
                    found
                }
            );
        }

        for ch in parts.channels.iter() {
            check_spend(&ch.spend)?;
        }

        debug!(
            "ModelInputDataset: {} observations, {} channels, {} controls",
            expected,
            parts.channels.len(),
            parts.controls.len()
        );
        Ok(ModelInputDataset {
            kpi_type: parts.kpi_type,
            kpi: parts.kpi,
            revenue_per_kpi: parts.revenue_per_kpi,
            population: parts.population,
            controls: parts.controls,
            channels: parts.channels,
            time: parts.time,
            geo: parts.geo,
        })
    }

    pub fn kpi_type(&self) -> KpiType {
        self.kpi_type
    }

    pub fn n_observations(&self) -> usize {
        self.kpi.len()
    }

    pub fn kpi(&self) -> &Series {
        &self.kpi
    }

    pub fn revenue_per_kpi(&self) -> Option<&Series> {
        self.revenue_per_kpi.as_ref()
    }

    pub fn population(&self) -> Option<&Series> {
        self.population.as_ref()
    }

    pub fn controls(&self) -> &[Series] {
        &self.controls
    }

    pub fn channels(&self) -> &[ChannelSeries] {
        &self.channels
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelSeries> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn time(&self) -> Option<&Labels> {
        self.time.as_ref()
    }

    pub fn geo(&self) -> Option<&Labels> {
        self.geo.as_ref()
    }
}

// Spend is a physical quantity: a negative value is corrupted data, and is
// reported as such rather than clamped.
fn check_spend(spend: &Series) -> DatasetResult<()> {
    for (row, v) in spend.values.iter().enumerate() {
        ensure!(
            *v >= 0.0,
            InvalidValueSnafu {
                column: &spend.column,
                row,
                reason: format!("negative spend {}", v),
            }
        );
    }
    Ok(())
}

/// Parses the cells of a column as finite numbers.
pub(crate) fn parse_numeric(column: &str, cells: &[String]) -> DatasetResult<Series> {
    let mut values: Vec<f64> = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        let s = cell.trim();
        ensure!(
            !s.is_empty(),
            InvalidValueSnafu {
                column,
                row,
                reason: "missing value",
            }
        );
        let v = s.parse::<f64>().ok().filter(|v| v.is_finite());
        match v {
            Some(v) => values.push(v),
            None => {
                return InvalidValueSnafu {
                    column,
                    row,
                    reason: format!("not a number: {:?}", s),
                }
                .fail()
            }
        }
    }
    Ok(Series {
        column: column.to_string(),
        values,
    })
}
