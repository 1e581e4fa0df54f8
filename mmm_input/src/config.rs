// ********* Input data structures ***********

use std::fmt::Display;

use serde::Serialize;

/// How the KPI series is monetized.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize)]
pub enum KpiType {
    /// The KPI is directly monetary (for example revenue).
    #[serde(rename = "revenue")]
    Revenue,
    /// The KPI counts something else (conversions, sign-ups) and requires a
    /// revenue-per-KPI series to be monetized.
    #[serde(rename = "non_revenue")]
    NonRevenue,
}

impl KpiType {
    pub fn parse(s: &str) -> Option<KpiType> {
        match s {
            "revenue" => Some(KpiType::Revenue),
            "non_revenue" => Some(KpiType::NonRevenue),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KpiType::Revenue => "revenue",
            KpiType::NonRevenue => "non_revenue",
        }
    }
}

impl Display for KpiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One marketing channel, as inferred from the column names.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ChannelSpec {
    pub name: String,
    pub spend_column: String,
    /// Only present when a `<name>_impression` column exists.
    pub impression_column: Option<String>,
}

// ********* Configuration **********

/// The naming conventions used to read an uploaded table.
///
/// Column names are the whole contract of an upload: there is no schema file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Conventions {
    pub spend_suffix: &'static str,
    pub impression_suffix: &'static str,
    /// Any column containing this marker is a control covariate.
    pub control_marker: &'static str,
    pub population_column: &'static str,
    pub kpi_column: &'static str,
    pub revenue_per_kpi_column: &'static str,
    pub time_column: &'static str,
    pub geo_column: &'static str,
}

impl Conventions {
    pub const DEFAULT: Conventions = Conventions {
        spend_suffix: "_spend",
        impression_suffix: "_impression",
        control_marker: "control",
        population_column: "population",
        kpi_column: "conversions",
        revenue_per_kpi_column: "revenue_per_conversion",
        time_column: "time",
        geo_column: "geo",
    };

    /// The spend column declaring the given channel.
    pub fn spend_column(&self, channel: &str) -> String {
        format!("{}{}", channel, self.spend_suffix)
    }

    /// The impression column that would attach to the given channel.
    pub fn impression_column(&self, channel: &str) -> String {
        format!("{}{}", channel, self.impression_suffix)
    }
}

/// The options fixed when the input builder is created.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BuilderOptions {
    pub kpi_type: KpiType,
    pub default_kpi_column: String,
    /// Only used when `kpi_type` is `NonRevenue`.
    pub default_revenue_per_kpi_column: String,
    pub population_column: String,
    pub time_column: String,
    pub geo_column: String,
}

impl BuilderOptions {
    /// Options following the default column conventions.
    pub fn new(kpi_type: KpiType) -> BuilderOptions {
        let conv = &Conventions::DEFAULT;
        BuilderOptions {
            kpi_type,
            default_kpi_column: conv.kpi_column.to_string(),
            default_revenue_per_kpi_column: conv.revenue_per_kpi_column.to_string(),
            population_column: conv.population_column.to_string(),
            time_column: conv.time_column.to_string(),
            geo_column: conv.geo_column.to_string(),
        }
    }

    pub fn with_kpi_column(self, column: &str) -> BuilderOptions {
        BuilderOptions {
            default_kpi_column: column.to_string(),
            ..self
        }
    }

    pub fn with_revenue_per_kpi_column(self, column: &str) -> BuilderOptions {
        BuilderOptions {
            default_revenue_per_kpi_column: column.to_string(),
            ..self
        }
    }
}

impl Default for BuilderOptions {
    fn default() -> Self {
        BuilderOptions::new(KpiType::NonRevenue)
    }
}
