use std::fmt::Display;

use log::{debug, info, warn};
use snafu::{ensure, OptionExt};

pub use crate::config::*;
use crate::dataset::{
    parse_numeric, ChannelSeries, DatasetParts, Labels, ModelInputDataset, Series,
};
use crate::error::*;
use crate::table::RawTable;

/// The roles a column can play in the model input.
#[derive(Eq, PartialEq, Debug, Clone)]
enum Role {
    Kpi,
    RevenuePerKpi,
    Population,
    Controls,
    Control(String),
    Media,
    Spend(String),
    Impressions(String),
    Time,
    Geo,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Kpi => write!(f, "the kpi"),
            Role::RevenuePerKpi => write!(f, "the revenue per kpi"),
            Role::Population => write!(f, "the population"),
            Role::Controls => write!(f, "the control set"),
            Role::Control(col) => write!(f, "control {}", col),
            Role::Media => write!(f, "the media set"),
            Role::Spend(ch) => write!(f, "the spend of channel {}", ch),
            Role::Impressions(ch) => write!(f, "the impressions of channel {}", ch),
            Role::Time => write!(f, "the time coordinates"),
            Role::Geo => write!(f, "the geo coordinates"),
        }
    }
}

/// A column registered for a role, in the table it was registered with.
#[derive(Debug, Clone)]
struct Registered<'t> {
    table: &'t RawTable,
    column: String,
    role: Role,
}

#[derive(Debug, Clone)]
struct MediaRegistration<'t> {
    channel: String,
    spend: Registered<'t>,
    impressions: Option<Registered<'t>>,
}

/// Assembles a model input dataset, one role at a time.
///
/// Every registration consumes the builder and hands it back, so a builder
/// has a single owner at all times. Registrations only keep references to the
/// columns of the table; the values are copied by `build`.
///
/// ```
/// use mmm_input::builder::InputBuilder;
/// use mmm_input::{BuilderOptions, DatasetError, KpiType, RawTable};
///
/// let table = RawTable::from_columns(vec![
///     ("conversions".to_string(), vec!["10".to_string(), "12".to_string()]),
///     ("tv_spend".to_string(), vec!["100".to_string(), "80".to_string()]),
/// ]);
///
/// let dataset = InputBuilder::new(&BuilderOptions::new(KpiType::Revenue))
///     .with_kpi(&table)?
///     .with_media(&table, &[], &["tv_spend".to_string()], &["tv".to_string()])?
///     .build()?;
///
/// assert_eq!(dataset.n_observations(), 2);
/// # Ok::<(), DatasetError>(())
/// ```
#[derive(Debug, Clone)]
pub struct InputBuilder<'t> {
    options: BuilderOptions,
    // The first table passed to the builder.
    origin: Option<&'t RawTable>,
    kpi: Option<Registered<'t>>,
    revenue_per_kpi: Option<Registered<'t>>,
    population: Option<Registered<'t>>,
    controls: Option<Vec<Registered<'t>>>,
    media: Option<Vec<MediaRegistration<'t>>>,
    time: Option<Registered<'t>>,
    geo: Option<Registered<'t>>,
}

impl<'t> InputBuilder<'t> {
    pub fn new(options: &BuilderOptions) -> InputBuilder<'t> {
        InputBuilder {
            options: options.clone(),
            origin: None,
            kpi: None,
            revenue_per_kpi: None,
            population: None,
            controls: None,
            media: None,
            time: None,
            geo: None,
        }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Registers the default KPI column.
    pub fn with_kpi(mut self, table: &'t RawTable) -> DatasetResult<InputBuilder<'t>> {
        ensure_unregistered(self.kpi.is_some(), Role::Kpi)?;
        let column = self.options.default_kpi_column.clone();
        self.kpi = Some(self.register(table, &column, Role::Kpi)?);
        Ok(self)
    }

    /// Registers the default revenue-per-KPI column.
    ///
    /// A revenue KPI is already monetary: for such a KPI, this call is
    /// accepted but ignored.
    pub fn with_revenue_per_kpi(mut self, table: &'t RawTable) -> DatasetResult<InputBuilder<'t>> {
        if self.options.kpi_type == KpiType::Revenue {
            warn!(
                "with_revenue_per_kpi: the kpi type is {}, ignoring column {:?}",
                self.options.kpi_type, self.options.default_revenue_per_kpi_column
            );
            return Ok(self);
        }
        ensure_unregistered(self.revenue_per_kpi.is_some(), Role::RevenuePerKpi)?;
        let column = self.options.default_revenue_per_kpi_column.clone();
        self.revenue_per_kpi = Some(self.register(table, &column, Role::RevenuePerKpi)?);
        Ok(self)
    }

    /// Registers the population column, used to scale every channel.
    pub fn with_population(mut self, table: &'t RawTable) -> DatasetResult<InputBuilder<'t>> {
        ensure_unregistered(self.population.is_some(), Role::Population)?;
        let column = self.options.population_column.clone();
        self.population = Some(self.register(table, &column, Role::Population)?);
        Ok(self)
    }

    /// Registers the control covariates. An empty list means no controls.
    pub fn with_controls(
        mut self,
        table: &'t RawTable,
        control_columns: &[String],
    ) -> DatasetResult<InputBuilder<'t>> {
        ensure_unregistered(self.controls.is_some(), Role::Controls)?;
        let mut controls: Vec<Registered<'t>> = Vec::new();
        for col in control_columns {
            let role = Role::Control(col.clone());
            ensure_unregistered(controls.iter().any(|r| r.column == *col), role.clone())?;
            controls.push(self.register(table, col, role)?);
        }
        self.controls = Some(controls);
        Ok(self)
    }

    /// Registers the media channels.
    ///
    /// `media_spend_columns` and `media_channels` correspond position by
    /// position. `media_columns` holds the impression columns: each of them
    /// is attached to the channel whose name prefixes it, and the channels
    /// left without one only have spend data.
    pub fn with_media(
        mut self,
        table: &'t RawTable,
        media_columns: &[String],
        media_spend_columns: &[String],
        media_channels: &[String],
    ) -> DatasetResult<InputBuilder<'t>> {
        ensure_unregistered(self.media.is_some(), Role::Media)?;
        ensure!(
            media_spend_columns.len() == media_channels.len(),
            MediaListMismatchSnafu {
                reason: format!(
                    "{} spend columns for {} channels",
                    media_spend_columns.len(),
                    media_channels.len()
                ),
            }
        );
        ensure!(!media_channels.is_empty(), NoMediaChannelsSnafu {});

        let mut media: Vec<MediaRegistration<'t>> = Vec::new();
        for (channel, spend_col) in media_channels.iter().zip(media_spend_columns) {
            let role = Role::Spend(channel.clone());
            ensure_unregistered(media.iter().any(|m| m.channel == *channel), role.clone())?;
            let spend = self.register(table, spend_col, role)?;
            media.push(MediaRegistration {
                channel: channel.clone(),
                spend,
                impressions: None,
            });
        }

        for imp_col in media_columns {
            let idx = match_channel(imp_col, media_channels).context(MediaListMismatchSnafu {
                reason: format!("impression column {:?} matches no channel", imp_col),
            })?;
            let role = Role::Impressions(media_channels[idx].clone());
            ensure_unregistered(media[idx].impressions.is_some(), role.clone())?;
            let reg = self.register(table, imp_col, role)?;
            media[idx].impressions = Some(reg);
        }

        for m in media.iter() {
            debug!(
                "with_media: channel {:?} spend: {:?} impressions: {:?}",
                m.channel,
                m.spend.column,
                m.impressions.as_ref().map(|r| &r.column)
            );
        }
        self.media = Some(media);
        Ok(self)
    }

    /// Registers the time column and, when the table has one, the geo column.
    pub fn with_coordinates(mut self, table: &'t RawTable) -> DatasetResult<InputBuilder<'t>> {
        ensure_unregistered(self.time.is_some(), Role::Time)?;
        let time_col = self.options.time_column.clone();
        let geo_col = self.options.geo_column.clone();
        self.time = Some(self.register(table, &time_col, Role::Time)?);
        if table.has_column(&geo_col) {
            self.geo = Some(self.register(table, &geo_col, Role::Geo)?);
        }
        Ok(self)
    }

    /// Validates the registrations and snapshots all the series.
    ///
    /// The checks are done in this order:
    /// 1. the KPI is registered
    /// 2. the revenue per KPI is registered, for a non-revenue KPI
    /// 3. at least one media channel is registered
    /// 4. all the registered columns exist in the first table passed to the builder
    ///
    /// followed by the dataset invariants (aligned series, non-negative spend).
    pub fn build(self) -> DatasetResult<ModelInputDataset> {
        let kpi = self.kpi.as_ref().context(MissingColumnSnafu {
            column: &self.options.default_kpi_column,
            role: Role::Kpi.to_string(),
        })?;
        if self.options.kpi_type == KpiType::NonRevenue {
            ensure!(
                self.revenue_per_kpi.is_some(),
                MissingColumnSnafu {
                    column: &self.options.default_revenue_per_kpi_column,
                    role: Role::RevenuePerKpi.to_string(),
                }
            );
        }
        let media = match self.media.as_deref() {
            Some(media) if !media.is_empty() => media,
            _ => return NoMediaChannelsSnafu {}.fail(),
        };

        // The kpi is registered, so the origin is known.
        if let Some(origin) = self.origin {
            for reg in self.registrations() {
                ensure!(
                    origin.has_column(&reg.column),
                    MissingColumnSnafu {
                        column: &reg.column,
                        role: reg.role.to_string(),
                    }
                );
            }
        }

        let mut channels: Vec<ChannelSeries> = Vec::new();
        for m in media {
            channels.push(ChannelSeries {
                name: m.channel.clone(),
                spend: m.spend.snapshot()?,
                impressions: m.impressions.as_ref().map(|r| r.snapshot()).transpose()?,
            });
        }
        let controls = match &self.controls {
            Some(cs) => cs.iter().map(|r| r.snapshot()).collect::<DatasetResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        let parts = DatasetParts {
            kpi_type: self.options.kpi_type,
            kpi: kpi.snapshot()?,
            revenue_per_kpi: self.revenue_per_kpi.as_ref().map(|r| r.snapshot()).transpose()?,
            population: self.population.as_ref().map(|r| r.snapshot()).transpose()?,
            controls,
            channels,
            time: self.time.as_ref().map(|r| r.labels()).transpose()?,
            geo: self.geo.as_ref().map(|r| r.labels()).transpose()?,
        };
        let dataset = ModelInputDataset::new(parts)?;
        info!(
            "build: dataset with {} observations, channels: {:?}",
            dataset.n_observations(),
            dataset.channel_names()
        );
        Ok(dataset)
    }

    fn register(
        &mut self,
        table: &'t RawTable,
        column: &str,
        role: Role,
    ) -> DatasetResult<Registered<'t>> {
        ensure!(
            table.has_column(column),
            MissingColumnSnafu {
                column,
                role: role.to_string(),
            }
        );
        if self.origin.is_none() {
            self.origin = Some(table);
        }
        debug!("register: {} <- {:?}", role, column);
        Ok(Registered {
            table,
            column: column.to_string(),
            role,
        })
    }

    fn registrations(&self) -> Vec<&Registered<'t>> {
        let mut res: Vec<&Registered<'t>> = Vec::new();
        res.extend(self.kpi.iter());
        res.extend(self.revenue_per_kpi.iter());
        res.extend(self.population.iter());
        res.extend(self.controls.iter().flatten());
        for m in self.media.iter().flatten() {
            res.push(&m.spend);
            res.extend(m.impressions.iter());
        }
        res.extend(self.time.iter());
        res.extend(self.geo.iter());
        res
    }
}

impl<'t> Registered<'t> {
    fn cells(&self) -> DatasetResult<&'t [String]> {
        self.table.column(&self.column).context(MissingColumnSnafu {
            column: &self.column,
            role: self.role.to_string(),
        })
    }

    fn snapshot(&self) -> DatasetResult<Series> {
        parse_numeric(&self.column, self.cells()?)
    }

    fn labels(&self) -> DatasetResult<Labels> {
        Ok(Labels {
            column: self.column.clone(),
            values: self.cells()?.to_vec(),
        })
    }
}

fn ensure_unregistered(registered: bool, role: Role) -> DatasetResult<()> {
    ensure!(
        !registered,
        DuplicateRegistrationSnafu {
            role: role.to_string()
        }
    );
    Ok(())
}

// The channel whose name is the longest prefix of the column, followed by '_'.
fn match_channel(column: &str, channels: &[String]) -> Option<usize> {
    channels
        .iter()
        .enumerate()
        .filter(|(_, ch)| {
            column
                .strip_prefix(ch.as_str())
                .map(|rest| rest.starts_with('_'))
                .unwrap_or(false)
        })
        .max_by_key(|(_, ch)| ch.len())
        .map(|(idx, _)| idx)
}
