/*!
Assembly of marketing-mix-modeling (MMM) inputs from uploaded spreadsheets.

An upload is a plain table: one row per observation (a time period, possibly
for one geography), one column per series. The column names are the only
schema:

* `<channel>_spend` declares a marketing channel
* `<channel>_impression` attaches impressions to a declared channel
* any column containing `control` is a control covariate
* `conversions`, `revenue_per_conversion` and `population` are the default
  KPI, revenue-per-KPI and population columns

The data flows in one direction:

```text
RawTable --resolve_columns--> ResolvedColumns --InputBuilder--> ModelInputDataset --ModelEngine--> report
```

The modeling itself (sampling, report rendering) is done by an external
engine, behind the [`ModelEngine`] trait.

For more details on the conventions, see the [manual].
*/

mod config;
mod error;

pub mod builder;
pub mod conventions;
pub mod dataset;
pub mod engine;
pub mod manual;
pub mod table;

pub use crate::config::*;
pub use crate::conventions::{resolve_columns, resolve_columns_with, ResolvedColumns};
pub use crate::dataset::{ChannelSeries, Labels, ModelInputDataset, Series};
pub use crate::engine::{assemble_from_table, run_pipeline, ModelEngine, ReportHandle};
pub use crate::error::*;
pub use crate::table::RawTable;
