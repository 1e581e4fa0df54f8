/*!

This is the long-form manual for `mmm_input` and `mmmrun`.

## Preparing an upload

The upload is a CSV file (or an Excel workbook) with a header row. There is no
schema file: the names of the columns tell what each column holds.

| column                       | meaning                                           |
|------------------------------|---------------------------------------------------|
| `conversions`                | the KPI (required)                                |
| `revenue_per_conversion`     | the revenue of one conversion                     |
| `population`                 | the population of the observation, for scaling    |
| `<channel>_spend`            | the spend of a channel (at least one is required) |
| `<channel>_impression`       | the impressions of a channel                      |
| `...control...`              | a control covariate                               |
| `time`                       | the time period of the observation                |
| `geo`                        | the geography of the observation                  |

A minimal upload looks like this:

```text
time,conversions,revenue_per_conversion,tv_spend,tv_impression,search_spend,control_price
2024-01-01,120,35.5,1000,52000,300,1.0
2024-01-08,135,35.5,1200,61000,280,1.1
```

It declares two channels: `tv` (spend and impressions) and `search` (spend
only), and one control (`control_price`).

Every numeric series must be complete: an empty cell or a cell that is not a
number is refused. All the series must have the same number of rows. Spend
cannot be negative.

## KPI types

* `non_revenue` (default): the KPI counts conversions. It is monetized with the
  `revenue_per_conversion` column, which is then required.
* `revenue`: the KPI is already an amount of money. A `revenue_per_conversion`
  column is ignored (with a warning).

The names of the KPI and revenue-per-KPI columns can be changed with the
`--kpi-column` and `--revenue-per-kpi-column` flags.

## Running the model

```bash
mmmrun -i marketing.csv --engine-command ./fit_meridian.sh --report summary.html
```

The engine command is called with two arguments: a JSON request (the dataset
and the sampling settings) and the path of the HTML report to write. Without
an engine command, `mmmrun` only checks the upload and prints a summary of the
dataset.

## Configuration

Instead of flags, a JSON configuration can be provided with `--config`:

```json
{
  "dataSource": { "filePath": "marketing.csv", "provider": "csv" },
  "modelSettings": { "kpiType": "non_revenue" },
  "samplingSettings": { "nPriorDraws": 300, "nChains": 2, "nAdapt": 500, "nBurnin": 300, "nKeep": 500 },
  "outputSettings": { "reportPath": "meridian_mmm_summary.html" }
}
```

Paths in the configuration are relative to the configuration file. Flags
passed on the command line take precedence.

*/
