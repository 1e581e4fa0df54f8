use clap::Parser;

/// This program turns marketing data into a marketing-mix-modeling report.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the run: the data source, the model settings, the sampling
    /// settings and the outputs. The options given on the command line override the ones in this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The uploaded marketing data: a CSV file with a header row, or an Excel workbook.
    /// Setting this option overrides the data source of the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv, excel or empty) The type of the input. By default, it is guessed from the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file with several worksheets, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (revenue or non_revenue, default non_revenue) Whether the KPI is directly an amount of money, or needs
    /// the revenue per KPI column to be monetized.
    #[clap(long, value_parser)]
    pub kpi_type: Option<String>,

    /// (default conversions) The column holding the KPI.
    #[clap(long, value_parser)]
    pub kpi_column: Option<String>,

    /// (default revenue_per_conversion) The column holding the revenue per KPI.
    #[clap(long, value_parser)]
    pub revenue_per_kpi_column: Option<String>,

    /// (program, optional) The modeling engine. It is called with the path of the request (JSON) and the path of the
    /// report to write. If not provided, the data is only checked and summarized.
    #[clap(long, value_parser)]
    pub engine_command: Option<String>,

    /// (file path, default meridian_mmm_summary.html) Where the engine should write the report.
    #[clap(long, value_parser)]
    pub report: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the model input will be written in JSON format
    /// to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the summary of the model input in JSON format. If provided, mmmrun
    /// will check that the assembled input matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
