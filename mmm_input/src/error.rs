use snafu::Snafu;

/// Errors that prevent a model input dataset from being assembled.
///
/// None of them is recoverable within one run: a failed build never yields a
/// partial dataset.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatasetError {
    #[snafu(display("missing column {column:?} (required for {role})"))]
    MissingColumn { column: String, role: String },

    #[snafu(display("no media channel: at least one <channel>_spend column is required"))]
    NoMediaChannels {},

    #[snafu(display(
        "series {column:?} has {found} observations, expected {expected}"
    ))]
    MisalignedSeries {
        column: String,
        expected: usize,
        found: usize,
    },

    #[snafu(display("invalid value in column {column:?} at row {row}: {reason}"))]
    InvalidValue {
        column: String,
        row: usize,
        reason: String,
    },

    #[snafu(display("{role} is registered more than once"))]
    DuplicateRegistration { role: String },

    #[snafu(display("inconsistent media columns: {reason}"))]
    MediaListMismatch { reason: String },
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Failure reported by the external modeling engine.
///
/// Engines build it with `snafu::whatever!` or `whatever_context`.
#[derive(Debug, Snafu)]
pub enum EngineError {
    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

/// Failure of a complete run: either the dataset could not be assembled, or
/// the engine failed on it.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PipelineError {
    #[snafu(display("cannot assemble the model input: {source}"))]
    Assembly { source: DatasetError },
    #[snafu(display("the modeling engine failed: {source}"))]
    Modeling { source: EngineError },
}
