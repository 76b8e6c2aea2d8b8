//! Error types for column replacements.
//!
//! Every failure is classified into an [`ErrorKind`] so a serving layer can
//! map it onto a user-facing message without string matching:
//!
//! - **Configuration**: unknown strategy tag, missing or malformed option
//! - **Lookup**: unknown dataset id or column name
//! - **Type**: an operation applied to an incompatible column type
//!
//! Errors are serializable as `{code, kind, message}` so they can be sent to
//! a frontend as-is.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// Broad classification of a [`ReplacementError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad strategy tag or option, raised at construction.
    Configuration,
    /// Unknown dataset or column, raised at build time.
    Lookup,
    /// Type-incompatible operation, raised at build time.
    Type,
    /// Failure inside polars, IO or JSON handling.
    Internal,
}

/// The main error type for column replacements.
#[derive(Error, Debug)]
pub enum ReplacementError {
    /// Strategy tag is not one of `spaces`, `strings`, `value`, `imputer`.
    #[error("Unknown replacement type '{0}'")]
    UnknownStrategy(String),

    /// A required option is absent from the configuration.
    #[error("Replacement type '{strategy}' requires the '{option}' option")]
    MissingOption { strategy: String, option: String },

    /// An option is present but unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset id is not present in the registry.
    #[error("Dataset '{0}' not found")]
    DatasetNotFound(String),

    /// Column was not found in the dataset.
    #[error("Column '{column}' not found in dataset '{data_id}'")]
    ColumnNotFound { data_id: String, column: String },

    /// Operation is not applicable to the column's values.
    #[error("Column '{column}' is incompatible with this replacement: {reason}")]
    TypeMismatch { column: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ReplacementError>,
    },
}

impl ReplacementError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ReplacementError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a [`ReplacementError::TypeMismatch`].
    pub fn type_mismatch(column: impl Into<String>, reason: impl Into<String>) -> Self {
        ReplacementError::TypeMismatch {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownStrategy(_) => "UNKNOWN_STRATEGY",
            Self::MissingOption { .. } => "MISSING_OPTION",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::DatasetNotFound(_) => "DATASET_NOT_FOUND",
            Self::ColumnNotFound { .. } => "COLUMN_NOT_FOUND",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownStrategy(_) | Self::MissingOption { .. } | Self::InvalidConfig(_) => {
                ErrorKind::Configuration
            }
            Self::DatasetNotFound(_) | Self::ColumnNotFound { .. } => ErrorKind::Lookup,
            Self::TypeMismatch { .. } => ErrorKind::Type,
            Self::Io(_) | Self::Polars(_) | Self::Json(_) => ErrorKind::Internal,
            Self::WithContext { source, .. } => source.kind(),
        }
    }

    /// Check if this error was caused by the configuration.
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// Check if this error was caused by an unknown dataset or column.
    pub fn is_lookup(&self) -> bool {
        self.kind() == ErrorKind::Lookup
    }
}

/// Serialize implementation for IPC compatibility.
///
/// Errors are serialized as a struct with `code`, `kind` and `message` fields.
impl Serialize for ReplacementError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ReplacementError", 3)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for replacement operations.
pub type Result<T> = std::result::Result<T, ReplacementError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ReplacementError::Polars(e).with_context(context))
    }
}
