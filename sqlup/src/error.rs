use std::{
    env::VarError,
    fmt::{self, Debug, Display},
};

type StdError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("column `{0}` appears more than once")]
    DuplicateColumn(String),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("compare column list is empty")]
    EmptyCompareColumns,

    #[error("row change has no column")]
    EmptyRowChange,

    #[error("table name is empty")]
    EmptyTable,

    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("invalid upsert options; {0}")]
    InvalidOpts(&'static str),

    #[error("failed parsing env var {name}, got `{value}`")]
    ParseVar { name: String, value: String },

    #[error("unexpected result from matched row probe on {table}")]
    ProbeResult { table: String },

    #[error("upsert on {table} gave up after {attempts} attempts; {last}")]
    RetryExhausted {
        attempts: u32,

        #[source]
        last: DriverError,

        table: String,
    },

    #[error("compare column `{0}` is not part of the row change")]
    UnknownCompareColumn(String),

    #[error(transparent)]
    Unknown(StdError),

    #[error("failed accessing env var {name}, {error}")]
    Var { error: VarError, name: String },
}

impl Error {
    pub fn unknown<E: Into<StdError>>(error: E) -> Self {
        Self::Unknown(error.into())
    }

    /// The driver error behind this error, if any. For [Error::RetryExhausted]
    /// it is the failure of the last attempt.
    pub fn driver(&self) -> Option<&DriverError> {
        match self {
            Self::Driver(e) | Self::RetryExhausted { last: e, .. } => Some(e),
            _ => None,
        }
    }
}

/// Failure reported by a database driver while executing a statement.
///
/// `code` holds the vendor error number (SQL Server, MySQL, SQLite) and
/// `sql_state` the SQLSTATE class (PostgreSQL). Retry decisions are taken
/// from those two fields only, never from the message.
pub struct DriverError {
    pub code: Option<i64>,
    pub message: String,
    pub sql_state: Option<String>,
    source: Option<StdError>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            sql_state: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<i64>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_source<E: Into<StdError>>(mut self, source: E) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }
}

impl Debug for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverError")
            .field("code", &self.code)
            .field("sql_state", &self.sql_state)
            .field("message", &self.message)
            .finish()
    }
}

impl Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.sql_state) {
            (Some(code), _) => write!(f, "driver error {code}: {}", self.message),
            (None, Some(state)) => write!(f, "driver error {state}: {}", self.message),
            (None, None) => write!(f, "driver error: {}", self.message),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
