use sqlup::DriverError;
use std::{env::VarError, io};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed beginning transaction; {0}")]
    BeginTran(#[source] tiberius::error::Error),

    #[error("failed connecting to sql server named instance; {0}")]
    ConnectNamed(#[source] tiberius::error::Error),

    #[error("failed creating client; {0}")]
    CreateClient(#[source] tiberius::error::Error),

    #[error("failed decoding column {index} as {ty}; {source}")]
    Decode {
        index: usize,
        source: tiberius::error::Error,
        ty: &'static str,
    },

    #[error("mssql io: {0}")]
    Io(#[source] io::Error),

    #[error("failed parse ado connection string; {0}")]
    ParseAdoConnStr(#[source] tiberius::error::Error),

    #[error("column {index} of type {ty} is not a scalar value")]
    UnsupportedColumn { index: usize, ty: &'static str },

    #[error("failed accessing env var {name}, {error}")]
    Var { error: VarError, name: String },
}

impl From<Error> for sqlup::Error {
    fn from(value: Error) -> Self {
        sqlup::Error::unknown(value)
    }
}

/// Converts a statement failure into a [DriverError].
///
/// Server errors keep their number (1205 deadlock victim, 1222 lock timeout,
/// 2601 / 2627 duplicate key) so the upsert can tell contention apart.
/// Transport and protocol errors have no number and are never retried.
pub fn driver_error(error: tiberius::error::Error) -> DriverError {
    let (code, message) = match &error {
        tiberius::error::Error::Server(token) => (Some(token.code()), token.message().to_string()),
        e => (None, e.to_string()),
    };

    let mut driver = DriverError::new(message).with_source(error);
    driver.code = code.map(i64::from);
    driver
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlup::{classify, Classification, Mssql, Statement};

    #[test]
    fn protocol_error_has_no_code_and_is_fatal() {
        let e = driver_error(tiberius::error::Error::Protocol("unexpected token".into()));

        assert_eq!(e.code, None);
        assert!(e.message.contains("unexpected token"));
        assert_eq!(
            classify(&Mssql, &e.into(), Statement::Insert),
            Classification::Fatal
        );
    }

    #[test]
    fn converts_into_core_error() {
        let e: sqlup::Error = Error::UnsupportedColumn {
            index: 2,
            ty: "xml",
        }
        .into();

        assert!(matches!(e, sqlup::Error::Unknown(_)));
        assert_eq!(e.to_string(), "column 2 of type xml is not a scalar value");
    }
}
