mod adapter;
mod classify;
mod compare_columns;
mod dialect;
mod error;
mod execute;
mod query;
mod row_change;
#[cfg(feature = "telemetry")]
mod telemetry;
mod upsert_builder;
mod upsert_opts;
mod value;

pub use adapter::UpsertAdapter;
pub use classify::{classify, Classification, Contention, Statement};
pub use compare_columns::CompareColumns;
pub use dialect::{Dialect, Mssql, MySql, Postgres, Sqlite, TransientCodes};
pub use error::{DriverError, Error};
pub use execute::Execute;
pub use futures::future::BoxFuture;
pub use query::Query;
pub use row_change::RowChange;
pub use upsert_builder::UpsertBuilder;
pub use upsert_opts::{UpsertOpts, DEFAULT_MAX_ATTEMPTS};
pub use value::Value;

pub type Result<T> = std::result::Result<T, Error>;

/// A row returned by [Query::query_rows], one value per selected column.
pub type Row = Vec<Value>;
