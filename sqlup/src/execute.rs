use crate::{BoxFuture, Result, Value};

/// Executes a parameterized statement and returns the affected row count.
///
/// A failing statement must be reported as [Error::Driver](crate::Error::Driver)
/// carrying the vendor code or SQLSTATE, otherwise it can't be retried.
pub trait Execute: Send + Sync {
    fn execute<'a>(&'a self, statement: &'a str, params: &'a [Value]) -> BoxFuture<'a, Result<u64>>;
}

impl<E> Execute for &E
where
    E: Execute + ?Sized,
{
    fn execute<'a>(&'a self, statement: &'a str, params: &'a [Value]) -> BoxFuture<'a, Result<u64>> {
        (**self).execute(statement, params)
    }
}
