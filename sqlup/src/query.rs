use crate::{BoxFuture, Result, Row, Value};

pub trait Query: Send + Sync {
    /// Execute a query and returns all the rows of the first result set.
    fn query_rows<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, Result<Vec<Row>>>;
}

impl<Q> Query for &Q
where
    Q: Query + ?Sized,
{
    fn query_rows<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, Result<Vec<Row>>> {
        (**self).query_rows(statement, params)
    }
}
