use crate::{driver_error, from_sql::row_values, parameter::Parameter, Client, ClientFactory};
use sqlup::{
    BoxFuture, DriverError, Execute, Mssql, Query, Result, Row, UpsertAdapter, UpsertOpts, Value,
};
use tiberius::ToSql;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{instrument, warn};

/// A single sql server connection, created on first use.
///
/// Statements are serialized: a caller holds the client for the whole
/// statement. A client that failed for any other reason than a server error
/// is dropped and the next statement reconnects.
///
/// With a [TransactionScoped](crate::TransactionScoped) factory, a deadlock
/// victim (1205) keeps its client but the server has rolled back its
/// transaction: following statements run in autocommit.
pub struct MssqlConn<F> {
    client: Mutex<Option<Client>>,
    client_factory: F,
}

impl<F> MssqlConn<F>
where
    F: ClientFactory,
{
    pub fn new(client_factory: F) -> Self {
        Self {
            client: Mutex::new(None),
            client_factory,
        }
    }

    pub fn client_factory(&self) -> &F {
        &self.client_factory
    }

    pub fn upsert_adapter(&self) -> UpsertAdapter<'_, Self, Mssql> {
        UpsertAdapter::new(self, Mssql)
    }

    pub fn upsert_adapter_with(&self, opts: UpsertOpts) -> Result<UpsertAdapter<'_, Self, Mssql>> {
        UpsertAdapter::with_opts(self, Mssql, opts)
    }

    async fn state_client(&self) -> Result<(MutexGuard<'_, Option<Client>>, Client)> {
        let mut state = self.client.lock().await;

        let client = match state.take() {
            Some(client) => client,
            None => self.client_factory.create_client().await?,
        };

        Ok((state, client))
    }

    #[instrument(name = "MssqlConn::execute", skip(self, params), err)]
    async fn execute_impl(&self, statement: &str, params: &[Value]) -> Result<u64> {
        let (mut state, mut client) = self.state_client().await?;
        let params = params.iter().map(Parameter).collect::<Vec<_>>();
        let params = params.iter().map(|p| p as &dyn ToSql).collect::<Vec<_>>();

        match client.execute(statement, &params).await {
            Ok(result) => {
                *state = Some(client);
                Ok(result.total())
            }
            Err(e) => Err(self.release(&mut state, client, e).into()),
        }
    }

    #[instrument(name = "MssqlConn::query_rows", skip(self, params), err)]
    async fn query_rows_impl(&self, statement: &str, params: &[Value]) -> Result<Vec<Row>> {
        let (mut state, mut client) = self.state_client().await?;
        let params = params.iter().map(Parameter).collect::<Vec<_>>();
        let params = params.iter().map(|p| p as &dyn ToSql).collect::<Vec<_>>();

        let result = match client.query(statement, &params).await {
            Ok(stream) => stream.into_first_result().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(rows) => {
                *state = Some(client);

                Ok(rows
                    .into_iter()
                    .map(row_values)
                    .collect::<crate::Result<Vec<_>>>()?)
            }
            Err(e) => Err(self.release(&mut state, client, e).into()),
        }
    }

    fn release(
        &self,
        state: &mut Option<Client>,
        client: Client,
        e: tiberius::error::Error,
    ) -> DriverError {
        let server = matches!(e, tiberius::error::Error::Server(_));
        let e = driver_error(e);

        if server {
            if self.client_factory.under_transaction() && rolls_back_transaction(&e) {
                warn!(code = e.code, "server rolled back the transaction of the client");
            }

            *state = Some(client);
        } else if self.client_factory.under_transaction() {
            warn!("dropping client in error, its transaction is rolled back");
        }

        e
    }
}

/// Server errors that end the transaction in progress.
fn rolls_back_transaction(e: &DriverError) -> bool {
    // deadlock victim
    e.code == Some(1205)
}

impl<F> Execute for MssqlConn<F>
where
    F: ClientFactory,
{
    fn execute<'a>(&'a self, statement: &'a str, params: &'a [Value]) -> BoxFuture<'a, Result<u64>> {
        Box::pin(self.execute_impl(statement, params))
    }
}

impl<F> Query for MssqlConn<F>
where
    F: ClientFactory,
{
    fn query_rows<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, Result<Vec<Row>>> {
        Box::pin(self.query_rows_impl(statement, params))
    }
}
