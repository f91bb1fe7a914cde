use crate::{Client, ClientFactory, Error, Result};
use sqlup::BoxFuture;

/// This can wrap a ClientFactory and creates a transaction for each Client that are returned.
/// It is useful for integration tests making sure that all rows are rolled back once the
/// connection is dropped.
///
/// A deadlock victim (1205) has its transaction rolled back by the server; the client is
/// kept and its following statements, upsert retries included, are committed.
pub struct TransactionScoped<F>(pub F);

impl<F> ClientFactory for TransactionScoped<F>
where
    F: ClientFactory,
{
    fn create_client(&self) -> BoxFuture<'_, Result<Client>> {
        Box::pin(async {
            let mut client = self.0.create_client().await?;

            client
                .simple_query("BEGIN TRAN")
                .await
                .map_err(Error::BeginTran)?
                .into_results()
                .await
                .map_err(Error::BeginTran)?;

            Ok(client)
        })
    }

    fn under_transaction(&self) -> bool {
        true
    }
}
