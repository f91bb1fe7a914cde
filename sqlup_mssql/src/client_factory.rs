use crate::{Client, Error, Result};
use sqlup::BoxFuture;
use tiberius::{Config, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;
use tracing::instrument;

pub trait ClientFactory: Send + Sync {
    fn create_client(&self) -> BoxFuture<'_, Result<Client>>;

    /// `true` when each client returned is already inside a transaction.
    fn under_transaction(&self) -> bool {
        false
    }
}

impl ClientFactory for Config {
    fn create_client(&self) -> BoxFuture<'_, Result<Client>> {
        Box::pin(connect(self))
    }
}

#[instrument(name = "ClientFactory::create_client", skip(config), err)]
async fn connect(config: &Config) -> Result<Client> {
    // resolves `host\instance` through the sql browser service.
    let tcp = TcpStream::connect_named(config)
        .await
        .map_err(Error::ConnectNamed)?;

    tcp.set_nodelay(true).map_err(Error::Io)?;

    Client::connect(config.clone(), tcp.compat_write())
        .await
        .map_err(Error::CreateClient)
}
