use crate::{Error, MssqlConn, Result, TransactionScoped};
use std::env::var;
use tiberius::Config;

pub struct MssqlFactory(pub Config);

impl MssqlFactory {
    /// Reads an ADO connection string from the env var `var_name`.
    pub fn from_env(var_name: &str) -> Result<Self> {
        Self::from_env_with_trust(var_name, false)
    }

    /// Same as [from_env](Self::from_env), `trust` accepts the server certificate without
    /// validation.
    pub fn from_env_with_trust(var_name: &str, trust: bool) -> Result<Self> {
        let conn_str = var(var_name).map_err(|error| Error::Var {
            error,
            name: var_name.to_string(),
        })?;

        let mut config = Config::from_ado_string(&conn_str).map_err(Error::ParseAdoConnStr)?;

        if trust {
            config.trust_cert();
        }

        Ok(Self(config))
    }

    pub fn create_conn(&self) -> MssqlConn<Config> {
        MssqlConn::new(self.0.clone())
    }

    /// Connection whose work is rolled back when it is dropped.
    pub fn create_scoped_conn(&self) -> MssqlConn<TransactionScoped<Config>> {
        MssqlConn::new(TransactionScoped(self.0.clone()))
    }
}
