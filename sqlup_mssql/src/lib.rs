mod client_factory;
mod error;
mod from_sql;
mod mssql_conn;
mod mssql_factory;
mod parameter;
mod transaction_scoped;

pub use client_factory::ClientFactory;
pub use error::{driver_error, Error};
pub use mssql_conn::MssqlConn;
pub use mssql_factory::MssqlFactory;
pub use sqlup::Mssql;
pub use transaction_scoped::TransactionScoped;

pub type Client = tiberius::Client<tokio_util::compat::Compat<tokio::net::TcpStream>>;
pub type Result<T, E = Error> = std::result::Result<T, E>;
