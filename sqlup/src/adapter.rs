use crate::{
    classify, Classification, CompareColumns, Dialect, Error, Execute, Query, Result, RowChange,
    Statement, UpsertBuilder, UpsertOpts, Value,
};
use tracing::{debug, error, instrument, warn};

/// Insert-or-update of single rows through a borrowed connection.
///
/// Each attempt runs an `UPDATE` matching the compare columns and falls back
/// to an `INSERT` when no row matched. Deadlocks, lock timeouts and a
/// duplicate key raised by the fallback `INSERT` (another writer won the race)
/// restart the whole sequence, up to [UpsertOpts::max_attempts] attempts.
/// Any other error is returned as is on its first occurrence.
///
/// The adapter never opens a transaction: each statement runs in the caller's
/// transaction if there is one, or commits on its own otherwise. Statements are
/// awaited one after the other and the connection must not be shared with
/// another caller for the duration of the call.
///
/// Retries assume the failed statement left the connection usable, which is
/// not the case inside a caller's transaction on every engine:
/// - PostgreSQL aborts the transaction on any error, a lost race (23505) makes
///   the next attempt fail with 25P02.
/// - SQL Server rolls back the whole transaction of a deadlock victim (1205),
///   the next attempts then run in autocommit.
///
/// Callers running an upsert inside their own transaction should either use a
/// savepoint around the call or set [UpsertOpts::max_attempts] to 1 and retry
/// the whole transaction themselves.
///
/// # Example
/// ```no_run
/// use sqlup::{CompareColumns, Execute, MySql, Query, Result, RowChange, UpsertAdapter};
///
/// async fn save<C: Execute + Query>(conn: &C) -> Result<u64> {
///     let row = RowChange::try_from_iter([("configkey", "theme"), ("configvalue", "dark")])?;
///
///     UpsertAdapter::new(conn, MySql)
///         .upsert("appconfig", &row, &CompareColumns::only(["configkey"]))
///         .await
/// }
/// ```
pub struct UpsertAdapter<'c, C: ?Sized, D> {
    conn: &'c C,
    dialect: D,
    opts: UpsertOpts,
}

impl<'c, C, D> UpsertAdapter<'c, C, D>
where
    C: Execute + Query + ?Sized,
    D: Dialect,
{
    pub fn new(conn: &'c C, dialect: D) -> Self {
        Self {
            conn,
            dialect,
            opts: UpsertOpts::default(),
        }
    }

    pub fn with_opts(conn: &'c C, dialect: D, opts: UpsertOpts) -> Result<Self> {
        opts.validate()?;

        Ok(Self {
            conn,
            dialect,
            opts,
        })
    }

    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    pub fn opts(&self) -> &UpsertOpts {
        &self.opts
    }

    /// Updates the row of `table` matching `compare`, or inserts `row` when
    /// there is none. Returns the affected row count.
    ///
    /// # Errors
    /// - [Error::RetryExhausted] when every attempt failed on contention.
    /// - The driver error unchanged when it is not contention.
    /// - A precondition error, before any statement runs, for an empty table
    ///   name, an empty row or a compare column missing from the row.
    #[instrument(
        name = "UpsertAdapter::upsert",
        skip(self, row, compare),
        fields(dialect = self.dialect.name()),
        err
    )]
    pub async fn upsert(
        &self,
        table: &str,
        row: &RowChange,
        compare: &CompareColumns,
    ) -> Result<u64> {
        #[cfg(feature = "telemetry")]
        let instant = std::time::Instant::now();

        let result = self.upsert_impl(table, row, compare).await;

        #[cfg(feature = "telemetry")]
        crate::telemetry::upsert_done(table, outcome(&result), instant);

        result
    }

    async fn upsert_impl(
        &self,
        table: &str,
        row: &RowChange,
        compare: &CompareColumns,
    ) -> Result<u64> {
        if compare.is_all() {
            debug!("matching on every column of the row");
        }

        let plan = Plan::new(UpsertBuilder::new(&self.dialect, table, row, compare)?);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let (statement, error) = match self.attempt(&plan).await {
                Ok(count) => return Ok(count),
                Err(e) => e,
            };

            let contention = match classify(&self.dialect, &error, statement) {
                Classification::Transient(c) => c,
                Classification::Fatal => return Err(error),
            };

            let last = match error {
                Error::Driver(e) => e,
                e => return Err(e),
            };

            if attempt >= self.opts.max_attempts {
                error!(attempt, %contention, error = %last, "upsert retry budget exhausted");

                return Err(Error::RetryExhausted {
                    attempts: attempt,
                    last,
                    table: table.to_owned(),
                });
            }

            warn!(attempt, %contention, ?statement, error = %last, "upsert contention, retrying");

            #[cfg(feature = "telemetry")]
            crate::telemetry::upsert_retry(table, contention);

            let delay = self.opts.backoff(attempt);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    async fn attempt(&self, plan: &Plan) -> std::result::Result<u64, (Statement, Error)> {
        let params = plan.builder.update_params();
        let count = self
            .conn
            .execute(&plan.update_sql, params)
            .await
            .map_err(|e| (Statement::Update, e))?;

        if count > 0 {
            return Ok(count);
        }

        // the update count may only reflect changed rows, a row already
        // holding the values would then be reported as missing.
        if !self.dialect.reports_matched_rows() {
            let matched = self.probe(plan).await.map_err(|e| (Statement::Probe, e))?;

            if matched > 0 {
                debug!(matched, "row already up to date");
                return Ok(matched);
            }
        }

        debug!(table = plan.builder.table(), "no row matched, inserting");

        let params = plan.builder.insert_params();
        self.conn
            .execute(&plan.insert_sql, params)
            .await
            .map_err(|e| (Statement::Insert, e))
    }

    async fn probe(&self, plan: &Plan) -> Result<u64> {
        let rows = self
            .conn
            .query_rows(&plan.probe_sql, plan.builder.probe_params())
            .await?;

        rows.first()
            .and_then(|row| row.first())
            .and_then(Value::as_i64)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| Error::ProbeResult {
                table: plan.builder.table().to_owned(),
            })
    }
}

struct Plan {
    builder: UpsertBuilder,
    insert_sql: String,
    probe_sql: String,
    update_sql: String,
}

impl Plan {
    fn new(builder: UpsertBuilder) -> Self {
        Self {
            insert_sql: builder.insert_sql(),
            probe_sql: builder.probe_sql(),
            update_sql: builder.update_sql(),
            builder,
        }
    }
}

#[cfg(feature = "telemetry")]
fn outcome(result: &Result<u64>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(Error::RetryExhausted { .. }) => "exhausted",
        Err(_) => "error",
    }
}
