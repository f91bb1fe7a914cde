use crate::{DriverError, Error, Result};
use std::borrow::Cow;

/// The few dialect differences an upsert has to care about: how parameters
/// and identifiers are written, which error codes mean contention, and what
/// an `UPDATE` reports as its row count.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Placeholder of the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> Cow<'static, str>;

    /// Opening and closing identifier quote characters.
    fn quote_chars(&self) -> (char, char);

    /// Error codes classified as transient contention.
    fn transient_codes(&self) -> &TransientCodes;

    /// `true` when `UPDATE` reports the rows matched by its `WHERE` clause,
    /// `false` when it only reports the rows whose values actually changed.
    fn reports_matched_rows(&self) -> bool {
        true
    }

    fn quote_ident(&self, ident: &str) -> Result<String> {
        let (open, close) = self.quote_chars();

        if ident.trim().is_empty() || ident.contains(close) {
            return Err(Error::InvalidIdentifier(ident.to_string()));
        }

        let mut s = String::with_capacity(ident.len() + 2);
        s.push(open);
        s.push_str(ident);
        s.push(close);
        Ok(s)
    }

    /// Quotes a possibly schema qualified table name (`schema.table`).
    fn quote_table(&self, table: &str) -> Result<String> {
        if table.trim().is_empty() {
            return Err(Error::EmptyTable);
        }

        let parts = table
            .split('.')
            .map(|part| self.quote_ident(part))
            .collect::<Result<Vec<_>>>()?;

        Ok(parts.join("."))
    }
}

impl<D: Dialect + ?Sized> Dialect for &D {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn placeholder(&self, index: usize) -> Cow<'static, str> {
        (**self).placeholder(index)
    }

    fn quote_chars(&self) -> (char, char) {
        (**self).quote_chars()
    }

    fn transient_codes(&self) -> &TransientCodes {
        (**self).transient_codes()
    }

    fn reports_matched_rows(&self) -> bool {
        (**self).reports_matched_rows()
    }
}

/// Vendor codes and SQLSTATEs of the errors an upsert may retry.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransientCodes {
    pub deadlock: &'static [i64],
    pub deadlock_states: &'static [&'static str],
    pub duplicate_key: &'static [i64],
    pub duplicate_key_states: &'static [&'static str],
    pub lock_timeout: &'static [i64],
    pub lock_timeout_states: &'static [&'static str],
}

impl TransientCodes {
    pub fn is_deadlock(&self, e: &DriverError) -> bool {
        matches(self.deadlock, self.deadlock_states, e)
    }

    pub fn is_duplicate_key(&self, e: &DriverError) -> bool {
        matches(self.duplicate_key, self.duplicate_key_states, e)
    }

    pub fn is_lock_timeout(&self, e: &DriverError) -> bool {
        matches(self.lock_timeout, self.lock_timeout_states, e)
    }
}

fn matches(codes: &[i64], states: &[&str], e: &DriverError) -> bool {
    e.code.map_or(false, |c| codes.contains(&c))
        || e.sql_state
            .as_deref()
            .map_or(false, |s| states.contains(&s))
}

/// MySQL / MariaDB. `UPDATE` reports changed rows unless the client was
/// connected with `CLIENT_FOUND_ROWS`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn placeholder(&self, _: usize) -> Cow<'static, str> {
        Cow::Borrowed("?")
    }

    fn quote_chars(&self) -> (char, char) {
        ('`', '`')
    }

    fn transient_codes(&self) -> &TransientCodes {
        // ER_LOCK_DEADLOCK, ER_LOCK_WAIT_TIMEOUT, ER_DUP_ENTRY, ER_DUP_ENTRY_WITH_KEY_NAME
        static CODES: TransientCodes = TransientCodes {
            deadlock: &[1213],
            deadlock_states: &[],
            duplicate_key: &[1062, 1586],
            duplicate_key_states: &[],
            lock_timeout: &[1205],
            lock_timeout_states: &[],
        };

        &CODES
    }

    fn reports_matched_rows(&self) -> bool {
        false
    }
}

/// Microsoft SQL Server.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mssql;

impl Dialect for Mssql {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn placeholder(&self, index: usize) -> Cow<'static, str> {
        Cow::Owned(format!("@p{index}"))
    }

    fn quote_chars(&self) -> (char, char) {
        ('[', ']')
    }

    fn transient_codes(&self) -> &TransientCodes {
        // 1205 deadlock victim, 1222 lock request time out,
        // 2601 duplicate key in unique index, 2627 unique constraint violation
        static CODES: TransientCodes = TransientCodes {
            deadlock: &[1205],
            deadlock_states: &[],
            duplicate_key: &[2601, 2627],
            duplicate_key_states: &[],
            lock_timeout: &[1222],
            lock_timeout_states: &[],
        };

        &CODES
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> Cow<'static, str> {
        Cow::Owned(format!("${index}"))
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn transient_codes(&self) -> &TransientCodes {
        static CODES: TransientCodes = TransientCodes {
            deadlock: &[],
            deadlock_states: &["40P01", "40001"],
            duplicate_key: &[],
            duplicate_key_states: &["23505"],
            lock_timeout: &[],
            lock_timeout_states: &["55P03"],
        };

        &CODES
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, index: usize) -> Cow<'static, str> {
        Cow::Owned(format!("?{index}"))
    }

    fn quote_chars(&self) -> (char, char) {
        ('"', '"')
    }

    fn transient_codes(&self) -> &TransientCodes {
        // Drivers report either primary or extended result codes, both are listed.
        // A primary SQLITE_CONSTRAINT (19) can't be told apart from other
        // constraint failures and is taken as a duplicate key.
        static CODES: TransientCodes = TransientCodes {
            // SQLITE_LOCKED, _SHAREDCACHE, _VTAB
            deadlock: &[6, 262, 518],
            deadlock_states: &[],
            // SQLITE_CONSTRAINT, _PRIMARYKEY, _UNIQUE
            duplicate_key: &[19, 1555, 2067],
            duplicate_key_states: &[],
            // SQLITE_BUSY, _RECOVERY, _SNAPSHOT, _TIMEOUT
            lock_timeout: &[5, 261, 517, 773],
            lock_timeout_states: &[],
        };

        &CODES
    }
}
