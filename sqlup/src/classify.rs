use crate::{Dialect, Error};
use std::fmt::{self, Display};

/// Statement of an upsert attempt that produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Statement {
    Update,
    Probe,
    Insert,
}

/// Why a transient failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contention {
    Deadlock,
    LockTimeout,
    /// Another writer inserted the row between our `UPDATE` and `INSERT`.
    LostRace,
}

impl Contention {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deadlock => "deadlock",
            Self::LockTimeout => "lock_timeout",
            Self::LostRace => "lost_race",
        }
    }
}

impl Display for Contention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Transient(Contention),
    Fatal,
}

/// Classifies an error raised by `statement`.
///
/// Only driver errors can be transient. A duplicate key is a lost race when
/// the fallback `INSERT` raises it; raised by the `UPDATE` it means the new
/// values collide with another row and retrying cannot help.
pub fn classify<D: Dialect + ?Sized>(
    dialect: &D,
    error: &Error,
    statement: Statement,
) -> Classification {
    let Error::Driver(e) = error else {
        return Classification::Fatal;
    };

    let codes = dialect.transient_codes();

    if codes.is_deadlock(e) {
        Classification::Transient(Contention::Deadlock)
    } else if codes.is_lock_timeout(e) {
        Classification::Transient(Contention::LockTimeout)
    } else if statement == Statement::Insert && codes.is_duplicate_key(e) {
        Classification::Transient(Contention::LostRace)
    } else {
        Classification::Fatal
    }
}
