use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    env::{var, VarError},
    str::FromStr,
    time::Duration,
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Retry settings of an [UpsertAdapter](crate::UpsertAdapter).
///
/// Missing fields take their default when deserialized, so the options can be
/// embedded as a partial section of an application config.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct UpsertOpts {
    /// Total attempts, the first one included.
    pub max_attempts: u32,

    /// Delay before the first retry, doubled on each following retry.
    /// Zero retries immediately.
    pub backoff_ms: u64,

    pub backoff_max_ms: u64,
}

impl Default for UpsertOpts {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: 0,
            backoff_max_ms: 1000,
        }
    }
}

impl UpsertOpts {
    /// Reads `{prefix}_MAX_ATTEMPTS`, `{prefix}_BACKOFF_MS` and `{prefix}_BACKOFF_MAX_MS`.
    /// Variables that are not set keep their default value.
    pub fn from_env(prefix: &str) -> Result<Self> {
        let mut opts = Self::default();

        if let Some(v) = env_var(format!("{prefix}_MAX_ATTEMPTS"))? {
            opts.max_attempts = v;
        }

        if let Some(v) = env_var(format!("{prefix}_BACKOFF_MS"))? {
            opts.backoff_ms = v;
        }

        if let Some(v) = env_var(format!("{prefix}_BACKOFF_MAX_MS"))? {
            opts.backoff_max_ms = v;
        }

        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::InvalidOpts("max_attempts must be at least 1"));
        }

        Ok(())
    }

    pub fn with_backoff(mut self, backoff: Duration, max: Duration) -> Self {
        self.backoff_ms = backoff.as_millis().try_into().unwrap_or(u64::MAX);
        self.backoff_max_ms = max.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay to wait before the `retry`th retry (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        if self.backoff_ms == 0 || retry == 0 {
            return Duration::ZERO;
        }

        let factor = 1u64 << (retry - 1).min(16);
        let ms = self
            .backoff_ms
            .saturating_mul(factor)
            .min(self.backoff_max_ms.max(self.backoff_ms));

        Duration::from_millis(ms)
    }
}

fn env_var<T: FromStr>(name: String) -> Result<Option<T>> {
    match var(&name) {
        Ok(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map(Some).map_err(|_| Error::ParseVar { name, value })
        }
        Err(VarError::NotPresent) => Ok(None),
        Err(error) => Err(Error::Var { error, name }),
    }
}
