use crate::{Error, Result, Value};

/// Columns and values written by an upsert.
///
/// Columns keep their insertion order so that the parameters of the
/// generated statements are stable from one attempt to the next.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowChange {
    columns: Vec<(String, Value)>,
}

impl RowChange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row change from `(column, value)` pairs, rejecting empty or
    /// repeated column names.
    pub fn try_from_iter<I, S, V>(iter: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let mut row = Self::new();

        for (name, value) in iter {
            row.insert(name, value)?;
        }

        Ok(row)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(Error::InvalidIdentifier(name));
        }

        if self.contains(&name) {
            return Err(Error::DuplicateColumn(name));
        }

        self.columns.push((name, value.into()));
        Ok(())
    }

    /// Chaining form of [insert](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        self.insert(name, value)?;
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }
}
