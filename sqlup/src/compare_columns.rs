use crate::{Error, Result, RowChange, Value};

/// Columns used to find the existing row in the update branch of an upsert.
///
/// [CompareColumns::All] matches on every column being written. Since the
/// update then sets each column to the value it was matched on, it can only
/// hit a row that already holds exactly those values; any row that differs
/// is left alone and a new row is inserted instead. Prefer naming the
/// identity columns with [CompareColumns::only].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CompareColumns {
    #[default]
    All,
    Only(Vec<String>),
}

impl CompareColumns {
    pub fn only<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(columns.into_iter().map(Into::into).collect())
    }

    #[inline]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Resolves the compare columns against the row change, in compare order.
    pub(crate) fn resolve<'a>(&'a self, row: &'a RowChange) -> Result<Vec<(&'a str, &'a Value)>> {
        let names = match self {
            Self::All => return Ok(row.iter().collect()),
            Self::Only(names) => names,
        };

        if names.is_empty() {
            return Err(Error::EmptyCompareColumns);
        }

        let mut keys: Vec<(&str, &Value)> = Vec::with_capacity(names.len());

        for name in names {
            if keys.iter().any(|(n, _)| n == name) {
                return Err(Error::DuplicateColumn(name.clone()));
            }

            match row.get(name) {
                Some(value) => keys.push((name.as_str(), value)),
                None => return Err(Error::UnknownCompareColumn(name.clone())),
            }
        }

        Ok(keys)
    }
}

impl From<&[&str]> for CompareColumns {
    fn from(columns: &[&str]) -> Self {
        Self::only(columns.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for CompareColumns {
    fn from(columns: [&str; N]) -> Self {
        Self::only(columns)
    }
}

impl From<Vec<String>> for CompareColumns {
    fn from(columns: Vec<String>) -> Self {
        Self::Only(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RowChange {
        RowChange::try_from_iter([("configvalue", "v"), ("configkey", "k")]).unwrap()
    }

    #[test]
    fn all_resolves_every_column() -> Result<()> {
        let row = row();
        let keys = CompareColumns::All.resolve(&row)?;
        assert_eq!(keys.len(), 2);
        Ok(())
    }

    #[test]
    fn only_keeps_compare_order() -> Result<()> {
        let row = row();
        let compare = CompareColumns::from(["configkey", "configvalue"]);
        let keys = compare.resolve(&row)?;
        assert_eq!(keys[0].0, "configkey");
        assert_eq!(keys[1].0, "configvalue");
        Ok(())
    }

    #[test]
    fn unknown_empty_and_repeated_columns_fail() {
        let row = row();

        assert!(matches!(
            CompareColumns::from(["appid"]).resolve(&row),
            Err(Error::UnknownCompareColumn(n)) if n == "appid"
        ));

        assert!(matches!(
            CompareColumns::Only(Vec::new()).resolve(&row),
            Err(Error::EmptyCompareColumns)
        ));

        assert!(matches!(
            CompareColumns::from(["configkey", "configkey"]).resolve(&row),
            Err(Error::DuplicateColumn(_))
        ));
    }
}
