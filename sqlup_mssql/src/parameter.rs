use sqlup::Value;
use std::borrow::Cow;
use tiberius::{ColumnData, ToSql};

/// Binds a [Value] as a tiberius parameter without copying it.
#[derive(Debug)]
pub(crate) struct Parameter<'a>(pub &'a Value);

impl ToSql for Parameter<'_> {
    fn to_sql(&self) -> ColumnData<'_> {
        match self.0 {
            // an untyped NULL converts implicitly to any column type.
            Value::Null => ColumnData::String(None),
            Value::Bool(v) => ColumnData::Bit(Some(*v)),
            Value::I64(v) => ColumnData::I64(Some(*v)),
            Value::F64(v) => ColumnData::F64(Some(*v)),
            Value::String(v) => ColumnData::String(Some(Cow::Borrowed(v.as_str()))),
        }
    }
}
