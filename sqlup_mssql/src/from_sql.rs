use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use sqlup::{Row, Value};
use tiberius::{ColumnData, FromSql};

pub(crate) fn row_values(row: tiberius::Row) -> Result<Row> {
    row.into_iter()
        .enumerate()
        .map(|(index, data)| column_to_value(index, &data))
        .collect()
}

/// Dates and times are read back as ISO 8601 strings, numerics as `f64`.
pub(crate) fn column_to_value(index: usize, data: &ColumnData<'static>) -> Result<Value> {
    Ok(match data {
        ColumnData::Binary(_) => return Err(Error::UnsupportedColumn { index, ty: "binary" }),
        ColumnData::Bit(v) => Value::from(*v),
        ColumnData::Date(_) => NaiveDate::from_sql(data)
            .map_err(decode(index, "date"))?
            .map(|v| v.to_string())
            .into(),
        ColumnData::DateTime(_) | ColumnData::DateTime2(_) | ColumnData::SmallDateTime(_) => {
            NaiveDateTime::from_sql(data)
                .map_err(decode(index, "datetime"))?
                .map(|v| v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
                .into()
        }
        ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(data)
            .map_err(decode(index, "datetimeoffset"))?
            .map(|v| v.to_rfc3339())
            .into(),
        ColumnData::F32(v) => Value::from(*v),
        ColumnData::F64(v) => Value::from(*v),
        ColumnData::Guid(v) => Value::from(v.map(|v| v.to_string())),
        ColumnData::I16(v) => Value::from(*v),
        ColumnData::I32(v) => Value::from(*v),
        ColumnData::I64(v) => Value::from(*v),
        ColumnData::Numeric(v) => {
            Value::from(v.map(|n| n.value() as f64 / 10f64.powi(i32::from(n.scale()))))
        }
        ColumnData::String(v) => Value::from(v.as_deref()),
        ColumnData::Time(_) => NaiveTime::from_sql(data)
            .map_err(decode(index, "time"))?
            .map(|v| v.to_string())
            .into(),
        ColumnData::U8(v) => Value::from(*v),
        ColumnData::Xml(_) => return Err(Error::UnsupportedColumn { index, ty: "xml" }),
    })
}

fn decode(index: usize, ty: &'static str) -> impl FnOnce(tiberius::error::Error) -> Error {
    move |source| Error::Decode { index, source, ty }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::borrow::Cow;
    use tiberius::numeric::Numeric;

    #[test]
    fn scalars() -> Result<()> {
        let v = column_to_value(0, &ColumnData::I32(Some(12)))?;
        assert_eq!(v, Value::I64(12));

        let v = column_to_value(0, &ColumnData::String(Some(Cow::Borrowed("test1"))))?;
        assert_eq!(v, Value::from("test1"));

        let v = column_to_value(0, &ColumnData::Bit(None))?;
        assert_eq!(v, Value::Null);

        let v = column_to_value(0, &ColumnData::Numeric(Some(Numeric::new_with_scale(12345, 2))))?;
        assert_eq!(v, Value::F64(123.45));
        Ok(())
    }

    #[test]
    fn date_reads_as_iso_string() -> Result<()> {
        let date = NaiveDate::from_ymd_opt(2017, 3, 14).unwrap();

        let data = match tiberius::ToSql::to_sql(&date) {
            ColumnData::Date(d) => ColumnData::Date(d),
            other => panic!("unexpected {other:?}"),
        };

        assert_eq!(column_to_value(1, &data)?, Value::from("2017-03-14"));
        Ok(())
    }

    #[test]
    fn xml_and_binary_are_rejected() {
        assert!(matches!(
            column_to_value(3, &ColumnData::Binary(None)),
            Err(Error::UnsupportedColumn { index: 3, ty: "binary" })
        ));
    }
}
