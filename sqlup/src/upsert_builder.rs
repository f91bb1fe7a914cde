use crate::{CompareColumns, Dialect, Error, Result, RowChange, Value};

/// Statements of an update-then-insert upsert.
///
/// Built once per upsert and replayed on every attempt:
/// - `UPDATE t SET c1 = ?, c2 = ? WHERE k1 = ? AND k2 IS NULL`
/// - `INSERT INTO t (c1, c2) VALUES (?, ?)`
/// - `SELECT COUNT(*) FROM t WHERE k1 = ? AND k2 IS NULL`
///
/// A `NULL` compare value is matched with `IS NULL` and binds no parameter.
#[derive(Debug)]
pub struct UpsertBuilder {
    insert_fields: String,
    insert_params: Vec<Value>,
    insert_values: String,
    probe_params: Vec<Value>,
    probe_wheres: String,
    table: String,
    update_params: Vec<Value>,
    update_setters: String,
    update_wheres: String,
    where_params: Vec<Value>,
}

impl UpsertBuilder {
    pub fn new<D: Dialect + ?Sized>(
        dialect: &D,
        table: &str,
        row: &RowChange,
        compare: &CompareColumns,
    ) -> Result<Self> {
        if table.trim().is_empty() {
            return Err(Error::EmptyTable);
        }

        if row.is_empty() {
            return Err(Error::EmptyRowChange);
        }

        let keys = compare.resolve(row)?;

        let mut builder = Self {
            insert_fields: String::new(),
            insert_params: Vec::with_capacity(row.len()),
            insert_values: String::new(),
            probe_params: Vec::with_capacity(keys.len()),
            probe_wheres: String::new(),
            table: dialect.quote_table(table)?,
            update_params: Vec::with_capacity(row.len() + keys.len()),
            update_setters: String::new(),
            update_wheres: String::new(),
            where_params: Vec::with_capacity(keys.len()),
        };

        for (name, value) in row.iter() {
            builder.add_field(dialect, name, value)?;
        }

        for (name, value) in keys {
            builder.add_key(dialect, name, value)?;
        }

        builder.update_params.append(&mut builder.where_params);

        Ok(builder)
    }

    fn add_field<D: Dialect + ?Sized>(&mut self, dialect: &D, name: &str, value: &Value) -> Result<()> {
        let name = dialect.quote_ident(name)?;

        if !self.insert_fields.is_empty() {
            self.insert_fields.push_str(", ");
            self.insert_values.push_str(", ");
            self.update_setters.push_str(", ");
        }

        self.insert_params.push(value.clone());
        self.update_params.push(value.clone());

        self.insert_fields.push_str(&name);
        self.insert_values
            .push_str(&dialect.placeholder(self.insert_params.len()));

        self.update_setters.push_str(&name);
        self.update_setters.push_str(" = ");
        self.update_setters
            .push_str(&dialect.placeholder(self.update_params.len()));

        Ok(())
    }

    fn add_key<D: Dialect + ?Sized>(&mut self, dialect: &D, name: &str, value: &Value) -> Result<()> {
        let name = dialect.quote_ident(name)?;

        if !self.update_wheres.is_empty() {
            self.update_wheres.push_str(" AND ");
            self.probe_wheres.push_str(" AND ");
        }

        self.update_wheres.push_str(&name);
        self.probe_wheres.push_str(&name);

        if value.is_null() {
            self.update_wheres.push_str(" IS NULL");
            self.probe_wheres.push_str(" IS NULL");
            return Ok(());
        }

        self.where_params.push(value.clone());
        self.probe_params.push(value.clone());

        // update parameters are numbered after the setters.
        let index = self.update_params.len() + self.where_params.len();

        self.update_wheres.push_str(" = ");
        self.update_wheres.push_str(&dialect.placeholder(index));

        self.probe_wheres.push_str(" = ");
        self.probe_wheres
            .push_str(&dialect.placeholder(self.probe_params.len()));

        Ok(())
    }

    pub fn insert_params(&self) -> &[Value] {
        &self.insert_params
    }

    pub fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {table} ({fields}) VALUES ({values})",
            table = self.table,
            fields = self.insert_fields,
            values = self.insert_values,
        )
    }

    pub fn probe_params(&self) -> &[Value] {
        &self.probe_params
    }

    pub fn probe_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {table} WHERE {wheres}",
            table = self.table,
            wheres = self.probe_wheres,
        )
    }

    /// Quoted table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn update_params(&self) -> &[Value] {
        &self.update_params
    }

    pub fn update_sql(&self) -> String {
        format!(
            "UPDATE {table} SET {setters} WHERE {wheres}",
            table = self.table,
            setters = self.update_setters,
            wheres = self.update_wheres,
        )
    }
}
