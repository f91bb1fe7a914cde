#![allow(clippy::unwrap_used, dead_code)]

use sqlup::{BoxFuture, DriverError, Error, Execute, Query, Result, Row, Value};
use std::{
    collections::{BTreeMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering::Relaxed},
        Mutex,
    },
};

pub type MemRow = BTreeMap<String, Value>;

/// In-memory table understanding the statements produced by `UpsertBuilder`.
///
/// Rows are unique on `unique` columns; violating it raises `dup_code`.
/// With `matched_rows = false` an `UPDATE` only counts the rows it changed.
pub struct MemDb {
    dup_code: i64,
    matched_rows: bool,
    state: Mutex<MemState>,
    statements: Mutex<Vec<String>>,
    unique: Vec<String>,
}

#[derive(Default)]
struct MemState {
    before_insert: Option<MemRow>,
    rows: Vec<MemRow>,
}

impl MemDb {
    pub fn new(unique: &[&str], dup_code: i64) -> Self {
        Self {
            dup_code,
            matched_rows: true,
            state: Mutex::default(),
            statements: Mutex::default(),
            unique: unique.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn changed_rows_only(mut self) -> Self {
        self.matched_rows = false;
        self
    }

    /// A row sneaked in by a concurrent writer right before our next `INSERT`.
    pub fn race_before_insert(&self, row: &[(&str, &str)]) {
        self.state.lock().unwrap().before_insert = Some(mem_row(row));
    }

    pub fn seed(&self, row: &[(&str, &str)]) {
        self.state.lock().unwrap().rows.push(mem_row(row));
    }

    pub fn rows(&self) -> Vec<MemRow> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn count_where(&self, row: &[(&str, &str)]) -> usize {
        let expected = mem_row(row);

        self.rows()
            .iter()
            .filter(|r| expected.iter().all(|(k, v)| r.get(k) == Some(v)))
            .count()
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    fn run(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.statements.lock().unwrap().push(sql.to_string());

        let mut state = self.state.lock().unwrap();
        let mut params = params.iter().cloned();

        if let Some(rest) = sql.strip_prefix("UPDATE ") {
            let (_, rest) = rest.split_once(" SET ").unwrap();
            let (setters, wheres) = rest.split_once(" WHERE ").unwrap();

            let values = setters
                .split(", ")
                .map(|s| (ident(s.split_once(" = ").unwrap().0), params.next().unwrap()))
                .collect::<Vec<_>>();

            let filter = parse_wheres(wheres, &mut params);
            let mut count = 0;

            for i in 0..state.rows.len() {
                if !filter.iter().all(|(k, v)| state.rows[i].get(k).unwrap_or(&Value::Null) == v) {
                    continue;
                }

                let mut updated = state.rows[i].clone();
                updated.extend(values.iter().cloned());

                let conflict = state
                    .rows
                    .iter()
                    .enumerate()
                    .any(|(j, r)| j != i && self.same_key(r, &updated));

                if conflict {
                    return Err(self.duplicate());
                }

                if self.matched_rows || updated != state.rows[i] {
                    count += 1;
                }

                state.rows[i] = updated;
            }

            return Ok(count);
        }

        if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
            if let Some(row) = state.before_insert.take() {
                state.rows.push(row);
            }

            let (_, rest) = rest.split_once(" (").unwrap();
            let (fields, _) = rest.split_once(") VALUES ").unwrap();
            let row = fields
                .split(", ")
                .map(|f| (ident(f), params.next().unwrap()))
                .collect::<MemRow>();

            if state.rows.iter().any(|r| self.same_key(r, &row)) {
                return Err(self.duplicate());
            }

            state.rows.push(row);
            return Ok(1);
        }

        Err(DriverError::new(format!("syntax error near `{sql}`"))
            .with_code(1064)
            .into())
    }

    fn count(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.statements.lock().unwrap().push(sql.to_string());

        let (_, wheres) = sql.split_once(" WHERE ").unwrap();
        let mut params = params.iter().cloned();
        let filter = parse_wheres(wheres, &mut params);
        let state = self.state.lock().unwrap();

        let n = state
            .rows
            .iter()
            .filter(|r| filter.iter().all(|(k, v)| r.get(k).unwrap_or(&Value::Null) == v))
            .count();

        Ok(n as u64)
    }

    fn duplicate(&self) -> Error {
        DriverError::new("Duplicate entry")
            .with_code(self.dup_code)
            .into()
    }

    fn same_key(&self, a: &MemRow, b: &MemRow) -> bool {
        !self.unique.is_empty()
            && self
                .unique
                .iter()
                .all(|k| a.get(k).is_some() && a.get(k) == b.get(k))
    }
}

impl Execute for MemDb {
    fn execute<'a>(&'a self, statement: &'a str, params: &'a [Value]) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move { self.run(statement, params) })
    }
}

impl Query for MemDb {
    fn query_rows<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, Result<Vec<Row>>> {
        Box::pin(async move {
            let n = self.count(statement, params)?;
            Ok(vec![vec![Value::I64(n as i64)]])
        })
    }
}

fn ident(s: &str) -> String {
    s.trim_matches(|c| matches!(c, '`' | '"' | '[' | ']'))
        .to_string()
}

fn mem_row(row: &[(&str, &str)]) -> MemRow {
    row.iter()
        .map(|(k, v)| (k.to_string(), Value::from(*v)))
        .collect()
}

fn parse_wheres(wheres: &str, params: &mut impl Iterator<Item = Value>) -> Vec<(String, Value)> {
    wheres
        .split(" AND ")
        .map(|w| match w.strip_suffix(" IS NULL") {
            Some(name) => (ident(name), Value::Null),
            None => (ident(w.split_once(" = ").unwrap().0), params.next().unwrap()),
        })
        .collect()
}

/// Connection replaying scripted `execute` results, then `fallback` forever.
/// Queries replay `queries`, then count no row.
pub struct ScriptedConn {
    calls: AtomicUsize,
    fallback: fn() -> Result<u64>,
    queries: Mutex<VecDeque<Result<Vec<Row>>>>,
    query_calls: AtomicUsize,
    script: Mutex<VecDeque<Result<u64>>>,
    statements: Mutex<Vec<String>>,
}

impl ScriptedConn {
    pub fn new(script: Vec<Result<u64>>, fallback: fn() -> Result<u64>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fallback,
            queries: Mutex::default(),
            query_calls: AtomicUsize::new(0),
            script: Mutex::new(script.into()),
            statements: Mutex::default(),
        }
    }

    pub fn always(fallback: fn() -> Result<u64>) -> Self {
        Self::new(Vec::new(), fallback)
    }

    pub fn with_queries(self, queries: Vec<Result<Vec<Row>>>) -> Self {
        *self.queries.lock().unwrap() = queries.into();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Relaxed)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Relaxed)
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

impl Execute for ScriptedConn {
    fn execute<'a>(&'a self, statement: &'a str, _: &'a [Value]) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Relaxed);
            self.statements.lock().unwrap().push(statement.to_string());

            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(self.fallback)
        })
    }
}

impl Query for ScriptedConn {
    fn query_rows<'a>(&'a self, _: &'a str, _: &'a [Value]) -> BoxFuture<'a, Result<Vec<Row>>> {
        Box::pin(async move {
            self.query_calls.fetch_add(1, Relaxed);

            let next = self.queries.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(vec![vec![Value::I64(0)]]))
        })
    }
}

pub fn driver(code: i64) -> Error {
    DriverError::new(format!("driver error {code}"))
        .with_code(code)
        .into()
}
