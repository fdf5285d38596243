//! In-memory store backend for testing.

use crate::backend::StoreBackend;
use crate::error::{StoreError, StoreResult};
use parking_lot::{Mutex, RwLock};
use rowmap_sql::{parse_literal, Row, SqlValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Statement counters for an [`InMemoryStore`].
///
/// All counters are atomic and monotonically increasing. Tests use them to
/// assert exactly which statements an operation issued - e.g. that saving
/// an unmodified entity issues no writes at all.
#[derive(Debug, Default)]
pub struct StoreStats {
    selects: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    begins: AtomicU64,
    commits: AtomicU64,
    rollbacks: AtomicU64,
}

impl StoreStats {
    /// Total select statements issued.
    pub fn selects(&self) -> u64 {
        self.selects.load(Ordering::Relaxed)
    }

    /// Total insert statements issued.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Total update statements issued.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Total delete statements issued.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Total insert plus update plus delete statements issued.
    pub fn writes(&self) -> u64 {
        self.inserts() + self.updates() + self.deletes()
    }

    /// Total transactions opened.
    pub fn begins(&self) -> u64 {
        self.begins.load(Ordering::Relaxed)
    }

    /// Total transactions committed.
    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    /// Total transactions rolled back.
    pub fn rollbacks(&self) -> u64 {
        self.rollbacks.load(Ordering::Relaxed)
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Default)]
struct Table {
    rows: Vec<Row>,
    last_id: i64,
}

impl Table {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// An in-memory relational store.
///
/// Tables are created on first insert (or explicitly via
/// [`create_table`](Self::create_table)); addressing a table that was never
/// created is an error, like it would be against a real store.
///
/// Transactions are implemented as a snapshot stack: `begin` pushes a copy
/// of every table, `rollback` restores the top copy, `commit` discards it.
/// That makes post-rollback state directly inspectable, which the cascade
/// atomicity tests rely on.
///
/// `execute` supports exactly the statement shapes the mapper's relation
/// loaders produce: `select * from <table>` with an optional
/// `where <column> = <literal>` clause. Anything else is rejected.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    snapshots: Mutex<Vec<HashMap<String, Table>>>,
    stats: StoreStats,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table.
    ///
    /// Useful for tests that select before any insert.
    pub fn create_table(&self, name: impl Into<String>) {
        self.tables.write().entry(name.into()).or_default();
    }

    /// Returns the statement counters.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Returns the number of rows in a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist.
    pub fn row_count(&self, table: &str) -> StoreResult<usize> {
        let tables = self.tables.read();
        let t = tables
            .get(table)
            .ok_or_else(|| StoreError::unknown_table(table))?;
        Ok(t.rows.len())
    }

    fn all_rows(&self, table: &str) -> StoreResult<Vec<Row>> {
        StoreStats::bump(&self.stats.selects);
        let tables = self.tables.read();
        let t = tables
            .get(table)
            .ok_or_else(|| StoreError::unknown_table(table))?;
        Ok(t.rows.clone())
    }
}

fn column_matches(row: &Row, key_field: &str, key: &SqlValue) -> bool {
    match row.get(key_field) {
        Some(value) => value.matches(key),
        None => key.is_null(),
    }
}

impl StoreBackend for InMemoryStore {
    fn execute(&self, statement: &str) -> StoreResult<Vec<Row>> {
        trace!(statement, "execute");

        let stmt = statement.trim().trim_end_matches(';').trim();
        let lower = stmt.to_ascii_lowercase();

        const PREFIX: &str = "select * from ";
        if !lower.starts_with(PREFIX) {
            return Err(StoreError::unsupported_statement(statement));
        }

        let body = &stmt[PREFIX.len()..];
        let lower_body = &lower[PREFIX.len()..];

        let Some(where_pos) = lower_body.find(" where ") else {
            return self.all_rows(body.trim());
        };

        let table = body[..where_pos].trim();
        let condition = body[where_pos + " where ".len()..].trim();
        let Some((column, literal)) = condition.split_once('=') else {
            return Err(StoreError::unsupported_statement(statement));
        };

        let key = parse_literal(literal.trim())?;
        self.select_rows(table, column.trim(), &key)
    }

    fn select_row(
        &self,
        table: &str,
        key_field: &str,
        key: &SqlValue,
    ) -> StoreResult<Option<Row>> {
        Ok(self.select_rows(table, key_field, key)?.into_iter().next())
    }

    fn select_rows(&self, table: &str, key_field: &str, key: &SqlValue) -> StoreResult<Vec<Row>> {
        StoreStats::bump(&self.stats.selects);
        let tables = self.tables.read();
        let t = tables
            .get(table)
            .ok_or_else(|| StoreError::unknown_table(table))?;
        Ok(t.rows
            .iter()
            .filter(|row| column_matches(row, key_field, key))
            .cloned()
            .collect())
    }

    fn insert(
        &self,
        table: &str,
        fields: &[(String, SqlValue)],
        id_field: Option<&str>,
    ) -> StoreResult<Option<i64>> {
        StoreStats::bump(&self.stats.inserts);
        let mut tables = self.tables.write();
        let t = tables.entry(table.to_string()).or_default();

        let mut row = Row::new();
        for (name, value) in fields {
            row.set(name.clone(), value.clone());
        }

        let Some(id_field) = id_field else {
            t.rows.push(row);
            return Ok(None);
        };

        let supplied = row.get(id_field).cloned().unwrap_or(SqlValue::Null);
        let id = match supplied {
            SqlValue::Null => {
                let id = t.next_id();
                row.set(id_field, id);
                id
            }
            SqlValue::Integer(id) => {
                if t.rows
                    .iter()
                    .any(|r| column_matches(r, id_field, &SqlValue::Integer(id)))
                {
                    return Err(StoreError::key_conflict(table, id));
                }
                t.last_id = t.last_id.max(id);
                id
            }
            other => {
                // Non-integer caller-assigned key: stored as-is, nothing generated.
                row.set(id_field, other);
                t.rows.push(row);
                return Ok(None);
            }
        };

        t.rows.push(row);
        Ok(Some(id))
    }

    fn update(
        &self,
        table: &str,
        fields: &[(String, SqlValue)],
        key_field: &str,
        key: &SqlValue,
    ) -> StoreResult<usize> {
        StoreStats::bump(&self.stats.updates);
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::unknown_table(table))?;

        let mut affected = 0;
        for row in t.rows.iter_mut() {
            if column_matches(row, key_field, key) {
                for (name, value) in fields {
                    row.set(name.clone(), value.clone());
                }
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn delete(&self, table: &str, key_field: &str, key: &SqlValue) -> StoreResult<usize> {
        StoreStats::bump(&self.stats.deletes);
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::unknown_table(table))?;

        let before = t.rows.len();
        t.rows.retain(|row| !column_matches(row, key_field, key));
        Ok(before - t.rows.len())
    }

    fn begin(&self) -> StoreResult<()> {
        StoreStats::bump(&self.stats.begins);
        let snapshot = self.tables.read().clone();
        self.snapshots.lock().push(snapshot);
        Ok(())
    }

    fn commit(&self) -> StoreResult<()> {
        StoreStats::bump(&self.stats.commits);
        self.snapshots
            .lock()
            .pop()
            .map(|_| ())
            .ok_or(StoreError::NoActiveTransaction)
    }

    fn rollback(&self) -> StoreResult<()> {
        StoreStats::bump(&self.stats.rollbacks);
        let snapshot = self
            .snapshots
            .lock()
            .pop()
            .ok_or(StoreError::NoActiveTransaction)?;
        *self.tables.write() = snapshot;
        Ok(())
    }
}
