//! Scoped transaction guard.

use crate::backend::StoreHandle;
use crate::error::StoreResult;
use std::sync::Arc;

/// A scoped transaction on a store.
///
/// `begin` opens a transaction on the backend; the guard must then be
/// consumed by [`commit`](Self::commit) or [`rollback`](Self::rollback).
/// A guard dropped any other way - an early `?` return, a panic unwind -
/// rolls the transaction back, so partial writes never outlive the scope
/// that made them.
///
/// Guards nest: a `save` cascade that saves a child entity opens an inner
/// transaction on the same backend, and the backend unwinds them in LIFO
/// order.
#[must_use = "a transaction guard that is not committed rolls back on drop"]
pub struct Transaction {
    store: StoreHandle,
    finished: bool,
}

impl Transaction {
    /// Opens a transaction on the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot open a transaction.
    pub fn begin(store: &StoreHandle) -> StoreResult<Self> {
        store.begin()?;
        Ok(Self {
            store: Arc::clone(store),
            finished: false,
        })
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to commit; the transaction is
    /// considered finished either way.
    pub fn commit(mut self) -> StoreResult<()> {
        self.finished = true;
        self.store.commit()
    }

    /// Rolls the transaction back explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to roll back.
    pub fn rollback(mut self) -> StoreResult<()> {
        self.finished = true;
        self.store.rollback()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.finished {
            // Abandoned scope: undo. The error has nowhere to go here.
            let _ = self.store.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::StoreBackend;
    use rowmap_sql::SqlValue;

    fn store_with_row() -> StoreHandle {
        let store = InMemoryStore::new();
        store
            .insert("t", &[("name".into(), SqlValue::from("a"))], Some("id"))
            .unwrap();
        Arc::new(store)
    }

    #[test]
    fn commit_keeps_writes() {
        let store = store_with_row();
        let txn = Transaction::begin(&store).unwrap();
        store
            .insert("t", &[("name".into(), SqlValue::from("b"))], Some("id"))
            .unwrap();
        txn.commit().unwrap();

        let rows = store.execute("select * from t").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn drop_rolls_back() {
        let store = store_with_row();
        {
            let _txn = Transaction::begin(&store).unwrap();
            store
                .insert("t", &[("name".into(), SqlValue::from("b"))], Some("id"))
                .unwrap();
            // guard dropped without commit
        }

        let rows = store.execute("select * from t").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn explicit_rollback() {
        let store = store_with_row();
        let txn = Transaction::begin(&store).unwrap();
        store.delete("t", "id", &SqlValue::Integer(1)).unwrap();
        txn.rollback().unwrap();

        let rows = store.execute("select * from t").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn nested_inner_rollback_preserves_outer() {
        let store = store_with_row();
        let outer = Transaction::begin(&store).unwrap();
        store
            .insert("t", &[("name".into(), SqlValue::from("outer"))], Some("id"))
            .unwrap();

        {
            let _inner = Transaction::begin(&store).unwrap();
            store
                .insert("t", &[("name".into(), SqlValue::from("inner"))], Some("id"))
                .unwrap();
            // inner dropped -> rolled back
        }

        outer.commit().unwrap();
        let rows = store.execute("select * from t").unwrap();
        assert_eq!(rows.len(), 2);
    }
}
