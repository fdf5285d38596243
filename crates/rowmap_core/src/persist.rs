//! The persistence engine: save, load, delete.

use crate::descriptor::SaverFn;
use crate::entity::Entity;
use crate::error::{MapperError, MapperResult};
use rowmap_sql::SqlValue;
use rowmap_store::Transaction;
use std::sync::Arc;
use tracing::{debug, warn};

impl Entity {
    /// Saves this entity and its cascades in one transaction.
    ///
    /// The order is fixed: autosaved internal relations first (so their
    /// keys exist before the owner stores them), then the owner's own row
    /// (insert when the id is NULL, otherwise an update restricted to the
    /// modified fields, or no statement at all when nothing changed), then
    /// the registered savers for every cached relation. Any error rolls
    /// the whole transaction back and propagates unmodified; on success
    /// the change baseline is recaptured.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::NoStoreAttached`] without a store; otherwise
    /// whatever the store or a cascade step raised.
    pub fn save(&mut self) -> MapperResult<()> {
        let store = Arc::clone(self.store()?);
        let txn = Transaction::begin(&store)?;
        self.save_cascade()?;
        txn.commit()?;
        self.rebaseline();
        Ok(())
    }

    fn save_cascade(&mut self) -> MapperResult<()> {
        let autosave: Vec<String> = self
            .descriptor
            .internal_fields()
            .iter()
            .filter(|f| f.autosave())
            .map(|f| f.name().to_string())
            .collect();

        for name in autosave {
            let Some(mut related) = self.relations.remove(&name) else {
                continue;
            };
            if let Some(store) = &self.store {
                related.attach_store_if_missing(store);
            }
            let result = related.save();
            let key = related.id_value();
            self.relations.insert(name.clone(), related);
            result?;
            self.internal.insert(name, key);
        }

        self.save_self()?;

        let savers: Vec<(String, SaverFn)> = self.descriptor.savers().to_vec();
        for (name, saver) in savers {
            if self.relations.contains_key(&name) {
                (*saver)(self)?;
            }
        }
        Ok(())
    }

    fn save_self(&mut self) -> MapperResult<()> {
        let Some(table) = self.descriptor.table().map(str::to_string) else {
            warn!(type_name = self.type_name(), "save skipped: no table defined");
            return Ok(());
        };
        let Some(id_field) = self.descriptor.id_field().map(str::to_string) else {
            warn!(type_name = self.type_name(), "save skipped: no id field defined");
            return Ok(());
        };

        let modified = self.modified_fields();
        if modified.is_empty() {
            return Ok(());
        }

        let store = Arc::clone(self.store()?);
        let id = self.values.get(&id_field).cloned().unwrap_or(SqlValue::Null);

        if id.is_null() {
            let mut fields = Vec::new();
            for field in self.descriptor.fields() {
                if field.name() == id_field {
                    continue;
                }
                let value = self
                    .values
                    .get(field.name())
                    .cloned()
                    .unwrap_or(SqlValue::Null);
                fields.push((field.name().to_string(), value.coerce(field.sql_type())?));
            }
            for field in self.descriptor.internal_fields() {
                let value = self
                    .internal
                    .get(field.name())
                    .cloned()
                    .unwrap_or(SqlValue::Null);
                fields.push((field.name().to_string(), value));
            }

            let generated = store.insert(&table, &fields, Some(&id_field))?;
            if let Some(new_id) = generated {
                self.values.insert(id_field.clone(), SqlValue::Integer(new_id));
            }
            debug!(type_name = self.type_name(), table = %table, id = ?generated, "inserted row");
        } else {
            let mut fields = Vec::with_capacity(modified.len());
            for (name, value) in modified {
                let value = match self.descriptor.field(&name) {
                    Some(field) => value.coerce(field.sql_type())?,
                    None => value,
                };
                fields.push((name, value));
            }
            store.update(&table, &fields, &id_field, &id)?;
            debug!(
                type_name = self.type_name(),
                table = %table,
                id = %id,
                fields = fields.len(),
                "updated row"
            );
        }
        Ok(())
    }

    /// Loads this entity's fields from the store row with the given id.
    ///
    /// Returns `Ok(false)` when no row matches - an expected outcome, not
    /// an error. On success the fields are hydrated with type-directed
    /// conversion and the change baseline is recaptured, so a freshly
    /// loaded entity reports itself unmodified.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::NoStoreAttached`] without a store and
    /// [`MapperError::MissingSchema`] when the type declares no table or
    /// id field.
    pub fn load(&mut self, id: impl Into<SqlValue>) -> MapperResult<bool> {
        let store = Arc::clone(self.store()?);
        let table = self
            .descriptor
            .table()
            .map(str::to_string)
            .ok_or_else(|| MapperError::missing_schema(self.type_name(), "table"))?;
        let id_field = self
            .descriptor
            .id_field()
            .map(str::to_string)
            .ok_or_else(|| MapperError::missing_schema(self.type_name(), "id field"))?;

        let id = id.into();
        let Some(row) = store.select_row(&table, &id_field, &id)? else {
            return Ok(false);
        };

        self.hydrate(&row)?;
        self.rebaseline();
        Ok(true)
    }

    /// Deletes this entity's row from the store.
    ///
    /// A type without a table or id field, or an entity with a NULL id,
    /// is silently left alone. Cached relations are not touched: delete
    /// never cascades.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::NoStoreAttached`] without a store; otherwise
    /// whatever the store raised.
    pub fn delete(&mut self) -> MapperResult<()> {
        let store = Arc::clone(self.store()?);
        let (Some(table), Some(id_field)) = (self.descriptor.table(), self.descriptor.id_field())
        else {
            return Ok(());
        };

        let id = self.values.get(id_field).cloned().unwrap_or(SqlValue::Null);
        if id.is_null() {
            return Ok(());
        }

        store.delete(table, id_field, &id)?;
        debug!(type_name = self.type_name(), table, id = %id, "deleted row");
        Ok(())
    }
}
