use crate::{AsValue, Error, QueryError, Result, Value};
use std::collections::BTreeMap;

/// Summary returned by insert, update, replace and delete.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct WriteResult {
    pub inserted: u64,
    pub replaced: u64,
    pub unchanged: u64,
    pub skipped: u64,
    pub deleted: u64,
    pub errors: u64,
    pub first_error: Option<String>,
    pub generated_keys: Vec<String>,
    pub warnings: Vec<String>,
    /// Present when the write asked for `return_changes`.
    pub changes: Vec<ValueChange<Value>>,
}

impl WriteResult {
    /// Turn a write that reported errors into an error.
    ///
    /// Primary key collisions become [`QueryError::Conflict`], anything else
    /// [`QueryError::RemoteQuery`].
    pub fn check(self) -> Result<Self> {
        if self.errors == 0 {
            return Ok(self);
        }
        let message = self
            .first_error
            .clone()
            .unwrap_or_else(|| format!("{} documents failed to write", self.errors));
        if message.contains("Duplicate primary key") {
            Err(QueryError::Conflict(message).into())
        } else {
            Err(QueryError::RemoteQuery(message).into())
        }
    }

    /// Total number of documents touched.
    pub fn affected(&self) -> u64 {
        self.inserted + self.replaced + self.deleted
    }
}

/// Summary of a database creation or removal.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct DbChangeResult {
    pub dbs_created: u64,
    pub dbs_dropped: u64,
    pub tables_dropped: u64,
}

/// Summary of a table creation or removal.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct TableChangeResult {
    pub tables_created: u64,
    pub tables_dropped: u64,
}

/// Summary of an index administration operation.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct IndexChangeResult {
    pub created: u64,
    pub renamed: u64,
    pub dropped: u64,
}

/// One event of a changefeed, or one entry of `changes` in a [`WriteResult`].
///
/// `old_val` is `None` for insertions and initial values, `new_val` is `None` for deletions.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ValueChange<T> {
    pub old_val: Option<T>,
    pub new_val: Option<T>,
    /// Set on the terminal event of a feed that stopped, for example after an overflow.
    pub error: Option<String>,
}

impl<T> ValueChange<T> {
    pub fn is_insert(&self) -> bool {
        self.old_val.is_none() && self.new_val.is_some()
    }

    pub fn is_delete(&self) -> bool {
        self.old_val.is_some() && self.new_val.is_none()
    }
}

struct Fields(BTreeMap<String, Value>);

impl Fields {
    fn new<T>(value: Value) -> Result<Self> {
        match value {
            Value::Object(v) => Ok(Self(v)),
            v => Err(Error::msg(format!(
                "Expected an object to decode {}, found {}",
                std::any::type_name::<T>(),
                v.type_name()
            ))),
        }
    }

    fn take<T: AsValue + Default>(&mut self, key: &str) -> Result<T> {
        match self.0.remove(key) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(v) => T::try_from_value(v).map_err(|e| e.context(format!("In field `{key}`"))),
        }
    }

    fn take_option<T: AsValue>(&mut self, key: &str) -> Result<Option<T>> {
        Option::<T>::try_from_value(self.0.remove(key).unwrap_or_default())
            .map_err(|e| e.context(format!("In field `{key}`")))
    }
}

fn object(fields: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

impl AsValue for WriteResult {
    fn as_value(self) -> Value {
        let mut fields = vec![
            ("inserted", self.inserted.as_value()),
            ("replaced", self.replaced.as_value()),
            ("unchanged", self.unchanged.as_value()),
            ("skipped", self.skipped.as_value()),
            ("deleted", self.deleted.as_value()),
            ("errors", self.errors.as_value()),
        ];
        if let Some(first_error) = self.first_error {
            fields.push(("first_error", first_error.as_value()));
        }
        if !self.generated_keys.is_empty() {
            fields.push(("generated_keys", self.generated_keys.as_value()));
        }
        if !self.warnings.is_empty() {
            fields.push(("warnings", self.warnings.as_value()));
        }
        if !self.changes.is_empty() {
            fields.push(("changes", self.changes.as_value()));
        }
        object(fields)
    }

    fn try_from_value(value: Value) -> Result<Self> {
        let mut fields = Fields::new::<Self>(value)?;
        Ok(Self {
            inserted: fields.take("inserted")?,
            replaced: fields.take("replaced")?,
            unchanged: fields.take("unchanged")?,
            skipped: fields.take("skipped")?,
            deleted: fields.take("deleted")?,
            errors: fields.take("errors")?,
            first_error: fields.take_option("first_error")?,
            generated_keys: fields.take("generated_keys")?,
            warnings: fields.take("warnings")?,
            changes: fields.take("changes")?,
        })
    }
}

impl AsValue for DbChangeResult {
    fn as_value(self) -> Value {
        object([
            ("dbs_created", self.dbs_created.as_value()),
            ("dbs_dropped", self.dbs_dropped.as_value()),
            ("tables_dropped", self.tables_dropped.as_value()),
        ])
    }

    fn try_from_value(value: Value) -> Result<Self> {
        let mut fields = Fields::new::<Self>(value)?;
        Ok(Self {
            dbs_created: fields.take("dbs_created")?,
            dbs_dropped: fields.take("dbs_dropped")?,
            tables_dropped: fields.take("tables_dropped")?,
        })
    }
}

impl AsValue for TableChangeResult {
    fn as_value(self) -> Value {
        object([
            ("tables_created", self.tables_created.as_value()),
            ("tables_dropped", self.tables_dropped.as_value()),
        ])
    }

    fn try_from_value(value: Value) -> Result<Self> {
        let mut fields = Fields::new::<Self>(value)?;
        Ok(Self {
            tables_created: fields.take("tables_created")?,
            tables_dropped: fields.take("tables_dropped")?,
        })
    }
}

impl AsValue for IndexChangeResult {
    fn as_value(self) -> Value {
        object([
            ("created", self.created.as_value()),
            ("renamed", self.renamed.as_value()),
            ("dropped", self.dropped.as_value()),
        ])
    }

    fn try_from_value(value: Value) -> Result<Self> {
        let mut fields = Fields::new::<Self>(value)?;
        Ok(Self {
            created: fields.take("created")?,
            renamed: fields.take("renamed")?,
            dropped: fields.take("dropped")?,
        })
    }
}

impl<T: AsValue> AsValue for ValueChange<T> {
    fn as_value(self) -> Value {
        let mut fields = vec![
            ("old_val", self.old_val.as_value()),
            ("new_val", self.new_val.as_value()),
        ];
        if let Some(error) = self.error {
            fields.push(("error", error.as_value()));
        }
        object(fields)
    }

    fn try_from_value(value: Value) -> Result<Self> {
        let mut fields = Fields::new::<Self>(value)?;
        Ok(Self {
            old_val: fields.take_option("old_val")?,
            new_val: fields.take_option("new_val")?,
            error: fields.take_option("error")?,
        })
    }
}
