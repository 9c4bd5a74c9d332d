use super::{
    EvalError, EvalResult, Evaluator, arg, expect_string, option_str, runtime_error,
    sequence::{has_fields, matches_example, merge},
};
use crate::server::{DEFAULT_PRIMARY_KEY, DatabaseData, Index, TableData};
use quarry_core::{
    AsValue, DbChangeResult, IndexChangeResult, TableChangeResult, Term, TermType, Value,
    ValueChange, WriteResult,
};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Old and new version of a written document.
type Change = (Option<Value>, Option<Value>);

fn in_range(term: &Term, lower: &Value, upper: &Value, value: &Value) -> bool {
    let after = if option_str(term, "left_bound") == Some("open") {
        value > lower
    } else {
        value >= lower
    };
    let before = if option_str(term, "right_bound") == Some("closed") {
        value <= upper
    } else {
        value < upper
    };
    after && before
}

/// Table node below a chain of operations that keep the table binding.
pub(crate) fn bound_table(term: &Term) -> EvalResult<&Term> {
    let mut current = term;
    loop {
        match current.term_type {
            TermType::Table => return Ok(current),
            TermType::Get
            | TermType::GetAll
            | TermType::Between
            | TermType::Filter
            | TermType::OrderBy
            | TermType::Limit
            | TermType::Skip
            | TermType::Slice
            | TermType::HasFields => current = arg(current, 0)?,
            _ => {
                return Err(runtime_error!(
                    "Expected a selection of a table but found {}",
                    current.term_type
                ));
            }
        }
    }
}

impl Evaluator<'_> {
    pub(super) fn eval_catalog(&mut self, term: &Term) -> EvalResult<Value> {
        let operation = term.term_type.name();
        match term.term_type {
            TermType::Table => {
                let (db, name) = self.table_name(term)?;
                Ok(Value::Array(
                    self.table(&db, &name)?.rows.values().cloned().collect(),
                ))
            }
            TermType::Get => {
                let (db, name) = self.table_name(arg(term, 0)?)?;
                let key = self.eval_arg(term, 1)?;
                Ok(self
                    .table(&db, &name)?
                    .rows
                    .get(&key)
                    .cloned()
                    .unwrap_or_default())
            }
            TermType::GetAll => self.get_all(term).map(Value::Array),
            TermType::Between => self.between(term).map(Value::Array),
            TermType::DbCreate => {
                let name = expect_string(self.eval_arg(term, 0)?, operation)?;
                if self.catalog.databases.contains_key(&name) {
                    return Err(runtime_error!("Database `{name}` already exists"));
                }
                self.catalog
                    .databases
                    .insert(name, DatabaseData::default());
                Ok(DbChangeResult {
                    dbs_created: 1,
                    ..Default::default()
                }
                .as_value())
            }
            TermType::DbDrop => {
                let name = expect_string(self.eval_arg(term, 0)?, operation)?;
                let Some(mut database) = self.catalog.databases.remove(&name) else {
                    return Err(runtime_error!("Database `{name}` does not exist"));
                };
                for table in database.tables.values_mut() {
                    table.close("The database was dropped");
                }
                Ok(DbChangeResult {
                    dbs_dropped: 1,
                    tables_dropped: database.tables.len() as u64,
                    ..Default::default()
                }
                .as_value())
            }
            TermType::DbList => Ok(Value::Array(
                self.catalog
                    .databases
                    .keys()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            )),
            TermType::TableCreate => {
                let db = self.db_name(arg(term, 0)?)?;
                let name = expect_string(self.eval_arg(term, 1)?, operation)?;
                let primary_key = option_str(term, "primary_key")
                    .unwrap_or(DEFAULT_PRIMARY_KEY)
                    .to_string();
                let database = self.database_mut(&db)?;
                if database.tables.contains_key(&name) {
                    return Err(runtime_error!("Table `{db}.{name}` already exists"));
                }
                database.tables.insert(name, TableData::new(primary_key));
                Ok(TableChangeResult {
                    tables_created: 1,
                    ..Default::default()
                }
                .as_value())
            }
            TermType::TableDrop => {
                let db = self.db_name(arg(term, 0)?)?;
                let name = expect_string(self.eval_arg(term, 1)?, operation)?;
                let Some(mut table) = self.database_mut(&db)?.tables.remove(&name) else {
                    return Err(runtime_error!("Table `{db}.{name}` does not exist"));
                };
                table.close("The table was dropped");
                Ok(TableChangeResult {
                    tables_dropped: 1,
                    ..Default::default()
                }
                .as_value())
            }
            TermType::TableList => {
                let db = self.db_name(arg(term, 0)?)?;
                Ok(Value::Array(
                    self.database_mut(&db)?
                        .tables
                        .keys()
                        .cloned()
                        .map(Value::String)
                        .collect(),
                ))
            }
            TermType::IndexCreate => {
                let (db, name) = self.table_name(arg(term, 0)?)?;
                let index = expect_string(self.eval_arg(term, 1)?, operation)?;
                let definition = match term.args.get(2) {
                    Some(function) => Index::Function(function.clone()),
                    None => Index::Field(index.clone()),
                };
                let table = self.table_mut(&db, &name)?;
                if table.indexes.contains_key(&index) {
                    return Err(runtime_error!(
                        "Index `{index}` already exists on table `{db}.{name}`"
                    ));
                }
                table.indexes.insert(index, definition);
                Ok(IndexChangeResult {
                    created: 1,
                    ..Default::default()
                }
                .as_value())
            }
            TermType::IndexDrop => {
                let (db, name) = self.table_name(arg(term, 0)?)?;
                let index = expect_string(self.eval_arg(term, 1)?, operation)?;
                if self.table_mut(&db, &name)?.indexes.remove(&index).is_none() {
                    return Err(runtime_error!(
                        "Index `{index}` does not exist on table `{db}.{name}`"
                    ));
                }
                Ok(IndexChangeResult {
                    dropped: 1,
                    ..Default::default()
                }
                .as_value())
            }
            TermType::IndexRename => {
                let (db, name) = self.table_name(arg(term, 0)?)?;
                let from = expect_string(self.eval_arg(term, 1)?, operation)?;
                let to = expect_string(self.eval_arg(term, 2)?, operation)?;
                let table = self.table_mut(&db, &name)?;
                if table.indexes.contains_key(&to) {
                    return Err(runtime_error!(
                        "Index `{to}` already exists on table `{db}.{name}`"
                    ));
                }
                let Some(index) = table.indexes.remove(&from) else {
                    return Err(runtime_error!(
                        "Index `{from}` does not exist on table `{db}.{name}`"
                    ));
                };
                table.indexes.insert(to, index);
                Ok(IndexChangeResult {
                    renamed: 1,
                    ..Default::default()
                }
                .as_value())
            }
            TermType::IndexList => {
                let (db, name) = self.table_name(arg(term, 0)?)?;
                Ok(Value::Array(
                    self.table(&db, &name)?
                        .indexes
                        .keys()
                        .cloned()
                        .map(Value::String)
                        .collect(),
                ))
            }
            TermType::Insert => self.insert(term),
            TermType::Update | TermType::Replace | TermType::Delete => self.write(term),
            _ => Err(runtime_error!("{operation} is not a catalog operation")),
        }
    }

    fn db_name(&mut self, term: &Term) -> EvalResult<String> {
        match term.term_type {
            TermType::Db => expect_string(self.eval_arg(term, 0)?, "DB"),
            _ => Err(runtime_error!(
                "Expected a database but found {}",
                term.term_type
            )),
        }
    }

    /// Database and name of a `TABLE` node.
    pub(crate) fn table_name(&mut self, term: &Term) -> EvalResult<(String, String)> {
        if term.term_type != TermType::Table {
            return Err(runtime_error!(
                "Expected a table but found {}",
                term.term_type
            ));
        }
        let (db, name) = match term.args.as_slice() {
            [name] => (self.default_db.to_string(), name),
            [db, name] => (self.db_name(db)?, name),
            _ => {
                return Err(runtime_error!(
                    "Expected 1 or 2 arguments to TABLE but found {}",
                    term.args.len()
                ));
            }
        };
        let name = expect_string(self.eval(name)?, "TABLE")?;
        Ok((db, name))
    }

    fn database_mut(&mut self, db: &str) -> EvalResult<&mut DatabaseData> {
        self.catalog
            .databases
            .get_mut(db)
            .ok_or_else(|| runtime_error!("Database `{db}` does not exist"))
    }

    pub(crate) fn table(&self, db: &str, name: &str) -> EvalResult<&TableData> {
        self.catalog
            .databases
            .get(db)
            .ok_or_else(|| runtime_error!("Database `{db}` does not exist"))?
            .tables
            .get(name)
            .ok_or_else(|| runtime_error!("Table `{db}.{name}` does not exist"))
    }

    pub(crate) fn table_mut(&mut self, db: &str, name: &str) -> EvalResult<&mut TableData> {
        self.database_mut(db)?
            .tables
            .get_mut(name)
            .ok_or_else(|| runtime_error!("Table `{db}.{name}` does not exist"))
    }

    /// Value of the document under the index named by the `index` option of `term`, the
    /// primary key when the option is missing.
    fn document_key(&mut self, term: &Term, document: &Value) -> EvalResult<Option<Value>> {
        let (db, name) = self.table_name(arg(term, 0)?)?;
        let table = self.table(&db, &name)?;
        let index = option_str(term, "index")
            .unwrap_or(&table.primary_key)
            .to_string();
        if index == table.primary_key {
            return Ok(document.get(&index).cloned());
        }
        let Some(definition) = table.indexes.get(&index).cloned() else {
            return Err(runtime_error!(
                "Index `{index}` was not found on table `{db}.{name}`"
            ));
        };
        match definition {
            Index::Field(field) => Ok(document.get(&field).cloned()),
            Index::Function(function) => match self.call(&function, vec![document.clone()]) {
                Ok(v) => Ok(Some(v)),
                Err(EvalError::NonExistence(..)) => Ok(None),
                Err(e) => Err(e),
            },
        }
    }

    fn get_all(&mut self, term: &Term) -> EvalResult<Vec<Value>> {
        let (db, name) = self.table_name(arg(term, 0)?)?;
        let keys = term.args[1..]
            .iter()
            .map(|v| self.eval(v))
            .collect::<EvalResult<Vec<_>>>()?;
        let table = self.table(&db, &name)?;
        if option_str(term, "index").is_none_or(|v| v == table.primary_key) {
            let mut seen = BTreeSet::new();
            return Ok(keys
                .into_iter()
                .filter(|v| seen.insert(v.clone()))
                .filter_map(|v| table.rows.get(&v).cloned())
                .collect());
        }
        let rows: Vec<Value> = table.rows.values().cloned().collect();
        let mut result = Vec::new();
        for row in rows {
            if let Some(key) = self.document_key(term, &row)?
                && keys.contains(&key)
            {
                result.push(row);
            }
        }
        Ok(result)
    }

    fn between(&mut self, term: &Term) -> EvalResult<Vec<Value>> {
        let (db, name) = self.table_name(arg(term, 0)?)?;
        let lower = self.eval_arg(term, 1)?;
        let upper = self.eval_arg(term, 2)?;
        let rows: Vec<Value> = self.table(&db, &name)?.rows.values().cloned().collect();
        let mut result = Vec::new();
        for row in rows {
            if let Some(key) = self.document_key(term, &row)?
                && in_range(term, &lower, &upper, &key)
            {
                result.push(row);
            }
        }
        Ok(result)
    }

    /// Whether `document` belongs to the selection `source`, used to route changes to feeds.
    pub(crate) fn selects(&mut self, source: &Term, document: &Value) -> EvalResult<bool> {
        match source.term_type {
            TermType::Table => Ok(true),
            TermType::Get => {
                let (db, name) = self.table_name(arg(source, 0)?)?;
                let key = self.eval_arg(source, 1)?;
                let primary_key = &self.table(&db, &name)?.primary_key;
                Ok(document.get(primary_key) == Some(&key))
            }
            TermType::GetAll => {
                let keys = source.args[1..]
                    .iter()
                    .map(|v| self.eval(v))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(self
                    .document_key(source, document)?
                    .is_some_and(|v| keys.contains(&v)))
            }
            TermType::Between => {
                let lower = self.eval_arg(source, 1)?;
                let upper = self.eval_arg(source, 2)?;
                Ok(self
                    .document_key(source, document)?
                    .is_some_and(|v| in_range(source, &lower, &upper, &v)))
            }
            TermType::Filter => {
                if !self.selects(arg(source, 0)?, document)? {
                    return Ok(false);
                }
                let predicate = arg(source, 1)?;
                if let TermType::Func(..) = predicate.term_type {
                    self.test(predicate, vec![document.clone()])
                } else {
                    let example = self.eval(predicate)?;
                    Ok(matches_example(document, &example))
                }
            }
            TermType::HasFields => {
                let mut fields = Vec::new();
                for field in source.args.iter().skip(1) {
                    fields.push(expect_string(self.eval(field)?, "HAS_FIELDS")?);
                }
                Ok(self.selects(arg(source, 0)?, document)? && has_fields(document, &fields))
            }
            _ => match source.args.first() {
                Some(inner) => self.selects(inner, document),
                None => Ok(false),
            },
        }
    }

    fn insert(&mut self, term: &Term) -> EvalResult<Value> {
        let (db, name) = self.table_name(arg(term, 0)?)?;
        let documents = match self.eval_arg(term, 1)? {
            Value::Array(v) => v,
            v => vec![v],
        };
        let conflict = option_str(term, "conflict").unwrap_or("error");
        let mut result = WriteResult::default();
        let mut changes: Vec<Change> = Vec::new();
        let table = self.table_mut(&db, &name)?;
        let primary_key = table.primary_key.clone();
        for document in documents {
            let mut document = match document {
                Value::Object(v) => v,
                v => {
                    result.errors += 1;
                    result.first_error.get_or_insert_with(|| {
                        format!("Expected type OBJECT but found {}", v.type_name())
                    });
                    continue;
                }
            };
            let key = match document.get(&primary_key) {
                Some(Value::Null) | Some(Value::Array(..)) | Some(Value::Object(..)) => {
                    result.errors += 1;
                    result.first_error.get_or_insert_with(|| {
                        format!("Invalid primary key `{primary_key}`")
                    });
                    continue;
                }
                Some(key) => key.clone(),
                None => {
                    let key = Uuid::new_v4().to_string();
                    document.insert(primary_key.clone(), Value::String(key.clone()));
                    result.generated_keys.push(key.clone());
                    Value::String(key)
                }
            };
            let document = Value::Object(document);
            let Some(old) = table.rows.get(&key).cloned() else {
                table.rows.insert(key, document.clone());
                result.inserted += 1;
                changes.push((None, Some(document)));
                continue;
            };
            let new = match conflict {
                "replace" => document,
                "update" => merge(old.clone(), document),
                _ => {
                    result.errors += 1;
                    result.first_error.get_or_insert_with(|| {
                        format!("Duplicate primary key `{primary_key}`:\n{old}\n{document}")
                    });
                    continue;
                }
            };
            if old == new {
                result.unchanged += 1;
            } else {
                table.rows.insert(key, new.clone());
                result.replaced += 1;
                changes.push((Some(old), Some(new)));
            }
        }
        self.finish_write(term, &db, &name, result, changes)
    }

    fn write(&mut self, term: &Term) -> EvalResult<Value> {
        let selection = arg(term, 0)?;
        let (db, name) = self.table_name(bound_table(selection)?)?;
        let primary_key = self.table(&db, &name)?.primary_key.clone();
        let mut result = WriteResult::default();
        let targets = match self.eval(selection)? {
            Value::Array(v) => v.into_iter().map(Some).collect(),
            // A missing document of `get`, only a replacement can create it
            Value::Null => vec![None],
            v => vec![Some(v)],
        };
        let mut changes: Vec<Change> = Vec::new();
        for old in targets {
            let new = match term.term_type {
                TermType::Delete => None,
                _ => {
                    if term.term_type == TermType::Update && old.is_none() {
                        result.skipped += 1;
                        continue;
                    }
                    let current = old.clone().unwrap_or_default();
                    match self.write_argument(term.args.get(1), current) {
                        Ok(Value::Null) if term.term_type == TermType::Update => old.clone(),
                        Ok(Value::Null) => None,
                        Ok(v) if term.term_type == TermType::Update => {
                            Some(merge(old.clone().unwrap_or_default(), v))
                        }
                        Ok(v) => Some(v),
                        Err(e) => {
                            result.errors += 1;
                            result.first_error.get_or_insert_with(|| e.to_string());
                            continue;
                        }
                    }
                }
            };
            let key = old
                .as_ref()
                .or(new.as_ref())
                .and_then(|v| v.get(&primary_key))
                .cloned();
            let Some(key) = key else {
                if old.is_some() || new.is_some() {
                    result.errors += 1;
                    result.first_error.get_or_insert_with(|| {
                        format!("Document must have the primary key `{primary_key}`")
                    });
                } else {
                    result.skipped += 1;
                }
                continue;
            };
            if let Some(new) = &new {
                if !matches!(new, Value::Object(..)) {
                    result.errors += 1;
                    result.first_error.get_or_insert_with(|| {
                        format!("Expected type OBJECT but found {}", new.type_name())
                    });
                    continue;
                }
                if new.get(&primary_key) != Some(&key) {
                    result.errors += 1;
                    result.first_error.get_or_insert_with(|| {
                        format!("Primary key `{primary_key}` cannot be changed")
                    });
                    continue;
                }
            }
            match (&old, &new) {
                (Some(old), Some(new)) if old == new => {
                    result.unchanged += 1;
                    continue;
                }
                (Some(..), Some(..)) => result.replaced += 1,
                (None, Some(..)) => result.inserted += 1,
                (Some(..), None) => result.deleted += 1,
                (None, None) => {
                    result.skipped += 1;
                    continue;
                }
            }
            let table = self.table_mut(&db, &name)?;
            match &new {
                Some(new) => table.rows.insert(key, new.clone()),
                None => table.rows.remove(&key),
            };
            changes.push((old, new));
        }
        self.finish_write(term, &db, &name, result, changes)
    }

    /// Patch or replacement computed for one document.
    fn write_argument(&mut self, argument: Option<&Term>, document: Value) -> EvalResult<Value> {
        match argument {
            Some(func) if matches!(func.term_type, TermType::Func(..)) => {
                self.call(func, vec![document])
            }
            Some(value) => self.eval(value),
            None => Ok(Value::Null),
        }
    }

    fn finish_write(
        &mut self,
        term: &Term,
        db: &str,
        name: &str,
        mut result: WriteResult,
        changes: Vec<Change>,
    ) -> EvalResult<Value> {
        self.publish(db, name, &changes)?;
        if term
            .options
            .get("return_changes")
            .is_some_and(Value::is_truthy)
        {
            result.changes = changes
                .into_iter()
                .map(|(old_val, new_val)| ValueChange {
                    old_val,
                    new_val,
                    error: None,
                })
                .collect();
        }
        log::trace!(
            "{} on `{db}.{name}` affected {} documents",
            term.term_type,
            result.affected()
        );
        Ok(result.as_value())
    }

    /// Route the changes of a table to its subscriptions.
    fn publish(&mut self, db: &str, name: &str, changes: &[Change]) -> EvalResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let table = self.table_mut(db, name)?;
        let primary_key = table.primary_key.clone();
        let subscribers = table.subscribers();
        for subscription in subscribers {
            for (old, new) in changes {
                let old = self.visible(&subscription.source, old);
                let new = self.visible(&subscription.source, new);
                if old.is_none() && new.is_none() {
                    continue;
                }
                let key = new
                    .as_ref()
                    .or(old.as_ref())
                    .and_then(|v| v.get(&primary_key))
                    .cloned()
                    .unwrap_or_default();
                subscription.push(
                    key,
                    ValueChange {
                        old_val: old,
                        new_val: new,
                        error: None,
                    },
                );
            }
        }
        Ok(())
    }

    fn visible(&mut self, source: &Term, document: &Option<Value>) -> Option<Value> {
        let document = document.as_ref()?;
        match self.selects(source, document) {
            Ok(true) => Some(document.clone()),
            Ok(false) => None,
            Err(e) => {
                log::warn!("Could not route a change to a feed: {e}");
                None
            }
        }
    }
}
