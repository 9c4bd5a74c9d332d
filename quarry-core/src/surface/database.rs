use crate::{
    Array, DbChanged, Datum, Document, IntoOptions, Kind, Shape, Str, Table, TableChanged,
    TableCreateOptions, Term, TermType,
};
use std::fmt::{self, Debug, Formatter};

/// Handle to a named catalog of tables, holds no server state.
#[derive(Clone)]
pub struct Database {
    term: Term,
    name: String,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            term: Term::new(TermType::Db, vec![Term::datum(name.as_str())], Kind::Database),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Table holding documents of shape `S`.
    pub fn table<S: Shape>(&self, name: &str) -> Table<S> {
        Table::new(Some(self.term.clone()), name)
    }

    /// Schemaless table.
    pub fn document_table(&self, name: &str) -> Table<Document> {
        self.table(name)
    }

    pub fn table_create(&self, name: &str) -> Datum<TableChanged> {
        self.table_create_with_options(name, TableCreateOptions::default())
    }

    pub fn table_create_with_options(
        &self,
        name: &str,
        options: TableCreateOptions,
    ) -> Datum<TableChanged> {
        Datum::from_term(Term::with_options(
            TermType::TableCreate,
            vec![self.term.clone(), Term::datum(name)],
            options.into_options(),
            <TableChanged as Shape>::kind(),
        ))
    }

    pub fn table_drop(&self, name: &str) -> Datum<TableChanged> {
        Datum::from_term(Term::new(
            TermType::TableDrop,
            vec![self.term.clone(), Term::datum(name)],
            <TableChanged as Shape>::kind(),
        ))
    }

    pub fn table_list(&self) -> Datum<Array<Str>> {
        Datum::from_term(Term::new(
            TermType::TableList,
            vec![self.term.clone()],
            <Array<Str> as Shape>::kind(),
        ))
    }
}

impl Debug for Database {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("name", &self.name).finish()
    }
}

/// Handle to the database `name`.
pub fn db(name: impl Into<String>) -> Database {
    Database::new(name)
}

/// Table of the default database of the connection.
pub fn table<S: Shape>(name: &str) -> Table<S> {
    Table::new(None, name)
}

pub fn db_create(name: &str) -> Datum<DbChanged> {
    Datum::from_term(Term::new(
        TermType::DbCreate,
        vec![Term::datum(name)],
        <DbChanged as Shape>::kind(),
    ))
}

/// Drop a database and every table in it.
pub fn db_drop(name: &str) -> Datum<DbChanged> {
    Datum::from_term(Term::new(
        TermType::DbDrop,
        vec![Term::datum(name)],
        <DbChanged as Shape>::kind(),
    ))
}

pub fn db_list() -> Datum<Array<Str>> {
    Datum::from_term(Term::new(
        TermType::DbList,
        Vec::new(),
        <Array<Str> as Shape>::kind(),
    ))
}
