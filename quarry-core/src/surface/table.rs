use super::{collect_as, fetch_as, impl_surface_conversions};
use crate::{
    Any, Array, Cursor, Datum, Document, Executor, Expr, Finite, Foldable, IndexChanged,
    InsertOptions, IntoExpr, IntoOptions, Kind, Mutable, Options, RangeOptions, Result, Selection,
    Sequence, Shape, SingleSelection, Str, Stream, Surface, Template, Term, TermType, Written,
    func1,
};
use std::{
    fmt::{self, Debug, Display, Formatter},
    marker::PhantomData,
};

/// A named table, the root of every selection.
///
/// `S` is the declared shape of the documents, schemaless tables use [`Document`].
pub struct Table<S = Document> {
    term: Term,
    name: String,
    shape: PhantomData<fn() -> S>,
}

impl<S: Shape> Table<S> {
    /// Table of the database `db`, the default database of the connection when `None`.
    pub fn new(db: Option<Term>, name: impl Into<String>) -> Self {
        let name = name.into();
        let mut args: Vec<Term> = db.into_iter().collect();
        args.push(Term::datum(name.as_str()));
        Self {
            term: Term::new(TermType::Table, args, <Array<S> as Shape>::kind()),
            name,
            shape: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_term(self) -> Term {
        self.term
    }

    /// Document with the primary key `key`.
    pub fn get(&self, key: impl IntoExpr<Any>) -> SingleSelection<S> {
        SingleSelection::from_term(Term::new(
            TermType::Get,
            vec![self.term.clone(), key.into_expr().into_term()],
            <S as Shape>::kind(),
        ))
    }

    /// Documents with any of the primary keys.
    pub fn get_all<K: IntoExpr<Any>>(&self, keys: impl IntoIterator<Item = K>) -> Selection<S> {
        self.get_all_term(keys, None)
    }

    /// Documents with any of the keys in the secondary index `index`.
    pub fn get_all_by<K: IntoExpr<Any>>(
        &self,
        index: &str,
        keys: impl IntoIterator<Item = K>,
    ) -> Selection<S> {
        self.get_all_term(keys, Some(index))
    }

    fn get_all_term<K: IntoExpr<Any>>(
        &self,
        keys: impl IntoIterator<Item = K>,
        index: Option<&str>,
    ) -> Selection<S> {
        let mut args = vec![self.term.clone()];
        args.extend(keys.into_iter().map(|v| v.into_expr().into_term()));
        let mut options = Options::new();
        if let Some(index) = index {
            options.insert("index".into(), index.into());
        }
        Selection::from_term(Term::with_options(
            TermType::GetAll,
            args,
            options,
            self.term.kind.clone(),
        ))
    }

    /// Documents whose primary key is in `[lower, upper)`.
    pub fn between(&self, lower: impl IntoExpr<Any>, upper: impl IntoExpr<Any>) -> Selection<S> {
        self.between_with_options(lower, upper, RangeOptions::default())
    }

    /// Documents whose key is between the bounds, the index and the bounds come from `options`.
    pub fn between_with_options(
        &self,
        lower: impl IntoExpr<Any>,
        upper: impl IntoExpr<Any>,
        options: RangeOptions,
    ) -> Selection<S> {
        Selection::from_term(Term::with_options(
            TermType::Between,
            vec![
                self.term.clone(),
                lower.into_expr().into_term(),
                upper.into_expr().into_term(),
            ],
            options.into_options(),
            self.term.kind.clone(),
        ))
    }

    /// Insert one document or an array of documents.
    pub fn insert(&self, documents: impl Into<Template>) -> Result<Datum<Written>> {
        self.insert_with_options(documents, InsertOptions::default())
    }

    pub fn insert_with_options(
        &self,
        documents: impl Into<Template>,
        options: InsertOptions,
    ) -> Result<Datum<Written>> {
        let documents = documents.into().fold()?;
        Ok(Datum::from_term(Term::with_options(
            TermType::Insert,
            vec![self.term.clone(), documents],
            options.into_options(),
            <Written as Shape>::kind(),
        )))
    }

    /// Secondary index on the field of the same name.
    pub fn index_create(&self, name: &str) -> Datum<IndexChanged> {
        self.admin(TermType::IndexCreate, [Term::datum(name)])
    }

    /// Secondary index on the value computed from each document.
    pub fn index_create_by<R: Foldable>(
        &self,
        name: &str,
        f: impl FnOnce(Expr<S>) -> R,
    ) -> Result<Datum<IndexChanged>> {
        let (func, _) = func1(f)?;
        Ok(self.admin(TermType::IndexCreate, [Term::datum(name), func]))
    }

    pub fn index_drop(&self, name: &str) -> Datum<IndexChanged> {
        self.admin(TermType::IndexDrop, [Term::datum(name)])
    }

    pub fn index_rename(&self, from: &str, to: &str) -> Datum<IndexChanged> {
        self.admin(TermType::IndexRename, [Term::datum(from), Term::datum(to)])
    }

    pub fn index_list(&self) -> Datum<Array<Str>> {
        Datum::from_term(Term::new(
            TermType::IndexList,
            vec![self.term.clone()],
            <Array<Str> as Shape>::kind(),
        ))
    }

    fn admin(
        &self,
        term_type: TermType,
        args: impl IntoIterator<Item = Term>,
    ) -> Datum<IndexChanged> {
        Datum::from_term(self.wrap_term_kind(
            term_type,
            args,
            Kind::Object(Box::new(Kind::Any)),
        ))
    }

    pub async fn run<E: Executor>(&self, executor: &mut E) -> Result<Vec<S::Output>> {
        collect_as(executor, self.query()).await
    }

    pub fn fetch<'e, E: Executor>(&self, executor: &'e mut E) -> Cursor<'e, S::Output> {
        fetch_as(executor, self.query())
    }
}

impl<S: Shape> Surface for Table<S> {
    type Item = S;
    fn term(&self) -> &Term {
        &self.term
    }
}

impl<S: Shape> Sequence for Table<S> {
    type Narrowed = Selection<S>;
    type Mapped<U: Shape> = Stream<U>;

    fn narrowed(&self, term: Term) -> Self::Narrowed {
        Selection::from_term(term)
    }

    fn mapped<U: Shape>(&self, term: Term) -> Self::Mapped<U> {
        Stream::from_term(term)
    }
}

impl<S: Shape> Finite for Table<S> {}

impl<S: Shape> Mutable for Table<S> {}

impl_surface_conversions!(Table => Array<S>);

impl<S> Clone for Table<S> {
    fn clone(&self) -> Self {
        Self {
            term: self.term.clone(),
            name: self.name.clone(),
            shape: PhantomData,
        }
    }
}

impl<S> Debug for Table<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}

impl<S> Display for Table<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.term, f)
    }
}
