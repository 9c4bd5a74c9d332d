use crate::{
    Change, ChangesOptions, Datum, Expr, Feed, Foldable, IntoOptions, Kind, Result, Shape, Surface,
    Template, Term, TermType, UpdateOptions, Written,
};

/// Writes on documents still bound to their table.
pub trait Mutable: Surface {
    /// Merge `patch` into every selected document.
    fn update(&self, patch: impl Into<Template>) -> Result<Datum<Written>> {
        self.update_with_options(patch, UpdateOptions::default())
    }

    fn update_with_options(
        &self,
        patch: impl Into<Template>,
        options: UpdateOptions,
    ) -> Result<Datum<Written>> {
        let patch = patch.into().fold()?;
        Ok(write(self, TermType::Update, Some(patch), options))
    }

    /// Merge the object computed from each document into it.
    fn update_by<R: Foldable>(&self, f: impl FnOnce(Expr<Self::Item>) -> R) -> Result<Datum<Written>> {
        let (func, _) = crate::func1(f)?;
        Ok(write(self, TermType::Update, Some(func), UpdateOptions::default()))
    }

    /// Replace every selected document, the primary key must not change.
    fn replace(&self, document: impl Into<Template>) -> Result<Datum<Written>> {
        self.replace_with_options(document, UpdateOptions::default())
    }

    fn replace_with_options(
        &self,
        document: impl Into<Template>,
        options: UpdateOptions,
    ) -> Result<Datum<Written>> {
        let document = document.into().fold()?;
        Ok(write(self, TermType::Replace, Some(document), options))
    }

    /// Replace each document with the one computed from it, null deletes it.
    fn replace_by<R: Foldable>(&self, f: impl FnOnce(Expr<Self::Item>) -> R) -> Result<Datum<Written>> {
        let (func, _) = crate::func1(f)?;
        Ok(write(self, TermType::Replace, Some(func), UpdateOptions::default()))
    }

    fn delete(&self) -> Datum<Written> {
        write(self, TermType::Delete, None, UpdateOptions::default())
    }

    fn delete_with_options(&self, options: UpdateOptions) -> Datum<Written> {
        write(self, TermType::Delete, None, options)
    }

    /// Subscribe to the changes of the selected documents.
    fn changes(&self) -> Feed<Change<Self::Item>> {
        self.changes_with_options(ChangesOptions::default())
    }

    fn changes_with_options(&self, options: ChangesOptions) -> Feed<Change<Self::Item>> {
        Feed::from_term(Term::with_options(
            TermType::Changes,
            vec![self.term().clone()],
            options.into_options(),
            <Change<Self::Item> as Shape>::kind(),
        ))
    }
}

fn write<M: Mutable + ?Sized>(
    surface: &M,
    term_type: TermType,
    argument: Option<Term>,
    options: UpdateOptions,
) -> Datum<Written> {
    let mut args = vec![surface.term().clone()];
    args.extend(argument);
    Datum::from_term(Term::with_options(
        term_type,
        args,
        options.into_options(),
        Kind::Object(Box::new(Kind::Any)),
    ))
}
