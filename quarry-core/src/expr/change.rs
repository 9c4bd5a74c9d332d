use crate::{Change, Expr, Nullable, Shape, Term, TermType};

impl<T: Shape> Expr<Change<T>> {
    /// Document before the change, null for insertions and initial values.
    pub fn old_val(&self) -> Expr<Nullable<T>> {
        self.wrap(TermType::GetField, [Term::datum("old_val")])
    }

    /// Document after the change, null for deletions.
    pub fn new_val(&self) -> Expr<Nullable<T>> {
        self.wrap(TermType::GetField, [Term::datum("new_val")])
    }
}
