use crate::{Bool, Expr, IntoExpr, TermType};

impl Expr<Bool> {
    pub fn and(&self, other: impl IntoExpr<Bool>) -> Expr<Bool> {
        self.wrap(TermType::And, [other.into_expr().into_term()])
    }

    pub fn or(&self, other: impl IntoExpr<Bool>) -> Expr<Bool> {
        self.wrap(TermType::Or, [other.into_expr().into_term()])
    }

    pub fn not(&self) -> Expr<Bool> {
        self.wrap(TermType::Not, [])
    }
}
