use crate::{Expr, IntoExpr, Number, TermType};

impl Expr<Number> {
    pub fn add(&self, other: impl IntoExpr<Number>) -> Expr<Number> {
        self.wrap(TermType::Add, [other.into_expr().into_term()])
    }

    pub fn sub(&self, other: impl IntoExpr<Number>) -> Expr<Number> {
        self.wrap(TermType::Sub, [other.into_expr().into_term()])
    }

    pub fn mul(&self, other: impl IntoExpr<Number>) -> Expr<Number> {
        self.wrap(TermType::Mul, [other.into_expr().into_term()])
    }

    pub fn div(&self, other: impl IntoExpr<Number>) -> Expr<Number> {
        self.wrap(TermType::Div, [other.into_expr().into_term()])
    }

    pub fn rem(&self, other: impl IntoExpr<Number>) -> Expr<Number> {
        self.wrap(TermType::Mod, [other.into_expr().into_term()])
    }

    pub fn bit_and(&self, other: impl IntoExpr<Number>) -> Expr<Number> {
        self.wrap(TermType::BitAnd, [other.into_expr().into_term()])
    }

    pub fn bit_or(&self, other: impl IntoExpr<Number>) -> Expr<Number> {
        self.wrap(TermType::BitOr, [other.into_expr().into_term()])
    }

    pub fn bit_xor(&self, other: impl IntoExpr<Number>) -> Expr<Number> {
        self.wrap(TermType::BitXor, [other.into_expr().into_term()])
    }

    pub fn bit_not(&self) -> Expr<Number> {
        self.wrap(TermType::BitNot, [])
    }

    /// Arithmetic left shift.
    pub fn shl(&self, bits: impl IntoExpr<Number>) -> Expr<Number> {
        self.wrap(TermType::BitSal, [bits.into_expr().into_term()])
    }

    /// Arithmetic right shift, the sign is preserved.
    pub fn shr(&self, bits: impl IntoExpr<Number>) -> Expr<Number> {
        self.wrap(TermType::BitSar, [bits.into_expr().into_term()])
    }

    pub fn round(&self) -> Expr<Number> {
        self.wrap(TermType::Round, [])
    }

    pub fn ceil(&self) -> Expr<Number> {
        self.wrap(TermType::Ceil, [])
    }

    pub fn floor(&self) -> Expr<Number> {
        self.wrap(TermType::Floor, [])
    }
}
