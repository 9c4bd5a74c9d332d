use crate::{Bool, Date, Expr, IntoExpr, Number, Str};
use std::ops;

macro_rules! impl_binary_op {
    ($shape:ty, $rhs:ty, $op:ident, $fn:ident, $method:ident) => {
        impl<R: IntoExpr<$rhs>> ops::$op<R> for Expr<$shape> {
            type Output = Expr<$shape>;
            fn $fn(self, rhs: R) -> Self::Output {
                Expr::<$shape>::$method(&self, rhs)
            }
        }
        impl<R: IntoExpr<$rhs>> ops::$op<R> for &Expr<$shape> {
            type Output = Expr<$shape>;
            fn $fn(self, rhs: R) -> Self::Output {
                Expr::<$shape>::$method(self, rhs)
            }
        }
    };
}
impl_binary_op!(Number, Number, Add, add, add);
impl_binary_op!(Number, Number, Sub, sub, sub);
impl_binary_op!(Number, Number, Mul, mul, mul);
impl_binary_op!(Number, Number, Div, div, div);
impl_binary_op!(Number, Number, Rem, rem, rem);
impl_binary_op!(Number, Number, BitAnd, bitand, bit_and);
impl_binary_op!(Number, Number, BitOr, bitor, bit_or);
impl_binary_op!(Number, Number, BitXor, bitxor, bit_xor);
impl_binary_op!(Number, Number, Shl, shl, shl);
impl_binary_op!(Number, Number, Shr, shr, shr);
impl_binary_op!(Bool, Bool, BitAnd, bitand, and);
impl_binary_op!(Bool, Bool, BitOr, bitor, or);
impl_binary_op!(Str, Str, Add, add, concat);
impl_binary_op!(Date, Number, Add, add, add);
impl_binary_op!(Date, Number, Sub, sub, sub);

impl ops::Not for Expr<Bool> {
    type Output = Expr<Bool>;
    fn not(self) -> Self::Output {
        Expr::<Bool>::not(&self)
    }
}

impl ops::Not for &Expr<Bool> {
    type Output = Expr<Bool>;
    fn not(self) -> Self::Output {
        Expr::<Bool>::not(self)
    }
}

impl ops::Not for Expr<Number> {
    type Output = Expr<Number>;
    fn not(self) -> Self::Output {
        self.bit_not()
    }
}
