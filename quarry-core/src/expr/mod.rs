mod array;
mod boolean;
mod change;
mod date;
mod expr;
mod func;
mod nullable;
mod number;
mod object;
mod ops;
mod string;

pub use expr::*;
pub use func::*;
