//! Compose document database queries as typed expression trees.
//!
//! Every call on a table, a selection or an expression only builds a node, nothing reaches the
//! server until the finished tree is run on an [`Executor`].
//! ```rust,ignore
//! let adults = table::<Document>("users")
//!     .filter(|v| v.field::<Number>("age").gt(18))?
//!     .order_by([desc("age")])
//!     .run(&mut connection)
//!     .await?;
//! ```
pub use quarry_core::*;
pub use quarry_macros::*;
