use crate::Value;
use std::collections::BTreeMap;

/// Call-scoped options record attached to a term, passed through to the server untouched.
pub type Options = BTreeMap<String, Value>;

/// Number of pending changes a feed may buffer when neither the call nor the connection set one.
pub const DEFAULT_CHANGEFEED_QUEUE_SIZE: usize = 100_000;

/// Conversion of a typed options struct into the options record of a term.
pub trait IntoOptions {
    fn into_options(self) -> Options;
}

impl IntoOptions for Options {
    fn into_options(self) -> Options {
        self
    }
}

/// Policy applied when an inserted document collides with an existing primary key.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// Keep the stored document and report the collision in the write result.
    #[default]
    Error,
    /// Replace the stored document.
    Replace,
    /// Merge the new document into the stored one.
    Update,
}

impl Conflict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conflict::Error => "error",
            Conflict::Replace => "replace",
            Conflict::Update => "update",
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOptions {
    pub conflict: Conflict,
    pub return_changes: bool,
}

impl IntoOptions for InsertOptions {
    fn into_options(self) -> Options {
        let mut options = Options::new();
        options.insert("conflict".into(), self.conflict.as_str().into());
        if self.return_changes {
            options.insert("return_changes".into(), true.into());
        }
        options
    }
}

/// Options of `update`, `replace` and `delete`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    pub return_changes: bool,
}

impl IntoOptions for UpdateOptions {
    fn into_options(self) -> Options {
        let mut options = Options::new();
        if self.return_changes {
            options.insert("return_changes".into(), true.into());
        }
        options
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangesOptions {
    /// Let the server coalesce successive changes of the same document.
    pub squash: bool,
    /// Bound on the changes the server buffers for a slow consumer, the server default when
    /// `None`.
    pub changefeed_queue_size: Option<usize>,
    /// Emit the current documents before any change.
    pub include_initial: bool,
}

impl IntoOptions for ChangesOptions {
    fn into_options(self) -> Options {
        let mut options = Options::new();
        options.insert("squash".into(), self.squash.into());
        if let Some(size) = self.changefeed_queue_size {
            options.insert("changefeed_queue_size".into(), size.into());
        }
        options.insert("include_initial".into(), self.include_initial.into());
        options
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TableCreateOptions {
    /// Defaults to `id` on the server.
    pub primary_key: Option<String>,
}

impl IntoOptions for TableCreateOptions {
    fn into_options(self) -> Options {
        let mut options = Options::new();
        if let Some(primary_key) = self.primary_key {
            options.insert("primary_key".into(), primary_key.into());
        }
        options
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    #[default]
    Closed,
    Open,
}

impl Bound {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bound::Closed => "closed",
            Bound::Open => "open",
        }
    }
}

/// Options of `between` and `during`, by default the range is `[lower, upper)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOptions {
    pub index: Option<String>,
    pub left_bound: Bound,
    pub right_bound: Bound,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            index: None,
            left_bound: Bound::Closed,
            right_bound: Bound::Open,
        }
    }
}

impl IntoOptions for RangeOptions {
    fn into_options(self) -> Options {
        let mut options = Options::new();
        if let Some(index) = self.index {
            options.insert("index".into(), index.into());
        }
        options.insert("left_bound".into(), self.left_bound.as_str().into());
        options.insert("right_bound".into(), self.right_bound.as_str().into());
        options
    }
}
