use crate::Value;
use std::fmt::{self, Display, Formatter};

/// Join kinds, the rows emitted for each are documented on the join methods of
/// [`Finite`](crate::Finite).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Cross,
    #[default]
    Inner,
    Left,
    LeftExcl,
    Right,
    RightExcl,
    FullOuter,
    FullExcl,
}

impl JoinKind {
    /// Unmatched left rows are emitted (paired with null).
    pub fn keeps_unmatched_left(&self) -> bool {
        matches!(
            self,
            JoinKind::Left | JoinKind::LeftExcl | JoinKind::FullOuter | JoinKind::FullExcl
        )
    }
    /// Unmatched right rows are emitted (paired with null).
    pub fn keeps_unmatched_right(&self) -> bool {
        matches!(
            self,
            JoinKind::Right | JoinKind::RightExcl | JoinKind::FullOuter | JoinKind::FullExcl
        )
    }
    /// Matched pairs are emitted.
    pub fn keeps_matched(&self) -> bool {
        matches!(
            self,
            JoinKind::Cross
                | JoinKind::Inner
                | JoinKind::Left
                | JoinKind::Right
                | JoinKind::FullOuter
        )
    }
}

impl Display for JoinKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinKind::Cross => "cross",
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::LeftExcl => "left_excl",
            JoinKind::Right => "right",
            JoinKind::RightExcl => "right_excl",
            JoinKind::FullOuter => "full_outer",
            JoinKind::FullExcl => "full_excl",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Year,
    Month,
    Day,
    DayOfWeek,
    DayOfYear,
    Hours,
    Minutes,
    Seconds,
    Date,
    TimeOfDay,
}

/// Operation tag of an expression node, operation specific payload travels inside the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum TermType {
    // Literals and variables
    Datum(Value),
    MakeArray,
    /// Keys aligned with the arguments.
    MakeObject(Vec<String>),
    Var(String),
    /// Parameters, the single argument is the body.
    Func(Vec<String>),
    /// `[func, arg...]`
    FuncCall,
    // Field access
    GetField,
    Nth,
    HasFields,
    WithFields,
    Pluck,
    Without,
    Merge,
    Keys,
    Values,
    Default,
    Branch,
    // Comparison and logic
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    BitSal,
    BitSar,
    Round,
    Ceil,
    Floor,
    // Strings
    Split,
    Upcase,
    Downcase,
    Match,
    // Time
    Now,
    EpochTime,
    ToEpochTime,
    InTimezone,
    Timezone,
    During,
    TimeField(TimeField),
    // Sequences
    Filter,
    Map,
    ConcatMap,
    OrderBy,
    Asc,
    Desc,
    Limit,
    Skip,
    Slice,
    Distinct,
    Union,
    IsEmpty,
    Contains,
    Append,
    Reduce,
    CoerceToArray,
    // Aggregates
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Join(JoinKind),
    /// Grouping fields, arguments are `[source, mapper]`.
    Group(Vec<String>),
    // Catalog
    Db,
    Table,
    Get,
    GetAll,
    Between,
    DbCreate,
    DbDrop,
    DbList,
    TableCreate,
    TableDrop,
    TableList,
    IndexCreate,
    IndexDrop,
    IndexList,
    IndexRename,
    // Writes
    Insert,
    Update,
    Replace,
    Delete,
    Changes,
}

impl TermType {
    pub fn name(&self) -> &'static str {
        match self {
            TermType::Datum(..) => "DATUM",
            TermType::MakeArray => "MAKE_ARRAY",
            TermType::MakeObject(..) => "MAKE_OBJECT",
            TermType::Var(..) => "VAR",
            TermType::Func(..) => "FUNC",
            TermType::FuncCall => "FUNCALL",
            TermType::GetField => "GET_FIELD",
            TermType::Nth => "NTH",
            TermType::HasFields => "HAS_FIELDS",
            TermType::WithFields => "WITH_FIELDS",
            TermType::Pluck => "PLUCK",
            TermType::Without => "WITHOUT",
            TermType::Merge => "MERGE",
            TermType::Keys => "KEYS",
            TermType::Values => "VALUES",
            TermType::Default => "DEFAULT",
            TermType::Branch => "BRANCH",
            TermType::Eq => "EQ",
            TermType::Ne => "NE",
            TermType::Lt => "LT",
            TermType::Le => "LE",
            TermType::Gt => "GT",
            TermType::Ge => "GE",
            TermType::And => "AND",
            TermType::Or => "OR",
            TermType::Not => "NOT",
            TermType::Add => "ADD",
            TermType::Sub => "SUB",
            TermType::Mul => "MUL",
            TermType::Div => "DIV",
            TermType::Mod => "MOD",
            TermType::BitAnd => "BIT_AND",
            TermType::BitOr => "BIT_OR",
            TermType::BitXor => "BIT_XOR",
            TermType::BitNot => "BIT_NOT",
            TermType::BitSal => "BIT_SAL",
            TermType::BitSar => "BIT_SAR",
            TermType::Round => "ROUND",
            TermType::Ceil => "CEIL",
            TermType::Floor => "FLOOR",
            TermType::Split => "SPLIT",
            TermType::Upcase => "UPCASE",
            TermType::Downcase => "DOWNCASE",
            TermType::Match => "MATCH",
            TermType::Now => "NOW",
            TermType::EpochTime => "EPOCH_TIME",
            TermType::ToEpochTime => "TO_EPOCH_TIME",
            TermType::InTimezone => "IN_TIMEZONE",
            TermType::Timezone => "TIMEZONE",
            TermType::During => "DURING",
            TermType::TimeField(field) => match field {
                TimeField::Year => "YEAR",
                TimeField::Month => "MONTH",
                TimeField::Day => "DAY",
                TimeField::DayOfWeek => "DAY_OF_WEEK",
                TimeField::DayOfYear => "DAY_OF_YEAR",
                TimeField::Hours => "HOURS",
                TimeField::Minutes => "MINUTES",
                TimeField::Seconds => "SECONDS",
                TimeField::Date => "DATE",
                TimeField::TimeOfDay => "TIME_OF_DAY",
            },
            TermType::Filter => "FILTER",
            TermType::Map => "MAP",
            TermType::ConcatMap => "CONCAT_MAP",
            TermType::OrderBy => "ORDER_BY",
            TermType::Asc => "ASC",
            TermType::Desc => "DESC",
            TermType::Limit => "LIMIT",
            TermType::Skip => "SKIP",
            TermType::Slice => "SLICE",
            TermType::Distinct => "DISTINCT",
            TermType::Union => "UNION",
            TermType::IsEmpty => "IS_EMPTY",
            TermType::Contains => "CONTAINS",
            TermType::Append => "APPEND",
            TermType::Reduce => "REDUCE",
            TermType::CoerceToArray => "COERCE_TO_ARRAY",
            TermType::Count => "COUNT",
            TermType::Sum => "SUM",
            TermType::Avg => "AVG",
            TermType::Min => "MIN",
            TermType::Max => "MAX",
            TermType::Join(..) => "JOIN",
            TermType::Group(..) => "GROUP",
            TermType::Db => "DB",
            TermType::Table => "TABLE",
            TermType::Get => "GET",
            TermType::GetAll => "GET_ALL",
            TermType::Between => "BETWEEN",
            TermType::DbCreate => "DB_CREATE",
            TermType::DbDrop => "DB_DROP",
            TermType::DbList => "DB_LIST",
            TermType::TableCreate => "TABLE_CREATE",
            TermType::TableDrop => "TABLE_DROP",
            TermType::TableList => "TABLE_LIST",
            TermType::IndexCreate => "INDEX_CREATE",
            TermType::IndexDrop => "INDEX_DROP",
            TermType::IndexList => "INDEX_LIST",
            TermType::IndexRename => "INDEX_RENAME",
            TermType::Insert => "INSERT",
            TermType::Update => "UPDATE",
            TermType::Replace => "REPLACE",
            TermType::Delete => "DELETE",
            TermType::Changes => "CHANGES",
        }
    }
}

impl Display for TermType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
