use crate::{Bool, Date, Expr, IntoExpr, Number, Str, Term, TermType, TimeField};

macro_rules! time_field {
    ($($(#[$meta:meta])* $name:ident => $field:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(&self) -> Expr<Number> {
                self.wrap(TermType::TimeField(TimeField::$field), [])
            }
        )+
    };
}

impl Expr<Date> {
    /// Shift forward by a number of seconds.
    pub fn add(&self, seconds: impl IntoExpr<Number>) -> Expr<Date> {
        self.wrap(TermType::Add, [seconds.into_expr().into_term()])
    }

    /// Shift backward by a number of seconds.
    pub fn sub(&self, seconds: impl IntoExpr<Number>) -> Expr<Date> {
        self.wrap(TermType::Sub, [seconds.into_expr().into_term()])
    }

    /// Seconds elapsed from `other` to this date.
    pub fn diff(&self, other: impl IntoExpr<Date>) -> Expr<Number> {
        self.wrap(TermType::Sub, [other.into_expr().into_term()])
    }

    /// Whether the date falls in `[start, end)`.
    pub fn during(&self, start: impl IntoExpr<Date>, end: impl IntoExpr<Date>) -> Expr<Bool> {
        self.wrap(
            TermType::During,
            [start.into_expr().into_term(), end.into_expr().into_term()],
        )
    }

    /// Same instant expressed with a different offset, like `"+02:00"`.
    pub fn in_timezone(&self, offset: &str) -> Expr<Date> {
        self.wrap(TermType::InTimezone, [Term::datum(offset)])
    }

    /// Offset of the date, formatted as `"+HH:MM"`.
    pub fn timezone(&self) -> Expr<Str> {
        self.wrap(TermType::Timezone, [])
    }

    /// Seconds since the unix epoch.
    pub fn to_epoch_time(&self) -> Expr<Number> {
        self.wrap(TermType::ToEpochTime, [])
    }

    /// Midnight of the same day.
    pub fn date(&self) -> Expr<Date> {
        self.wrap(TermType::TimeField(TimeField::Date), [])
    }

    time_field! {
        year => Year,
        /// From 1 to 12.
        month => Month,
        day => Day,
        /// From 1 (monday) to 7.
        day_of_week => DayOfWeek,
        day_of_year => DayOfYear,
        hours => Hours,
        minutes => Minutes,
        /// Including the fractional part.
        seconds => Seconds,
        /// Seconds since midnight.
        time_of_day => TimeOfDay,
    }
}
