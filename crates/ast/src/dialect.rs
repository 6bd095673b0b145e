use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect};

/// The small, fixed set of dialects the core supports (spec §1 Non-goals —
/// this is not a general SQL parser, so the allow-list stays short).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    Generic,
    MySql,
    Postgres,
}

impl SqlDialect {
    pub fn as_dialect(self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::Generic => Box::new(GenericDialect {}),
            SqlDialect::MySql => Box::new(MySqlDialect {}),
            SqlDialect::Postgres => Box::new(PostgreSqlDialect {}),
        }
    }
}
