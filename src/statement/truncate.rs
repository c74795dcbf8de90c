use std::sync::Arc;

use smol_str::SmolStr;

use crate::{
    dialect::{Dialect, DialectKind},
    error::{Result, SqlError},
};

use super::{ToSql, bound};

/// `TRUNCATE TABLE`, emulated with `DELETE` statements on SQLite.
#[derive(Debug, Clone, Default)]
pub struct Truncate {
    maybe_dialect: Option<Arc<Dialect>>,
    maybe_table: Option<SmolStr>,
}

impl Truncate {
    pub fn new(dialect: Arc<Dialect>) -> Self {
        Self {
            maybe_dialect: Some(dialect),
            maybe_table: None,
        }
    }

    pub fn dialect(&mut self, dialect: Arc<Dialect>) -> &mut Self {
        self.maybe_dialect = Some(dialect);
        self
    }

    pub fn table<T>(&mut self, table: T) -> &mut Self
    where
        T: Into<SmolStr>,
    {
        self.maybe_table = Some(table.into());
        self
    }
}

impl ToSql for Truncate {
    fn to_sql(&self) -> Result<String> {
        let dialect = bound(&self.maybe_dialect)?;
        let table = self
            .maybe_table
            .as_ref()
            .filter(|table| !table.is_empty())
            .ok_or_else(|| SqlError::missing_clause("TRUNCATE", "TABLE"))?;

        let sql = match dialect.kind() {
            DialectKind::Sqlite => format!(
                "DELETE FROM {};DELETE FROM {} WHERE name={}",
                dialect.name(table),
                dialect.name("SQLITE_SEQUENCE"),
                dialect.quote(table),
            ),
            _ => format!("TRUNCATE TABLE {}", dialect.name(table)),
        };
        tracing::debug!(%sql, "rendered truncate");
        Ok(sql)
    }
}
