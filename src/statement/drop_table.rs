use std::sync::Arc;

use crate::{
    dialect::Dialect,
    error::{Result, SqlError},
    value::{Tree, Value},
};

use super::{ToSql, bound, extend, flag};

#[derive(Debug, Clone, Default)]
pub struct DropTable {
    maybe_dialect: Option<Arc<Dialect>>,
    tables: Tree,
    if_exists: bool,
    cascade: bool,
    restrict: bool,
}

impl DropTable {
    pub fn new(dialect: Arc<Dialect>) -> Self {
        Self {
            maybe_dialect: Some(dialect),
            ..Self::default()
        }
    }

    pub fn dialect(&mut self, dialect: Arc<Dialect>) -> &mut Self {
        self.maybe_dialect = Some(dialect);
        self
    }

    /// Adds one or more tables to drop.
    pub fn table<V>(&mut self, tables: V) -> &mut Self
    where
        V: Into<Value>,
    {
        extend(&mut self.tables, tables.into());
        self
    }

    pub fn if_exists(&mut self, enable: bool) -> &mut Self {
        self.if_exists = enable;
        self
    }

    pub fn cascade(&mut self, enable: bool) -> &mut Self {
        self.cascade = enable;
        self
    }

    pub fn restrict(&mut self, enable: bool) -> &mut Self {
        self.restrict = enable;
        self
    }
}

impl ToSql for DropTable {
    fn to_sql(&self) -> Result<String> {
        let dialect = bound(&self.maybe_dialect)?;
        if self.tables.is_empty() {
            return Err(SqlError::missing_clause("DROP TABLE", "TABLE"));
        }

        let mut sql = String::from("DROP TABLE");
        sql.push_str(&flag("IF EXISTS", self.if_exists));
        sql.push(' ');
        sql.push_str(&dialect.tree_names(&self.tables, None)?);
        sql.push_str(&flag("CASCADE", self.cascade));
        sql.push_str(&flag("RESTRICT", self.restrict));
        tracing::debug!(%sql, "rendered drop table");
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list;

    #[test]
    fn test_drop_table() {
        let dialect = Arc::new(Dialect::generic());
        let mut drop = dialect.drop_table();
        drop.table("table");
        assert_eq!("DROP TABLE \"table\"", drop.to_sql().unwrap());
    }

    #[test]
    fn test_drop_tables_with_flags() {
        let dialect = Arc::new(Dialect::postgres());
        let mut drop = dialect.drop_table();
        drop.if_exists(true).table(list!["table1", "table2"]).cascade(true);
        assert_eq!("DROP TABLE IF EXISTS \"table1\", \"table2\" CASCADE", drop.to_sql().unwrap());
        drop.cascade(false).restrict(true);
        assert_eq!("DROP TABLE IF EXISTS \"table1\", \"table2\" RESTRICT", drop.to_sql().unwrap());
    }

    #[test]
    fn test_missing_table() {
        let dialect = Arc::new(Dialect::mysql());
        assert_eq!(Err(SqlError::missing_clause("DROP TABLE", "TABLE")), dialect.drop_table().to_sql());
    }
}
