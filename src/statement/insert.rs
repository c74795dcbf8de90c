use std::sync::Arc;

use smol_str::SmolStr;

use crate::{
    cond::{ConditionOptions, Schema, State},
    dialect::Dialect,
    error::{Result, SqlError},
    value::{Key, Tree, Value},
};

use super::{Flags, ToSql, bound, clause, extend};

#[derive(Debug, Clone, Default)]
pub struct Insert {
    maybe_dialect: Option<Arc<Dialect>>,
    flags: Flags,
    maybe_into: Option<SmolStr>,
    rows: Vec<Tree>,
    returning: Tree,
    options: ConditionOptions,
}

impl Insert {
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

    flags! {
        /// MySQL `HIGH_PRIORITY`.
        high_priority => "HIGH_PRIORITY",
        low_priority => "LOW_PRIORITY",
        ignore => "IGNORE",
        delayed => "DELAYED",
    }

    pub fn into_table<T>(&mut self, table: T) -> &mut Self
    where
        T: Into<SmolStr>,
    {
        self.maybe_into = Some(table.into());
        self
    }

    /// Adds a row of `column => value` entries.
    ///
    /// Columns are taken from the first row. Later rows may list them in any
    /// order but must hold exactly the same keys.
    pub fn values(&mut self, row: Tree) -> &mut Self {
        self.rows.push(row);
        self
    }

    pub fn returning<V>(&mut self, fields: V) -> &mut Self
    where
        V: Into<Value>,
    {
        extend(&mut self.returning, fields.into());
        self
    }

    /// Schema consulted when casting the inserted values.
    pub fn schema<S>(&mut self, schema: S) -> &mut Self
    where
        S: Schema + 'static,
    {
        self.options.schemas.insert(SmolStr::default(), Arc::new(schema));
        self
    }

    fn values_sql(&self, dialect: &Dialect, first: &Tree) -> Result<String> {
        let state = State::from_options(&self.options);
        let mut rows = Vec::with_capacity(self.rows.len());
        for (position, row) in self.rows.iter().enumerate() {
            if row.len() != first.len() {
                return Err(SqlError::MismatchedRow { row: position });
            }
            let mut values = Vec::with_capacity(row.len());
            for key in first.keys() {
                let value = row
                    .get(key.clone())
                    .ok_or(SqlError::MismatchedRow { row: position })?;
                let value = match key {
                    Key::Name(column) => dialect.value(value, &state.scoped(column))?,
                    Key::Index(_) => dialect.value(value, &state)?,
                };
                values.push(value);
            }
            rows.push(format!("({})", values.join(", ")));
        }
        Ok(rows.join(", "))
    }
}

impl ToSql for Insert {
    fn to_sql(&self) -> Result<String> {
        let dialect = bound(&self.maybe_dialect)?;
        let into = self
            .maybe_into
            .as_ref()
            .filter(|into| !into.is_empty())
            .ok_or_else(|| SqlError::missing_clause("INSERT", "INTO"))?;
        let Some(first) = self.rows.first() else {
            return Err(SqlError::missing_clause("INSERT", "VALUES"));
        };
        let columns: Tree = first.keys().filter_map(|key| key.as_name()).collect();

        let mut sql = String::from("INSERT");
        sql.push_str(&self.flags.to_sql());
        sql.push_str(&clause("INTO", &dialect.name(into)));
        sql.push_str(&format!(" ({})", dialect.tree_names(&columns, None)?));
        sql.push_str(&clause("VALUES", &self.values_sql(dialect, first)?));
        sql.push_str(&clause("RETURNING", &dialect.tree_names(&self.returning, None)?));
        tracing::debug!(%sql, "rendered insert");
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{column::TableSchema, list, tree};

    #[test]
    fn test_insert() {
        let dialect = Arc::new(Dialect::generic());
        let mut insert = dialect.insert();
        insert
            .into_table("table")
            .values(tree! {"field1" => "value1", "field2" => "value2"});
        assert_eq!(
            "INSERT INTO \"table\" (\"field1\", \"field2\") VALUES ('value1', 'value2')",
            insert.to_sql().unwrap()
        );
    }

    #[test]
    fn test_multiple_rows() {
        let dialect = Arc::new(Dialect::generic());
        let mut insert = dialect.insert();
        insert
            .into_table("table")
            .values(tree! {"a" => 1, "b" => Value::Null})
            .values(tree! {"a" => 2, "b" => true});
        assert_eq!(
            "INSERT INTO \"table\" (\"a\", \"b\") VALUES (1, NULL), (2, TRUE)",
            insert.to_sql().unwrap()
        );
    }

    #[test]
    fn test_rows_follow_first_row_columns() {
        let dialect = Arc::new(Dialect::generic());
        let mut insert = dialect.insert();
        insert
            .into_table("table")
            .values(tree! {"a" => 1, "b" => 2})
            .values(tree! {"b" => 4, "a" => 3});
        assert_eq!(
            "INSERT INTO \"table\" (\"a\", \"b\") VALUES (1, 2), (3, 4)",
            insert.to_sql().unwrap()
        );
    }

    #[test]
    fn test_mismatched_row() {
        let dialect = Arc::new(Dialect::generic());
        let mut insert = dialect.insert();
        insert
            .into_table("table")
            .values(tree! {"a" => 1, "b" => 2})
            .values(tree! {"a" => 3, "c" => 4});
        assert_eq!(Err(SqlError::MismatchedRow { row: 1 }), insert.to_sql());

        let mut insert = dialect.insert();
        insert
            .into_table("table")
            .values(tree! {"a" => 1})
            .values(tree! {"a" => 2, "b" => 3});
        assert_eq!(Err(SqlError::MismatchedRow { row: 1 }), insert.to_sql());
    }

    #[test]
    fn test_missing_into() {
        let dialect = Arc::new(Dialect::generic());
        let mut insert = dialect.insert();
        insert.values(tree! {"a" => 1});
        let error = insert.to_sql().unwrap_err();
        assert_eq!("invalid `INSERT` statement, missing `INTO` clause", error.to_string());
        assert!(error.is_missing_clause());
    }

    #[test]
    fn test_missing_values() {
        let dialect = Arc::new(Dialect::generic());
        let mut insert = dialect.insert();
        insert.into_table("table");
        assert_eq!(Err(SqlError::missing_clause("INSERT", "VALUES")), insert.to_sql());
    }

    #[test]
    fn test_mysql_flags() {
        let dialect = Arc::new(Dialect::mysql());
        let mut insert = dialect.insert();
        insert
            .high_priority(true)
            .ignore(true)
            .into_table("table")
            .values(tree! {"a" => 1});
        assert_eq!("INSERT HIGH_PRIORITY IGNORE INTO `table` (`a`) VALUES (1)", insert.to_sql().unwrap());
    }

    #[test]
    fn test_returning() {
        let dialect = Arc::new(Dialect::postgres());
        let mut insert = dialect.insert();
        insert.into_table("table").values(tree! {"a" => 1}).returning(list!["id", "a"]);
        assert_eq!(
            "INSERT INTO \"table\" (\"a\") VALUES (1) RETURNING \"id\", \"a\"",
            insert.to_sql().unwrap()
        );
        insert.returning("*");
        assert_eq!(
            "INSERT INTO \"table\" (\"a\") VALUES (1) RETURNING \"id\", \"a\", *",
            insert.to_sql().unwrap()
        );
    }

    #[test]
    fn test_schema_state() {
        let config = crate::DialectConfig::new().caster(|dialect, value, state| {
            match (state.name(), state.field_type().as_deref()) {
                (Some("flag"), Some("boolean")) => String::from(if value.is_truthy() { "1" } else { "0" }),
                _ => dialect.cast(value).unwrap_or_default(),
            }
        });
        let dialect = Arc::new(Dialect::with_config(crate::DialectKind::MySql, config));
        let mut insert = dialect.insert();
        insert
            .into_table("table")
            .schema(TableSchema::new().column("flag", "boolean"))
            .values(tree! {"flag" => true, "name" => "x"});
        assert_eq!("INSERT INTO `table` (`flag`, `name`) VALUES (1, 'x')", insert.to_sql().unwrap());
    }
}
