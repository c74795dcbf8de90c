use std::sync::Arc;

use smol_str::SmolStr;

use crate::{
    cond::{ConditionOptions, Schema},
    dialect::Dialect,
    error::{Result, SqlError},
    value::{Tree, Value},
};

use super::{Flags, Limit, Order, ToSql, bound, clause, extend};

#[derive(Debug, Clone, Default)]
pub struct Delete {
    maybe_dialect: Option<Arc<Dialect>>,
    flags: Flags,
    from: Tree,
    wheres: Tree,
    order: Order,
    limit: Limit,
    returning: Tree,
    options: ConditionOptions,
}

impl Delete {
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
        /// MySQL `LOW_PRIORITY`.
        low_priority => "LOW_PRIORITY",
        ignore => "IGNORE",
        quick => "QUICK",
    }

    pub fn from<V>(&mut self, table: V) -> &mut Self
    where
        V: Into<Value>,
    {
        self.from.clear();
        extend(&mut self.from, table.into());
        self
    }

    pub fn where_clause<V>(&mut self, conditions: V) -> &mut Self
    where
        V: Into<Value>,
    {
        let conditions = conditions.into();
        if !matches!(&conditions, Value::Null) && conditions.as_tree().is_none_or(|tree| !tree.is_empty()) {
            self.wheres.push(conditions);
        }
        self
    }

    pub fn order<V>(&mut self, fields: V) -> &mut Self
    where
        V: Into<Value>,
    {
        self.order.push(fields.into());
        self
    }

    pub fn limit(&mut self, limit: usize, offset: usize) -> &mut Self {
        self.limit.set(limit, offset);
        self
    }

    pub fn returning<V>(&mut self, fields: V) -> &mut Self
    where
        V: Into<Value>,
    {
        extend(&mut self.returning, fields.into());
        self
    }

    /// Schema bound to unqualified columns of the conditions.
    pub fn schema<S>(&mut self, schema: S) -> &mut Self
    where
        S: Schema + 'static,
    {
        self.options.schemas.insert(SmolStr::default(), Arc::new(schema));
        self
    }
}

impl ToSql for Delete {
    fn to_sql(&self) -> Result<String> {
        let dialect = bound(&self.maybe_dialect)?;
        if self.from.is_empty() {
            return Err(SqlError::missing_clause("DELETE", "FROM"));
        }

        let mut sql = String::from("DELETE");
        sql.push_str(&self.flags.to_sql());
        sql.push_str(&clause("FROM", &dialect.tree_names(&self.from, None)?));
        sql.push_str(&clause("WHERE", &dialect.conditions(&self.wheres, &self.options)?));
        sql.push_str(&self.order.to_sql(dialect));
        sql.push_str(&self.limit.to_sql());
        sql.push_str(&clause("RETURNING", &dialect.tree_names(&self.returning, None)?));
        tracing::debug!(%sql, "rendered delete");
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{list, tree};

    #[test]
    fn test_delete_where_true() {
        let dialect = Arc::new(Dialect::generic());
        let mut delete = dialect.delete();
        delete.from("table").where_clause(list![true]);
        assert_eq!("DELETE FROM \"table\" WHERE TRUE", delete.to_sql().unwrap());
    }

    #[test]
    fn test_delete_conditions() {
        let dialect = Arc::new(Dialect::generic());
        let mut delete = dialect.delete();
        delete
            .from("table")
            .where_clause(tree! {"field1" => "value1"})
            .where_clause(tree! {"field2" => tree! {"<=" => 5}})
            .order(list!["field1"])
            .limit(5, 0);
        assert_eq!(
            "DELETE FROM \"table\" WHERE \"field1\" = 'value1' AND \"field2\" <= 5 ORDER BY \"field1\" ASC LIMIT 5",
            delete.to_sql().unwrap()
        );
    }

    #[test]
    fn test_empty_where_is_ignored() {
        let dialect = Arc::new(Dialect::generic());
        let mut delete = dialect.delete();
        delete.from("table").where_clause(Tree::new()).where_clause(Value::Null);
        assert_eq!("DELETE FROM \"table\"", delete.to_sql().unwrap());
    }

    #[test]
    fn test_mysql_flags() {
        let dialect = Arc::new(Dialect::mysql());
        let mut delete = dialect.delete();
        delete.low_priority(true).quick(true).from("table");
        assert_eq!("DELETE LOW_PRIORITY QUICK FROM `table`", delete.to_sql().unwrap());
    }

    #[test]
    fn test_returning() {
        let dialect = Arc::new(Dialect::postgres());
        let mut delete = dialect.delete();
        delete.from("table").returning(list!["id", "name"]);
        assert_eq!("DELETE FROM \"table\" RETURNING \"id\", \"name\"", delete.to_sql().unwrap());
    }

    #[test]
    fn test_missing_from() {
        let dialect = Arc::new(Dialect::generic());
        let delete = dialect.delete();
        let error = delete.to_sql().unwrap_err();
        assert_eq!(SqlError::missing_clause("DELETE", "FROM"), error);
    }
}
