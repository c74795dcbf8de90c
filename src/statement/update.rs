use std::sync::Arc;

use smol_str::SmolStr;

use crate::{
    cond::{ConditionOptions, Schema, State},
    dialect::Dialect,
    error::{Result, SqlError},
    value::{Key, Tree, Value},
};

use super::{Flags, Limit, Order, ToSql, bound, clause, extend};

#[derive(Debug, Clone, Default)]
pub struct Update {
    maybe_dialect: Option<Arc<Dialect>>,
    flags: Flags,
    table: Tree,
    values: Tree,
    wheres: Tree,
    order: Order,
    limit: Limit,
    returning: Tree,
    options: ConditionOptions,
}

impl Update {
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
        /// MySQL `IGNORE`.
        ignore => "IGNORE",
        /// SQLite `OR ABORT` conflict resolution.
        or_abort => "OR ABORT",
        or_fail => "OR FAIL",
        or_ignore => "OR IGNORE",
        or_replace => "OR REPLACE",
        or_rollback => "OR ROLLBACK",
    }

    pub fn table<V>(&mut self, table: V) -> &mut Self
    where
        V: Into<Value>,
    {
        self.table.clear();
        extend(&mut self.table, table.into());
        self
    }

    /// `column => value` assignments, replacing previous ones.
    pub fn values(&mut self, values: Tree) -> &mut Self {
        self.values = values;
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

    /// Schema of the updated table, used for the assignments and conditions.
    pub fn schema<S>(&mut self, schema: S) -> &mut Self
    where
        S: Schema + 'static,
    {
        self.options.schemas.insert(SmolStr::default(), Arc::new(schema));
        self
    }

    fn set_sql(&self, dialect: &Dialect) -> Result<String> {
        let state = State::from_options(&self.options);
        let mut assignments = Vec::with_capacity(self.values.len());
        for (key, value) in self.values.iter() {
            let Key::Name(column) = key else {
                continue;
            };
            let value = dialect.value(value, &state.scoped(column))?;
            assignments.push(format!("{} = {value}", dialect.name(column)));
        }
        Ok(assignments.join(", "))
    }
}

impl ToSql for Update {
    fn to_sql(&self) -> Result<String> {
        let dialect = bound(&self.maybe_dialect)?;
        if self.table.is_empty() {
            return Err(SqlError::missing_clause("UPDATE", "TABLE"));
        }
        if self.values.is_empty() {
            return Err(SqlError::missing_clause("UPDATE", "VALUES"));
        }

        let mut sql = String::from("UPDATE");
        sql.push_str(&self.flags.to_sql());
        sql.push(' ');
        sql.push_str(&dialect.tree_names(&self.table, None)?);
        sql.push_str(&clause("SET", &self.set_sql(dialect)?));
        sql.push_str(&clause("WHERE", &dialect.conditions(&self.wheres, &self.options)?));
        sql.push_str(&self.order.to_sql(dialect));
        sql.push_str(&self.limit.to_sql());
        sql.push_str(&clause("RETURNING", &dialect.tree_names(&self.returning, None)?));
        tracing::debug!(%sql, "rendered update");
        Ok(sql)
    }
}
