use std::sync::Arc;

use smol_str::SmolStr;

use crate::{
    cond::{ConditionOptions, Schema},
    dialect::Dialect,
    error::Result,
    ident::Aliases,
    value::{Tree, Value},
};

use super::{Flags, Limit, Order, ToSql, bound, clause, extend};

/// One `{KIND} JOIN table ON conditions` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: SmolStr,
    pub table: Value,
    pub on: Tree,
}

#[derive(Debug, Clone, Default)]
pub struct Select {
    maybe_dialect: Option<Arc<Dialect>>,
    flags: Flags,
    fields: Tree,
    from: Tree,
    joins: Vec<Join>,
    wheres: Tree,
    group: Vec<SmolStr>,
    having: Tree,
    order: Order,
    limit: Limit,
    maybe_lock: Option<SmolStr>,
    maybe_alias: Option<SmolStr>,
    options: ConditionOptions,
}

impl Select {
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

    pub fn distinct(&mut self, enable: bool) -> &mut Self {
        self.flags.set("DISTINCT", enable);
        self
    }

    flags! {
        /// MySQL `SQL_CALC_FOUND_ROWS`.
        calc_found_rows => "SQL_CALC_FOUND_ROWS",
        cache => "SQL_CACHE",
        no_cache => "SQL_NO_CACHE",
        straight_join => "STRAIGHT_JOIN",
        high_priority => "HIGH_PRIORITY",
        small_result => "SQL_SMALL_RESULT",
        big_result => "SQL_BIG_RESULT",
        buffer_result => "SQL_BUFFER_RESULT",
    }

    /// Selected columns, `*` when none are given.
    pub fn fields<V>(&mut self, fields: V) -> &mut Self
    where
        V: Into<Value>,
    {
        extend(&mut self.fields, fields.into());
        self
    }

    pub fn from<V>(&mut self, sources: V) -> &mut Self
    where
        V: Into<Value>,
    {
        extend(&mut self.from, sources.into());
        self
    }

    /// Adds a `LEFT JOIN`.
    pub fn join<T>(&mut self, table: T, on: Tree) -> &mut Self
    where
        T: Into<Value>,
    {
        self.join_with("LEFT", table, on)
    }

    pub fn join_with<K, T>(&mut self, kind: K, table: T, on: Tree) -> &mut Self
    where
        K: AsRef<str>,
        T: Into<Value>,
    {
        let table = table.into();
        if !table.is_truthy() {
            return self;
        }
        self.joins.push(Join {
            kind: SmolStr::new(kind.as_ref().to_uppercase()),
            table,
            on,
        });
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

    pub fn group<I, T>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SmolStr>,
    {
        for field in fields {
            let field = field.into();
            if !field.is_empty() && !self.group.contains(&field) {
                self.group.push(field);
            }
        }
        self
    }

    pub fn having<V>(&mut self, conditions: V) -> &mut Self
    where
        V: Into<Value>,
    {
        let conditions = conditions.into();
        if !matches!(&conditions, Value::Null) && conditions.as_tree().is_none_or(|tree| !tree.is_empty()) {
            self.having.push(conditions);
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

    /// Locks the selected rows, `mode` being one of the dialect lock modes.
    pub fn lock(&mut self, mode: &str) -> Result<&mut Self> {
        let lock = bound(&self.maybe_dialect)?.lock_clause(mode)?;
        self.maybe_lock = Some(SmolStr::new(lock));
        Ok(self)
    }

    pub fn for_update(&mut self) -> Result<&mut Self> {
        self.lock("update")
    }

    pub fn unlock(&mut self) -> &mut Self {
        self.maybe_lock = None;
        self
    }

    /// Renders as `(SELECT ...) AS alias`, for use as a subquery.
    pub fn alias<T>(&mut self, alias: T) -> &mut Self
    where
        T: Into<SmolStr>,
    {
        self.maybe_alias = Some(alias.into());
        self
    }

    /// Schema consulted when casting values compared to `alias` columns.
    pub fn schema<T, S>(&mut self, alias: T, schema: S) -> &mut Self
    where
        T: Into<SmolStr>,
        S: Schema + 'static,
    {
        self.options.schemas.insert(alias.into(), Arc::new(schema));
        self
    }

    pub fn aliases(&mut self, aliases: Aliases) -> &mut Self {
        self.options.aliases = aliases;
        self
    }

    fn joins_sql(&self, dialect: &Dialect) -> Result<String> {
        let mut sql = String::new();
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.kind);
            sql.push_str(" JOIN ");
            sql.push_str(&dialect.qualified_names(&join.table, Some(&self.options.aliases))?);
            let on = dialect.conditions(&join.on, &self.options)?;
            sql.push_str(&clause("ON", &on));
        }
        Ok(sql)
    }
}

impl ToSql for Select {
    fn to_sql(&self) -> Result<String> {
        let dialect = bound(&self.maybe_dialect)?;
        let aliases = Some(&self.options.aliases);

        let fields = dialect.tree_names(&self.fields, aliases)?;
        let group = self
            .group
            .iter()
            .map(|field| dialect.qualified_name(field, aliases))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = String::from("SELECT");
        sql.push_str(&self.flags.to_sql());
        sql.push(' ');
        sql.push_str(if fields.is_empty() { "*" } else { &fields });
        sql.push_str(&clause("FROM", &dialect.tree_names(&self.from, aliases)?));
        sql.push_str(&self.joins_sql(dialect)?);
        sql.push_str(&clause("WHERE", &dialect.conditions(&self.wheres, &self.options)?));
        sql.push_str(&clause("GROUP BY", &group));
        sql.push_str(&clause("HAVING", &dialect.conditions(&self.having, &self.options)?));
        sql.push_str(&self.order.to_sql(dialect));
        sql.push_str(&self.limit.to_sql());
        if let Some(lock) = &self.maybe_lock {
            sql.push(' ');
            sql.push_str(lock);
        }

        if let Some(alias) = &self.maybe_alias {
            sql = format!("({sql}) AS {}", dialect.name(alias));
        }
        tracing::debug!(%sql, "rendered select");
        Ok(sql)
    }
}
