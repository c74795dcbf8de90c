use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    column::{Field, TableSchema},
    cond::ConditionOptions,
    constraint::{Constraint, Meta, MetaScope},
    dialect::Dialect,
    error::{Result, SqlError},
    value::Value,
};

use super::{ToSql, bound, flag};

/// Table level attributes copied onto text columns lacking them.
const INHERITED_META: [&str; 2] = ["charset", "collate"];

#[derive(Debug, Clone, Default)]
pub struct CreateTable {
    maybe_dialect: Option<Arc<Dialect>>,
    maybe_table: Option<SmolStr>,
    if_not_exists: bool,
    columns: IndexMap<SmolStr, Field>,
    constraints: Vec<Constraint>,
    meta: Meta,
}

impl CreateTable {
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

    pub fn table<T>(&mut self, table: T) -> &mut Self
    where
        T: Into<SmolStr>,
    {
        self.maybe_table = Some(table.into());
        self
    }

    pub fn if_not_exists(&mut self, enable: bool) -> &mut Self {
        self.if_not_exists = enable;
        self
    }

    /// Adds a column, replacing any column of the same name.
    pub fn column(&mut self, field: Field) -> &mut Self {
        self.columns.insert(field.name.clone(), field);
        self
    }

    pub fn columns<I>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = Field>,
    {
        for field in fields {
            self.column(field);
        }
        self
    }

    pub fn constraint(&mut self, constraint: Constraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }

    pub fn constraints<I>(&mut self, constraints: I) -> &mut Self
    where
        I: IntoIterator<Item = Constraint>,
    {
        self.constraints.extend(constraints);
        self
    }

    /// Table attribute such as `engine` or `charset`.
    pub fn meta<T, V>(&mut self, name: T, value: V) -> &mut Self
    where
        T: Into<SmolStr>,
        V: Into<Value>,
    {
        self.meta.insert(name.into(), value.into());
        self
    }

    /// Logical types of the declared columns.
    pub fn schema(&self) -> TableSchema {
        self.columns.values().collect()
    }

    /// Completes a field, giving text columns the table charset and collation.
    fn complete(&self, dialect: &Dialect, field: &Field) -> Result<Field> {
        let mut field = dialect.field(field.clone())?;
        let text = field
            .native
            .as_deref()
            .is_some_and(|native| matches!(native.to_lowercase().as_str(), "char" | "varchar" | "text"));
        if !text {
            return Ok(field);
        }
        let Some(column_meta) = dialect.meta.get(&MetaScope::Column) else {
            return Ok(field);
        };
        for name in INHERITED_META {
            if !column_meta.contains_key(name) || field.meta.contains_key(name) {
                continue;
            }
            if let Some(value) = self.meta.get(name) {
                field.meta.insert(SmolStr::new_static(name), value.clone());
            }
        }
        Ok(field)
    }

    fn definitions(&self, dialect: &Dialect) -> Result<Vec<String>> {
        let mut definitions = Vec::with_capacity(self.columns.len() + self.constraints.len());
        let mut maybe_primary = None;
        for field in self.columns.values() {
            let field = self.complete(dialect, field)?;
            if field.is_serial() {
                maybe_primary = Some(field.name.clone());
            }
            definitions.push(dialect.column(field)?);
        }

        let options = ConditionOptions::default().with_schema("", self.schema());
        for constraint in &self.constraints {
            let kind = constraint.kind.as_deref().ok_or(SqlError::MissingConstraintType)?;
            let rendered = dialect.constraint(kind, constraint, &options)?;
            if !rendered.is_empty() {
                definitions.push(rendered);
            }
            if kind == "primary" {
                maybe_primary = None;
            }
        }
        if let Some(primary) = maybe_primary {
            let options = ConditionOptions::default();
            definitions.push(dialect.constraint("primary", &Constraint::primary([primary]), &options)?);
        }
        Ok(definitions)
    }
}

impl ToSql for CreateTable {
    fn to_sql(&self) -> Result<String> {
        let dialect = bound(&self.maybe_dialect)?;
        let table = self
            .maybe_table
            .as_ref()
            .filter(|table| !table.is_empty())
            .ok_or_else(|| SqlError::missing_clause("CREATE TABLE", "TABLE"))?;
        if self.columns.is_empty() {
            return Err(SqlError::missing_clause("CREATE TABLE", "COLUMNS"));
        }

        let mut sql = String::from("CREATE TABLE");
        sql.push_str(&flag("IF NOT EXISTS", self.if_not_exists));
        sql.push(' ');
        sql.push_str(&dialect.name(table));
        sql.push_str(&format!(" ({})", self.definitions(dialect)?.join(", ")));
        let meta = dialect.meta(MetaScope::Table, &self.meta, None)?;
        if !meta.is_empty() {
            sql.push(' ');
            sql.push_str(&meta);
        }
        tracing::debug!(%sql, "rendered create table");
        Ok(sql)
    }
}
