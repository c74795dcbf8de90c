use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    column::{ColumnFn, MapOptions, TypeDef},
    constraint::{ConstraintDef, MetaDef, MetaScope},
    cond::State,
    error::{Result, SqlError},
    format::{self, FormatterFn},
    operator::{self, BuilderFn, BuilderKind, OperatorDef},
    statement::{
        CreateTable, Delete, DropTable, Insert, Select, Statement, StatementKind, Truncate, Update,
    },
    value::Value,
};

mod generic;
mod mysql;
mod postgres;
mod sqlite;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DialectKind {
    #[default]
    Generic,
    MySql,
    Postgres,
    Sqlite,
}

pub trait HasDialect {
    const DIALECT: DialectKind;
}

pub struct Generic;

impl HasDialect for Generic {
    const DIALECT: DialectKind = DialectKind::Generic;
}

pub struct MySql;

impl HasDialect for MySql {
    const DIALECT: DialectKind = DialectKind::MySql;
}

pub struct Postgres;

impl HasDialect for Postgres {
    const DIALECT: DialectKind = DialectKind::Postgres;
}

pub struct Sqlite;

impl HasDialect for Sqlite {
    const DIALECT: DialectKind = DialectKind::Sqlite;
}

#[cfg(feature = "postgres")]
impl HasDialect for sqlx::Postgres {
    const DIALECT: DialectKind = DialectKind::Postgres;
}

#[cfg(feature = "mysql")]
impl HasDialect for sqlx::MySql {
    const DIALECT: DialectKind = DialectKind::MySql;
}

#[cfg(feature = "sqlite")]
impl HasDialect for sqlx::Sqlite {
    const DIALECT: DialectKind = DialectKind::Sqlite;
}

/// Replaces the default string quoting.
pub type Quoter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Replaces the default value casting. Receives the dialect so it can fall
/// back to [`Dialect::cast`] for values it does not handle.
pub type Caster = Arc<dyn Fn(&Dialect, &Value, &State<'_>) -> String + Send + Sync>;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// User supplied settings, applied on top of the dialect defaults.
#[derive(Clone, Default)]
pub struct DialectConfig {
    quoter: Option<Quoter>,
    caster: Option<Caster>,
    date_format: Option<SmolStr>,
    types: IndexMap<SmolStr, TypeDef>,
    operators: IndexMap<SmolStr, OperatorDef>,
    builders: IndexMap<BuilderKind, BuilderFn>,
    formatters: IndexMap<SmolStr, FormatterFn>,
    statements: IndexMap<SmolStr, StatementKind>,
}

impl DialectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quoter<F>(mut self, quoter: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.quoter = Some(Arc::new(quoter));
        self
    }

    pub fn caster<F>(mut self, caster: F) -> Self
    where
        F: Fn(&Dialect, &Value, &State<'_>) -> String + Send + Sync + 'static,
    {
        self.caster = Some(Arc::new(caster));
        self
    }

    pub fn date_format<T>(mut self, format: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.date_format = Some(format.into());
        self
    }

    pub fn type_def<T>(mut self, name: T, definition: TypeDef) -> Self
    where
        T: Into<SmolStr>,
    {
        self.types.insert(name.into(), definition);
        self
    }

    pub fn operator<T>(mut self, token: T, definition: OperatorDef) -> Self
    where
        T: Into<SmolStr>,
    {
        self.operators.insert(token.into(), definition);
        self
    }

    pub fn builder<F>(mut self, kind: BuilderKind, builder: F) -> Self
    where
        F: Fn(&str, Vec<String>) -> Result<String> + Send + Sync + 'static,
    {
        self.builders.insert(kind, Arc::new(builder));
        self
    }

    pub fn formatter<T, F>(mut self, name: T, formatter: F) -> Self
    where
        T: Into<SmolStr>,
        F: Fn(&Dialect, &Value, &State<'_>) -> Result<String> + Send + Sync + 'static,
    {
        self.formatters.insert(name.into(), Arc::new(formatter));
        self
    }

    pub fn statement<T>(mut self, name: T, kind: StatementKind) -> Self
    where
        T: Into<SmolStr>,
    {
        self.statements.insert(name.into(), kind);
        self
    }
}

impl fmt::Debug for DialectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectConfig")
            .field("quoter", &self.quoter.is_some())
            .field("caster", &self.caster.is_some())
            .field("date_format", &self.date_format)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("operators", &self.operators.keys().collect::<Vec<_>>())
            .field("builders", &self.builders.keys().collect::<Vec<_>>())
            .field("formatters", &self.formatters.keys().collect::<Vec<_>>())
            .field("statements", &self.statements)
            .finish()
    }
}

/// Per dialect data tables layered over the shared defaults.
pub(crate) struct Overlay {
    pub(crate) escape: char,
    pub(crate) operators: Vec<(&'static str, OperatorDef)>,
    pub(crate) types: Vec<(&'static str, TypeDef)>,
    pub(crate) maps: Vec<(&'static str, &'static str, Option<MapOptions>)>,
    pub(crate) meta: Vec<(MetaScope, &'static str, MetaDef)>,
    pub(crate) constraints: Vec<(&'static str, ConstraintDef)>,
    pub(crate) locks: Vec<(&'static str, &'static str)>,
    pub(crate) column: ColumnFn,
}

/// Everything needed to render SQL for one database flavor.
///
/// Built once from the shared defaults, the dialect overlay and an optional
/// [`DialectConfig`]. Share it behind an [`Arc`] to hand it to statements.
#[derive(Clone)]
pub struct Dialect {
    kind: DialectKind,
    escape: char,
    quoter: Option<Quoter>,
    caster: Option<Caster>,
    date_format: SmolStr,
    pub(crate) operators: IndexMap<SmolStr, OperatorDef>,
    pub(crate) builders: IndexMap<BuilderKind, BuilderFn>,
    pub(crate) formatters: IndexMap<SmolStr, FormatterFn>,
    pub(crate) types: IndexMap<SmolStr, TypeDef>,
    pub(crate) maps: IndexMap<SmolStr, Vec<(SmolStr, MapOptions)>>,
    pub(crate) meta: IndexMap<MetaScope, IndexMap<SmolStr, MetaDef>>,
    pub(crate) constraints: IndexMap<SmolStr, ConstraintDef>,
    pub(crate) locks: IndexMap<SmolStr, SmolStr>,
    pub(crate) statements: IndexMap<SmolStr, StatementKind>,
    pub(crate) column: ColumnFn,
}

impl Dialect {
    pub fn new(kind: DialectKind) -> Self {
        Self::with_config(kind, DialectConfig::default())
    }

    pub fn with_config(kind: DialectKind, config: DialectConfig) -> Self {
        let overlay = match kind {
            DialectKind::Generic => generic::overlay(),
            DialectKind::MySql => mysql::overlay(),
            DialectKind::Postgres => postgres::overlay(),
            DialectKind::Sqlite => sqlite::overlay(),
        };
        let mut dialect = Self::layered(kind, overlay);
        dialect.configure(config);
        tracing::debug!(?kind, "dialect configured");
        dialect
    }

    pub fn of<D: HasDialect>() -> Self {
        Self::new(D::DIALECT)
    }

    #[inline]
    pub fn generic() -> Self {
        Self::new(DialectKind::Generic)
    }

    #[inline]
    pub fn mysql() -> Self {
        Self::new(DialectKind::MySql)
    }

    #[inline]
    pub fn postgres() -> Self {
        Self::new(DialectKind::Postgres)
    }

    #[inline]
    pub fn sqlite() -> Self {
        Self::new(DialectKind::Sqlite)
    }

    fn layered(kind: DialectKind, overlay: Overlay) -> Self {
        let mut operators: IndexMap<SmolStr, OperatorDef> = operator::defaults()
            .into_iter()
            .map(|(token, def)| (SmolStr::new_static(token), def))
            .collect();
        for (token, def) in overlay.operators {
            operators.insert(SmolStr::new_static(token), def);
        }

        let mut constraints: IndexMap<SmolStr, ConstraintDef> = crate::constraint::defaults()
            .into_iter()
            .map(|(name, def)| (SmolStr::new_static(name), def))
            .collect();
        for (name, def) in overlay.constraints {
            constraints.insert(SmolStr::new_static(name), def);
        }

        let mut meta: IndexMap<MetaScope, IndexMap<SmolStr, MetaDef>> = IndexMap::new();
        for (scope, name, def) in overlay.meta {
            meta.entry(scope).or_default().insert(SmolStr::new_static(name), def);
        }

        let mut dialect = Self {
            kind,
            escape: overlay.escape,
            quoter: None,
            caster: None,
            date_format: SmolStr::new_static(DATE_FORMAT),
            operators,
            builders: operator::builders(),
            formatters: format::defaults(),
            types: overlay
                .types
                .into_iter()
                .map(|(name, def)| (SmolStr::new_static(name), def))
                .collect(),
            maps: IndexMap::new(),
            meta,
            constraints,
            locks: overlay
                .locks
                .into_iter()
                .map(|(mode, clause)| (SmolStr::new_static(mode), SmolStr::new_static(clause)))
                .collect(),
            statements: StatementKind::defaults()
                .into_iter()
                .map(|(name, kind)| (SmolStr::new_static(name), kind))
                .collect(),
            column: overlay.column,
        };
        for (native, logical, options) in overlay.maps {
            dialect.register_map(native, logical, options);
        }
        dialect
    }

    fn configure(&mut self, config: DialectConfig) {
        if config.quoter.is_some() {
            self.quoter = config.quoter;
        }
        if config.caster.is_some() {
            self.caster = config.caster;
        }
        if let Some(date_format) = config.date_format {
            self.date_format = date_format;
        }
        for (name, def) in config.types {
            self.register_type(name, def);
        }
        for (token, def) in config.operators {
            if self.operators.insert(token.clone(), def).is_some() {
                tracing::debug!(%token, "operator overridden");
            }
        }
        self.builders.extend(config.builders);
        self.formatters.extend(config.formatters);
        self.statements.extend(config.statements);
    }

    #[inline]
    pub fn kind(&self) -> DialectKind {
        self.kind
    }

    /// The identifier quote character.
    #[inline]
    pub fn escape_char(&self) -> char {
        self.escape
    }

    #[inline]
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    #[inline]
    pub(crate) fn quoter(&self) -> Option<&Quoter> {
        self.quoter.as_ref()
    }

    #[inline]
    pub(crate) fn caster(&self) -> Option<&Caster> {
        self.caster.as_ref()
    }

    /// The clause rendered for a row lock mode, e.g. `update` gives `FOR UPDATE`.
    pub fn lock_clause(&self, mode: &str) -> Result<&str> {
        self.locks
            .get(mode.to_lowercase().as_str())
            .map(SmolStr::as_str)
            .ok_or_else(|| SqlError::InvalidLockMode(mode.into()))
    }

    /// Builds a statement bound to this dialect from its registered name.
    pub fn statement(self: &Arc<Self>, name: &str) -> Result<Statement> {
        let kind = self
            .statements
            .get(name.to_lowercase().as_str())
            .copied()
            .ok_or_else(|| SqlError::UnsupportedStatementKind(name.into()))?;
        Ok(match kind {
            StatementKind::Select => Statement::Select(self.select()),
            StatementKind::Insert => Statement::Insert(self.insert()),
            StatementKind::Update => Statement::Update(self.update()),
            StatementKind::Delete => Statement::Delete(self.delete()),
            StatementKind::Truncate => Statement::Truncate(self.truncate()),
            StatementKind::CreateTable => Statement::CreateTable(self.create_table()),
            StatementKind::DropTable => Statement::DropTable(self.drop_table()),
        })
    }

    pub fn select(self: &Arc<Self>) -> Select {
        Select::new(Arc::clone(self))
    }

    pub fn insert(self: &Arc<Self>) -> Insert {
        Insert::new(Arc::clone(self))
    }

    pub fn update(self: &Arc<Self>) -> Update {
        Update::new(Arc::clone(self))
    }

    pub fn delete(self: &Arc<Self>) -> Delete {
        Delete::new(Arc::clone(self))
    }

    pub fn truncate(self: &Arc<Self>) -> Truncate {
        Truncate::new(Arc::clone(self))
    }

    pub fn create_table(self: &Arc<Self>) -> CreateTable {
        CreateTable::new(Arc::clone(self))
    }

    pub fn drop_table(self: &Arc<Self>) -> DropTable {
        DropTable::new(Arc::clone(self))
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::generic()
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("kind", &self.kind)
            .field("escape", &self.escape)
            .field("quoter", &self.quoter.is_some())
            .field("caster", &self.caster.is_some())
            .field("date_format", &self.date_format)
            .field("operators", &self.operators.len())
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("statements", &self.statements)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{column::Field, statement::ToSql};

    #[test]
    fn test_escape_char_per_kind() {
        assert_eq!('"', Dialect::generic().escape_char());
        assert_eq!('`', Dialect::mysql().escape_char());
        assert_eq!('"', Dialect::postgres().escape_char());
        assert_eq!('"', Dialect::sqlite().escape_char());
    }

    #[test]
    fn test_of_marker() {
        assert_eq!(DialectKind::MySql, Dialect::of::<MySql>().kind());
        assert_eq!(DialectKind::Sqlite, Dialect::of::<Sqlite>().kind());
    }

    #[test]
    fn test_integer_resolves_per_dialect() {
        assert_eq!("int", Dialect::mysql().type_def("integer").unwrap().native);
        assert_eq!("integer", Dialect::postgres().type_def("integer").unwrap().native);
        assert_eq!("integer", Dialect::sqlite().type_def("integer").unwrap().native);
    }

    #[test]
    fn test_user_types_win_over_overlay() {
        let config = DialectConfig::new().type_def("string", TypeDef::new("text"));
        let dialect = Dialect::with_config(DialectKind::MySql, config);
        let column = dialect.column(Field::new("title")).unwrap();
        assert_eq!("`title` text", column);
    }

    #[test]
    fn test_quoter_hook() {
        let config = DialectConfig::new().quoter(|value| format!("q({value})"));
        let dialect = Dialect::with_config(DialectKind::Postgres, config);
        assert_eq!("q(abc)", dialect.quote("abc"));
    }

    #[test]
    fn test_lock_clause() {
        assert_eq!("FOR UPDATE", Dialect::generic().lock_clause("update").unwrap());
        assert_eq!("LOCK IN SHARE MODE", Dialect::mysql().lock_clause("share").unwrap());
        assert_eq!("FOR NO KEY UPDATE", Dialect::postgres().lock_clause("no key update").unwrap());
        assert!(matches!(
            Dialect::sqlite().lock_clause("update"),
            Err(SqlError::InvalidLockMode(_))
        ));
    }

    #[test]
    fn test_statement_factory() {
        let dialect = Arc::new(Dialect::postgres());
        let statement = dialect.statement("drop table").unwrap();
        assert_eq!(StatementKind::DropTable, statement.kind());
        let error = dialect.statement("merge").unwrap_err();
        assert_eq!(SqlError::UnsupportedStatementKind("merge".into()), error);
    }

    #[test]
    fn test_statement_alias_registration() {
        let config = DialectConfig::new().statement("remove", StatementKind::Delete);
        let dialect = Arc::new(Dialect::with_config(DialectKind::Generic, config));
        let Statement::Delete(mut delete) = dialect.statement("remove").unwrap() else {
            panic!("expected a delete statement");
        };
        delete.from("table");
        assert_eq!("DELETE FROM \"table\"", delete.to_sql().unwrap());
    }
}
