use std::{fmt, sync::{Arc, OnceLock}};

use indexmap::IndexMap;
use regex::Regex;
use smol_str::SmolStr;

use crate::{
    dialect::Dialect,
    error::{Result, SqlError},
    value::{Key, Tree, Value},
};

/// Generates `&mut self` setters toggling a statement flag.
macro_rules! flags {
    ($( $(#[$meta:meta])* $name:ident => $flag:literal ),+ $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self, enable: bool) -> &mut Self {
                self.flags.set($flag, enable);
                self
            }
        )+
    };
}

mod create_table;
mod delete;
mod drop_table;
mod insert;
mod select;
mod truncate;
mod update;

pub use create_table::CreateTable;
pub use delete::Delete;
pub use drop_table::DropTable;
pub use insert::Insert;
pub use select::{Join, Select};
pub use truncate::Truncate;
pub use update::Update;

/// Anything rendering to a SQL string.
pub trait ToSql: fmt::Debug + Send + Sync {
    fn to_sql(&self) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Truncate,
    CreateTable,
    DropTable,
}

impl StatementKind {
    pub(crate) fn defaults() -> [(&'static str, Self); 7] {
        [
            ("select", Self::Select),
            ("insert", Self::Insert),
            ("update", Self::Update),
            ("delete", Self::Delete),
            ("truncate", Self::Truncate),
            ("create table", Self::CreateTable),
            ("drop table", Self::DropTable),
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::CreateTable => "CREATE TABLE",
            Self::DropTable => "DROP TABLE",
        }
    }
}

/// A statement produced by [`Dialect::statement`].
#[derive(Debug, Clone)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Truncate(Truncate),
    CreateTable(CreateTable),
    DropTable(DropTable),
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Self::Select(_) => StatementKind::Select,
            Self::Insert(_) => StatementKind::Insert,
            Self::Update(_) => StatementKind::Update,
            Self::Delete(_) => StatementKind::Delete,
            Self::Truncate(_) => StatementKind::Truncate,
            Self::CreateTable(_) => StatementKind::CreateTable,
            Self::DropTable(_) => StatementKind::DropTable,
        }
    }

    pub fn into_select(self) -> Option<Select> {
        match self {
            Self::Select(select) => Some(select),
            _ => None,
        }
    }

    pub fn into_insert(self) -> Option<Insert> {
        match self {
            Self::Insert(insert) => Some(insert),
            _ => None,
        }
    }

    pub fn into_update(self) -> Option<Update> {
        match self {
            Self::Update(update) => Some(update),
            _ => None,
        }
    }

    pub fn into_delete(self) -> Option<Delete> {
        match self {
            Self::Delete(delete) => Some(delete),
            _ => None,
        }
    }

    pub fn into_create_table(self) -> Option<CreateTable> {
        match self {
            Self::CreateTable(create) => Some(create),
            _ => None,
        }
    }
}

impl ToSql for Statement {
    fn to_sql(&self) -> Result<String> {
        match self {
            Self::Select(statement) => statement.to_sql(),
            Self::Insert(statement) => statement.to_sql(),
            Self::Update(statement) => statement.to_sql(),
            Self::Delete(statement) => statement.to_sql(),
            Self::Truncate(statement) => statement.to_sql(),
            Self::CreateTable(statement) => statement.to_sql(),
            Self::DropTable(statement) => statement.to_sql(),
        }
    }
}

macro_rules! statement_value {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(statement: $ty) -> Self {
                    Value::statement(statement)
                }
            }
        )+
    };
}

statement_value!(Select, Insert, Update, Delete, Truncate, CreateTable, DropTable, Statement);

pub(crate) fn bound(dialect: &Option<Arc<Dialect>>) -> Result<&Dialect> {
    dialect.as_deref().ok_or(SqlError::MissingDialect)
}

/// ` NAME expr`, nothing when `expr` is empty.
pub(crate) fn clause(name: &str, expression: &str) -> String {
    if expression.is_empty() {
        String::new()
    } else {
        format!(" {name} {expression}")
    }
}

/// ` FLAG` when enabled.
pub(crate) fn flag(name: &str, enabled: bool) -> String {
    if enabled { format!(" {name}") } else { String::new() }
}

/// Appends entries to a statement list, a tree being merged entry by entry.
pub(crate) fn extend(list: &mut Tree, values: Value) {
    match values {
        Value::Null => {}
        Value::Tree(tree) => {
            list.append(tree);
        }
        other => {
            list.push(other);
        }
    }
}

/// Keyword flags rendered in insertion order, e.g. `DISTINCT`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Flags(IndexMap<SmolStr, bool>);

impl Flags {
    pub(crate) fn set(&mut self, flag: &'static str, enable: bool) {
        self.0.insert(SmolStr::new_static(flag), enable);
    }

    pub(crate) fn get(&self, flag: &str) -> Option<bool> {
        self.0.get(flag).copied()
    }

    pub(crate) fn to_sql(&self) -> String {
        self.0
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(flag, _)| format!(" {flag}"))
            .collect()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    #[default]
    Asc,
    Desc,
}

impl Ordering {
    /// `desc` in any case gives [`Ordering::Desc`], anything else ascends.
    pub fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

fn direction() -> &'static Regex {
    static DIRECTION: OnceLock<Regex> = OnceLock::new();
    DIRECTION.get_or_init(|| Regex::new(r"(?i)^(.*?)\s+((?:a|de)sc)$").expect("valid direction regex"))
}

/// `ORDER BY` columns.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Order(IndexMap<SmolStr, Ordering>);

impl Order {
    /// Accepts `"field DESC"`, lists of those, or `field => direction` entries.
    pub(crate) fn push(&mut self, fields: Value) {
        match fields {
            Value::String(field) => self.push_field(&field),
            Value::Tree(tree) => {
                for (key, value) in tree.iter() {
                    match (key, value) {
                        (Key::Name(field), direction) => {
                            let direction = direction.as_str().map_or(Ordering::Asc, Ordering::parse);
                            self.0.insert(field.clone(), direction);
                        }
                        (Key::Index(_), Value::String(field)) => self.push_field(field),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn push_field(&mut self, field: &str) {
        if field.is_empty() {
            return;
        }
        match direction().captures(field) {
            Some(captures) => {
                let name = captures.get(1).map_or(field, |m| m.as_str());
                let direction = captures.get(2).map_or(Ordering::Asc, |m| Ordering::parse(m.as_str()));
                self.0.insert(SmolStr::new(name), direction);
            }
            None => {
                self.0.insert(SmolStr::new(field), Ordering::Asc);
            }
        }
    }

    pub(crate) fn to_sql(&self, dialect: &Dialect) -> String {
        let columns = self
            .0
            .iter()
            .map(|(column, ordering)| format!("{} {}", dialect.name(column), ordering.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        clause("ORDER BY", &columns)
    }
}

/// `LIMIT n [OFFSET m]`, a zero limit meaning none.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Limit {
    maybe_limit: Option<usize>,
    maybe_offset: Option<usize>,
}

impl Limit {
    pub(crate) fn set(&mut self, limit: usize, offset: usize) {
        if limit == 0 {
            return;
        }
        self.maybe_limit = Some(limit);
        self.maybe_offset = (offset > 0).then_some(offset);
    }

    pub(crate) fn to_sql(&self) -> String {
        match (self.maybe_limit, self.maybe_offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{list, tree};

    #[test]
    fn test_flags() {
        let mut flags = Flags::default();
        flags.set("LOW_PRIORITY", true);
        flags.set("IGNORE", true);
        flags.set("QUICK", false);
        assert_eq!(" LOW_PRIORITY IGNORE", flags.to_sql());
        assert_eq!(Some(false), flags.get("QUICK"));
        assert_eq!(None, flags.get("DELAYED"));
    }

    #[test]
    fn test_order() {
        let dialect = Dialect::generic();
        let mut order = Order::default();
        order.push("field DESC".into());
        order.push(list!["other", "third asc"].into());
        order.push(tree! {"last" => "desc"}.into());
        assert_eq!(
            " ORDER BY \"field\" DESC, \"other\" ASC, \"third\" ASC, \"last\" DESC",
            order.to_sql(&dialect)
        );
    }

    #[test]
    fn test_order_ignores_empty() {
        let mut order = Order::default();
        order.push("".into());
        order.push(Value::Null);
        assert_eq!("", order.to_sql(&Dialect::generic()));
    }

    #[test]
    fn test_limit() {
        let mut limit = Limit::default();
        assert_eq!("", limit.to_sql());
        limit.set(0, 10);
        assert_eq!("", limit.to_sql());
        limit.set(50, 0);
        assert_eq!(" LIMIT 50", limit.to_sql());
        limit.set(50, 10);
        assert_eq!(" LIMIT 50 OFFSET 10", limit.to_sql());
    }

    #[test]
    fn test_clause() {
        assert_eq!(" WHERE TRUE", clause("WHERE", "TRUE"));
        assert_eq!("", clause("WHERE", ""));
    }

    #[test]
    fn test_statement_kind() {
        let dialect = Arc::new(Dialect::mysql());
        for (name, kind) in StatementKind::defaults() {
            assert_eq!(kind, dialect.statement(name).unwrap().kind());
        }
        assert_eq!("CREATE TABLE", StatementKind::CreateTable.as_str());
    }

    #[test]
    fn test_unbound_statement() {
        assert_eq!(Err(SqlError::MissingDialect), Select::default().to_sql());
    }
}
