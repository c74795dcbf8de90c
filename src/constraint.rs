use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use smol_str::SmolStr;

use crate::{
    cond::{ConditionOptions, State},
    dialect::Dialect,
    error::{Result, SqlError},
    value::{Tree, Value},
};

/// Column or table level metadata, e.g. `charset => "utf8mb4"`.
pub type Meta = IndexMap<SmolStr, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaScope {
    Column,
    Table,
}

/// How one metadata attribute renders: `{keyword}{join}{value}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaDef {
    pub keyword: SmolStr,
    /// Quote the value as a literal.
    pub escape: bool,
    pub join: SmolStr,
    /// Accepted values, anything else is skipped.
    pub options: Option<Vec<SmolStr>>,
}

impl MetaDef {
    pub fn new<T>(keyword: T) -> Self
    where
        T: Into<SmolStr>,
    {
        Self {
            keyword: keyword.into(),
            escape: false,
            join: SmolStr::new_static(" "),
            options: None,
        }
    }

    pub fn escaped(mut self) -> Self {
        self.escape = true;
        self
    }

    pub fn join<T>(mut self, join: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.join = join.into();
        self
    }

    pub fn options<I, T>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SmolStr>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }
}

/// A constraint template with its `{:placeholder}` slots, plus the keywords
/// the `index`/`key` flags expand to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintDef {
    pub template: SmolStr,
    pub keywords: IndexMap<SmolStr, SmolStr>,
}

impl ConstraintDef {
    pub fn new<T>(template: T) -> Self
    where
        T: Into<SmolStr>,
    {
        Self {
            template: template.into(),
            keywords: IndexMap::new(),
        }
    }

    pub fn keyword<F, K>(mut self, flag: F, keyword: K) -> Self
    where
        F: Into<SmolStr>,
        K: Into<SmolStr>,
    {
        self.keywords.insert(flag.into(), keyword.into());
        self
    }
}

pub(crate) fn defaults() -> [(&'static str, ConstraintDef); 4] {
    [
        ("primary", ConstraintDef::new("PRIMARY KEY ({:column})")),
        (
            "foreign key",
            ConstraintDef::new("FOREIGN KEY ({:foreignKey}) REFERENCES {:to} ({:primaryKey}) {:on}"),
        ),
        ("unique", ConstraintDef::new("CONSTRAINT {:name} UNIQUE {:index} ({:column})")),
        ("check", ConstraintDef::new("{:constraint} CHECK ({:expr})")),
    ]
}

/// A table constraint descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraint {
    /// Template name: `primary`, `unique`, `foreign key`, `check`...
    pub kind: Option<SmolStr>,
    pub name: Option<SmolStr>,
    pub column: Vec<SmolStr>,
    pub foreign_key: Vec<SmolStr>,
    pub primary_key: Vec<SmolStr>,
    pub to: Option<SmolStr>,
    pub on: Option<SmolStr>,
    pub expr: Option<Tree>,
    pub index: bool,
    pub key: bool,
}

fn names<I, T>(names: I) -> Vec<SmolStr>
where
    I: IntoIterator<Item = T>,
    T: Into<SmolStr>,
{
    names.into_iter().map(Into::into).collect()
}

impl Constraint {
    pub fn new<T>(kind: T) -> Self
    where
        T: Into<SmolStr>,
    {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    pub fn primary<I, T>(columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SmolStr>,
    {
        Self::new("primary").column(columns)
    }

    pub fn unique<I, T>(columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SmolStr>,
    {
        Self::new("unique").column(columns)
    }

    pub fn check(expr: Tree) -> Self {
        Self::new("check").expr(expr)
    }

    pub fn foreign_key<I, T>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SmolStr>,
    {
        self.foreign_key = names(columns);
        if self.kind.is_none() {
            self.kind = Some(SmolStr::new_static("foreign key"));
        }
        self
    }

    pub fn name<T>(mut self, name: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.name = Some(name.into());
        self
    }

    pub fn column<I, T>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SmolStr>,
    {
        self.column = names(columns);
        self
    }

    pub fn primary_key<I, T>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SmolStr>,
    {
        self.primary_key = names(columns);
        self
    }

    pub fn to<T>(mut self, table: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.to = Some(table.into());
        self
    }

    pub fn on<T>(mut self, clause: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.on = Some(clause.into());
        self
    }

    pub fn expr(mut self, expr: Tree) -> Self {
        self.expr = Some(expr);
        self
    }

    pub fn index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    pub fn key(mut self, key: bool) -> Self {
        self.key = key;
        self
    }
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{:(\w+)\}").expect("valid placeholder regex"))
}

/// Slots a constraint template may use.
const PLACEHOLDERS: [&str; 9] = [
    "index",
    "to",
    "on",
    "constraint",
    "name",
    "expr",
    "column",
    "primaryKey",
    "foreignKey",
];

/// Substitutes `{:key}` slots. Empty or missing slots vanish with one
/// adjacent space, slots outside [`PLACEHOLDERS`] make the template invalid.
fn insert(kind: &str, template: &str, data: &IndexMap<&'static str, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for captures in placeholder().captures_iter(template) {
        let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if !PLACEHOLDERS.contains(&key.as_str()) {
            tracing::debug!(kind, placeholder = key.as_str(), "unknown constraint placeholder");
            return Err(SqlError::InvalidConstraintTemplate(kind.into()));
        }
        out.push_str(&template[last..whole.start()]);
        last = whole.end();
        match data.get(key.as_str()) {
            Some(value) if !value.is_empty() => out.push_str(value),
            _ => {
                if out.ends_with(' ') {
                    out.pop();
                } else if template[last..].starts_with(' ') {
                    last += 1;
                }
            }
        }
    }
    out.push_str(&template[last..]);
    Ok(out.trim().to_string())
}

impl Dialect {
    /// Renders metadata attributes, optionally restricted to `names`.
    pub fn meta(&self, scope: MetaScope, data: &Meta, names: Option<&[&str]>) -> Result<String> {
        let names: Vec<&str> = match names {
            Some(names) => names.to_vec(),
            None => data.keys().map(SmolStr::as_str).collect(),
        };
        let mut result = Vec::new();
        for name in names {
            let Some(value) = data.get(name).filter(|value| value.is_truthy()) else {
                continue;
            };
            let Some(def) = self.meta.get(&scope).and_then(|defs| defs.get(name)) else {
                continue;
            };
            let plain = self.plain(value)?;
            if let Some(options) = &def.options
                && !options.iter().any(|option| *option == plain)
            {
                continue;
            }
            let rendered = if def.escape {
                self.value(value, &State::new())?
            } else {
                plain
            };
            result.push(format!("{}{}{}", def.keyword, def.join, rendered));
        }
        Ok(result.join(" "))
    }

    /// Renders a table constraint through the template registered as `kind`.
    pub fn constraint(&self, kind: &str, constraint: &Constraint, options: &ConditionOptions) -> Result<String> {
        let def = self
            .constraints
            .get(kind)
            .ok_or_else(|| SqlError::InvalidConstraintTemplate(kind.into()))?;

        let list = |names: &[SmolStr]| {
            names
                .iter()
                .map(|name| self.name(name))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut data: IndexMap<&'static str, String> = IndexMap::new();
        let flag = if constraint.key {
            def.keywords.get("key")
        } else if constraint.index {
            def.keywords.get("index")
        } else {
            None
        };
        if let Some(keyword) = flag {
            data.insert("index", keyword.to_string());
        }
        if let Some(to) = &constraint.to {
            data.insert("to", self.name(to));
        }
        if let Some(on) = &constraint.on {
            data.insert("on", format!("ON {on}"));
        }
        if let Some(name) = &constraint.name {
            data.insert("constraint", format!("CONSTRAINT {}", self.name(name)));
            data.insert("name", self.name(name));
        } else if !constraint.column.is_empty() {
            let joined = constraint
                .column
                .iter()
                .map(SmolStr::as_str)
                .collect::<Vec<_>>()
                .join("_");
            data.insert("name", self.escape(&joined));
        }
        if let Some(expr) = &constraint.expr {
            data.insert("expr", self.conditions(expr, options)?);
        }
        data.insert("column", list(&constraint.column));
        data.insert("primaryKey", list(&constraint.primary_key));
        data.insert("foreignKey", list(&constraint.foreign_key));

        insert(kind, &def.template, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    #[test]
    fn test_insert_cleans_missing() {
        let mut data = IndexMap::new();
        data.insert("column", String::from("\"a\""));
        assert_eq!("UNIQUE (\"a\")", insert("unique", "UNIQUE {:index} ({:column})", &data).unwrap());
        assert_eq!("CHECK ()", insert("check", "{:constraint} CHECK ({:expr})", &data).unwrap());
        assert_eq!(
            "REFERENCES (\"a\")",
            insert("foreign key", "REFERENCES ({:column}) {:on}", &data).unwrap()
        );
    }

    #[test]
    fn test_unknown_placeholder() {
        let mut dialect = Dialect::postgres();
        dialect
            .constraints
            .insert("exclude".into(), ConstraintDef::new("EXCLUDE USING {:foo} ({:column})"));
        let error = dialect
            .constraint("exclude", &Constraint::new("exclude").column(["id"]), &ConditionOptions::default())
            .unwrap_err();
        assert_eq!(SqlError::InvalidConstraintTemplate("exclude".into()), error);
    }

    #[test]
    fn test_meta() {
        let dialect = Dialect::mysql();
        let mut data = Meta::new();
        data.insert("charset".into(), "utf8".into());
        data.insert("collate".into(), "utf8_bin".into());
        data.insert("comment".into(), "the title".into());
        data.insert("unknown".into(), "x".into());
        assert_eq!(
            "CHARACTER SET utf8 COLLATE utf8_bin COMMENT 'the title'",
            dialect.meta(MetaScope::Column, &data, None).unwrap()
        );
        assert_eq!(
            "COMMENT 'the title'",
            dialect.meta(MetaScope::Column, &data, Some(&["comment"])).unwrap()
        );
        assert_eq!(
            "DEFAULT CHARSET utf8 COLLATE utf8_bin",
            dialect.meta(MetaScope::Table, &data, None).unwrap()
        );
    }

    #[test]
    fn test_meta_skips_empty_values() {
        let dialect = Dialect::mysql();
        let mut data = Meta::new();
        data.insert("charset".into(), "".into());
        data.insert("engine".into(), Value::Null);
        assert_eq!("", dialect.meta(MetaScope::Table, &data, None).unwrap());
    }

    #[test]
    fn test_meta_options() {
        let mut dialect = Dialect::mysql();
        dialect
            .meta
            .entry(MetaScope::Table)
            .or_default()
            .insert("engine".into(), MetaDef::new("ENGINE").join("=").options(["InnoDB", "MyISAM"]));
        let mut data = Meta::new();
        data.insert("engine".into(), "InnoDB".into());
        assert_eq!("ENGINE=InnoDB", dialect.meta(MetaScope::Table, &data, None).unwrap());
        data.insert("engine".into(), "Memory".into());
        assert_eq!("", dialect.meta(MetaScope::Table, &data, None).unwrap());
    }

    #[test]
    fn test_primary() {
        let dialect = Dialect::postgres();
        let constraint = Constraint::primary(["id"]);
        assert_eq!(
            "PRIMARY KEY (\"id\")",
            dialect.constraint("primary", &constraint, &ConditionOptions::default()).unwrap()
        );
    }

    #[test]
    fn test_foreign_key() {
        let dialect = Dialect::mysql();
        let constraint = Constraint::default()
            .foreign_key(["table_id"])
            .to("table")
            .primary_key(["id"])
            .on("DELETE CASCADE");
        assert_eq!(
            "FOREIGN KEY (`table_id`) REFERENCES `table` (`id`) ON DELETE CASCADE",
            dialect.constraint("foreign key", &constraint, &ConditionOptions::default()).unwrap()
        );
        let constraint = Constraint::default().foreign_key(["table_id"]).to("table").primary_key(["id"]);
        assert_eq!(
            "FOREIGN KEY (`table_id`) REFERENCES `table` (`id`)",
            dialect.constraint("foreign key", &constraint, &ConditionOptions::default()).unwrap()
        );
    }

    #[test]
    fn test_unique_mysql() {
        let dialect = Dialect::mysql();
        let options = ConditionOptions::default();
        let constraint = Constraint::unique(["firstname", "lastname"]).index(true).key(true);
        assert_eq!(
            "UNIQUE KEY `firstname_lastname` (`firstname`, `lastname`)",
            dialect.constraint("unique", &constraint, &options).unwrap()
        );
        let constraint = Constraint::unique(["email"]).index(true);
        assert_eq!(
            "UNIQUE INDEX `email` (`email`)",
            dialect.constraint("unique", &constraint, &options).unwrap()
        );
        let constraint = Constraint::unique(["email"]);
        assert_eq!("UNIQUE `email` (`email`)", dialect.constraint("unique", &constraint, &options).unwrap());
    }

    #[test]
    fn test_unique_postgres() {
        let dialect = Dialect::postgres();
        let constraint = Constraint::unique(["firstname", "lastname"]).index(true);
        assert_eq!(
            "CONSTRAINT \"firstname_lastname\" UNIQUE (\"firstname\", \"lastname\")",
            dialect.constraint("unique", &constraint, &ConditionOptions::default()).unwrap()
        );
    }

    #[test]
    fn test_check() {
        let dialect = Dialect::postgres();
        let constraint = Constraint::check(tree! {"population" => tree! {">" => 20}}).name("population");
        assert_eq!(
            "CONSTRAINT \"population\" CHECK (\"population\" > 20)",
            dialect.constraint("check", &constraint, &ConditionOptions::default()).unwrap()
        );
        let constraint = Constraint::check(tree! {"population" => tree! {">" => 20}});
        assert_eq!(
            "CHECK (\"population\" > 20)",
            dialect.constraint("check", &constraint, &ConditionOptions::default()).unwrap()
        );
    }

    #[test]
    fn test_invalid_template() {
        let dialect = Dialect::postgres();
        let error = dialect
            .constraint("index", &Constraint::new("index"), &ConditionOptions::default())
            .unwrap_err();
        assert_eq!(SqlError::InvalidConstraintTemplate("index".into()), error);
    }
}
