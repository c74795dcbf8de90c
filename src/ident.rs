use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    cond::ConditionOptions,
    dialect::Dialect,
    error::Result,
    value::{Key, Tree, Value},
};

/// Qualifier aliases: `alias => real qualifier`.
pub type Aliases = IndexMap<SmolStr, SmolStr>;

/// Splits an identifier on its last dot.
///
/// `"a.b.c"` gives `(Some("a.b"), "c")`, `"c"` gives `(None, "c")`.
pub fn undot(name: &str) -> (Option<&str>, &str) {
    match name.rfind('.') {
        Some(index) => (Some(&name[..index]), &name[index + 1..]),
        None => (None, name),
    }
}

/// Wraps `part` in `quote`, doubling embedded quotes. `*` passes through.
pub(crate) fn escape_ident(quote: char, part: &str) -> String {
    if part == "*" {
        return String::from("*");
    }

    let mut out = String::with_capacity(part.len() + 2);
    out.push(quote);
    for c in part.chars() {
        if c == quote {
            out.push(quote);
        }
        out.push(c);
    }
    out.push(quote);
    out
}

impl Dialect {
    pub fn escape(&self, name: &str) -> String {
        escape_ident(self.escape_char(), name)
    }

    pub fn undot<'a>(&self, name: &'a str) -> (Option<&'a str>, &'a str) {
        undot(name)
    }

    /// Escapes an identifier, `qualifier.field` rendering as two escaped parts.
    pub fn name(&self, name: &str) -> String {
        self.qualified_name(name, None)
    }

    /// Like [`Dialect::name`], resolving the qualifier through `aliases` first.
    pub fn aliased_name(&self, name: &str, aliases: &Aliases) -> String {
        self.qualified_name(name, Some(aliases))
    }

    pub(crate) fn qualified_name(&self, name: &str, aliases: Option<&Aliases>) -> String {
        match undot(name) {
            (Some(qualifier), field) if !qualifier.is_empty() => {
                let qualifier = aliases
                    .and_then(|aliases| aliases.get(qualifier))
                    .map_or(qualifier, SmolStr::as_str);
                format!("{}.{}", self.escape(qualifier), self.escape(field))
            }
            _ => self.escape(name),
        }
    }

    /// Escapes and joins a name, a list of names or a nested name tree.
    ///
    /// Named entries render as `key AS value`, or prefix their nested list
    /// with the escaped key. Duplicates are dropped.
    pub fn names<V>(&self, names: V) -> Result<String>
    where
        V: Into<Value>,
    {
        self.qualified_names(&names.into(), None)
    }

    pub fn aliased_names(&self, names: &Value, aliases: &Aliases) -> Result<String> {
        self.qualified_names(names, Some(aliases))
    }

    pub(crate) fn qualified_names(&self, names: &Value, aliases: Option<&Aliases>) -> Result<String> {
        match names {
            Value::Tree(tree) => self.tree_names(tree, aliases),
            other => self.tree_names(&Tree::from_iter([other.clone()]), aliases),
        }
    }

    pub(crate) fn tree_names(&self, names: &Tree, aliases: Option<&Aliases>) -> Result<String> {
        let mut escaped = IndexMap::new();
        self.escapes(names, None, aliases, &mut escaped)?;
        Ok(escaped.into_values().collect::<Vec<_>>().join(", "))
    }

    fn escapes(
        &self,
        names: &Tree,
        prefix: Option<&str>,
        aliases: Option<&Aliases>,
        escaped: &mut IndexMap<Key, String>,
    ) -> Result<()> {
        for (key, value) in names.iter() {
            if let Some(token) = key.as_name().filter(|token| self.is_operator(token)) {
                let mut fragment = Tree::new();
                fragment.insert(token, value.clone());
                let options = ConditionOptions::default().with_aliases(aliases.cloned().unwrap_or_default());
                let sql = self.conditions(&fragment, &options)?;
                push_positional(escaped, sql);
                continue;
            }

            match value {
                Value::String(name) => {
                    let mut sql = match key.as_name() {
                        Some(field) => {
                            let field_name = self.qualified_name(field, aliases);
                            let alias = self.qualified_name(name, aliases);
                            if field_name == alias {
                                field_name
                            } else {
                                format!("{field_name} AS {alias}")
                            }
                        }
                        None => self.qualified_name(name, aliases),
                    };
                    if let Some(prefix) = prefix {
                        sql = format!("{prefix}.{sql}");
                    }
                    escaped.insert(Key::Name(SmolStr::new(&sql)), sql);
                }
                Value::Tree(tree) => {
                    let nested = key.as_name().map(|table| self.escape(table));
                    self.escapes(tree, nested.as_deref().or(prefix), aliases, escaped)?;
                }
                Value::Null => {}
                other => push_positional(escaped, self.plain(other)?),
            }
        }
        Ok(())
    }
}

fn push_positional(escaped: &mut IndexMap<Key, String>, sql: String) {
    let index = escaped.len();
    escaped.insert(Key::Index(index), sql);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{list, tree};

    #[test]
    fn test_names_skip_null() {
        let dialect = Dialect::postgres();
        assert_eq!("\"id\", \"name\"", dialect.names(list!["id", Value::Null, "name"]).unwrap());
        assert_eq!("\"id\"", dialect.names(list!["id", Value::Null]).unwrap());
        assert_eq!("", dialect.names(Value::Null).unwrap());
    }

    #[test]
    fn test_undot() {
        assert_eq!((Some("a.b"), "c"), undot("a.b.c"));
        assert_eq!((Some("users"), "id"), undot("users.id"));
        assert_eq!((None, "id"), undot("id"));
    }

    #[test]
    fn test_escape() {
        assert_eq!("\"users\"", Dialect::postgres().escape("users"));
        assert_eq!("`users`", Dialect::mysql().escape("users"));
        assert_eq!("*", Dialect::mysql().escape("*"));
        assert_eq!("\"an sql table\"", Dialect::postgres().escape("an sql table"));
    }

    #[test]
    fn test_escape_quote() {
        assert_eq!("\"us\"\"ers\"", Dialect::postgres().escape("us\"ers"));
        assert_eq!("\"us`ers\"", Dialect::postgres().escape("us`ers"));
        assert_eq!("`us``ers`", Dialect::mysql().escape("us`ers"));
    }

    #[test]
    fn test_escape_applies_quote_once() {
        let escaped = Dialect::generic().escape("field");
        assert_eq!(2, escaped.matches('"').count());
    }

    #[test]
    fn test_name() {
        let dialect = Dialect::generic();
        assert_eq!("\"field\"", dialect.name("field"));
        assert_eq!("\"table\".\"field\"", dialect.name("table.field"));
        assert_eq!("\"table\".*", dialect.name("table.*"));
        assert_eq!("\"schema.table\".\"field\"", dialect.name("schema.table.field"));
    }

    #[test]
    fn test_aliased_name() {
        let dialect = Dialect::mysql();
        let mut aliases = Aliases::new();
        aliases.insert("u".into(), "users".into());
        assert_eq!("`users`.`id`", dialect.aliased_name("u.id", &aliases));
        assert_eq!("`p`.`id`", dialect.aliased_name("p.id", &aliases));
        assert_eq!("`id`", dialect.aliased_name("id", &aliases));
    }

    #[test]
    fn test_names() {
        let dialect = Dialect::generic();
        assert_eq!("\"a\"", dialect.names("a").unwrap());
        assert_eq!("\"a\", \"b\".\"c\"", dialect.names(list!["a", "b.c"]).unwrap());
    }

    #[test]
    fn test_names_dedup() {
        let dialect = Dialect::generic();
        assert_eq!("\"a\", \"b\"", dialect.names(list!["a", "b", "a"]).unwrap());
    }

    #[test]
    fn test_names_alias_and_prefix() {
        let dialect = Dialect::generic();
        let names = tree! {"id" => "key", "name" => "name", "posts" => list!["title", "body"]};
        assert_eq!(
            "\"id\" AS \"key\", \"name\", \"posts\".\"title\", \"posts\".\"body\"",
            dialect.names(names).unwrap()
        );
    }

    #[test]
    fn test_names_with_operator() {
        let dialect = Dialect::generic();
        let names = tree! {0usize => "id", ":plain" => "COUNT(*)"};
        assert_eq!("\"id\", COUNT(*)", dialect.names(names).unwrap());
    }

    #[test]
    fn test_names_scalar_passthrough() {
        let dialect = Dialect::generic();
        assert_eq!("\"a\", 1", dialect.names(list!["a", 1]).unwrap());
    }
}
