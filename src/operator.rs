use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    dialect::Dialect,
    error::{Result, SqlError},
};

/// Rendering strategy for an operator's operand list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderKind {
    /// `a OP b OP c`
    Infix,
    /// `OP a`
    Prefix,
    /// `key OP (a, b, c)`
    List,
    /// `key OP lo AND hi`
    Between,
    /// `a OP b`, operands being whole statements
    Set,
    /// `(expr) OP alias`
    Alias,
    /// `NAME(a, b)`
    Function,
}

pub type BuilderFn = Arc<dyn Fn(&str, Vec<String>) -> Result<String> + Send + Sync>;

/// Registry entry for one operator token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorDef {
    /// Token substituted when the second operand renders as `NULL`.
    pub null: Option<SmolStr>,
    pub builder: Option<BuilderKind>,
    /// Template whose `%s` slots receive the operands in order.
    pub format: Option<SmolStr>,
    /// Text rendered instead of the token itself.
    pub name: Option<SmolStr>,
}

impl OperatorDef {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn null<T>(mut self, token: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.null = Some(token.into());
        self
    }

    pub fn builder(mut self, kind: BuilderKind) -> Self {
        self.builder = Some(kind);
        self
    }

    pub fn format<T>(mut self, template: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.format = Some(template.into());
        self
    }

    pub fn name<T>(mut self, name: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.name = Some(name.into());
        self
    }
}

pub(crate) fn plain() -> OperatorDef {
    OperatorDef::new()
}

pub(crate) fn with(kind: BuilderKind) -> OperatorDef {
    OperatorDef::new().builder(kind)
}

pub(crate) fn format(template: &'static str) -> OperatorDef {
    OperatorDef::new().format(SmolStr::new_static(template))
}

pub(crate) fn defaults() -> Vec<(&'static str, OperatorDef)> {
    use BuilderKind::*;
    vec![
        ("=", plain().null(":is")),
        ("<=>", plain()),
        ("<", plain()),
        (">", plain()),
        ("<=", plain()),
        (">=", plain()),
        ("!=", plain().null(":is not")),
        ("<>", plain()),
        ("-", plain()),
        ("+", plain()),
        ("*", plain()),
        ("/", plain()),
        ("%", plain()),
        (">>", plain()),
        ("<<", plain()),
        (":=", plain()),
        ("&", plain()),
        ("|", plain()),
        (":mod", plain()),
        (":div", plain()),
        (":like", plain()),
        (":not like", plain()),
        (":is", plain()),
        (":is not", plain()),
        ("~", with(Prefix)),
        (":not", with(Prefix)),
        (":distinct", with(Prefix)),
        (":between", with(Between)),
        (":not between", with(Between)),
        (":in", with(List)),
        (":not in", with(List)),
        (":exists", format("EXISTS (%s)")),
        (":not exists", format("NOT EXISTS (%s)")),
        (":all", format("ALL (%s)")),
        (":any", format("ANY (%s)")),
        (":some", format("SOME (%s)")),
        (":as", with(Alias)),
        (":and", plain()),
        (":or", plain()),
        (":xor", plain()),
        ("()", with(Function).name("")),
    ]
}

pub(crate) fn builders() -> IndexMap<BuilderKind, BuilderFn> {
    let mut builders: IndexMap<BuilderKind, BuilderFn> = IndexMap::new();
    builders.insert(BuilderKind::Infix, Arc::new(infix));
    builders.insert(BuilderKind::Prefix, Arc::new(prefix));
    builders.insert(BuilderKind::List, Arc::new(list));
    builders.insert(BuilderKind::Between, Arc::new(between));
    builders.insert(BuilderKind::Set, Arc::new(infix));
    builders.insert(BuilderKind::Alias, Arc::new(alias));
    builders.insert(BuilderKind::Function, Arc::new(function));
    builders
}

fn infix(operator: &str, parts: Vec<String>) -> Result<String> {
    Ok(parts.join(&format!(" {operator} ")))
}

fn prefix(operator: &str, parts: Vec<String>) -> Result<String> {
    match parts.first() {
        Some(operand) => Ok(format!("{operator} {operand}")),
        None => Err(SqlError::invalid_operands(operator, 1, 0)),
    }
}

fn list(operator: &str, parts: Vec<String>) -> Result<String> {
    let mut parts = parts.into_iter();
    let Some(key) = parts.next() else {
        return Err(SqlError::invalid_operands(operator, 1, 0));
    };
    let values: Vec<String> = parts.collect();
    if !values.is_empty() {
        return Ok(format!("{key} {operator} ({})", values.join(", ")));
    }
    Ok(match operator {
        "IN" => "FALSE".to_string(),
        "NOT IN" => "TRUE".to_string(),
        _ => format!("{key} {operator} ()"),
    })
}

fn between(operator: &str, parts: Vec<String>) -> Result<String> {
    match parts.as_slice() {
        [key, low, high] => Ok(format!("{key} {operator} {low} AND {high}")),
        _ => Err(SqlError::invalid_operands(operator, 3, parts.len())),
    }
}

fn alias(operator: &str, parts: Vec<String>) -> Result<String> {
    match parts.as_slice() {
        [expr, alias] => Ok(format!("({expr}) {operator} {alias}")),
        _ => Err(SqlError::invalid_operands(operator, 2, parts.len())),
    }
}

fn function(name: &str, parts: Vec<String>) -> Result<String> {
    Ok(format!("{name}({})", parts.join(", ")))
}

fn apply_format(operator: &str, template: &str, parts: &[String]) -> Result<String> {
    let slots = template.matches("%s").count();
    if slots != parts.len() {
        return Err(SqlError::invalid_operands(operator, slots, parts.len()));
    }
    let mut out = String::with_capacity(template.len() + parts.iter().map(String::len).sum::<usize>());
    let mut rest = template;
    for part in parts {
        if let Some(index) = rest.find("%s") {
            out.push_str(&rest[..index]);
            out.push_str(part);
            rest = &rest[index + 2..];
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Text rendered for a sigil token: `:not like` gives `NOT LIKE`.
pub(crate) fn display(token: &str) -> String {
    match token.strip_prefix(':') {
        Some(name) => name.to_uppercase(),
        None => token.to_string(),
    }
}

impl Dialect {
    /// `true` for sigil tokens, registered tokens and function calls.
    pub fn is_operator(&self, token: &str) -> bool {
        token.starts_with(':') || token.ends_with("()") || self.operators.contains_key(token)
    }

    pub fn operator_def(&self, token: &str) -> Option<&OperatorDef> {
        self.operators.get(token)
    }

    /// Renders already compiled operand fragments through an operator.
    pub fn build(&self, token: &str, parts: Vec<String>) -> Result<String> {
        tracing::trace!(operator = token, operands = parts.len(), "building operator");
        if let Some(def) = self.operators.get(token) {
            return self.build_with(token, def, parts);
        }
        if let Some(name) = token.strip_suffix("()") {
            let name = name.strip_prefix(':').unwrap_or(name).to_uppercase();
            return self.run(BuilderKind::Function, &name, parts);
        }
        Err(SqlError::unknown_operator(token))
    }

    fn build_with(&self, token: &str, def: &OperatorDef, parts: Vec<String>) -> Result<String> {
        let null_operand = parts.get(1).is_some_and(|part| part == "NULL");
        let token = match &def.null {
            Some(null) if null_operand => null.as_str(),
            _ => token,
        };
        let text = match &def.name {
            Some(name) => name.to_string(),
            None => display(token),
        };
        match (def.builder, &def.format) {
            (Some(kind), _) => self.run(kind, &text, parts),
            (None, Some(template)) => apply_format(&text, template, &parts),
            (None, None) => self.run(BuilderKind::Infix, &text, parts),
        }
    }

    fn run(&self, kind: BuilderKind, text: &str, parts: Vec<String>) -> Result<String> {
        if let Some(builder) = self.builders.get(&kind) {
            return (**builder)(text, parts);
        }
        match kind {
            BuilderKind::Infix | BuilderKind::Set => infix(text, parts),
            BuilderKind::Prefix => prefix(text, parts),
            BuilderKind::List => list(text, parts),
            BuilderKind::Between => between(text, parts),
            BuilderKind::Alias => alias(text, parts),
            BuilderKind::Function => function(text, parts),
        }
    }
}
