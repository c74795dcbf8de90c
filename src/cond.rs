use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    column::Field,
    dialect::Dialect,
    error::Result,
    ident::{Aliases, undot},
    value::{Key, Tree, Value},
};

/// Column type lookup for one table, consulted by caster hooks.
pub trait Schema: Send + Sync {
    /// Logical type of `field`, if known.
    fn type_of(&self, field: &str) -> Option<SmolStr>;
}

impl<F> Schema for F
where
    F: Fn(&str) -> Option<SmolStr> + Send + Sync,
{
    fn type_of(&self, field: &str) -> Option<SmolStr> {
        self(field)
    }
}

/// Schemas keyed by table alias, `""` being the unqualified table.
pub type Schemas = IndexMap<SmolStr, Arc<dyn Schema>>;

/// Options of a top level [`Dialect::conditions`] call.
#[derive(Clone)]
pub struct ConditionOptions {
    pub prepend: Option<SmolStr>,
    pub operator: SmolStr,
    pub schemas: Schemas,
    pub aliases: Aliases,
}

impl Default for ConditionOptions {
    fn default() -> Self {
        Self {
            prepend: None,
            operator: SmolStr::new_static(":and"),
            schemas: Schemas::new(),
            aliases: Aliases::new(),
        }
    }
}

impl ConditionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyword placed before a non empty result, e.g. `WHERE`.
    pub fn with_prepend<T>(mut self, keyword: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.prepend = Some(keyword.into());
        self
    }

    /// Operator joining the top level entries, `:and` by default.
    pub fn with_operator<T>(mut self, operator: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.operator = operator.into();
        self
    }

    pub fn with_schema<T, S>(mut self, alias: T, schema: S) -> Self
    where
        T: Into<SmolStr>,
        S: Schema + 'static,
    {
        self.schemas.insert(alias.into(), Arc::new(schema));
        self
    }

    pub fn with_shared_schema<T>(mut self, alias: T, schema: Arc<dyn Schema>) -> Self
    where
        T: Into<SmolStr>,
    {
        self.schemas.insert(alias.into(), schema);
        self
    }

    pub fn with_aliases(mut self, aliases: Aliases) -> Self {
        self.aliases = aliases;
        self
    }
}

impl fmt::Debug for ConditionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionOptions")
            .field("prepend", &self.prepend)
            .field("operator", &self.operator)
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}

/// Field context handed to formatters and caster hooks.
///
/// Copied on descent: a field entry never sees the state of its siblings.
#[derive(Clone, Default)]
pub struct State<'a> {
    name: Option<SmolStr>,
    schema: Option<&'a dyn Schema>,
    field: Option<&'a Field>,
    aliases: Option<&'a Aliases>,
    schemas: Option<&'a Schemas>,
}

impl<'a> State<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &'a ConditionOptions) -> Self {
        Self {
            aliases: Some(&options.aliases),
            schemas: Some(&options.schemas),
            ..Self::default()
        }
    }

    pub fn with_name<T>(mut self, name: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.name = Some(name.into());
        self
    }

    pub fn with_schema(mut self, schema: &'a dyn Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_field(mut self, field: &'a Field) -> Self {
        self.field = Some(field);
        self
    }

    /// State for the field `name`, resolving its qualifier's schema.
    pub(crate) fn scoped(&self, name: &str) -> Self {
        let (qualifier, field) = undot(name);
        let schema = self
            .schemas
            .and_then(|schemas| schemas.get(qualifier.unwrap_or("")))
            .map(|schema| schema.as_ref());
        Self {
            name: Some(SmolStr::new(field)),
            schema,
            ..self.clone()
        }
    }

    /// Unqualified name of the current field.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn schema(&self) -> Option<&'a dyn Schema> {
        self.schema
    }

    /// Column being rendered, set while casting column defaults.
    pub fn field(&self) -> Option<&'a Field> {
        self.field
    }

    pub fn aliases(&self) -> Option<&'a Aliases> {
        self.aliases
    }

    /// Logical type of the current field according to its schema.
    pub fn field_type(&self) -> Option<SmolStr> {
        let name = self.name.as_deref()?;
        self.schema?.type_of(name)
    }
}

impl fmt::Debug for State<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("name", &self.name)
            .field("schema", &self.schema.is_some())
            .field("field", &self.field.map(|field| &field.name))
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

impl Dialect {
    /// Compiles a condition tree into a SQL expression.
    ///
    /// Top level entries are joined with `options.operator`. An empty tree
    /// gives an empty string, without the prepended keyword.
    pub fn conditions(&self, conditions: &Tree, options: &ConditionOptions) -> Result<String> {
        if conditions.is_empty() {
            return Ok(String::new());
        }
        let state = State::from_options(options);
        let parts = self.entries(conditions, &state)?;
        let sql = self.build(&options.operator.to_lowercase(), parts)?;
        Ok(match &options.prepend {
            Some(keyword) if !sql.is_empty() => format!("{keyword} {sql}"),
            _ => sql,
        })
    }

    fn operator(&self, token: &str, operands: &Tree, state: &State<'_>) -> Result<String> {
        let parts = self.entries(operands, state)?;
        self.build(token, parts)
    }

    fn entries(&self, tree: &Tree, state: &State<'_>) -> Result<Vec<String>> {
        let mut parts = Vec::with_capacity(tree.len());
        let mut scope = state.clone();
        self.collect_entries(tree, &mut scope, &mut parts)?;
        Ok(parts)
    }

    /// Compiles every entry of `tree`. Positional trees are spliced in place;
    /// a `:name` entry scopes the field state for the rest of the list.
    fn collect_entries(&self, tree: &Tree, state: &mut State<'_>, parts: &mut Vec<String>) -> Result<()> {
        for (key, value) in tree.iter() {
            match key {
                Key::Name(name) => {
                    let token = name.to_lowercase();
                    if self.is_formatter(&token) {
                        parts.push(self.format(&token, value, state)?);
                        if token == ":name" {
                            if let Some(field) = value.as_str() {
                                *state = state.scoped(field);
                            }
                        }
                    } else if self.is_operator(&token) {
                        parts.push(self.operator(&token, &value.operands(), state)?);
                    } else {
                        parts.push(self.field_condition(name, value, state)?);
                    }
                }
                Key::Index(_) => match value {
                    Value::Tree(nested) => self.collect_entries(nested, state, parts)?,
                    other => parts.push(self.value(other, state)?),
                },
            }
        }
        Ok(())
    }

    fn field_condition(&self, name: &str, value: &Value, state: &State<'_>) -> Result<String> {
        let state = state.scoped(name);
        let mut field = Tree::new();
        field.insert(":name", name);
        let mut operands = Tree::new();
        operands.push(field);

        let Value::Tree(tree) = value else {
            operands.push(value.clone());
            return self.operator("=", &operands, &state);
        };

        let first = tree
            .first()
            .and_then(|(key, first)| key.as_name().map(|token| (token.to_lowercase(), first)));
        match first {
            Some((token, first)) if self.is_formatter(&token) => Ok(format!(
                "{} = {}",
                self.qualified_name(name, state.aliases()),
                self.format(&token, first, &state)?
            )),
            Some((token, first)) if self.operators.contains_key(token.as_str()) => {
                match first {
                    Value::Tree(arguments) => {
                        operands.append(arguments.clone());
                    }
                    other => {
                        operands.push(other.clone());
                    }
                }
                self.operator(&token, &operands, &state)
            }
            _ => {
                operands.push(value.clone());
                self.operator(":in", &operands, &state)
            }
        }
    }
}
