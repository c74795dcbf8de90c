use std::{fmt::Write, sync::Arc};

use chrono::format::{Item, StrftimeItems};
use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    cond::State,
    dialect::Dialect,
    error::{Result, SqlError},
    value::{DateTime, Value},
};

pub type FormatterFn = Arc<dyn Fn(&Dialect, &Value, &State<'_>) -> Result<String> + Send + Sync>;

pub(crate) fn defaults() -> IndexMap<SmolStr, FormatterFn> {
    let mut formatters: IndexMap<SmolStr, FormatterFn> = IndexMap::new();
    formatters.insert(SmolStr::new_static(":name"), Arc::new(name));
    formatters.insert(SmolStr::new_static(":value"), Arc::new(value));
    formatters.insert(SmolStr::new_static(":plain"), Arc::new(plain));
    formatters
}

fn name(dialect: &Dialect, value: &Value, state: &State<'_>) -> Result<String> {
    match value {
        Value::String(name) => Ok(dialect.qualified_name(name, state.aliases())),
        Value::Tree(_) => dialect.qualified_names(value, state.aliases()),
        other => Err(SqlError::InvalidValue {
            formatter: SmolStr::new_static(":name"),
            found: other.kind_name(),
        }),
    }
}

fn value(dialect: &Dialect, value: &Value, state: &State<'_>) -> Result<String> {
    dialect.value(value, state)
}

fn plain(dialect: &Dialect, value: &Value, _: &State<'_>) -> Result<String> {
    dialect.plain(value)
}

impl Dialect {
    pub fn is_formatter(&self, token: &str) -> bool {
        self.formatters.contains_key(token)
    }

    /// Runs a registered formatter (`:name`, `:value`, `:plain`, ...).
    pub fn format(&self, formatter: &str, value: &Value, state: &State<'_>) -> Result<String> {
        let formatter_fn = self
            .formatters
            .get(formatter)
            .ok_or_else(|| SqlError::unknown_formatter(formatter))?;
        tracing::trace!(formatter, "formatting value");
        (**formatter_fn)(self, value, state)
    }

    /// Renders a value as a SQL literal, through the caster hook when one is set.
    pub fn value(&self, value: &Value, state: &State<'_>) -> Result<String> {
        if let Value::Statement(statement) = value {
            return statement.to_sql();
        }
        match self.caster() {
            Some(caster) => Ok((**caster)(self, value, state)),
            None => self.cast(value),
        }
    }

    /// The default casting rules, ignoring any caster hook.
    pub fn cast(&self, value: &Value) -> Result<String> {
        Ok(match value {
            Value::Null => String::from("NULL"),
            Value::Bool(true) => String::from("TRUE"),
            Value::Bool(false) => String::from("FALSE"),
            Value::String(value) => self.quote(value),
            Value::DateTime(date) => self.quote(&self.format_date(date)?),
            Value::Tree(tree) => {
                let items = tree
                    .values()
                    .map(|item| self.cast(item))
                    .collect::<Result<Vec<_>>>()?;
                format!("{{{}}}", items.join(","))
            }
            Value::Int(value) => value.to_string(),
            Value::UInt(value) => value.to_string(),
            Value::Float(value) => finite(*value)?,
            Value::Statement(statement) => statement.to_sql()?,
        })
    }

    /// Formats a timestamp with the strftime pattern of `date_format`.
    pub fn format_date(&self, date: &DateTime) -> Result<String> {
        let invalid = || SqlError::InvalidValue {
            formatter: self.date_format().into(),
            found: "datetime",
        };
        let items: Vec<Item<'_>> = StrftimeItems::new(self.date_format()).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return Err(invalid());
        }
        let mut formatted = String::new();
        // Zone directives have nothing to read from a naive timestamp and fail here.
        write!(formatted, "{}", date.format_with_items(items.iter())).map_err(|_| invalid())?;
        Ok(formatted)
    }

    /// Quotes a string literal, through the quoter hook when one is set.
    pub fn quote(&self, string: &str) -> String {
        if let Some(quoter) = self.quoter() {
            return (**quoter)(string);
        }

        let mut quoted = String::with_capacity(string.len() + 2);
        quoted.push('\'');
        for c in string.chars() {
            match c {
                '\0' => quoted.push_str("\\x00"),
                '\n' => quoted.push_str("\\n"),
                '\r' => quoted.push_str("\\r"),
                '\\' => quoted.push_str("\\\\"),
                '\'' => quoted.push_str("\\'"),
                '\x1a' => quoted.push_str("\\x1a"),
                c => quoted.push(c),
            }
        }
        quoted.push('\'');
        quoted
    }

    /// Raw text of a value, without quoting.
    pub fn plain(&self, value: &Value) -> Result<String> {
        Ok(match value {
            Value::Null => String::new(),
            Value::Bool(true) => String::from("TRUE"),
            Value::Bool(false) => String::from("FALSE"),
            Value::Int(value) => value.to_string(),
            Value::UInt(value) => value.to_string(),
            Value::Float(value) => finite(*value)?,
            Value::String(value) => value.to_string(),
            Value::DateTime(date) => self.format_date(date)?,
            Value::Tree(tree) => tree
                .values()
                .map(|item| self.plain(item))
                .collect::<Result<Vec<_>>>()?
                .join(", "),
            Value::Statement(statement) => statement.to_sql()?,
        })
    }
}

/// NaN and the infinities have no SQL literal.
fn finite(value: f64) -> Result<String> {
    if value.is_finite() {
        Ok(value.to_string())
    } else {
        Err(SqlError::InvalidValue {
            formatter: SmolStr::new_static(":value"),
            found: "non-finite float",
        })
    }
}
