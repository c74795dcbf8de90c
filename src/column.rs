use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{
    cond::{Schema, State},
    constraint::{Meta, MetaScope},
    dialect::Dialect,
    error::{Result, SqlError},
    value::{Key, Value},
};

/// Dialect specific column text builder.
pub(crate) type ColumnFn = fn(&Dialect, &Field) -> Result<String>;

/// A logical column type as resolved by a dialect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDef {
    /// Native type keyword, e.g. `varchar`.
    pub native: SmolStr,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub serial: bool,
    pub default: Option<Value>,
    pub null: Option<bool>,
}

impl TypeDef {
    pub fn new<T>(native: T) -> Self
    where
        T: Into<SmolStr>,
    {
        Self {
            native: native.into(),
            ..Self::default()
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn serial(mut self) -> Self {
        self.serial = true;
        self
    }

    pub fn default_value<V>(mut self, default: V) -> Self
    where
        V: Into<Value>,
    {
        self.default = Some(default.into());
        self
    }

    pub fn null(mut self, null: bool) -> Self {
        self.null = Some(null);
        self
    }
}

/// Options distinguishing several logical types sharing a native name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapOptions {
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub serial: Option<bool>,
}

impl MapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn serial(mut self, serial: bool) -> Self {
        self.serial = Some(serial);
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `true` when every option set here has the same value in `probe`.
    pub fn is_subset_of(&self, probe: &MapOptions) -> bool {
        fn matches<T: PartialEq>(expected: Option<T>, found: Option<T>) -> bool {
            expected.is_none() || expected == found
        }
        matches(self.length, probe.length)
            && matches(self.precision, probe.precision)
            && matches(self.serial, probe.serial)
    }
}

/// A column definition, possibly partial until completed by [`Dialect::field`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Field {
    pub name: SmolStr,
    /// Logical type, e.g. `string`.
    pub ty: Option<SmolStr>,
    /// Native type overriding the one of `ty`.
    pub native: Option<SmolStr>,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub serial: Option<bool>,
    pub default: Option<Value>,
    pub null: Option<bool>,
    pub meta: Meta,
}

impl Field {
    pub fn new<T>(name: T) -> Self
    where
        T: Into<SmolStr>,
    {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn ty<T>(mut self, ty: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.ty = Some(ty.into());
        self
    }

    pub fn native<T>(mut self, native: T) -> Self
    where
        T: Into<SmolStr>,
    {
        self.native = Some(native.into());
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn serial(mut self, serial: bool) -> Self {
        self.serial = Some(serial);
        self
    }

    pub fn default_value<V>(mut self, default: V) -> Self
    where
        V: Into<Value>,
    {
        self.default = Some(default.into());
        self
    }

    pub fn null(mut self, null: bool) -> Self {
        self.null = Some(null);
        self
    }

    pub fn meta<T, V>(mut self, name: T, value: V) -> Self
    where
        T: Into<SmolStr>,
        V: Into<Value>,
    {
        self.meta.insert(name.into(), value.into());
        self
    }

    #[inline]
    pub fn is_serial(&self) -> bool {
        self.serial.unwrap_or(false)
    }

    fn is_numeric(&self) -> bool {
        matches!(self.ty.as_deref(), Some("integer" | "float" | "boolean"))
    }
}

/// Logical column types of one table, usable as a condition [`Schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    columns: IndexMap<SmolStr, SmolStr>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column<N, T>(mut self, name: N, ty: T) -> Self
    where
        N: Into<SmolStr>,
        T: Into<SmolStr>,
    {
        self.columns.insert(name.into(), ty.into());
        self
    }
}

impl<'a> FromIterator<&'a Field> for TableSchema {
    fn from_iter<I: IntoIterator<Item = &'a Field>>(iter: I) -> Self {
        let columns = iter
            .into_iter()
            .map(|field| {
                let ty = field.ty.clone().unwrap_or_else(|| SmolStr::new_static("string"));
                (field.name.clone(), ty)
            })
            .collect();
        Self { columns }
    }
}

impl Schema for TableSchema {
    fn type_of(&self, field: &str) -> Option<SmolStr> {
        Some(
            self.columns
                .get(field)
                .cloned()
                .unwrap_or_else(|| SmolStr::new_static("string")),
        )
    }
}

/// `use(length[,precision])`, omitting parts that are unset or zero.
pub(crate) fn format_column(native: &str, length: Option<u32>, precision: Option<u32>) -> String {
    match (length.filter(|l| *l > 0), precision.filter(|p| *p > 0)) {
        (Some(length), Some(precision)) => format!("{native}({length},{precision})"),
        (Some(length), None) => format!("{native}({length})"),
        _ => native.to_string(),
    }
}

impl Dialect {
    /// Registers or replaces a logical type.
    pub fn register_type<T>(&mut self, name: T, definition: TypeDef) -> &mut Self
    where
        T: Into<SmolStr>,
    {
        let name = name.into();
        if self.types.insert(name.clone(), definition).is_some() {
            tracing::debug!(%name, "column type overridden");
        }
        self
    }

    /// Resolves a logical type.
    pub fn type_def(&self, name: &str) -> Result<&TypeDef> {
        self.types
            .get(name)
            .ok_or_else(|| SqlError::unknown_column_type(name))
    }

    /// Maps a native type back to a logical one.
    ///
    /// Entries with options take priority over existing ones, entries without
    /// options are appended unless the logical type is already mapped.
    pub fn register_map<N, L>(&mut self, native: N, logical: L, options: Option<MapOptions>) -> &mut Self
    where
        N: Into<SmolStr>,
        L: Into<SmolStr>,
    {
        let logical = logical.into();
        let entries = self.maps.entry(native.into()).or_default();
        match options {
            Some(options) => {
                entries.retain(|(existing, _)| *existing != logical);
                entries.insert(0, (logical, options));
            }
            None => {
                if !entries.iter().any(|(existing, _)| *existing == logical) {
                    entries.push((logical, MapOptions::default()));
                }
            }
        }
        self
    }

    /// Logical type of a native type, `string` when nothing matches.
    pub fn mapped(&self, native: &str, probe: &MapOptions) -> &str {
        self.maps
            .get(native.to_lowercase().as_str())
            .and_then(|entries| {
                entries
                    .iter()
                    .find(|(_, options)| options.is_subset_of(probe))
            })
            .map_or("string", |(logical, _)| logical.as_str())
    }

    /// Completes a column definition from its logical type.
    ///
    /// Without a native type, `ty` (or `string`) must resolve. With a native
    /// type, an unknown `ty` is ignored.
    pub fn field(&self, mut field: Field) -> Result<Field> {
        if field.name.is_empty() {
            return Err(SqlError::MissingColumnName);
        }
        let definition = match (&field.ty, &field.native) {
            (Some(ty), Some(_)) => self.types.get(ty.as_str()),
            (Some(ty), None) => Some(self.type_def(ty)?),
            (None, Some(_)) => None,
            (None, None) => Some(self.type_def("string")?),
        };
        if let Some(definition) = definition {
            field.native = field.native.or_else(|| Some(definition.native.clone()));
            field.length = field.length.or(definition.length);
            field.precision = field.precision.or(definition.precision);
            field.serial = field.serial.or(Some(definition.serial));
            field.default = field.default.or_else(|| definition.default.clone());
            field.null = field.null.or(definition.null);
        }
        field.serial.get_or_insert(false);
        Ok(field)
    }

    /// Renders a column definition for `CREATE TABLE`.
    pub fn column(&self, field: Field) -> Result<String> {
        let mut field = self.field(field)?;
        if field.is_numeric() && field.default.as_ref().is_some_and(|d| d.as_str() == Some("")) {
            field.null = Some(true);
            field.default = None;
        }
        field.native = field.native.map(|native| SmolStr::new(native.to_lowercase()));
        (self.column)(self, &field)
    }

    /// `NULL` / `NOT NULL` when nullability is set.
    pub(crate) fn column_null(&self, field: &Field) -> Option<&'static str> {
        field.null.map(|null| if null { "NULL" } else { "NOT NULL" })
    }

    /// `DEFAULT x`, a single formatter entry selecting how `x` renders.
    pub(crate) fn column_default(&self, field: &Field) -> Result<Option<String>> {
        let Some(default) = &field.default else {
            return Ok(None);
        };
        let state = State::new().with_name(field.name.clone()).with_field(field);
        let rendered = match default {
            Value::Tree(tree) => match tree.first() {
                Some((Key::Name(formatter), value)) => self.format(&formatter.to_lowercase(), value, &state)?,
                _ => self.value(default, &state)?,
            },
            _ => self.value(default, &state)?,
        };
        Ok(Some(format!("DEFAULT {rendered}")))
    }

    pub(crate) fn column_meta(&self, field: &Field, names: &[&str]) -> Result<String> {
        self.meta(MetaScope::Column, &field.meta, Some(names))
    }

    /// `name native(length[,precision])`.
    pub(crate) fn column_head(&self, field: &Field, native: &str) -> String {
        format!(
            "{} {}",
            self.name(&field.name),
            format_column(native, field.length, field.precision)
        )
    }
}

/// Joins the non empty parts of a column definition.
pub(crate) fn join_parts<I>(parts: I) -> String
where
    I: IntoIterator<Item = String>,
{
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Column layout shared by PostgreSQL, SQLite and the generic dialect.
pub(crate) fn standard_column(dialect: &Dialect, field: &Field) -> Result<String> {
    let native = match field.native.as_deref() {
        Some(_) if field.ty.as_deref() == Some("float") && field.precision.is_some() => "numeric",
        Some(native) => native,
        None => "",
    };
    let mut parts = vec![dialect.column_head(field, native), dialect.column_meta(field, &["collate"])?];
    if field.is_serial() {
        parts.push(String::from("NOT NULL"));
    } else {
        parts.extend(dialect.column_null(field).map(String::from));
        parts.extend(dialect.column_default(field)?);
    }
    Ok(join_parts(parts))
}
