use std::{borrow::Cow, sync::Arc};

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::statement::ToSql;

/// Key of a [`Tree`] entry.
///
/// Positional entries use `Index`, everything else is a `Name` (a field, an
/// operator token or a formatter token).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Key {
    Index(usize),
    Name(SmolStr),
}

impl Key {
    /// Builds a key from text, turning canonical integers into indexes.
    pub fn new<T>(name: T) -> Self
    where
        T: Into<SmolStr>,
    {
        let name = name.into();
        let canonical = !name.is_empty()
            && name.bytes().all(|b| b.is_ascii_digit())
            && (name.len() == 1 || !name.starts_with('0'));
        if canonical {
            if let Ok(index) = name.parse() {
                return Self::Index(index);
            }
        }
        Self::Name(name)
    }

    #[inline]
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    #[inline]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name.as_str()),
            Self::Index(_) => None,
        }
    }
}

impl From<usize> for Key {
    #[inline]
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl From<&str> for Key {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&String> for Key {
    #[inline]
    fn from(value: &String) -> Self {
        Self::new(value.as_str())
    }
}

impl From<String> for Key {
    #[inline]
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<SmolStr> for Key {
    #[inline]
    fn from(value: SmolStr) -> Self {
        Self::new(value)
    }
}

/// Ordered key to value structure describing conditions, name lists and
/// array literals.
///
/// Re-inserting an existing key replaces its value in place, pushing appends
/// after the largest index seen so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    entries: IndexMap<Key, Value>,
    next: usize,
}

impl Tree {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<Key>,
        V: Into<Value>,
    {
        let key = key.into();
        if let Key::Index(index) = key {
            self.next = self.next.max(index.saturating_add(1));
        }
        self.entries.insert(key, value.into());
        self
    }

    /// Appends a positional entry. Once `usize::MAX` is taken there is no
    /// next index left and the value is dropped.
    pub fn push<V>(&mut self, value: V) -> &mut Self
    where
        V: Into<Value>,
    {
        let index = self.next;
        if self.entries.contains_key(&Key::Index(index)) {
            tracing::debug!(index, "tree has no free index, entry dropped");
            return self;
        }
        self.next = index.saturating_add(1);
        self.entries.insert(Key::Index(index), value.into());
        self
    }

    /// Appends every entry of `other`, renumbering its positional entries.
    pub fn append(&mut self, other: Tree) -> &mut Self {
        for (key, value) in other.entries {
            match key {
                Key::Index(_) => self.push(value),
                Key::Name(name) => self.insert(Key::Name(name), value),
            };
        }
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get<K>(&self, key: K) -> Option<&Value>
    where
        K: Into<Key>,
    {
        self.entries.get(&key.into())
    }

    pub fn first(&self) -> Option<(&Key, &Value)> {
        self.entries.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next = 0;
    }
}

impl IntoIterator for Tree {
    type Item = (Key, Value);
    type IntoIter = indexmap::map::IntoIter<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V> FromIterator<V> for Tree
where
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut tree = Tree::new();
        for value in iter {
            tree.push(value);
        }
        tree
    }
}

impl From<&str> for Tree {
    fn from(value: &str) -> Self {
        let mut tree = Tree::new();
        tree.push(value);
        tree
    }
}

impl From<String> for Tree {
    fn from(value: String) -> Self {
        let mut tree = Tree::new();
        tree.push(value);
        tree
    }
}

impl From<SmolStr> for Tree {
    fn from(value: SmolStr) -> Self {
        let mut tree = Tree::new();
        tree.push(value);
        tree
    }
}

impl<T> From<Vec<T>> for Tree
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        value.into_iter().collect()
    }
}

impl<T, const N: usize> From<[T; N]> for Tree
where
    T: Into<Value>,
{
    fn from(value: [T; N]) -> Self {
        value.into_iter().collect()
    }
}

impl From<&Tree> for Tree {
    fn from(value: &Tree) -> Self {
        value.clone()
    }
}

/// Calendar timestamp rendered through the dialect date format.
pub type DateTime = chrono::NaiveDateTime;

/// A runtime value handed to the compiler.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(SmolStr),
    DateTime(DateTime),
    Tree(Tree),
    Statement(Arc<dyn ToSql>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Tree(a), Self::Tree(b)) => a == b,
            (Self::Statement(a), Self::Statement(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    pub fn statement<S>(statement: S) -> Self
    where
        S: ToSql + 'static,
    {
        Self::Statement(Arc::new(statement))
    }

    /// Name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::DateTime(_) => "datetime",
            Self::Tree(_) => "tree",
            Self::Statement(_) => "statement",
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Self::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// `false` for null, `false`, zero, `""`, `"0"` and empty trees.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::UInt(value) => *value != 0,
            Self::Float(value) => *value != 0.0,
            Self::String(value) => !value.is_empty() && value != "0",
            Self::DateTime(_) | Self::Statement(_) => true,
            Self::Tree(tree) => !tree.is_empty(),
        }
    }

    /// The operand list of an operator: trees are used as is, anything else
    /// becomes a single positional operand.
    pub(crate) fn operands(&self) -> Cow<'_, Tree> {
        match self {
            Self::Tree(tree) => Cow::Borrowed(tree),
            other => {
                let mut tree = Tree::new();
                tree.push(other.clone());
                Cow::Owned(tree)
            }
        }
    }
}

macro_rules! value_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )+
    };
}

value_from!(Bool: bool);
value_from!(Int: i8, i16, i32, i64);
value_from!(UInt: u8, u16, u32, u64);
value_from!(Float: f32, f64);
value_from!(String: &str, String, &String, SmolStr, Box<str>, Arc<str>);
value_from!(DateTime: DateTime);
value_from!(Tree: Tree);

impl From<isize> for Value {
    #[inline]
    fn from(value: isize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<usize> for Value {
    #[inline]
    fn from(value: usize) -> Self {
        Self::UInt(value as u64)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Self::String(smol_str::format_smolstr!("{}", value))
    }
}

impl<'a> From<Cow<'a, str>> for Value {
    #[inline]
    fn from(value: Cow<'a, str>) -> Self {
        Self::String(SmolStr::new(value))
    }
}

impl From<()> for Value {
    #[inline]
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        Self::Tree(value.into())
    }
}

impl<T, const N: usize> From<[T; N]> for Value
where
    T: Into<Value>,
{
    fn from(value: [T; N]) -> Self {
        Self::Tree(value.into())
    }
}

impl From<Arc<dyn ToSql>> for Value {
    #[inline]
    fn from(value: Arc<dyn ToSql>) -> Self {
        Self::Statement(value)
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(value: chrono::NaiveDate) -> Self {
        Value::DateTime(value.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Value {
    #[inline]
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        Value::DateTime(value.naive_utc())
    }
}

#[cfg(feature = "time")]
mod time_impl {
    use chrono::{NaiveDate, NaiveTime};

    use super::{DateTime, Value};

    fn naive_date(value: time::Date) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(value.year(), u8::from(value.month()).into(), value.day().into())
    }

    fn naive_datetime(value: time::PrimitiveDateTime) -> Option<DateTime> {
        let time = NaiveTime::from_hms_nano_opt(
            value.hour().into(),
            value.minute().into(),
            value.second().into(),
            value.nanosecond(),
        )?;
        Some(naive_date(value.date())?.and_time(time))
    }

    // Out of range dates have no chrono counterpart and become NULL.
    impl From<time::Date> for Value {
        fn from(value: time::Date) -> Self {
            naive_date(value).map_or(Value::Null, |date| Value::DateTime(date.and_time(NaiveTime::MIN)))
        }
    }

    impl From<time::PrimitiveDateTime> for Value {
        fn from(value: time::PrimitiveDateTime) -> Self {
            naive_datetime(value).map_or(Value::Null, Value::DateTime)
        }
    }

    impl From<time::OffsetDateTime> for Value {
        fn from(value: time::OffsetDateTime) -> Self {
            let utc = value.to_offset(time::UtcOffset::UTC);
            Value::from(time::PrimitiveDateTime::new(utc.date(), utc.time()))
        }
    }
}

#[cfg(feature = "uuid")]
impl From<uuid::Uuid> for Value {
    fn from(value: uuid::Uuid) -> Self {
        Value::String(SmolStr::new(value.hyphenated().to_string()))
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Json::Null => Value::Null,
            Json::Bool(value) => Value::Bool(value),
            Json::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Value::Int(value)
                } else if let Some(value) = number.as_u64() {
                    Value::UInt(value)
                } else {
                    Value::Float(number.as_f64().unwrap_or_default())
                }
            }
            Json::String(value) => Value::String(value.into()),
            Json::Array(items) => Value::Tree(items.into_iter().collect()),
            Json::Object(map) => {
                let mut tree = Tree::new();
                for (key, value) in map {
                    tree.insert(key, Value::from(value));
                }
                Value::Tree(tree)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalizes_integers() {
        assert_eq!(Key::Index(3), Key::from("3"));
        assert_eq!(Key::Name("03".into()), Key::from("03"));
        assert_eq!(Key::Name("+3".into()), Key::from("+3"));
        assert_eq!(Key::Name("age".into()), Key::from("age"));
    }

    #[test]
    fn test_tree_insert_keeps_position() {
        let mut tree = Tree::new();
        tree.insert("a", 1).insert("b", 2).insert("a", 3);
        let keys: Vec<_> = tree.keys().cloned().collect();
        assert_eq!(vec![Key::from("a"), Key::from("b")], keys);
        assert_eq!(Some(&Value::Int(3)), tree.get("a"));
    }

    #[test]
    fn test_tree_push_after_largest_index() {
        let mut tree = Tree::new();
        tree.insert(5usize, "x").push("y");
        assert_eq!(Some(&Value::from("y")), tree.get(6usize));
    }

    #[test]
    fn test_tree_append_renumbers() {
        let mut tree: Tree = ["a", "b"].into();
        let mut other = Tree::new();
        other.push("c").insert("d", "e");
        tree.append(other);
        assert_eq!(Some(&Value::from("c")), tree.get(2usize));
        assert_eq!(Some(&Value::from("e")), tree.get("d"));
    }

    #[test]
    fn test_truthy() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from("0").is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::Tree(Tree::new()).is_truthy());
        assert!(Value::from("utf8").is_truthy());
        assert!(Value::from(true).is_truthy());
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::Null, Value::from(None::<i32>));
        assert_eq!(Value::Int(4), Value::from(Some(4)));
    }

    #[test]
    fn test_tree_insert_largest_index() {
        let mut tree = Tree::new();
        tree.insert("18446744073709551615", 1).push(2);
        assert_eq!(Some(&Value::Int(1)), tree.get(usize::MAX));
        assert_eq!(1, tree.len());

        let mut tree = Tree::new();
        tree.push("a").insert(usize::MAX, "b");
        assert_eq!(Some(&Value::from("a")), tree.get(0usize));
        assert_eq!(Some(&Value::from("b")), tree.get(usize::MAX));
    }

    #[test]
    fn test_date_into_value() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let expected = date.and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(Value::DateTime(expected), Value::from(date));
    }
}
