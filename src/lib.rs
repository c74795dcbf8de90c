mod column;
mod cond;
mod constraint;
pub mod dialect;
mod error;
mod format;
mod ident;
mod operator;
pub mod statement;
mod value;

pub use column::{Field, MapOptions, TableSchema, TypeDef};
pub use cond::{ConditionOptions, Schema, Schemas, State};
pub use constraint::{Constraint, ConstraintDef, Meta, MetaDef, MetaScope};
pub use dialect::{Caster, Dialect, DialectConfig, DialectKind, HasDialect, Quoter};
pub use error::{Result, SqlError};
pub use format::FormatterFn;
pub use ident::{Aliases, undot};
pub use operator::{BuilderFn, BuilderKind, OperatorDef};
pub use statement::{
    CreateTable, Delete, DropTable, Insert, Join, Ordering, Select, Statement, StatementKind, ToSql, Truncate,
    Update,
};
pub use value::{DateTime, Key, Tree, Value};

/// Builds a [`Tree`] of keyed entries.
///
/// ```
/// use sqldialect::tree;
///
/// let conditions = tree! {"id" => 1, "name" => tree! {":like" => "%doe%"}};
/// assert_eq!(2, conditions.len());
/// ```
#[macro_export]
macro_rules! tree {
    () => {
        $crate::Tree::new()
    };
    ( $($key:expr => $value:expr),+ $(,)? ) => {{
        let mut tree = $crate::Tree::new();
        $( tree.insert($key, $value); )+
        tree
    }};
}

/// Builds a positional [`Tree`].
#[macro_export]
macro_rules! list {
    () => {
        $crate::Tree::new()
    };
    ( $($value:expr),+ $(,)? ) => {{
        let mut tree = $crate::Tree::new();
        $( tree.push($value); )+
        tree
    }};
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::{ConditionOptions, Dialect, Tree};

    pub(crate) fn compile(dialect: &Dialect, conditions: Tree) -> String {
        dialect.conditions(&conditions, &ConditionOptions::default()).unwrap()
    }
}
