use crate::{
    column::{Field, MapOptions, TypeDef, join_parts},
    constraint::{ConstraintDef, MetaDef, MetaScope},
    dialect::{Dialect, Overlay},
    error::Result,
    operator::{self, BuilderKind::Set},
};

pub(crate) fn overlay() -> Overlay {
    Overlay {
        escape: '`',
        operators: vec![
            ("#", operator::format("%s ^ %s")),
            (":regex", operator::format("%s REGEXP %s")),
            (":rlike", operator::plain()),
            (":sounds like", operator::plain()),
            (":union", operator::with(Set)),
            (":union all", operator::with(Set)),
            (":minus", operator::with(Set)),
            (":except", operator::with(Set).name("MINUS")),
        ],
        types: vec![
            ("id", TypeDef::new("int")),
            ("serial", TypeDef::new("int").serial()),
            ("string", TypeDef::new("varchar").length(255)),
            ("text", TypeDef::new("text")),
            ("integer", TypeDef::new("int")),
            ("boolean", TypeDef::new("boolean")),
            ("float", TypeDef::new("float")),
            ("decimal", TypeDef::new("decimal").precision(2)),
            ("date", TypeDef::new("date")),
            ("time", TypeDef::new("time")),
            ("datetime", TypeDef::new("datetime")),
            ("binary", TypeDef::new("blob")),
        ],
        maps: vec![
            ("bigint", "integer", None),
            ("bit", "string", None),
            ("blob", "string", None),
            ("char", "string", None),
            ("date", "date", None),
            ("datetime", "datetime", None),
            ("decimal", "decimal", None),
            ("double", "float", None),
            ("float", "float", None),
            ("geometry", "string", None),
            ("geometrycollection", "string", None),
            ("int", "integer", None),
            ("linestring", "string", None),
            ("longblob", "string", None),
            ("longtext", "string", None),
            ("mediumblob", "string", None),
            ("mediumint", "integer", None),
            ("mediumtext", "string", None),
            ("multilinestring", "string", None),
            ("multipolygon", "string", None),
            ("multipoint", "string", None),
            ("point", "string", None),
            ("polygon", "string", None),
            ("smallint", "integer", None),
            ("text", "string", None),
            ("time", "string", None),
            ("timestamp", "datetime", None),
            ("tinyblob", "string", None),
            ("tinyint", "boolean", Some(MapOptions::new().length(1))),
            ("tinyint", "integer", None),
            ("tinytext", "string", None),
            ("varchar", "string", None),
            ("year", "string", None),
        ],
        meta: vec![
            (MetaScope::Column, "charset", MetaDef::new("CHARACTER SET")),
            (MetaScope::Column, "collate", MetaDef::new("COLLATE")),
            (MetaScope::Column, "comment", MetaDef::new("COMMENT").escaped()),
            (MetaScope::Table, "charset", MetaDef::new("DEFAULT CHARSET")),
            (MetaScope::Table, "collate", MetaDef::new("COLLATE")),
            (MetaScope::Table, "engine", MetaDef::new("ENGINE")),
            (MetaScope::Table, "tablespace", MetaDef::new("TABLESPACE")),
        ],
        constraints: vec![
            ("index", ConstraintDef::new("INDEX ({:column})")),
            (
                "unique",
                ConstraintDef::new("UNIQUE {:index} {:name} ({:column})")
                    .keyword("key", "KEY")
                    .keyword("index", "INDEX"),
            ),
        ],
        locks: vec![("update", "FOR UPDATE"), ("share", "LOCK IN SHARE MODE")],
        column,
    }
}

fn column(dialect: &Dialect, field: &Field) -> Result<String> {
    let native = match field.native.as_deref() {
        Some(_) if field.ty.as_deref() == Some("float") && field.precision.is_some() => "decimal",
        Some(native) => native,
        None => "",
    };
    let mut parts = vec![
        dialect.column_head(field, native),
        dialect.column_meta(field, &["charset", "collate"])?,
    ];
    if field.is_serial() {
        parts.push(String::from("NOT NULL AUTO_INCREMENT"));
    } else {
        parts.extend(dialect.column_null(field).map(String::from));
        parts.extend(dialect.column_default(field)?);
    }
    parts.push(dialect.column_meta(field, &["comment"])?);
    Ok(join_parts(parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cond::ConditionOptions, list, tree, value::Tree};

    fn compile(conditions: Tree) -> String {
        crate::tests::compile(&Dialect::mysql(), conditions)
    }

    #[test]
    fn test_serial_column() {
        let dialect = Dialect::mysql();
        assert_eq!(
            "`id` int NOT NULL AUTO_INCREMENT",
            dialect.column(Field::new("id").ty("serial")).unwrap()
        );
    }

    #[test]
    fn test_string_column() {
        let dialect = Dialect::mysql();
        assert_eq!(
            "`title` varchar(128) NULL",
            dialect.column(Field::new("title").length(128).null(true)).unwrap()
        );
        assert_eq!(
            "`title` varchar(255) CHARACTER SET utf8 COLLATE utf8_unicode_ci NOT NULL COMMENT 'a title'",
            dialect
                .column(
                    Field::new("title")
                        .null(false)
                        .meta("charset", "utf8")
                        .meta("collate", "utf8_unicode_ci")
                        .meta("comment", "a title")
                )
                .unwrap()
        );
    }

    #[test]
    fn test_float_columns() {
        let dialect = Dialect::mysql();
        assert_eq!("`price` float", dialect.column(Field::new("price").ty("float")).unwrap());
        assert_eq!(
            "`price` decimal(10,2)",
            dialect.column(Field::new("price").ty("float").length(10).precision(2)).unwrap()
        );
        assert_eq!(
            "`price` decimal(10,2) DEFAULT 1.5",
            dialect
                .column(Field::new("price").ty("decimal").length(10).default_value(1.5))
                .unwrap()
        );
    }

    #[test]
    fn test_numeric_empty_default() {
        let dialect = Dialect::mysql();
        assert_eq!(
            "`count` int NULL",
            dialect.column(Field::new("count").ty("integer").default_value("")).unwrap()
        );
        assert_eq!(
            "`name` varchar(255) DEFAULT ''",
            dialect.column(Field::new("name").default_value("")).unwrap()
        );
    }

    #[test]
    fn test_datetime_default() {
        let dialect = Dialect::mysql();
        assert_eq!(
            "`modified` datetime NOT NULL DEFAULT CURRENT_TIMESTAMP",
            dialect
                .column(
                    Field::new("modified")
                        .ty("datetime")
                        .null(false)
                        .default_value(tree! {":plain" => "CURRENT_TIMESTAMP"})
                )
                .unwrap()
        );
    }

    #[test]
    fn test_native_column() {
        let dialect = Dialect::mysql();
        assert_eq!("`big` bigint(20)", dialect.column(Field::new("big").native("BIGINT").length(20)).unwrap());
    }

    #[test]
    fn test_mysql_operators() {
        assert_eq!("`a` ^ `b`", compile(tree! {"#" => list![tree! {":name" => "a"}, tree! {":name" => "b"}]}));
        assert_eq!(
            "`name` REGEXP '^a'",
            compile(tree! {":regex" => list![tree! {":name" => "name"}, "^a"]})
        );
        assert_eq!(
            "`name` SOUNDS LIKE 'bob'",
            compile(tree! {"name" => tree! {":sounds like" => "bob"}})
        );
    }

    #[test]
    fn test_table_meta() {
        let dialect = Dialect::mysql();
        let mut meta = crate::constraint::Meta::new();
        meta.insert("engine".into(), "InnoDB".into());
        meta.insert("tablespace".into(), "space".into());
        assert_eq!(
            "ENGINE InnoDB TABLESPACE space",
            dialect.meta(MetaScope::Table, &meta, None).unwrap()
        );
    }

    #[test]
    fn test_index_constraint() {
        let dialect = Dialect::mysql();
        let constraint = crate::constraint::Constraint::new("index").column(["a", "b"]);
        assert_eq!(
            "INDEX (`a`, `b`)",
            dialect.constraint("index", &constraint, &ConditionOptions::default()).unwrap()
        );
    }
}
