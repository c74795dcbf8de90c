use crate::{
    column::{MapOptions, TypeDef, standard_column},
    constraint::{ConstraintDef, MetaDef, MetaScope},
    dialect::Overlay,
    operator::{self, BuilderKind::Set},
};

pub(crate) fn overlay() -> Overlay {
    Overlay {
        escape: '"',
        operators: vec![
            (":union", operator::with(Set)),
            (":union all", operator::with(Set)),
            (":except", operator::with(Set)),
        ],
        types: vec![
            ("id", TypeDef::new("integer")),
            ("serial", TypeDef::new("integer").serial()),
            ("string", TypeDef::new("varchar").length(255)),
            ("text", TypeDef::new("text")),
            ("integer", TypeDef::new("integer")),
            ("boolean", TypeDef::new("boolean")),
            ("float", TypeDef::new("real")),
            ("decimal", TypeDef::new("decimal").precision(2)),
            ("date", TypeDef::new("date")),
            ("time", TypeDef::new("time")),
            ("datetime", TypeDef::new("timestamp")),
            ("binary", TypeDef::new("blob")),
        ],
        maps: vec![
            ("boolean", "boolean", None),
            ("blob", "binary", None),
            ("date", "date", None),
            ("integer", "integer", None),
            ("decimal", "decimal", Some(MapOptions::new().precision(2))),
            ("real", "float", None),
            ("text", "text", None),
            ("time", "time", None),
            ("timestamp", "datetime", None),
            ("varchar", "string", None),
        ],
        meta: vec![(MetaScope::Column, "collate", MetaDef::new("COLLATE").escaped())],
        constraints: vec![("unique", ConstraintDef::new("UNIQUE {:index} ({:column})"))],
        locks: Vec::new(),
        column: standard_column,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        column::{Field, MapOptions},
        cond::ConditionOptions,
        constraint::Constraint,
        dialect::Dialect,
        tree,
    };

    #[test]
    fn test_float_column() {
        let dialect = Dialect::sqlite();
        assert_eq!("\"fieldname\" real(10)", dialect.column(Field::new("fieldname").ty("float").length(10)).unwrap());
        assert_eq!(
            "\"fieldname\" numeric(10,2)",
            dialect
                .column(Field::new("fieldname").ty("float").length(10).precision(2))
                .unwrap()
        );
    }

    #[test]
    fn test_collate_is_quoted() {
        let dialect = Dialect::sqlite();
        assert_eq!(
            "\"fieldname\" varchar(32) COLLATE 'NOCASE' NULL",
            dialect
                .column(Field::new("fieldname").length(32).null(true).meta("collate", "NOCASE"))
                .unwrap()
        );
    }

    #[test]
    fn test_serial_column() {
        let dialect = Dialect::sqlite();
        assert_eq!("\"id\" integer NOT NULL", dialect.column(Field::new("id").ty("serial")).unwrap());
    }

    #[test]
    fn test_boolean_default() {
        let dialect = Dialect::sqlite();
        assert_eq!(
            "\"active\" boolean DEFAULT TRUE",
            dialect.column(Field::new("active").ty("boolean").default_value(true)).unwrap()
        );
    }

    #[test]
    fn test_unique_constraint() {
        let dialect = Dialect::sqlite();
        let constraint = Constraint::unique(["email"]).index(true);
        assert_eq!(
            "UNIQUE (\"email\")",
            dialect.constraint("unique", &constraint, &ConditionOptions::default()).unwrap()
        );
    }

    #[test]
    fn test_decimal_map_requires_precision() {
        let dialect = Dialect::sqlite();
        assert_eq!("decimal", dialect.mapped("decimal", &MapOptions::new().length(10).precision(2)));
        assert_eq!("string", dialect.mapped("decimal", &MapOptions::new()));
    }

    #[test]
    fn test_set_operators() {
        let dialect = Dialect::sqlite();
        assert!(dialect.is_operator(":union all"));
        assert_eq!("1 EXCEPT 2", crate::tests::compile(&dialect, tree! {":except" => crate::list![1, 2]}));
    }
}
