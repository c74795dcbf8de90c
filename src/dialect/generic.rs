use crate::{
    column::{TypeDef, standard_column},
    dialect::Overlay,
};

/// ANSI flavored defaults, close to PostgreSQL without its extensions.
pub(crate) fn overlay() -> Overlay {
    Overlay {
        escape: '"',
        operators: Vec::new(),
        types: vec![
            ("id", TypeDef::new("integer")),
            ("serial", TypeDef::new("serial").serial()),
            ("string", TypeDef::new("varchar").length(255)),
            ("text", TypeDef::new("text")),
            ("integer", TypeDef::new("integer")),
            ("boolean", TypeDef::new("boolean")),
            ("float", TypeDef::new("real")),
            ("decimal", TypeDef::new("numeric").precision(2)),
            ("date", TypeDef::new("date")),
            ("time", TypeDef::new("time")),
            ("datetime", TypeDef::new("timestamp")),
            ("binary", TypeDef::new("blob")),
        ],
        maps: vec![
            ("blob", "binary", None),
            ("boolean", "boolean", None),
            ("char", "string", None),
            ("date", "date", None),
            ("integer", "integer", None),
            ("numeric", "decimal", None),
            ("real", "float", None),
            ("serial", "serial", None),
            ("text", "text", None),
            ("time", "time", None),
            ("timestamp", "datetime", None),
            ("varchar", "string", None),
        ],
        meta: Vec::new(),
        constraints: Vec::new(),
        locks: vec![("update", "FOR UPDATE")],
        column: standard_column,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        column::{Field, MapOptions},
        dialect::Dialect,
    };

    #[test]
    fn test_columns() {
        let dialect = Dialect::generic();
        assert_eq!("\"id\" serial NOT NULL", dialect.column(Field::new("id").ty("serial")).unwrap());
        assert_eq!("\"body\" text", dialect.column(Field::new("body").ty("text")).unwrap());
        assert_eq!("\"data\" blob", dialect.column(Field::new("data").ty("binary")).unwrap());
    }

    #[test]
    fn test_mapped() {
        let dialect = Dialect::generic();
        assert_eq!("datetime", dialect.mapped("timestamp", &MapOptions::new()));
        assert_eq!("string", dialect.mapped("json", &MapOptions::new()));
    }

    #[test]
    fn test_share_lock_unsupported() {
        assert!(Dialect::generic().lock_clause("share").is_err());
    }
}
