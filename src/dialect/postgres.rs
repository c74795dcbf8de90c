use crate::{
    column::{TypeDef, standard_column},
    constraint::{MetaDef, MetaScope},
    dialect::Overlay,
    operator::{self, BuilderKind::Set},
};

pub(crate) fn overlay() -> Overlay {
    Overlay {
        escape: '"',
        operators: vec![
            (":regexp", operator::format("%s ~ %s")),
            (":regexpi", operator::format("%s ~* %s")),
            (":not regexp", operator::format("%s !~ %s")),
            (":not regexpi", operator::format("%s !~* %s")),
            (":square root", operator::format("|/ %s")),
            (":cube root", operator::format("||/ %s")),
            (":fact", operator::format("!! %s")),
            ("|/", operator::format("|/ %s")),
            ("||/", operator::format("||/ %s")),
            ("!!", operator::format("!! %s")),
            (":concat", operator::format("%s || %s")),
            (":pow", operator::format("%s ^ %s")),
            ("@", operator::format("@ %s")),
            (":union", operator::with(Set)),
            (":union all", operator::with(Set)),
            (":except", operator::with(Set)),
            (":except all", operator::with(Set)),
            (":intersect", operator::with(Set)),
            (":intersect all", operator::with(Set)),
        ],
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
            ("binary", TypeDef::new("bytea")),
        ],
        maps: vec![
            ("bit", "string", None),
            ("bool", "boolean", None),
            ("boolean", "boolean", None),
            ("box", "string", None),
            ("bytea", "binary", None),
            ("char", "string", None),
            ("character", "string", None),
            ("character varying", "string", None),
            ("cidr", "string", None),
            ("circle", "string", None),
            ("date", "date", None),
            ("decimal", "string", None),
            ("float4", "float", None),
            ("float8", "float", None),
            ("inet", "string", None),
            ("int2", "integer", None),
            ("int4", "integer", None),
            ("int8", "integer", None),
            ("integer", "integer", None),
            ("json", "string", None),
            ("lseg", "string", None),
            ("line", "string", None),
            ("macaddr", "string", None),
            ("numeric", "decimal", None),
            ("path", "string", None),
            ("polygon", "string", None),
            ("real", "float", None),
            ("serial", "serial", None),
            ("string", "string", None),
            ("text", "string", None),
            ("time", "time", None),
            ("time with time zone", "time", None),
            ("time without time zone", "time", None),
            ("timestamp", "datetime", None),
            ("timestamp with time zone", "datetime", None),
            ("timestamp without time zone", "datetime", None),
            ("timestamptz", "datetime", None),
            ("tsquery", "string", None),
            ("tsvector", "string", None),
            ("txid_snapshot", "string", None),
            ("uuid", "string", None),
            ("varbit", "string", None),
            ("varchar", "string", None),
            ("xml", "string", None),
        ],
        meta: vec![
            (MetaScope::Column, "collate", MetaDef::new("COLLATE")),
            (MetaScope::Table, "tablespace", MetaDef::new("TABLESPACE")),
        ],
        constraints: Vec::new(),
        locks: vec![
            ("update", "FOR UPDATE"),
            ("share", "FOR SHARE"),
            ("no key update", "FOR NO KEY UPDATE"),
            ("key share", "FOR KEY SHARE"),
        ],
        column: standard_column,
    }
}
