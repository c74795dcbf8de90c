use smol_str::SmolStr;
use thiserror::Error;

/// Result type used across the crate.
pub type Result<T, E = SqlError> = std::result::Result<T, E>;

/// Every failure raised while rendering SQL.
///
/// Errors are raised where they are detected; nothing is retried and no
/// partial output is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    /// A statement was rendered before being bound to a dialect.
    #[error("missing SQL dialect adapter")]
    MissingDialect,

    /// The statement factory was asked for a kind it does not know.
    #[error("unsupported statement `{0}`")]
    UnsupportedStatementKind(SmolStr),

    /// A logical column type is not registered.
    #[error("column type `{0}` does not exist")]
    UnknownColumnType(SmolStr),

    /// A column definition has no name.
    #[error("missing column name")]
    MissingColumnName,

    /// An operator token is neither registered nor a function call.
    #[error("unknown operator `{0}`")]
    UnknownOperator(SmolStr),

    /// A formatter token is not registered.
    #[error("unknown formatter `{0}`")]
    UnknownFormatter(SmolStr),

    /// A constraint kind has no template for the active dialect, or its
    /// template uses an unknown placeholder.
    #[error("invalid constraint template `{0}`")]
    InvalidConstraintTemplate(SmolStr),

    /// A constraint was declared without a type.
    #[error("missing constraint type")]
    MissingConstraintType,

    /// A statement lacks a clause it cannot be rendered without.
    #[error("invalid `{statement}` statement, missing `{clause}` clause")]
    MissingRequiredClause {
        statement: &'static str,
        clause: &'static str,
    },

    /// A row lock mode the dialect does not support.
    #[error("invalid lock mode `{0}`")]
    InvalidLockMode(SmolStr),

    /// An operator received an operand count its builder cannot render.
    #[error("operator `{operator}` expects {expected} operands, got {found}")]
    InvalidOperands {
        operator: SmolStr,
        expected: usize,
        found: usize,
    },

    /// An `INSERT` row whose columns differ from those of the first row.
    #[error("row {row} of `INSERT` does not match the columns of the first row")]
    MismatchedRow { row: usize },

    /// A formatter received a value it cannot render.
    #[error("formatter `{formatter}` cannot render a {found} value")]
    InvalidValue {
        formatter: SmolStr,
        found: &'static str,
    },
}

impl SqlError {
    pub fn missing_clause(statement: &'static str, clause: &'static str) -> Self {
        Self::MissingRequiredClause { statement, clause }
    }

    pub fn unknown_operator(token: impl Into<SmolStr>) -> Self {
        Self::UnknownOperator(token.into())
    }

    pub fn unknown_formatter(token: impl Into<SmolStr>) -> Self {
        Self::UnknownFormatter(token.into())
    }

    pub fn unknown_column_type(name: impl Into<SmolStr>) -> Self {
        Self::UnknownColumnType(name.into())
    }

    pub fn invalid_operands(operator: impl Into<SmolStr>, expected: usize, found: usize) -> Self {
        Self::InvalidOperands {
            operator: operator.into(),
            expected,
            found,
        }
    }

    /// Returns `true` for errors caused by an incomplete statement.
    pub fn is_missing_clause(&self) -> bool {
        matches!(self, Self::MissingRequiredClause { .. })
    }

    /// Returns `true` for errors caused by dialect configuration lookups.
    pub fn is_unknown_registration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedStatementKind(_)
                | Self::UnknownColumnType(_)
                | Self::UnknownOperator(_)
                | Self::UnknownFormatter(_)
                | Self::InvalidConstraintTemplate(_)
                | Self::InvalidLockMode(_)
        )
    }
}
