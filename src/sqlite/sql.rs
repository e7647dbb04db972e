use sqlparser::{
    ast::{self, Statement},
    dialect::SQLiteDialect,
    parser::Parser,
};
use tracing::debug;

use crate::sqlite::error::QueryError;

static DIALECT: SQLiteDialect = SQLiteDialect {};

/// What the read-only guard learned about a query before it reaches the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryShape {
    pub ordered: bool,
    pub limited: bool,
}

impl QueryShape {
    /// A LIMIT without ORDER BY picks an engine-dependent subset of rows.
    pub fn is_nondeterministic(&self) -> bool {
        self.limited && !self.ordered
    }
}

impl TryFrom<&Statement> for QueryShape {
    type Error = QueryError;

    fn try_from(value: &Statement) -> Result<Self, QueryError> {
        match value {
            Statement::Query(q) => Ok(q.as_ref().into()),
            s => Err(QueryError::NotReadOnly {
                statement: s.to_string(),
            }),
        }
    }
}

impl From<&ast::Query> for QueryShape {
    fn from(value: &ast::Query) -> Self {
        QueryShape {
            ordered: !value.order_by.is_empty(),
            limited: value.limit.is_some() || value.fetch.is_some(),
        }
    }
}

/// Classifies `sql` without running it.
///
/// Returns `Ok(None)` when the parser cannot read the text; the engine's own
/// parser is the authority for what it accepts, so such queries still run.
pub fn inspect(sql: &str) -> Result<Option<QueryShape>, QueryError> {
    let mut ast = match Parser::parse_sql(&DIALECT, sql) {
        Ok(ast) => ast,
        Err(e) => {
            debug!(error = %e, "query not understood by sqlparser, deferring to engine");
            return Ok(None);
        }
    };

    match (ast.pop(), ast.pop()) {
        (Some(s), None) => Ok(Some((&s).try_into()?)),
        (None, _) => Err(QueryError::StatementCount { count: 0 }),
        (Some(_), Some(_)) => Err(QueryError::StatementCount {
            count: ast.len() + 2,
        }),
    }
}
