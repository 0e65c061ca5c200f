//! Parameterized statement assembly.
//!
//! `SqlFragment` mirrors a query builder: raw SQL is pushed verbatim,
//! identifiers are quoted, and literal values are bound as parameters so no
//! user-supplied text is ever spliced into SQL. Fragments compose by
//! appending; placeholders are numbered only when the final `Statement` is
//! rendered, so parameter order always follows text order.

use std::fmt;

use crate::domain::schema::Placeholder;

/// A value bound to, or returned from, a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Real(value) if value.fract() == 0.0 => Some(*value as i64),
            Self::Text(value) => value.parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value),
            Self::Integer(value) => Some(value.to_string()),
            Self::Real(value) => Some(value.to_string()),
            Self::Null => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Sql(String),
    Bind(SqlValue),
}

/// Composable SQL text with bound values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pieces: Vec<Piece>,
}

impl SqlFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fragment with raw SQL.
    pub fn sql(text: impl Into<String>) -> Self {
        let mut fragment = Self::new();
        fragment.push(text);
        fragment
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Append raw SQL. Never pass user input here.
    pub fn push(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }
        match self.pieces.last_mut() {
            Some(Piece::Sql(last)) => last.push_str(&text),
            _ => self.pieces.push(Piece::Sql(text)),
        }
        self
    }

    /// Append a double-quoted identifier.
    pub fn push_ident(&mut self, name: &str) -> &mut Self {
        self.push(quote_ident(name))
    }

    /// Append `alias."column"`.
    pub fn push_column(&mut self, alias: &str, column: &str) -> &mut Self {
        self.push(format!("{alias}.{}", quote_ident(column)))
    }

    /// Append a parameter marker bound to `value`.
    pub fn push_bind(&mut self, value: impl Into<SqlValue>) -> &mut Self {
        self.pieces.push(Piece::Bind(value.into()));
        self
    }

    /// Append another fragment, keeping its bound values in order.
    pub fn push_fragment(&mut self, other: &SqlFragment) -> &mut Self {
        for piece in &other.pieces {
            match piece {
                Piece::Sql(text) => {
                    self.push(text.clone());
                }
                Piece::Bind(value) => {
                    self.push_bind(value.clone());
                }
            }
        }
        self
    }

    /// Render markers in the given style.
    pub fn build(&self, placeholders: Placeholder) -> Statement {
        let mut sql = String::new();
        let mut params = Vec::new();

        for piece in &self.pieces {
            match piece {
                Piece::Sql(text) => sql.push_str(text),
                Piece::Bind(value) => {
                    params.push(value.clone());
                    match placeholders {
                        Placeholder::Question => sql.push('?'),
                        Placeholder::Dollar => {
                            sql.push('$');
                            sql.push_str(&params.len().to_string());
                        }
                    }
                }
            }
        }

        Statement { sql, params }
    }
}

/// A rendered statement ready for a `QueryExecutor`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Quote an identifier for standard SQL, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
