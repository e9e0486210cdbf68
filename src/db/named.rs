//! Named-parameter statements.
//!
//! MySQL only understands positional `?` placeholders. Statements in this
//! service are written with `:name` placeholders instead; `NamedQuery`
//! rewrites them to `?` and remembers the order so values can be bound by
//! name.

use sqlx::{
    mysql::{MySql, MySqlArguments},
    query::Query,
};

use crate::error::AppError;

/// A value bound to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

/// SQL ready for execution plus the parameter order it expects.
#[derive(Debug, Clone)]
pub struct NamedQuery {
    sql: String,
    names: Vec<String>,
}

impl NamedQuery {
    /// Rewrite every `:name` placeholder to `?`.
    ///
    /// Text inside `'...'`, `"..."` and `` `...` `` is copied verbatim, and
    /// `::` is never treated as a placeholder.
    pub fn compile(sql: &str) -> Self {
        let mut out = String::with_capacity(sql.len());
        let mut names = Vec::new();
        let mut chars = sql.chars().peekable();
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            if let Some(open) = quote {
                out.push(c);
                if c == '\\' && open != '`' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == open {
                    quote = None;
                }
                continue;
            }

            match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    out.push(c);
                }
                ':' if chars.peek() == Some(&':') => {
                    chars.next();
                    out.push_str("::");
                }
                ':' => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        let valid = if name.is_empty() {
                            next.is_ascii_alphabetic() || next == '_'
                        } else {
                            next.is_ascii_alphanumeric() || next == '_'
                        };
                        if !valid {
                            break;
                        }
                        name.push(next);
                        chars.next();
                    }

                    if name.is_empty() {
                        out.push(':');
                    } else {
                        out.push('?');
                        names.push(name);
                    }
                }
                _ => out.push(c),
            }
        }

        Self {
            sql: out,
            names,
        }
    }

    #[cfg(test)]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[cfg(test)]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Build a sqlx query with `params` bound in placeholder order.
    ///
    /// # Errors
    ///
    /// `AppError::Statement` if a placeholder has no matching parameter.
    pub fn bind<'q>(
        &'q self,
        params: &[(&str, ParamValue)],
    ) -> Result<Query<'q, MySql, MySqlArguments>, AppError> {
        let mut query = sqlx::query(&self.sql);

        for name in &self.names {
            let value = params
                .iter()
                .find(|(key, _)| *key == name.as_str())
                .map(|(_, value)| value.clone())
                .ok_or_else(|| AppError::Statement(format!("no value bound for `:{name}`")))?;
            query = match value {
                ParamValue::Int(v) => query.bind(v),
                ParamValue::Text(v) => query.bind(v),
            };
        }

        Ok(query)
    }
}
