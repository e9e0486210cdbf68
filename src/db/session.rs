//! Per-connection session settings.
//!
//! A `SessionConfig` is built once from configuration and applied to every
//! connection when a request leases it, before any handler statement runs.

/// Session settings applied at acquisition time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Value for `SET SESSION sql_mode`
    pub sql_mode: String,

    /// Value for `SET time_zone`, e.g. `-08:00`
    pub time_zone: String,
}

/// One session statement with its single bound value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatement<'a> {
    pub sql: &'static str,
    pub value: &'a str,
}

impl SessionConfig {
    /// Statements to run on a fresh lease, in execution order.
    pub fn statements(&self) -> [SessionStatement<'_>; 2] {
        [
            SessionStatement {
                sql: "SET SESSION sql_mode = ?",
                value: &self.sql_mode,
            },
            SessionStatement {
                sql: "SET time_zone = ?",
                value: &self.time_zone,
            },
        ]
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sql_mode: "TRADITIONAL".to_string(),
            time_zone: "-08:00".to_string(),
        }
    }
}
