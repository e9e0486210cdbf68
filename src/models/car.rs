//! Car data models and API request types.
//!
//! This module defines:
//! - `Car`: Database entity representing a row of the `cars` table
//! - `CarPayload`: Request body for creating and updating cars

use serde::{Deserialize, Serialize};

use crate::db::named::ParamValue;

/// Represents a car record from the database.
///
/// # Database Table
///
/// Maps to the `cars` table. Rows are never physically removed; a soft
/// delete sets `deleted_flag` to 1 and the row drops out of list results.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Car {
    /// Assigned by `AUTO_INCREMENT`, never changed afterwards
    pub id: u32,

    pub make: String,

    pub model: String,

    pub year: i32,

    /// 0 = active, 1 = soft-deleted
    pub deleted_flag: i8,
}

/// Request body for creating or updating a car.
///
/// # JSON Example
///
/// ```json
/// {
///   "make": "Honda",
///   "model": "Civic",
///   "year": 2020
/// }
/// ```
///
/// Any `id` in the body is ignored; ids come from the database on insert
/// and from the URL path on update.
#[derive(Debug, Clone, Deserialize)]
pub struct CarPayload {
    pub make: String,
    pub model: String,
    pub year: i32,
}

impl CarPayload {
    /// Named statement parameters for the payload's columns.
    pub fn params(&self) -> Vec<(&'static str, ParamValue)> {
        vec![
            ("make", ParamValue::Text(self.make.clone())),
            ("model", ParamValue::Text(self.model.clone())),
            ("year", ParamValue::Int(i64::from(self.year))),
        ]
    }
}
