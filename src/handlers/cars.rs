//! Car HTTP handlers.
//!
//! This module implements the car endpoints:
//! - GET /cars - List active cars
//! - POST /cars - Create a car
//! - PUT /cars/{id} - Update an active car
//! - DELETE /cars/{id} - Soft-delete an active car
//!
//! Every handler runs exactly one statement on the request's leased
//! connection. Rows with `deleted_flag = 1` behave as if they do not exist.

use std::sync::LazyLock;

use axum::{
    Json,
    extract::{
        Path,
        rejection::{JsonRejection, PathRejection},
    },
};

use crate::{
    db::{
        DbLease,
        named::{NamedQuery, ParamValue},
    },
    error::AppError,
    models::{
        car::{Car, CarPayload},
        envelope::Envelope,
    },
};

const SELECT_ACTIVE_CARS: &str = r#"
    SELECT id, make, model, year, deleted_flag
    FROM cars
    WHERE deleted_flag = 0
    ORDER BY id
"#;

static INSERT_CAR: LazyLock<NamedQuery> = LazyLock::new(|| {
    NamedQuery::compile("INSERT INTO cars (make, model, year) VALUES (:make, :model, :year)")
});

static SOFT_DELETE_CAR: LazyLock<NamedQuery> = LazyLock::new(|| {
    NamedQuery::compile("UPDATE cars SET deleted_flag = 1 WHERE id = :id AND deleted_flag = 0")
});

static UPDATE_CAR: LazyLock<NamedQuery> = LazyLock::new(|| {
    NamedQuery::compile(
        r#"
        UPDATE cars
        SET make = :make, model = :model, year = :year
        WHERE id = :id AND deleted_flag = 0
        "#,
    )
});

/// List all active cars.
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Cars data retrieved",
///   "data": [
///     { "id": 1, "make": "Honda", "model": "Civic", "year": 2020, "deleted_flag": 0 }
///   ]
/// }
/// ```
pub async fn list_cars(lease: DbLease) -> Result<Json<Envelope<Vec<Car>>>, AppError> {
    let mut conn = lease.lock().await?;

    let cars = sqlx::query_as::<_, Car>(SELECT_ACTIVE_CARS)
        .fetch_all(&mut **conn)
        .await?;

    Ok(Json(Envelope::ok("Cars data retrieved", cars)))
}

/// Create a new car.
///
/// # Request Body
///
/// ```json
/// { "make": "Honda", "model": "Civic", "year": 2020 }
/// ```
///
/// The id is assigned by `AUTO_INCREMENT`; an `id` in the body is ignored.
///
/// # Response
///
/// - **200**: `{ "success": true, "message": "Car successfully created", "data": null }`
/// - **400**: Body is not a valid car payload
/// - **500**: Database error
pub async fn create_car(
    lease: DbLease,
    payload: Result<Json<CarPayload>, JsonRejection>,
) -> Result<Json<Envelope<()>>, AppError> {
    let Json(payload) = payload?;

    let mut conn = lease.lock().await?;
    let result = INSERT_CAR
        .bind(&payload.params())?
        .execute(&mut **conn)
        .await?;

    tracing::info!(
        id = result.last_insert_id(),
        make = %payload.make,
        model = %payload.model,
        "car created"
    );

    Ok(Json(Envelope::acknowledged("Car successfully created")))
}

/// Soft-delete a car by setting its `deleted_flag`.
///
/// Deleting an already-deleted car is reported as not found, so repeating
/// the request changes nothing.
///
/// # Response
///
/// - **200**: `{ "success": true, "message": "Car deleted successfully", "data": null }`
/// - **404**: No active car with this id
/// - **500**: Database error
pub async fn delete_car(
    lease: DbLease,
    id: Result<Path<u32>, PathRejection>,
) -> Result<Json<Envelope<()>>, AppError> {
    let Path(id) = id?;

    let mut conn = lease.lock().await?;
    let affected = SOFT_DELETE_CAR
        .bind(&[("id", ParamValue::Int(i64::from(id)))])?
        .execute(&mut **conn)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(AppError::NotFound("Car"));
    }

    tracing::info!(id, "car soft-deleted");
    Ok(Json(Envelope::acknowledged("Car deleted successfully")))
}

/// Replace the make, model and year of an active car.
///
/// # Response
///
/// - **200**: `{ "success": true, "message": "Car successfully updated", "data": null }`
/// - **400**: Invalid id or body
/// - **404**: No active car with this id
/// - **500**: Database error
pub async fn update_car(
    lease: DbLease,
    id: Result<Path<u32>, PathRejection>,
    payload: Result<Json<CarPayload>, JsonRejection>,
) -> Result<Json<Envelope<()>>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;

    let mut params = payload.params();
    params.push(("id", ParamValue::Int(i64::from(id))));

    let mut conn = lease.lock().await?;
    let affected = UPDATE_CAR
        .bind(&params)?
        .execute(&mut **conn)
        .await?
        .rows_affected();

    // sqlx requests CLIENT_FOUND_ROWS, so an unchanged row still counts
    if affected == 0 {
        return Err(AppError::NotFound("Car"));
    }

    tracing::info!(id, "car updated");
    Ok(Json(Envelope::acknowledged("Car successfully updated")))
}
