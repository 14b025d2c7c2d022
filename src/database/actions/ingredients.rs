use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    schema::{Ingredient, Uuid},
};

/// Name search tries a prefix match first and falls back to a substring
/// match when nothing starts with the term.
pub async fn list_ingredients(
    search: Option<String>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let search = match search {
        Some(search) if !search.is_empty() => search,
        _ => {
            let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY id")
                .fetch_all(pool)
                .await
                .map_err(|e| QueryError::from(e).into())?;
            return Ok(rows);
        }
    };

    let rows: Vec<Ingredient> =
        sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY id")
            .bind(format!("{search}%"))
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    if !rows.is_empty() {
        return Ok(rows);
    }

    let rows: Vec<Ingredient> =
        sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY id")
            .bind(format!("%{search}%"))
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub async fn get_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn find_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<Uuid>, ApiError> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT id FROM ingredients WHERE LOWER(name) = LOWER($1) AND measurement_unit = $2",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|r| r.0))
}

pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    let id: Option<(i32,)> = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING RETURNING id;
    ",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    match id {
        Some(id) => Ok(id.0),
        None => Err(ApiError::Conflict(String::from(
            "An ingredient with this name and unit already exists",
        ))),
    }
}

pub async fn update_ingredient(
    id: Uuid,
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("UPDATE ingredients SET name = $1, measurement_unit = $2 WHERE id = $3")
        .bind(name)
        .bind(measurement_unit)
        .bind(id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound(String::from(
            "No ingredient exists with specified id",
        )));
    }

    Ok(())
}

pub async fn delete_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound(String::from(
            "No ingredient exists with specified id",
        )));
    }

    Ok(())
}
