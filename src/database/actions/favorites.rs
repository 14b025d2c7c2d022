use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    schema::Uuid,
};

pub async fn is_favorite(id: Uuid, user_id: Uuid, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    let result: Option<(i32,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM user_favorites WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

pub async fn list_favorite_ids(user_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<Uuid>, ApiError> {
    let rows: Vec<(i32,)> = sqlx::query_as("SELECT recipe_id FROM user_favorites WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

/// Membership adds ride on the unique (user, recipe) constraint: a second
/// writer loses the insert and reports a conflict.
pub async fn add_to_favorites(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("INSERT INTO user_favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING *;")
        .bind(user_id)
        .bind(id)
        .execute(pool).await.map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::Conflict(String::from(
            "Recipe is already in favorites",
        )));
    }

    Ok(())
}

pub async fn remove_from_favorites(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::Conflict(String::from(
            "Recipe is not in favorites",
        )));
    }

    Ok(())
}
