use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    schema::{RecipeTag, Uuid},
};

pub async fn create_tag(name: &str, slug: &str, pool: &Pool<Postgres>) -> Result<Uuid, ApiError> {
    let id: Option<(i32,)> = sqlx::query_as(
        "INSERT INTO recipe_tags (name, slug) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING id",
    )
    .bind(name)
    .bind(slug)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    match id {
        Some(id) => Ok(id.0),
        None => Err(ApiError::Conflict(String::from(
            "A tag with this slug already exists",
        ))),
    }
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<RecipeTag>, ApiError> {
    let row: Option<RecipeTag> = sqlx::query_as("SELECT * FROM recipe_tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn find_tag(slug: &str, pool: &Pool<Postgres>) -> Result<Option<Uuid>, ApiError> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM recipe_tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|tag| tag.0))
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<RecipeTag>, ApiError> {
    let list: Vec<RecipeTag> = sqlx::query_as("SELECT * FROM recipe_tags ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn update_tag(
    id: Uuid,
    name: &str,
    slug: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("UPDATE recipe_tags SET name = $1, slug = $2 WHERE id = $3")
        .bind(name)
        .bind(slug)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound(String::from(
            "No tag exists with specified id",
        )));
    }

    Ok(())
}

pub async fn delete_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM recipe_tags WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound(String::from(
            "No tag exists with specified id",
        )));
    }

    Ok(())
}

pub async fn list_recipe_tags(
    pool: &Pool<Postgres>,
    recipe_id: Uuid,
) -> Result<Vec<RecipeTag>, ApiError> {
    let list: Vec<RecipeTag> = sqlx::query_as(
        "
        SELECT t.id, t.name, t.slug
        FROM recipe_tags_map m
        INNER JOIN recipe_tags t ON t.id = m.tag_id
        WHERE m.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}
