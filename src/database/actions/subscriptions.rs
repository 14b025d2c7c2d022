use sqlx::{Pool, Postgres};

use crate::{
    constants::USER_COUNT_PER_PAGE,
    error::{ApiError, QueryError},
    pagination::PageContext,
    schema::{UserRow, Uuid},
};

use super::get_user_by_id;

pub async fn is_subscribed(
    subscriber_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(i32,)> = sqlx::query_as(
        "
        SELECT author_id FROM user_subscriptions WHERE subscriber_id = $1 AND author_id = $2
    ",
    )
    .bind(subscriber_id)
    .bind(author_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

/// Follows another user's recipe feed. Subscribing to yourself is rejected
/// before any existence check; a duplicate pair is a conflict.
pub async fn subscribe(
    subscriber_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if subscriber_id == author_id {
        return Err(ApiError::InvalidRequest(String::from(
            "You cannot subscribe to yourself",
        )));
    }

    let author = get_user_by_id(pool, author_id).await?;
    if author.is_none() {
        return Err(ApiError::NotFound(String::from(
            "No user exists with specified id",
        )));
    }

    let result = sqlx::query("INSERT INTO user_subscriptions (subscriber_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING *;")
        .bind(subscriber_id)
        .bind(author_id)
        .execute(pool).await.map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::Conflict(String::from(
            "You are already subscribed to this user",
        )));
    }

    Ok(())
}

pub async fn unsubscribe(
    subscriber_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if subscriber_id == author_id {
        return Err(ApiError::InvalidRequest(String::from(
            "You cannot subscribe to yourself",
        )));
    }

    let result =
        sqlx::query("DELETE FROM user_subscriptions WHERE subscriber_id = $1 AND author_id = $2")
            .bind(subscriber_id)
            .bind(author_id)
            .execute(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::Conflict(String::from(
            "You are not subscribed to this user",
        )));
    }

    Ok(())
}

/// Paginated authors the given user follows.
pub async fn fetch_subscriptions(
    subscriber_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserRow>, ApiError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*, COUNT(uu) OVER()
        FROM user_subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        LEFT JOIN users uu ON uu.id = u.id
        WHERE s.subscriber_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(subscriber_id)
    .bind(USER_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, USER_COUNT_PER_PAGE, offset);
    Ok(page)
}
