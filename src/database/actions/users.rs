use sqlx::{Pool, Postgres};

use crate::{
    authentication::cryptography::{hash_password, verify_password},
    authentication::jwt::generate_jwt_session,
    constants::USER_COUNT_PER_PAGE,
    error::{ApiError, QueryError},
    pagination::PageContext,
    schema::{User, UserRow, Uuid},
};

pub async fn get_user(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Creates a user; the password is hashed before it reaches the database.
/// A taken email or username surfaces as a conflict.
pub async fn register_user(
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    let password = hash_password(password)
        .map_err(|_e| ApiError::InternalServerError(String::from("Failed to hash password")))?;

    let id: Option<(i32,)> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING id;
    ",
    )
    .bind(email)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(password)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    match id {
        Some(id) => Ok(id.0),
        None => Err(ApiError::Conflict(String::from(
            "A user with this email or username already exists",
        ))),
    }
}

pub async fn login_user(
    email: &str,
    password: &str,
    secret: &str,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = get_user_by_email(pool, email).await?;
    let user = match user {
        Some(user) => user,
        None => return Err(ApiError::InvalidRequest(String::from("Invalid credentials"))),
    };

    let authenticated = verify_password(password, &user.password)
        .map_err(|_e| ApiError::InternalServerError(String::from("Failed to verify password")))?;
    if !authenticated {
        return Err(ApiError::InvalidRequest(String::from("Invalid credentials")));
    }

    generate_jwt_session(&user, secret)
}

pub async fn fetch_users(
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserRow>, ApiError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*, COUNT(uu) OVER()
        FROM users u
        LEFT JOIN users uu ON uu.id = u.id
        ORDER BY u.username
        LIMIT $1 OFFSET $2
    ",
    )
    .bind(USER_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, USER_COUNT_PER_PAGE, offset);
    Ok(page)
}

/// Full profile update. A taken email or username surfaces as a conflict
/// through the unique-violation mapping.
pub async fn update_profile(
    id: Uuid,
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    sqlx::query(
        "UPDATE users SET email = $1, username = $2, first_name = $3, last_name = $4 WHERE id = $5",
    )
    .bind(email)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(id)
    .execute(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn set_avatar(id: Uuid, avatar: &str, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    sqlx::query("UPDATE users SET avatar = $1 WHERE id = $2")
        .bind(avatar)
        .bind(id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn clear_avatar(id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    sqlx::query("UPDATE users SET avatar = NULL WHERE id = $1")
        .bind(id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

/// Deletes an account. Recipes, memberships and subscriptions follow through
/// the cascading foreign keys.
pub async fn delete_user(id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound(String::from(
            "No user exists with specified id",
        )));
    }

    Ok(())
}
