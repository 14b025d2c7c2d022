use serde::Deserialize;
use serde_json::json;
use sqlx::{Pool, Postgres};
use warp::{http::StatusCode, reject::Rejection, reply::Reply};

use crate::{
    actions,
    authentication::permissions::ActionType,
    error::ApiError,
    form::{Form, FormData},
    jwt::{JwtSessionData, SessionData},
    media::MediaStore,
    schema::UserView,
    validate,
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub offset: Option<i64>,
}

pub async fn signup(data: FormData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);
    let email = form.get_str("email").map_err(ApiError::rejection)?;
    let username = form.get_str("username").map_err(ApiError::rejection)?;
    let first_name = form.get_str("first_name").map_err(ApiError::rejection)?;
    let last_name = form.get_str("last_name").map_err(ApiError::rejection)?;
    let password = form.get_str("password").map_err(ApiError::rejection)?;

    validate::validate_email(&email).map_err(|e| e.rejection())?;
    validate::validate_username(&username).map_err(|e| e.rejection())?;
    validate::validate_display_name("first_name", &first_name).map_err(|e| e.rejection())?;
    validate::validate_display_name("last_name", &last_name).map_err(|e| e.rejection())?;
    validate::validate_password(&password).map_err(|e| e.rejection())?;

    let id = actions::register_user(&email, &username, &first_name, &last_name, &password, &pool)
        .await
        .map_err(ApiError::rejection)?;

    let user = actions::get_user_by_id(&pool, id)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::InternalServerError(String::from("Registered user is missing")).rejection()
        })?;

    Ok(warp::reply::with_status(
        warp::reply::json(&UserView::from_user(user, false)),
        StatusCode::CREATED,
    ))
}

pub async fn login(
    data: FormData,
    secret: String,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);
    let email = form.get_str("email").map_err(ApiError::rejection)?;
    let password = form.get_str("password").map_err(ApiError::rejection)?;

    let token = actions::login_user(&email, &password, &secret, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::json(&json!({ "auth_token": token })))
}

/// Sessions are stateless; logout only acknowledges a valid token.
pub async fn logout(_session: JwtSessionData) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn me(session: JwtSessionData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let user = actions::get_user_by_id(&pool, session.user_id)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::InvalidSession(String::from("Session user no longer exists")).rejection()
        })?;

    Ok(warp::reply::json(&UserView::from_user(user, false)))
}

pub async fn update_me(
    session: JwtSessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageOwnProfile)
        .map_err(ApiError::rejection)?;

    let form = Form::from_data(data);
    let email = form.get_str("email").map_err(ApiError::rejection)?;
    let username = form.get_str("username").map_err(ApiError::rejection)?;
    let first_name = form.get_str("first_name").map_err(ApiError::rejection)?;
    let last_name = form.get_str("last_name").map_err(ApiError::rejection)?;

    validate::validate_email(&email).map_err(|e| e.rejection())?;
    validate::validate_username(&username).map_err(|e| e.rejection())?;
    validate::validate_display_name("first_name", &first_name).map_err(|e| e.rejection())?;
    validate::validate_display_name("last_name", &last_name).map_err(|e| e.rejection())?;

    actions::update_profile(
        session.user_id,
        &email,
        &username,
        &first_name,
        &last_name,
        &pool,
    )
    .await
    .map_err(ApiError::rejection)?;

    let user = actions::get_user_by_id(&pool, session.user_id)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::InvalidSession(String::from("Session user no longer exists")).rejection()
        })?;

    Ok(warp::reply::json(&UserView::from_user(user, false)))
}

pub async fn delete_me(
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageOwnProfile)
        .map_err(ApiError::rejection)?;

    actions::delete_user(session.user_id, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn list_users(query: PageQuery, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let page = actions::fetch_users(query.offset.unwrap_or(0), &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::json(&page))
}

pub async fn get_user_detail(
    id: i32,
    session: Option<JwtSessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_user_by_id(&pool, id)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::NotFound(String::from("No user exists with specified id")).rejection()
        })?;

    let is_subscribed = match session {
        Some(session) => actions::is_subscribed(session.user_id, id, &pool)
            .await
            .map_err(ApiError::rejection)?,
        None => false,
    };

    Ok(warp::reply::json(&UserView::from_user(user, is_subscribed)))
}

pub async fn put_avatar(
    session: JwtSessionData,
    data: FormData,
    media: MediaStore,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);
    let payload = form.get_str("avatar").map_err(ApiError::rejection)?;

    let avatar = media
        .store_image(&payload, "avatars")
        .await
        .map_err(ApiError::rejection)?;

    actions::set_avatar(session.user_id, &avatar, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::json(&json!({ "avatar": avatar })))
}

pub async fn delete_avatar(
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    actions::clear_avatar(session.user_id, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn subscribe(
    id: i32,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageOwnSubscriptions)
        .map_err(ApiError::rejection)?;

    actions::subscribe(session.user_id, id, &pool)
        .await
        .map_err(ApiError::rejection)?;

    let author = actions::get_user_by_id(&pool, id)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::NotFound(String::from("No user exists with specified id")).rejection()
        })?;

    Ok(warp::reply::with_status(
        warp::reply::json(&UserView::from_user(author, true)),
        StatusCode::CREATED,
    ))
}

pub async fn unsubscribe(
    id: i32,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageOwnSubscriptions)
        .map_err(ApiError::rejection)?;

    actions::unsubscribe(session.user_id, id, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn subscriptions(
    session: JwtSessionData,
    query: PageQuery,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let page = actions::fetch_subscriptions(session.user_id, query.offset.unwrap_or(0), &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::json(&page))
}
