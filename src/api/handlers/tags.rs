use sqlx::{Pool, Postgres};
use warp::{http::StatusCode, reject::Rejection, reply::Reply};

use crate::{
    actions,
    authentication::permissions::ActionType,
    error::ApiError,
    form::{Form, FormData},
    jwt::{JwtSessionData, SessionData},
    validate,
};

pub async fn list_tags(pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let tags = actions::list_tags(&pool).await.map_err(ApiError::rejection)?;

    Ok(warp::reply::json(&tags))
}

pub async fn get_tag(id: i32, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let tag = actions::get_tag(id, &pool)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::NotFound(String::from("No tag exists with specified id")).rejection()
        })?;

    Ok(warp::reply::json(&tag))
}

pub async fn create_tag(
    session: JwtSessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageTags)
        .map_err(ApiError::rejection)?;

    let form = Form::from_data(data);
    let name = form.get_str("name").map_err(ApiError::rejection)?;
    let slug = form.get_str("slug").map_err(ApiError::rejection)?;
    validate::validate_tag(&name, &slug).map_err(|e| e.rejection())?;

    let id = actions::create_tag(&name, &slug, &pool)
        .await
        .map_err(ApiError::rejection)?;
    let tag = actions::get_tag(id, &pool)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::InternalServerError(String::from("Created tag is missing")).rejection()
        })?;

    Ok(warp::reply::with_status(
        warp::reply::json(&tag),
        StatusCode::CREATED,
    ))
}

pub async fn update_tag(
    id: i32,
    session: JwtSessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageTags)
        .map_err(ApiError::rejection)?;

    let form = Form::from_data(data);
    let name = form.get_str("name").map_err(ApiError::rejection)?;
    let slug = form.get_str("slug").map_err(ApiError::rejection)?;
    validate::validate_tag(&name, &slug).map_err(|e| e.rejection())?;

    actions::update_tag(id, &name, &slug, &pool)
        .await
        .map_err(ApiError::rejection)?;
    let tag = actions::get_tag(id, &pool)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::InternalServerError(String::from("Updated tag is missing")).rejection()
        })?;

    Ok(warp::reply::json(&tag))
}

pub async fn delete_tag(
    id: i32,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageTags)
        .map_err(ApiError::rejection)?;

    actions::delete_tag(id, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}
