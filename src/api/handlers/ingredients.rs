use serde::Deserialize;
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

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

pub async fn list_ingredients(
    query: IngredientQuery,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let rows = actions::list_ingredients(query.name, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::json(&rows))
}

pub async fn get_ingredient(id: i32, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let ingredient = actions::get_ingredient(id, &pool)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::NotFound(String::from("No ingredient exists with specified id")).rejection()
        })?;

    Ok(warp::reply::json(&ingredient))
}

pub async fn create_ingredient(
    session: JwtSessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageIngredients)
        .map_err(ApiError::rejection)?;

    let form = Form::from_data(data);
    let name = form.get_str("name").map_err(ApiError::rejection)?;
    let measurement_unit = form.get_str("measurement_unit").map_err(ApiError::rejection)?;
    validate::validate_ingredient(&name, &measurement_unit).map_err(|e| e.rejection())?;

    let id = actions::create_ingredient(&name, &measurement_unit, &pool)
        .await
        .map_err(ApiError::rejection)?;
    let ingredient = actions::get_ingredient(id, &pool)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::InternalServerError(String::from("Created ingredient is missing")).rejection()
        })?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ingredient),
        StatusCode::CREATED,
    ))
}

pub async fn update_ingredient(
    id: i32,
    session: JwtSessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageIngredients)
        .map_err(ApiError::rejection)?;

    let form = Form::from_data(data);
    let name = form.get_str("name").map_err(ApiError::rejection)?;
    let measurement_unit = form.get_str("measurement_unit").map_err(ApiError::rejection)?;
    validate::validate_ingredient(&name, &measurement_unit).map_err(|e| e.rejection())?;

    actions::update_ingredient(id, &name, &measurement_unit, &pool)
        .await
        .map_err(ApiError::rejection)?;
    let ingredient = actions::get_ingredient(id, &pool)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::InternalServerError(String::from("Updated ingredient is missing")).rejection()
        })?;

    Ok(warp::reply::json(&ingredient))
}

pub async fn delete_ingredient(
    id: i32,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageIngredients)
        .map_err(ApiError::rejection)?;

    actions::delete_ingredient(id, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}
