use std::convert::Infallible;

use serde::Serialize;
use warp::{http::StatusCode, reject::Rejection, reply::Reply};

use crate::error::ApiError;

#[derive(Serialize)]
struct ErrorBody {
    errors: String,
}

/// Terminal rejection handler: everything a route refuses comes out as a
/// JSON `{"errors": ...}` body with a matching status code.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found"))
    } else if let Some(e) = err.find::<ApiError>() {
        (e.status(), e.to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, String::from("Invalid query string"))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            String::from("Method not allowed"),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, String::from("Payload too large"))
    } else {
        log::error!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error"),
        )
    };

    let json = warp::reply::json(&ErrorBody { errors: message });
    Ok(warp::reply::with_status(json, code))
}
