use warp::{reject::Rejection, Filter};

use crate::error::ApiError;

use super::jwt::{verify_jwt_session, JwtSessionData};

fn header_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Token ")
        .or_else(|| header.strip_prefix("Bearer "))
}

pub fn with_session(
    secret: String,
) -> impl Filter<Extract = (JwtSessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let secret = secret.clone();
        async move {
            let token = header.as_deref().and_then(header_token).ok_or_else(|| {
                ApiError::InvalidSession(String::from("Missing session token")).rejection()
            })?;

            verify_jwt_session(token.to_string(), &secret).map_err(|e| e.rejection())
        }
    })
}

pub fn with_possible_session(
    secret: String,
) -> impl Filter<Extract = (Option<JwtSessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let secret = secret.clone();
        async move {
            let session = header
                .as_deref()
                .and_then(header_token)
                .and_then(|token| verify_jwt_session(token.to_string(), &secret).ok());

            Ok::<_, Rejection>(session)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_token_and_bearer_prefixes() {
        assert_eq!(header_token("Token abc.def"), Some("abc.def"));
        assert_eq!(header_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(header_token("Basic abc"), None);
    }
}
