use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::SESSION_LIFETIME_HOURS;
use crate::database::schema::User;
use crate::error::ApiError;
use crate::schema::UserRole;

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub username: String,
    pub user_uid: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: i32, username: String, uid: UserRole) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self {
            user_id: id,
            username,
            user_uid: uid,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    pub user_uid: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(ApiError::Unauthorized(String::from(
                "You don't have permission to perform this action",
            )));
        }
        Ok(())
    }
}

impl Into<SessionData> for JwtSessionData {
    fn into(self) -> SessionData {
        SessionData {
            username: self.username,
            user_id: self.user_id,
            is_admin: self.user_uid == UserRole::Admin,
            user_uid: self.user_uid,
        }
    }
}

fn signing_key(secret: &str) -> Result<Hmac<Sha256>, ApiError> {
    Hmac::new_from_slice(secret.as_bytes())
        .map_err(|_e| ApiError::InternalServerError(String::from("Invalid signing key")))
}

pub fn generate_jwt_session(user: &User, secret: &str) -> Result<String, ApiError> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.uid.to_owned());

    claims
        .sign_with_key(&key)
        .map_err(|_e| ApiError::InternalServerError(String::from("Failed to sign session token")))
}

pub fn verify_jwt_session(token: String, secret: &str) -> Result<JwtSessionData, ApiError> {
    let key = signing_key(secret)?;

    token
        .verify_with_key(&key)
        .map_err(|_| ApiError::InvalidSession(String::from("Invalid session; Invalid token")))
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(ApiError::InvalidSession(String::from(
                    "Invalid session; Token expired",
                )));
            }
            return Ok(session);
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: String::from("Julia"),
            last_name: String::from("Child"),
            avatar: None,
            password: String::from("<hash>"),
            uid: UserRole::User,
        }
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let token = generate_jwt_session(&user(), "test-secret").unwrap();
        let session = verify_jwt_session(token, "test-secret").unwrap();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "cook");
        assert_eq!(session.user_uid, UserRole::User);
    }

    #[test]
    fn verification_fails_with_wrong_secret() {
        let token = generate_jwt_session(&user(), "test-secret").unwrap();

        assert!(verify_jwt_session(token, "other-secret").is_err());
    }

    #[test]
    fn session_data_marks_admins() {
        let mut u = user();
        u.uid = UserRole::Admin;
        let session: SessionData = JwtSessionData::new(u.id, u.username, u.uid).into();

        assert!(session.is_admin);
    }
}
