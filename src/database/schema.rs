use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl TryFrom<Value> for UserRole {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "user" => Ok(Self::User),
                "admin" => Ok(Self::Admin),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, PartialOrd, Serialize, Eq, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecipeOrder {
    Alphabetical,
    PubDateAsc,
    PubDateDesc,
    CookingTimeAsc,
    CookingTimeDesc,
}

impl TryFrom<Value> for RecipeOrder {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "alphabetical" => Ok(Self::Alphabetical),
                "pub_date_asc" => Ok(Self::PubDateAsc),
                "pub_date_desc" => Ok(Self::PubDateDesc),
                "cooking_time_asc" => Ok(Self::CookingTimeAsc),
                "cooking_time_desc" => Ok(Self::CookingTimeDesc),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub password: String,
    pub uid: UserRole,
}

/// Public projection of [`User`]; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn from_user(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar: user.avatar,
            is_subscribed,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeTag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub pub_date: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub pub_date: DateTime<Utc>,

    pub count: i64,
}

/// One ingredient line of a recipe, joined with the ingredient it points at.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipePart {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub amount: i32,
    pub name: String,
    pub measurement_unit: String,
}

/// Aggregated shopping-list line: one row per distinct ingredient across
/// every recipe in the requesting user's cart.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct ShoppingListRow {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

impl TryFrom<Value> for IngredientAmount {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let id = value
            .get("id")
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok())
            .ok_or(TypeError::new("Ingredient entry is missing a numeric id"))?;
        let amount = value
            .get("amount")
            .and_then(Value::as_i64)
            .and_then(|amount| i32::try_from(amount).ok())
            .ok_or(TypeError::new("Ingredient entry is missing a numeric amount"))?;

        Ok(Self { id, amount })
    }
}

/// Parsed create/update payload for a recipe, before validation.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ingredient_amount_parses_from_json_object() {
        let part = IngredientAmount::try_from(json!({"id": 3, "amount": 100})).unwrap();
        assert_eq!(part, IngredientAmount { id: 3, amount: 100 });
    }

    #[test]
    fn ingredient_amount_rejects_missing_fields() {
        assert!(IngredientAmount::try_from(json!({"id": 3})).is_err());
        assert!(IngredientAmount::try_from(json!({"amount": 5})).is_err());
        assert!(IngredientAmount::try_from(json!("3,5")).is_err());
    }

    #[test]
    fn recipe_order_parses_known_keys() {
        assert_eq!(
            RecipeOrder::try_from(json!("pub_date_desc")).unwrap(),
            RecipeOrder::PubDateDesc
        );
        assert!(RecipeOrder::try_from(json!("favorites_desc")).is_err());
    }
}
