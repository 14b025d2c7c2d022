use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{Pool, Postgres};
use warp::{http::StatusCode, http::Uri, reject::Rejection, reply::Reply};

use crate::{
    actions,
    actions::RecipeFilters,
    authentication::permissions::ActionType,
    error::ApiError,
    form::{Form, FormData},
    jwt::{JwtSessionData, SessionData},
    media::MediaStore,
    pagination::PageContext,
    schema::{Recipe, RecipeDraft, RecipeOrder, RecipeRow, RecipeTag, UserView, Uuid},
    shortlink::{decode_recipe_token, encode_recipe_token},
};

#[derive(Debug, Deserialize)]
pub struct RecipeListQuery {
    pub offset: Option<i64>,
    pub author: Option<i32>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub order: Option<String>,
    pub is_favorited: Option<u8>,
    pub is_in_shopping_cart: Option<u8>,
}

#[derive(Debug, Serialize)]
struct RecipeListItem {
    id: Uuid,
    author_id: Uuid,
    name: String,
    text: String,
    cooking_time: i32,
    image: String,
    pub_date: DateTime<Utc>,
    is_favorited: bool,
    is_in_shopping_cart: bool,
}

impl RecipeListItem {
    fn from_row(row: RecipeRow, favorites: &HashSet<Uuid>, cart: &HashSet<Uuid>) -> Self {
        Self {
            is_favorited: favorites.contains(&row.id),
            is_in_shopping_cart: cart.contains(&row.id),
            id: row.id,
            author_id: row.author_id,
            name: row.name,
            text: row.text,
            cooking_time: row.cooking_time,
            image: row.image,
            pub_date: row.pub_date,
        }
    }
}

#[derive(Debug, Serialize)]
struct RecipeIngredientView {
    id: Uuid,
    name: String,
    measurement_unit: String,
    amount: i32,
}

#[derive(Debug, Serialize)]
struct RecipeDetail {
    id: Uuid,
    author: UserView,
    name: String,
    text: String,
    cooking_time: i32,
    image: String,
    pub_date: DateTime<Utc>,
    tags: Vec<RecipeTag>,
    ingredients: Vec<RecipeIngredientView>,
    is_favorited: bool,
    is_in_shopping_cart: bool,
}

/// Compact recipe view used by the favorite/cart toggle responses.
#[derive(Debug, Serialize)]
struct RecipeShort {
    id: Uuid,
    name: String,
    image: String,
    cooking_time: i32,
}

impl From<Recipe> for RecipeShort {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

async fn recipe_detail(
    recipe: Recipe,
    user_id: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, ApiError> {
    let author = actions::get_user_by_id(pool, recipe.author_id)
        .await?
        .ok_or_else(|| ApiError::InternalServerError(String::from("Recipe author is missing")))?;

    let is_subscribed = match user_id {
        Some(user_id) => actions::is_subscribed(user_id, author.id, pool).await?,
        None => false,
    };
    let (is_favorited, is_in_shopping_cart) = match user_id {
        Some(user_id) => (
            actions::is_favorite(recipe.id, user_id, pool).await?,
            actions::is_in_cart(recipe.id, user_id, pool).await?,
        ),
        None => (false, false),
    };

    let tags = actions::list_recipe_tags(pool, recipe.id).await?;
    let ingredients = actions::list_recipe_parts(pool, recipe.id)
        .await?
        .into_iter()
        .map(|part| RecipeIngredientView {
            id: part.ingredient_id,
            name: part.name,
            measurement_unit: part.measurement_unit,
            amount: part.amount,
        })
        .collect();

    Ok(RecipeDetail {
        id: recipe.id,
        author: UserView::from_user(author, is_subscribed),
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        image: recipe.image,
        pub_date: recipe.pub_date,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    })
}

fn parse_draft(form: &Form) -> Result<RecipeDraft, Rejection> {
    Ok(RecipeDraft {
        name: form.get_str("name").map_err(ApiError::rejection)?,
        text: form.get_str("text").map_err(ApiError::rejection)?,
        cooking_time: form.get_number("cooking_time").map_err(ApiError::rejection)?,
        image: form.get_opt_str("image").map_err(ApiError::rejection)?,
        tags: form.get_id_list("tags").map_err(ApiError::rejection)?,
        ingredients: form.get_list("ingredients").map_err(ApiError::rejection)?,
    })
}

pub async fn list_recipes(
    query: RecipeListQuery,
    session: Option<JwtSessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let order = match query.order {
        Some(raw) => Some(RecipeOrder::try_from(Value::String(raw)).map_err(|e| e.rejection())?),
        None => None,
    };

    let user_id = session.map(|session| session.user_id);
    let filters = RecipeFilters {
        author: query.author,
        tag_slug: query.tag,
        search: query.search,
        favorited_by: user_id.filter(|_| query.is_favorited.unwrap_or(0) != 0),
        in_cart_of: user_id.filter(|_| query.is_in_shopping_cart.unwrap_or(0) != 0),
        order,
        offset: query.offset.unwrap_or(0),
    };

    let page = actions::fetch_recipes(filters, &pool)
        .await
        .map_err(ApiError::rejection)?;

    let (favorites, cart) = match user_id {
        Some(user_id) => (
            actions::list_favorite_ids(user_id, &pool)
                .await
                .map_err(ApiError::rejection)?
                .into_iter()
                .collect::<HashSet<_>>(),
            actions::list_cart_ids(user_id, &pool)
                .await
                .map_err(ApiError::rejection)?
                .into_iter()
                .collect::<HashSet<_>>(),
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    let page = PageContext {
        rows: page
            .rows
            .into_iter()
            .map(|row| RecipeListItem::from_row(row, &favorites, &cart))
            .collect(),
        total_rows: page.total_rows,
        next_offset: page.next_offset,
        prev_offset: page.prev_offset,
        page_list: page.page_list,
        message: page.message,
    };

    Ok(warp::reply::json(&page))
}

pub async fn get_recipe_detail(
    id: i32,
    session: Option<JwtSessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = actions::get_recipe(id, &pool)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::NotFound(String::from("No recipe exists with specified id")).rejection()
        })?;

    let detail = recipe_detail(recipe, session.map(|s| s.user_id), &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::json(&detail))
}

pub async fn create_recipe(
    session: JwtSessionData,
    data: FormData,
    media: MediaStore,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::CreateRecipes)
        .map_err(ApiError::rejection)?;

    let form = Form::from_data(data);
    let draft = parse_draft(&form)?;

    // validate before the image touches disk
    crate::validate::validate_recipe_draft(&draft).map_err(|e| e.rejection())?;

    let payload = draft.image.as_deref().ok_or_else(|| {
        ApiError::InvalidRequest(String::from("Missing field `image`")).rejection()
    })?;
    let image = media
        .store_image(payload, "recipes")
        .await
        .map_err(ApiError::rejection)?;

    let id = actions::create_recipe(&draft, session.user_id, &image, &pool)
        .await
        .map_err(ApiError::rejection)?;

    let recipe = actions::get_recipe(id, &pool)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::InternalServerError(String::from("Created recipe is missing")).rejection()
        })?;
    let detail = recipe_detail(recipe, Some(session.user_id), &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&detail),
        StatusCode::CREATED,
    ))
}

pub async fn update_recipe(
    id: i32,
    session: JwtSessionData,
    data: FormData,
    media: MediaStore,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    let recipe = actions::get_recipe_mut(id, session.clone(), &pool)
        .await
        .map_err(ApiError::rejection)?;

    let form = Form::from_data(data);
    let draft = parse_draft(&form)?;
    crate::validate::validate_recipe_draft(&draft).map_err(|e| e.rejection())?;

    let image = match draft.image.as_deref() {
        Some(payload) => Some(
            media
                .store_image(payload, "recipes")
                .await
                .map_err(ApiError::rejection)?,
        ),
        None => None,
    };

    actions::update_recipe(recipe.id, &draft, image.as_deref(), &pool)
        .await
        .map_err(ApiError::rejection)?;

    let recipe = actions::get_recipe(id, &pool)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::InternalServerError(String::from("Updated recipe is missing")).rejection()
        })?;
    let detail = recipe_detail(recipe, Some(session.user_id), &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::json(&detail))
}

pub async fn delete_recipe(
    id: i32,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    let recipe = actions::get_recipe_mut(id, session, &pool)
        .await
        .map_err(ApiError::rejection)?;

    actions::delete_recipe(recipe.id, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

async fn existing_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Recipe, Rejection> {
    actions::get_recipe(id, pool)
        .await
        .map_err(ApiError::rejection)?
        .ok_or_else(|| {
            ApiError::NotFound(String::from("No recipe exists with specified id")).rejection()
        })
}

pub async fn add_favorite(
    id: i32,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = existing_recipe(id, &pool).await?;
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageOwnFavorites)
        .map_err(ApiError::rejection)?;

    actions::add_to_favorites(id, session.user_id, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&RecipeShort::from(recipe)),
        StatusCode::CREATED,
    ))
}

pub async fn remove_favorite(
    id: i32,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    existing_recipe(id, &pool).await?;
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageOwnFavorites)
        .map_err(ApiError::rejection)?;

    actions::remove_from_favorites(id, session.user_id, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn add_to_cart(
    id: i32,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = existing_recipe(id, &pool).await?;
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageOwnCart)
        .map_err(ApiError::rejection)?;

    actions::add_to_cart(id, session.user_id, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&RecipeShort::from(recipe)),
        StatusCode::CREATED,
    ))
}

pub async fn remove_from_cart(
    id: i32,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    existing_recipe(id, &pool).await?;
    let session: SessionData = session.into();
    session
        .authenticate(ActionType::ManageOwnCart)
        .map_err(ApiError::rejection)?;

    actions::remove_from_cart(id, session.user_id, &pool)
        .await
        .map_err(ApiError::rejection)?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn download_shopping_cart(
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let rows = actions::fetch_shopping_list(session.user_id, &pool)
        .await
        .map_err(ApiError::rejection)?;
    let text = actions::render_shopping_list(&rows);

    let reply = warp::reply::with_header(text, "content-type", "text/plain; charset=utf-8");
    let reply = warp::reply::with_header(
        reply,
        "content-disposition",
        "attachment; filename=\"shopping_list.txt\"",
    );

    Ok(reply)
}

pub async fn get_link(id: i32, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    existing_recipe(id, &pool).await?;

    Ok(warp::reply::json(&json!({
        "short-link": format!("/s/{}", encode_recipe_token(id)),
    })))
}

/// `/s/{token}` — decodes the base-16 token and redirects to the canonical
/// recipe path. No lookup is needed: the token encodes the id itself.
pub async fn resolve_link(token: String) -> Result<impl Reply, Rejection> {
    let id = decode_recipe_token(&token).map_err(|e| e.rejection())?;

    let uri = format!("/recipes/{id}/").parse::<Uri>().map_err(|_e| {
        ApiError::InternalServerError(String::from("Failed to build redirect uri")).rejection()
    })?;

    Ok(warp::redirect::temporary(uri))
}
