use std::convert::Infallible;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::{
    config::Config,
    error::{ApiError, QueryError},
    form::FormData,
    media::MediaStore,
    middleware::{with_possible_session, with_session},
    rejection::handle_rejection,
};

use super::handlers;

fn with_pool(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (Pool<Postgres>,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

fn with_media(media: MediaStore) -> impl Filter<Extract = (MediaStore,), Error = Infallible> + Clone {
    warp::any().map(move || media.clone())
}

fn with_secret(secret: String) -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    warp::any().map(move || secret.clone())
}

fn json_body() -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::body::content_length_limit(1024 * 1024 * 8).and(warp::body::json())
}

fn auth_routes(
    pool: Pool<Postgres>,
    jwt_secret: String,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let signup = warp::path!("api" / "auth" / "signup")
        .and(warp::post())
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(handlers::users::signup);

    let login = warp::path!("api" / "auth" / "token" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with_secret(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::users::login);

    let logout = warp::path!("api" / "auth" / "token" / "logout")
        .and(warp::post())
        .and(with_session(jwt_secret))
        .and_then(handlers::users::logout);

    signup.or(login).or(logout)
}

fn user_routes(
    pool: Pool<Postgres>,
    media: MediaStore,
    jwt_secret: String,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let me = warp::path!("api" / "users" / "me")
        .and(warp::get())
        .and(with_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::users::me);

    let update_me = warp::path!("api" / "users" / "me")
        .and(warp::put())
        .and(with_session(jwt_secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(handlers::users::update_me);

    let delete_me = warp::path!("api" / "users" / "me")
        .and(warp::delete())
        .and(with_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::users::delete_me);

    let put_avatar = warp::path!("api" / "users" / "me" / "avatar")
        .and(warp::put())
        .and(with_session(jwt_secret.clone()))
        .and(json_body())
        .and(with_media(media))
        .and(with_pool(pool.clone()))
        .and_then(handlers::users::put_avatar);

    let delete_avatar = warp::path!("api" / "users" / "me" / "avatar")
        .and(warp::delete())
        .and(with_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::users::delete_avatar);

    let subscriptions = warp::path!("api" / "users" / "subscriptions")
        .and(warp::get())
        .and(with_session(jwt_secret.clone()))
        .and(warp::query::<handlers::users::PageQuery>())
        .and(with_pool(pool.clone()))
        .and_then(handlers::users::subscriptions);

    let subscribe = warp::path!("api" / "users" / i32 / "subscribe")
        .and(warp::post())
        .and(with_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::users::subscribe);

    let unsubscribe = warp::path!("api" / "users" / i32 / "subscribe")
        .and(warp::delete())
        .and(with_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::users::unsubscribe);

    let list_users = warp::path!("api" / "users")
        .and(warp::get())
        .and(warp::query::<handlers::users::PageQuery>())
        .and(with_pool(pool.clone()))
        .and_then(handlers::users::list_users);

    let get_user = warp::path!("api" / "users" / i32)
        .and(warp::get())
        .and(with_possible_session(jwt_secret))
        .and(with_pool(pool))
        .and_then(handlers::users::get_user_detail);

    me.or(update_me)
        .or(delete_me)
        .or(put_avatar)
        .or(delete_avatar)
        .or(subscriptions)
        .or(subscribe)
        .or(unsubscribe)
        .or(list_users)
        .or(get_user)
}

fn tag_routes(
    pool: Pool<Postgres>,
    jwt_secret: String,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path!("api" / "tags")
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(handlers::tags::list_tags);

    let get = warp::path!("api" / "tags" / i32)
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(handlers::tags::get_tag);

    let create = warp::path!("api" / "tags")
        .and(warp::post())
        .and(with_session(jwt_secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(handlers::tags::create_tag);

    let update = warp::path!("api" / "tags" / i32)
        .and(warp::patch())
        .and(with_session(jwt_secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(handlers::tags::update_tag);

    let delete = warp::path!("api" / "tags" / i32)
        .and(warp::delete())
        .and(with_session(jwt_secret))
        .and(with_pool(pool))
        .and_then(handlers::tags::delete_tag);

    list.or(get).or(create).or(update).or(delete)
}

fn ingredient_routes(
    pool: Pool<Postgres>,
    jwt_secret: String,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path!("api" / "ingredients")
        .and(warp::get())
        .and(warp::query::<handlers::ingredients::IngredientQuery>())
        .and(with_pool(pool.clone()))
        .and_then(handlers::ingredients::list_ingredients);

    let get = warp::path!("api" / "ingredients" / i32)
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(handlers::ingredients::get_ingredient);

    let create = warp::path!("api" / "ingredients")
        .and(warp::post())
        .and(with_session(jwt_secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(handlers::ingredients::create_ingredient);

    let update = warp::path!("api" / "ingredients" / i32)
        .and(warp::patch())
        .and(with_session(jwt_secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(handlers::ingredients::update_ingredient);

    let delete = warp::path!("api" / "ingredients" / i32)
        .and(warp::delete())
        .and(with_session(jwt_secret))
        .and(with_pool(pool))
        .and_then(handlers::ingredients::delete_ingredient);

    list.or(get).or(create).or(update).or(delete)
}

fn recipe_routes(
    pool: Pool<Postgres>,
    media: MediaStore,
    jwt_secret: String,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let download = warp::path!("api" / "recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::recipes::download_shopping_cart);

    let list = warp::path!("api" / "recipes")
        .and(warp::get())
        .and(warp::query::<handlers::recipes::RecipeListQuery>())
        .and(with_possible_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::recipes::list_recipes);

    let get = warp::path!("api" / "recipes" / i32)
        .and(warp::get())
        .and(with_possible_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::recipes::get_recipe_detail);

    let create = warp::path!("api" / "recipes")
        .and(warp::post())
        .and(with_session(jwt_secret.clone()))
        .and(json_body())
        .and(with_media(media.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::recipes::create_recipe);

    let update = warp::path!("api" / "recipes" / i32)
        .and(warp::patch())
        .and(with_session(jwt_secret.clone()))
        .and(json_body())
        .and(with_media(media))
        .and(with_pool(pool.clone()))
        .and_then(handlers::recipes::update_recipe);

    let delete = warp::path!("api" / "recipes" / i32)
        .and(warp::delete())
        .and(with_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::recipes::delete_recipe);

    let add_favorite = warp::path!("api" / "recipes" / i32 / "favorite")
        .and(warp::post())
        .and(with_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::recipes::add_favorite);

    let remove_favorite = warp::path!("api" / "recipes" / i32 / "favorite")
        .and(warp::delete())
        .and(with_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::recipes::remove_favorite);

    let add_to_cart = warp::path!("api" / "recipes" / i32 / "shopping_cart")
        .and(warp::post())
        .and(with_session(jwt_secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::recipes::add_to_cart);

    let remove_from_cart = warp::path!("api" / "recipes" / i32 / "shopping_cart")
        .and(warp::delete())
        .and(with_session(jwt_secret))
        .and(with_pool(pool.clone()))
        .and_then(handlers::recipes::remove_from_cart);

    let get_link = warp::path!("api" / "recipes" / i32 / "get-link")
        .and(warp::get())
        .and(with_pool(pool))
        .and_then(handlers::recipes::get_link);

    let resolve_link = warp::path!("s" / String)
        .and(warp::get())
        .and_then(handlers::recipes::resolve_link);

    download
        .or(list)
        .or(get)
        .or(create)
        .or(update)
        .or(delete)
        .or(add_favorite)
        .or(remove_favorite)
        .or(add_to_cart)
        .or(remove_from_cart)
        .or(get_link)
        .or(resolve_link)
}

/// The full route tree. Mount with a `recover(handle_rejection)` tail, or
/// use [`serve`] which does the wiring.
pub fn routes(
    pool: Pool<Postgres>,
    media: MediaStore,
    jwt_secret: String,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    auth_routes(pool.clone(), jwt_secret.clone())
        .or(user_routes(pool.clone(), media.clone(), jwt_secret.clone()))
        .or(tag_routes(pool.clone(), jwt_secret.clone()))
        .or(ingredient_routes(pool.clone(), jwt_secret.clone()))
        .or(recipe_routes(pool, media, jwt_secret))
}

pub async fn serve(config: Config) -> Result<(), ApiError> {
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await
        .map_err(|e| -> ApiError { QueryError::from(e).into() })?;

    let media = MediaStore::new(config.media_root.clone());
    let api = routes(pool, media, config.jwt_secret.clone()).recover(handle_rejection);

    log::info!("listening on {}", config.bind_addr);
    warp::serve(api).run(config.bind_addr).await;

    Ok(())
}
