use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    authentication::permissions::ActionType,
    constants::RECIPE_COUNT_PER_PAGE,
    error::{ApiError, QueryError},
    jwt::SessionData,
    pagination::PageContext,
    schema::{Recipe, RecipeDraft, RecipeOrder, RecipePart, RecipeRow, Uuid},
    validate::validate_recipe_draft,
};

#[derive(Debug, Default)]
pub struct RecipeFilters {
    pub author: Option<Uuid>,
    pub tag_slug: Option<String>,
    pub search: Option<String>,
    pub favorited_by: Option<Uuid>,
    pub in_cart_of: Option<Uuid>,
    pub order: Option<RecipeOrder>,
    pub offset: i64,
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Resolves a recipe for mutation: the session must hold the manage-own
/// permission, and anyone who is not the author needs the manage-all one.
pub async fn get_recipe_mut(
    id: Uuid,
    session: SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(ApiError::Unauthorized(String::from(
                        "You can only manage your own recipes",
                    )))
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(ApiError::NotFound(String::from(
            "No recipe exists with specified id",
        ))),
    }
}

pub async fn list_recipe_parts(
    pool: &Pool<Postgres>,
    recipe_id: Uuid,
) -> Result<Vec<RecipePart>, ApiError> {
    let rows: Vec<RecipePart> = sqlx::query_as("
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, ri.amount AS amount, i.name AS name, i.measurement_unit AS measurement_unit
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ")
    .bind(recipe_id)
    .fetch_all(pool).await.map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub async fn fetch_recipes(
    filters: RecipeFilters,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let order = filters
        .order
        .map(|order| match order {
            RecipeOrder::Alphabetical => "r.name",
            RecipeOrder::PubDateAsc => "r.pub_date",
            RecipeOrder::PubDateDesc => "r.pub_date DESC",
            RecipeOrder::CookingTimeAsc => "r.cooking_time",
            RecipeOrder::CookingTimeDesc => "r.cooking_time DESC",
        })
        .unwrap_or("r.pub_date DESC");

    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT r.*, COUNT(rr) OVER() FROM recipes r LEFT JOIN recipes rr ON rr.id = r.id WHERE TRUE",
    );

    if let Some(author) = filters.author {
        query_builder.push(" AND r.author_id = ").push_bind(author);
    }
    if let Some(search) = filters.search {
        query_builder
            .push(" AND r.name ILIKE ")
            .push_bind(format!("{search}%"));
    }
    if let Some(slug) = filters.tag_slug {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM recipe_tags_map m INNER JOIN recipe_tags t ON t.id = m.tag_id WHERE m.recipe_id = r.id AND t.slug = ")
            .push_bind(slug)
            .push(")");
    }
    if let Some(user_id) = filters.favorited_by {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM user_favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(user_id) = filters.in_cart_of {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM user_shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ")
            .push_bind(user_id)
            .push(")");
    }

    query_builder
        .push(" ORDER BY ")
        .push(order)
        .push(" LIMIT ")
        .push_bind(RECIPE_COUNT_PER_PAGE)
        .push(" OFFSET ")
        .push_bind(filters.offset);

    let rows: Vec<RecipeRow> = query_builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, filters.offset);
    Ok(page)
}

/// Creates a recipe and its tag/ingredient links in one transaction. The
/// draft must already carry the stored image path.
pub async fn create_recipe(
    draft: &RecipeDraft,
    author_id: Uuid,
    image: &str,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    validate_recipe_draft(draft).map_err(|e| -> ApiError { e.into() })?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    let id: (i32,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, cooking_time, image)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&draft.name)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .bind(image)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    insert_recipe_links(&mut tr, id.0, draft).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(id.0)
}

/// Updates the recipe record and fully replaces its tag and ingredient
/// links. Passing a new image path swaps the stored image reference.
pub async fn update_recipe(
    id: Uuid,
    draft: &RecipeDraft,
    image: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    validate_recipe_draft(draft).map_err(|e| -> ApiError { e.into() })?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    match image {
        Some(image) => {
            sqlx::query(
                "UPDATE recipes SET name = $1, text = $2, cooking_time = $3, image = $4 WHERE id = $5",
            )
            .bind(&draft.name)
            .bind(&draft.text)
            .bind(draft.cooking_time)
            .bind(image)
            .bind(id)
            .execute(&mut *tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
        }
        None => {
            sqlx::query("UPDATE recipes SET name = $1, text = $2, cooking_time = $3 WHERE id = $4")
                .bind(&draft.name)
                .bind(&draft.text)
                .bind(draft.cooking_time)
                .bind(id)
                .execute(&mut *tr)
                .await
                .map_err(|e| QueryError::from(e).into())?;
        }
    }

    sqlx::query("DELETE FROM recipe_tags_map WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    insert_recipe_links(&mut tr, id, draft).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(())
}

async fn insert_recipe_links(
    tr: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    draft: &RecipeDraft,
) -> Result<(), ApiError> {
    for tag_id in &draft.tags {
        let tag: Option<(i32,)> = sqlx::query_as("SELECT id FROM recipe_tags WHERE id = $1")
            .bind(tag_id)
            .fetch_optional(&mut **tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
        if tag.is_none() {
            return Err(ApiError::NotFound(format!(
                "No tag exists with id {tag_id}"
            )));
        }

        sqlx::query(
            "INSERT INTO recipe_tags_map (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(recipe_id)
        .bind(tag_id)
        .execute(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    }

    for part in &draft.ingredients {
        let ingredient: Option<(i32,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = $1")
            .bind(part.id)
            .fetch_optional(&mut **tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
        if ingredient.is_none() {
            return Err(ApiError::NotFound(format!(
                "No ingredient exists with id {}",
                part.id
            )));
        }

        sqlx::query(
            "
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
            VALUES ($1, $2, $3)
            ON CONFLICT (recipe_id, ingredient_id) DO UPDATE
            SET amount = $3;
        ",
        )
        .bind(recipe_id)
        .bind(part.id)
        .bind(part.amount)
        .execute(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    }

    Ok(())
}

pub async fn delete_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    sqlx::query("DELETE FROM recipe_tags_map WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    sqlx::query("DELETE FROM user_favorites WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    sqlx::query("DELETE FROM user_shopping_cart WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(())
}
