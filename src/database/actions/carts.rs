use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, QueryError},
    schema::{RecipePart, ShoppingListRow, Uuid},
};

pub async fn is_in_cart(id: Uuid, user_id: Uuid, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    let result: Option<(i32,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM user_shopping_cart WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

pub async fn list_cart_ids(user_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<Uuid>, ApiError> {
    let rows: Vec<(i32,)> =
        sqlx::query_as("SELECT recipe_id FROM user_shopping_cart WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

pub async fn add_to_cart(id: Uuid, user_id: Uuid, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("INSERT INTO user_shopping_cart (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING *;")
        .bind(user_id)
        .bind(id)
        .execute(pool).await.map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::Conflict(String::from(
            "Recipe is already in the shopping cart",
        )));
    }

    Ok(())
}

pub async fn remove_from_cart(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM user_shopping_cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::Conflict(String::from(
            "Recipe is not in the shopping cart",
        )));
    }

    Ok(())
}

/// Every ingredient line of every recipe in the user's cart, joined with
/// the ingredient it references.
pub async fn list_cart_parts(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipePart>, ApiError> {
    let rows: Vec<RecipePart> = sqlx::query_as("
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, ri.amount AS amount, i.name AS name, i.measurement_unit AS measurement_unit
        FROM user_shopping_cart c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
    ")
    .bind(user_id)
    .fetch_all(pool).await.map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub async fn fetch_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListRow>, ApiError> {
    let parts = list_cart_parts(user_id, pool).await?;

    Ok(aggregate_shopping_list(parts))
}

/// Groups cart rows by ingredient identity and sums their amounts: the same
/// ingredient contributed by two different recipes merges into one line.
/// Lines come out sorted by ingredient name.
pub fn aggregate_shopping_list(parts: Vec<RecipePart>) -> Vec<ShoppingListRow> {
    let mut totals: HashMap<Uuid, ShoppingListRow> = HashMap::new();
    parts
        .into_iter()
        .for_each(|part| match totals.get_mut(&part.ingredient_id) {
            Some(row) => row.total_amount += part.amount as i64,
            None => {
                totals.insert(
                    part.ingredient_id,
                    ShoppingListRow {
                        name: part.name,
                        measurement_unit: part.measurement_unit,
                        total_amount: part.amount as i64,
                    },
                );
            }
        });

    let mut rows: Vec<ShoppingListRow> = totals.into_values().collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

/// Renders aggregated rows as the exported plain-text attachment.
pub fn render_shopping_list(rows: &[ShoppingListRow]) -> String {
    let mut text = String::from("Shopping list:\n\n");
    for row in rows {
        text += &format!("{}: {} {}\n", row.name, row.total_amount, row.measurement_unit);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(recipe_id: Uuid, ingredient_id: Uuid, amount: i32, name: &str, unit: &str) -> RecipePart {
        RecipePart {
            recipe_id,
            ingredient_id,
            amount,
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        }
    }

    #[test]
    fn merges_shared_ingredients_across_recipes() {
        let rows = aggregate_shopping_list(vec![
            part(1, 10, 100, "flour", "g"),
            part(2, 10, 50, "flour", "g"),
            part(2, 11, 2, "egg", "pc"),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "flour");
        assert_eq!(rows[1].total_amount, 150);
        assert_eq!(rows[0].name, "egg");
        assert_eq!(rows[0].total_amount, 2);
    }

    #[test]
    fn keys_on_ingredient_identity_not_row_identity() {
        // same name, different unit -> different ingredient rows
        let rows = aggregate_shopping_list(vec![
            part(1, 10, 100, "sugar", "g"),
            part(2, 12, 3, "sugar", "tbsp"),
        ]);

        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn renders_one_line_per_ingredient() {
        let rows = aggregate_shopping_list(vec![
            part(1, 10, 100, "flour", "g"),
            part(2, 10, 50, "flour", "g"),
        ]);
        let text = render_shopping_list(&rows);

        assert_eq!(text, "Shopping list:\n\nflour: 150 g\n");
    }

    #[test]
    fn renders_header_for_empty_cart() {
        assert_eq!(render_shopping_list(&[]), "Shopping list:\n\n");
    }
}
