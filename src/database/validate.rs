use std::collections::HashSet;

use crate::constants::{
    MAX_AMOUNT, MAX_COOKING_TIME, MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_SLUG_LEN, MAX_TEXT_LEN,
    MAX_USERNAME_LEN, MIN_AMOUNT, MIN_COOKING_TIME, RESERVED_USERNAMES,
};
use crate::error::TypeError;
use crate::schema::RecipeDraft;

pub fn validate_username(username: &str) -> Result<(), TypeError> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(TypeError::new("`username` must be 1-150 characters"));
    }
    if RESERVED_USERNAMES.contains(&username) {
        return Err(TypeError::new("This username is already taken"));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
    {
        return Err(TypeError::new(
            "`username` may only contain letters, digits and .@+-_",
        ));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), TypeError> {
    if email.is_empty() || email.chars().count() > MAX_EMAIL_LEN {
        return Err(TypeError::new("`email` must be 1-254 characters"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(TypeError::new("`email` is not a valid address")),
    }
}

pub fn validate_display_name(field: &str, value: &str) -> Result<(), TypeError> {
    if value.is_empty() || value.chars().count() > MAX_USERNAME_LEN {
        return Err(TypeError::new(&format!(
            "`{field}` must be 1-150 characters"
        )));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), TypeError> {
    if password.chars().count() < 8 {
        return Err(TypeError::new("`password` must be at least 8 characters"));
    }

    Ok(())
}

pub fn validate_tag(name: &str, slug: &str) -> Result<(), TypeError> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(TypeError::new("`name` must be 1-200 characters"));
    }
    if slug.is_empty() || slug.chars().count() > MAX_SLUG_LEN {
        return Err(TypeError::new("`slug` must be 1-200 characters"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_'))
    {
        return Err(TypeError::new(
            "`slug` may only contain lowercase letters, digits, - and _",
        ));
    }

    Ok(())
}

pub fn validate_ingredient(name: &str, measurement_unit: &str) -> Result<(), TypeError> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(TypeError::new("`name` must be 1-200 characters"));
    }
    if measurement_unit.is_empty() || measurement_unit.chars().count() > MAX_NAME_LEN {
        return Err(TypeError::new(
            "`measurement_unit` must be 1-200 characters",
        ));
    }

    Ok(())
}

pub fn validate_cooking_time(cooking_time: i32) -> Result<(), TypeError> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&cooking_time) {
        return Err(TypeError::new(&format!(
            "`cooking_time` must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME}"
        )));
    }

    Ok(())
}

pub fn validate_amount(amount: i32) -> Result<(), TypeError> {
    if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&amount) {
        return Err(TypeError::new(&format!(
            "`amount` must be between {MIN_AMOUNT} and {MAX_AMOUNT}"
        )));
    }

    Ok(())
}

fn has_duplicates<I, T>(items: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: std::hash::Hash + Eq,
{
    let mut seen = HashSet::new();
    items.into_iter().any(|item| !seen.insert(item))
}

/// Full create/update check for a recipe payload. A recipe must always carry
/// at least one tag and one ingredient, with no duplicate references.
pub fn validate_recipe_draft(draft: &RecipeDraft) -> Result<(), TypeError> {
    if draft.name.is_empty() || draft.name.chars().count() > MAX_NAME_LEN {
        return Err(TypeError::new("`name` must be 1-200 characters"));
    }
    if draft.text.is_empty() || draft.text.chars().count() > MAX_TEXT_LEN {
        return Err(TypeError::new("`text` must be 1-10000 characters"));
    }
    validate_cooking_time(draft.cooking_time)?;

    if draft.tags.is_empty() {
        return Err(TypeError::new("`tags` must not be empty"));
    }
    if has_duplicates(draft.tags.iter()) {
        return Err(TypeError::new("`tags` contains duplicate ids"));
    }

    if draft.ingredients.is_empty() {
        return Err(TypeError::new("`ingredients` must not be empty"));
    }
    if has_duplicates(draft.ingredients.iter().map(|part| part.id)) {
        return Err(TypeError::new("`ingredients` contains duplicate ids"));
    }
    for part in &draft.ingredients {
        validate_amount(part.amount)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IngredientAmount;

    fn draft() -> RecipeDraft {
        RecipeDraft {
            name: String::from("Pancakes"),
            text: String::from("Mix and fry."),
            cooking_time: 20,
            image: Some(String::from("data:image/png;base64,AA==")),
            tags: vec![1, 2],
            ingredients: vec![
                IngredientAmount { id: 1, amount: 100 },
                IngredientAmount { id: 2, amount: 50 },
            ],
        }
    }

    #[test]
    fn accepts_minimal_valid_draft() {
        assert!(validate_recipe_draft(&draft()).is_ok());
    }

    #[test]
    fn rejects_cooking_time_outside_bounds() {
        let mut d = draft();
        d.cooking_time = 0;
        assert!(validate_recipe_draft(&d).is_err());
        d.cooking_time = -10;
        assert!(validate_recipe_draft(&d).is_err());
        d.cooking_time = MAX_COOKING_TIME + 1;
        assert!(validate_recipe_draft(&d).is_err());
        d.cooking_time = MAX_COOKING_TIME;
        assert!(validate_recipe_draft(&d).is_ok());
    }

    #[test]
    fn rejects_empty_or_duplicate_tags() {
        let mut d = draft();
        d.tags = vec![];
        assert!(validate_recipe_draft(&d).is_err());
        d.tags = vec![1, 1];
        assert!(validate_recipe_draft(&d).is_err());
    }

    #[test]
    fn rejects_empty_or_duplicate_ingredients() {
        let mut d = draft();
        d.ingredients = vec![];
        assert!(validate_recipe_draft(&d).is_err());
        d.ingredients = vec![
            IngredientAmount { id: 1, amount: 10 },
            IngredientAmount { id: 1, amount: 20 },
        ];
        assert!(validate_recipe_draft(&d).is_err());
    }

    #[test]
    fn rejects_out_of_range_amounts() {
        let mut d = draft();
        d.ingredients = vec![IngredientAmount { id: 1, amount: 0 }];
        assert!(validate_recipe_draft(&d).is_err());
        d.ingredients = vec![IngredientAmount {
            id: 1,
            amount: MAX_AMOUNT + 1,
        }];
        assert!(validate_recipe_draft(&d).is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("chef_julia").is_ok());
        assert!(validate_username("me").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username("bad name").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn tag_slug_rules() {
        assert!(validate_tag("Breakfast", "breakfast").is_ok());
        assert!(validate_tag("Breakfast", "Break Fast").is_err());
        assert!(validate_tag("", "breakfast").is_err());
    }
}
