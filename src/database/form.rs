use std::{collections::HashMap, str::FromStr};

use serde_json::Value;

use crate::error::{ApiError, TypeError};

pub type FormData = HashMap<String, Value>;

/// Field-by-field accessor over a JSON request body. Lookups fail with the
/// offending key in the message so clients get field-level errors.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn has(&self, key: &str) -> bool {
        matches!(self.inner.get(key), Some(value) if !value.is_null())
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, ApiError>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| TypeError::new(&format!("Invalid value for field `{key}`")).into()),
            None => Err(TypeError::new(&format!("Missing field `{key}`")).into()),
        }
    }

    pub fn get_number<T>(&self, key: &str) -> Result<T, ApiError>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(Value::Number(value)) => value
                .to_string()
                .parse()
                .map_err(|_e| TypeError::new(&format!("Invalid number in field `{key}`")).into()),
            Some(Value::String(value)) => value
                .parse()
                .map_err(|_e| TypeError::new(&format!("Invalid number in field `{key}`")).into()),
            Some(_) => Err(TypeError::new(&format!("Field `{key}` must be a number")).into()),
            None => Err(TypeError::new(&format!("Missing field `{key}`")).into()),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, ApiError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new(&format!("Field `{key}` must be a string")).into()),
            },
            None => Err(TypeError::new(&format!("Missing field `{key}`")).into()),
        }
    }

    pub fn get_opt_str(&self, key: &str) -> Result<Option<String>, ApiError> {
        match self.inner.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => match value.as_str() {
                Some(v) => Ok(Some(v.to_string())),
                None => Err(TypeError::new(&format!("Field `{key}` must be a string")).into()),
            },
        }
    }

    /// List of plain numeric identifiers, e.g. the `tags` field of a recipe
    /// payload.
    pub fn get_id_list(&self, key: &str) -> Result<Vec<i32>, ApiError> {
        match self.inner.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_i64()
                        .and_then(|id| i32::try_from(id).ok())
                        .ok_or_else(|| {
                            TypeError::new(&format!("Field `{key}` must hold numeric ids")).into()
                        })
                })
                .collect(),
            Some(_) => Err(TypeError::new(&format!("Field `{key}` must be a list")).into()),
            None => Err(TypeError::new(&format!("Missing field `{key}`")).into()),
        }
    }

    /// List of structured entries, e.g. the `ingredients` field of a recipe
    /// payload.
    pub fn get_list<T>(&self, key: &str) -> Result<Vec<T>, ApiError>
    where
        T: TryFrom<Value, Error = TypeError>,
    {
        match self.inner.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| T::try_from(item.to_owned()).map_err(|e| e.into()))
                .collect(),
            Some(_) => Err(TypeError::new(&format!("Field `{key}` must be a list")).into()),
            None => Err(TypeError::new(&format!("Missing field `{key}`")).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IngredientAmount;
    use serde_json::json;

    fn form(value: Value) -> Form {
        Form::from_data(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn reads_strings_and_numbers() {
        let form = form(json!({"name": "Borscht", "cooking_time": 45, "offset": "20"}));

        assert_eq!(form.get_str("name").unwrap(), "Borscht");
        assert_eq!(form.get_number::<i32>("cooking_time").unwrap(), 45);
        assert_eq!(form.get_number::<i64>("offset").unwrap(), 20);
        assert!(form.get_str("missing").is_err());
        assert!(form.get_number::<i32>("name").is_err());
    }

    #[test]
    fn optional_strings_treat_null_as_absent() {
        let form = form(json!({"avatar": null, "image": "data:image/png;base64,AA=="}));

        assert_eq!(form.get_opt_str("avatar").unwrap(), None);
        assert!(form.get_opt_str("image").unwrap().is_some());
        assert_eq!(form.get_opt_str("missing").unwrap(), None);
        assert!(!form.has("avatar"));
        assert!(form.has("image"));
    }

    #[test]
    fn reads_id_and_entry_lists() {
        let form = form(json!({
            "tags": [1, 2, 3],
            "ingredients": [{"id": 7, "amount": 100}],
        }));

        assert_eq!(form.get_id_list("tags").unwrap(), vec![1, 2, 3]);
        let parts: Vec<IngredientAmount> = form.get_list("ingredients").unwrap();
        assert_eq!(parts, vec![IngredientAmount { id: 7, amount: 100 }]);
    }

    #[test]
    fn reads_typed_values() {
        use crate::schema::UserRole;

        let form = form(json!({"role": "admin"}));

        assert_eq!(form.get_value::<UserRole>("role").unwrap(), UserRole::Admin);
        assert!(form.get_value::<UserRole>("missing").is_err());
    }

    #[test]
    fn rejects_malformed_lists() {
        let form = form(json!({"tags": "1,2", "ingredients": [{"id": "x"}]}));

        assert!(form.get_id_list("tags").is_err());
        assert!(form.get_list::<IngredientAmount>("ingredients").is_err());
    }
}
