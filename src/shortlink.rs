use crate::constants::SHORT_LINK_BASE;
use crate::error::TypeError;
use crate::schema::Uuid;

/// Encodes a recipe id as a compact base-16 token for `/s/{token}` links.
/// The mapping is a bijection on the id space, so no collision bookkeeping
/// is needed.
pub fn encode_recipe_token(id: Uuid) -> String {
    format!("{id:x}")
}

/// Parses a short-link token back into the recipe id it encodes.
pub fn decode_recipe_token(token: &str) -> Result<Uuid, TypeError> {
    Uuid::from_str_radix(token, SHORT_LINK_BASE)
        .map_err(|_e| TypeError::new("Invalid short link token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_as_lowercase_hex() {
        assert_eq!(encode_recipe_token(255), "ff");
        assert_eq!(encode_recipe_token(1), "1");
        assert_eq!(encode_recipe_token(4096), "1000");
    }

    #[test]
    fn round_trips() {
        for id in [1, 255, 73_534, i32::MAX] {
            assert_eq!(decode_recipe_token(&encode_recipe_token(id)).unwrap(), id);
        }
    }

    #[test]
    fn rejects_non_hex_tokens() {
        assert!(decode_recipe_token("zz").is_err());
        assert!(decode_recipe_token("").is_err());
        assert!(decode_recipe_token("12g").is_err());
    }
}
