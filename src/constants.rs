pub const USER_COUNT_PER_PAGE: i64 = 10;
pub const RECIPE_COUNT_PER_PAGE: i64 = 10;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 32_000;
pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 32_000;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_SLUG_LEN: usize = 200;
pub const MAX_TEXT_LEN: usize = 10_000;
pub const MAX_USERNAME_LEN: usize = 150;
pub const MAX_EMAIL_LEN: usize = 254;

pub const SESSION_LIFETIME_HOURS: i64 = 24;

pub const SHORT_LINK_BASE: u32 = 16;

/* usernames that collide with API routes */
pub const RESERVED_USERNAMES: &[&str] = &["me"];

pub const RECIPE_ORDERS: &[(&str, &str)] = &[
    ("alphabetical", "Alphabetical"),
    ("pub_date_asc", "Oldest first"),
    ("pub_date_desc", "Newest first"),
    ("cooking_time_asc", "Cooking time (asc)"),
    ("cooking_time_desc", "Cooking time (desc)"),
];
