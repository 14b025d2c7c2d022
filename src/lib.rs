mod database {
    pub mod actions;
    pub mod form;
    pub mod pagination;
    pub mod schema;
    pub mod validate;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod api {
    pub mod handlers {
        pub mod ingredients;
        pub mod recipes;
        pub mod tags;
        pub mod users;
    }
    pub mod rejection;
    pub mod routes;
}
mod config;
mod constants;
mod error;
mod media;
mod shortlink;

pub use api::*;
pub use authentication::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use error::*;
pub use media::*;
pub use shortlink::*;
