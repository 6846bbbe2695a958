pub mod auth;
pub mod categories;
pub mod newsletter;
pub mod orders;
pub mod products;
