pub mod auth;
pub mod health;
pub mod leave;
pub mod notifications;
