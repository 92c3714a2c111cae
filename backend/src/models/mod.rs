//! Data models shared across database access and API handlers.

pub mod leave_balance;
pub mod leave_request;
pub mod notification;
pub mod request;
pub mod team;
pub mod user;
