//! Leave ledger backend: per-user leave balances and the approval workflow
//! of leave requests, served over a JSON HTTP API.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod types;
pub mod utils;
