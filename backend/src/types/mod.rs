//! Strongly typed identifiers shared across models, repositories and handlers.

pub mod id;

pub use id::{LeaveBalanceId, LeaveRequestId, TeamId, UserId};
