//! Leave balance repository.
//!
//! This module re-exports the trait-based implementation from leave_balance_repository.

pub use crate::repositories::leave_balance_repository::{
    LeaveBalanceRepository, LeaveBalanceRepositoryTrait,
};

#[cfg(test)]
pub use crate::repositories::leave_balance_repository::MockLeaveBalanceRepositoryTrait;
