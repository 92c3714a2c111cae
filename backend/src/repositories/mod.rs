pub mod common;
pub mod leave_balance;
pub mod leave_balance_repository;
pub mod leave_request;
pub mod leave_request_repository;
pub mod transaction;
pub mod user;

pub use leave_balance::{LeaveBalanceRepository, LeaveBalanceRepositoryTrait};
pub use leave_request::{LeaveRequestRepository, LeaveRequestRepositoryTrait};
pub use transaction::{with_retry, RetryPolicy};
