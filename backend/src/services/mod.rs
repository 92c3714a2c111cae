pub mod leave_ledger;

pub use leave_ledger::LeaveLedger;
