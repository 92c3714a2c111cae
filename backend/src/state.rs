use crate::{config::Config, db::connection::DbPool, services::LeaveLedger};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub ledger: LeaveLedger,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        let ledger = LeaveLedger::new(pool.clone(), &config);
        Self {
            pool,
            config,
            ledger,
        }
    }
}
