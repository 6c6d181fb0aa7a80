//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use crate::bill::BillStore;

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The store that bills are saved to.
    pub bill_store: Arc<dyn BillStore>,
}

impl AppState {
    /// Create a new [AppState] that saves bills to `bill_store`.
    ///
    /// The store should already be initialized, e.g. with [initialize](crate::initialize_db)
    /// for a SQLite store.
    pub fn new(bill_store: impl BillStore + 'static) -> Self {
        Self {
            bill_store: Arc::new(bill_store),
        }
    }
}
