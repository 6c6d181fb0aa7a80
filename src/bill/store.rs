//! Defines the bill store trait and its SQLite implementation.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{
    Error,
    bill::{
        Bill, BillBuilder, BillId,
        db::{backfill_missing_roles, create_bill, delete_bill, get_all_bills},
    },
};

/// Handles the creation, retrieval and deletion of bills.
///
/// Each method is a single atomic operation on the store.
pub trait BillStore: Send + Sync {
    /// Create a new bill in the store.
    fn create(&self, builder: BillBuilder) -> Result<Bill, Error>;

    /// Retrieve every bill, most recent first.
    fn get_all(&self) -> Result<Vec<Bill>, Error>;

    /// Remove a bill from the store and return it.
    ///
    /// # Errors
    /// Returns [Error::DeleteMissingBill] if there is no bill with `id`.
    fn delete(&self, id: BillId) -> Result<Bill, Error>;

    /// Give every bill without a role the legacy default role.
    ///
    /// Returns the number of bills that were changed, so calling this a
    /// second time returns zero.
    fn backfill_missing_roles(&self) -> Result<usize, Error>;
}

/// Stores bills in a SQLite database.
///
/// The bill table must have been created with [initialize](crate::initialize_db).
#[derive(Debug, Clone)]
pub struct SQLiteBillStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteBillStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

#[cfg(test)]
impl SQLiteBillStore {
    /// Retrieve a single bill exactly as it is stored, without filling in a role.
    pub(crate) fn get(&self, id: BillId) -> Result<Bill, Error> {
        crate::bill::db::get_bill(id, &*self.lock()?)
    }
}

impl BillStore for SQLiteBillStore {
    fn create(&self, builder: BillBuilder) -> Result<Bill, Error> {
        create_bill(builder, &*self.lock()?)
    }

    fn get_all(&self) -> Result<Vec<Bill>, Error> {
        get_all_bills(&*self.lock()?)
    }

    fn delete(&self, id: BillId) -> Result<Bill, Error> {
        delete_bill(id, &*self.lock()?)
    }

    fn backfill_missing_roles(&self) -> Result<usize, Error> {
        backfill_missing_roles(&*self.lock()?)
    }
}
