use crate::{
    Error,
    bill::{Bill, BillBuilder, BillId, BillStore},
};

/// The fault a [FailingStore] reports.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    Sql,
    Lock,
}

impl Fault {
    pub(crate) fn error(self) -> Error {
        match self {
            Fault::Sql => Error::SqlError(rusqlite::Error::InvalidQuery),
            Fault::Lock => Error::DatabaseLockError,
        }
    }

    /// The message the client should see for this fault.
    pub(crate) fn message(self) -> String {
        match self {
            Fault::Sql => rusqlite::Error::InvalidQuery.to_string(),
            Fault::Lock => "could not acquire the database lock".to_owned(),
        }
    }
}

/// A store where every operation fails with the same fault.
pub(crate) struct FailingStore(pub(crate) Fault);

impl BillStore for FailingStore {
    fn create(&self, _: BillBuilder) -> Result<Bill, Error> {
        Err(self.0.error())
    }

    fn get_all(&self) -> Result<Vec<Bill>, Error> {
        Err(self.0.error())
    }

    fn delete(&self, _: BillId) -> Result<Bill, Error> {
        Err(self.0.error())
    }

    fn backfill_missing_roles(&self) -> Result<usize, Error> {
        Err(self.0.error())
    }
}
