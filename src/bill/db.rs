//! Database operations for bills.

use rusqlite::{Connection, OptionalExtension, Row, types::Type};
use time::OffsetDateTime;

use crate::{
    Error,
    bill::{Bill, BillBuilder, BillId, Role},
};

/// Create a bill and return it with its generated ID.
///
/// If the builder has no date, the current time is used. Dates are stored
/// with millisecond precision, so the returned bill may differ from the
/// builder's date by less than a millisecond.
pub fn create_bill(builder: BillBuilder, connection: &Connection) -> Result<Bill, Error> {
    let id = BillId::new();
    let date = builder.date.unwrap_or_else(OffsetDateTime::now_utc);

    connection
        .prepare(
            "INSERT INTO bill (id, amount, category, description, date, type, role)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, amount, category, description, date, type, role;",
        )?
        .query_row(
            (
                id.to_string(),
                builder.amount,
                builder.category,
                builder.description,
                to_unix_millis(date),
                builder.bill_type,
                builder.role,
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a single bill by ID, exactly as it is stored.
#[cfg(test)]
pub fn get_bill(id: BillId, connection: &Connection) -> Result<Bill, Error> {
    connection
        .prepare(
            "SELECT id, amount, category, description, date, type, role
             FROM bill WHERE id = :id;",
        )?
        .query_row(&[(":id", &id.to_string())], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all bills, most recent first.
///
/// Bills with the same date are ordered by most recently created first.
pub fn get_all_bills(connection: &Connection) -> Result<Vec<Bill>, Error> {
    connection
        .prepare(
            "SELECT id, amount, category, description, date, type, role
             FROM bill ORDER BY date DESC, rowid DESC;",
        )?
        .query_map([], map_row)?
        .map(|maybe_bill| maybe_bill.map_err(|error| error.into()))
        .collect()
}

/// Delete a bill by ID and return what was deleted.
///
/// # Errors
/// Returns [Error::DeleteMissingBill] if the bill doesn't exist.
pub fn delete_bill(id: BillId, connection: &Connection) -> Result<Bill, Error> {
    connection
        .prepare(
            "DELETE FROM bill WHERE id = :id
             RETURNING id, amount, category, description, date, type, role;",
        )?
        .query_row(&[(":id", &id.to_string())], map_row)
        .optional()?
        .ok_or(Error::DeleteMissingBill)
}

/// Set the role of every bill without one to [Role::LEGACY_DEFAULT].
///
/// Returns the number of bills that were changed.
pub fn backfill_missing_roles(connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE bill SET role = ?1 WHERE role IS NULL;",
            (Role::LEGACY_DEFAULT,),
        )
        .map_err(|error| error.into())
}

/// Initialize the bill table and indexes.
///
/// `role` is nullable since bills saved before roles existed do not have one.
pub fn create_bill_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS bill (
            id TEXT PRIMARY KEY NOT NULL,
            amount REAL,
            category TEXT,
            description TEXT,
            date INTEGER NOT NULL,
            type TEXT CHECK (type IN ('expense', 'income')),
            role TEXT CHECK (role IN ('husband', 'wife'))
        );

        CREATE INDEX IF NOT EXISTS idx_bill_date ON bill(date);",
    )?;

    Ok(())
}

fn to_unix_millis(date: OffsetDateTime) -> i64 {
    date.unix_timestamp_nanos().div_euclid(1_000_000) as i64
}

fn from_unix_millis(millis: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
}

fn map_row(row: &Row) -> Result<Bill, rusqlite::Error> {
    let raw_id: String = row.get(0)?;
    let id: BillId = raw_id.parse().map_err(|error: Error| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(error))
    })?;

    let raw_date: i64 = row.get(4)?;
    let date = from_unix_millis(raw_date).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, Type::Integer, Box::new(error))
    })?;

    Ok(Bill {
        id,
        amount: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        date,
        bill_type: row.get(5)?,
        role: row.get(6)?,
    })
}
