//! Bills: the expenses and incomes tracked by the app.

mod create;
pub(crate) mod db;
mod delete;
mod domain;
mod list;
mod store;

pub use create::{BillPayload, create_bill_endpoint};
pub use db::create_bill_table;
pub use delete::{DeleteBillResponse, delete_bill_endpoint};
pub use domain::{Bill, BillBuilder, BillId, BillType, Role};
pub use list::get_bills_endpoint;
pub use store::{BillStore, SQLiteBillStore};
