//! Bill deletion endpoint.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    bill::{Bill, BillId, BillStore},
};

/// The state needed for deleting a bill.
#[derive(Clone)]
pub struct DeleteBillState {
    pub bill_store: Arc<dyn BillStore>,
}

impl FromRef<AppState> for DeleteBillState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            bill_store: state.bill_store.clone(),
        }
    }
}

/// The JSON body sent to the client after a bill is deleted.
///
/// The deleted bill is included so that the client can offer to undo.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBillResponse {
    /// Confirms the bill was deleted.
    pub message: String,
    /// The bill as it was before it was deleted.
    pub deleted_bill: Bill,
}

/// Handle bill deletion, responds with the deleted bill.
///
/// Malformed IDs are rejected before the store is touched.
pub async fn delete_bill_endpoint(
    State(state): State<DeleteBillState>,
    Path(raw_id): Path<String>,
) -> Response {
    let bill_id: BillId = match raw_id.parse() {
        Ok(bill_id) => bill_id,
        Err(error) => {
            tracing::warn!("Tried to delete a bill with the invalid ID {raw_id:?}");
            return error.into_response();
        }
    };

    match state.bill_store.delete(bill_id) {
        Ok(deleted_bill) => Json(DeleteBillResponse {
            message: "bill deleted".to_owned(),
            deleted_bill,
        })
        .into_response(),
        Err(Error::DeleteMissingBill) => Error::DeleteMissingBill.into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting bill {bill_id}: {error}");
            error.into_response()
        }
    }
}
