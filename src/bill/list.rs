//! Bill listing endpoint.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    bill::{Bill, BillStore},
};

/// The state needed for listing bills.
#[derive(Clone)]
pub struct ListBillsState {
    pub bill_store: Arc<dyn BillStore>,
}

impl FromRef<AppState> for ListBillsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            bill_store: state.bill_store.clone(),
        }
    }
}

/// Respond with every bill as JSON, most recent first.
///
/// Bills saved before roles existed are shown with the legacy default role.
pub async fn get_bills_endpoint(State(state): State<ListBillsState>) -> Response {
    match state.bill_store.get_all() {
        Ok(bills) => {
            let bills: Vec<Bill> = bills.into_iter().map(Bill::with_default_role).collect();

            Json(bills).into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while listing bills: {error}");
            error.into_response()
        }
    }
}
