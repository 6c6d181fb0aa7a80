//! Application router configuration.

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, Error,
    bill::{create_bill_endpoint, delete_bill_endpoint, get_bills_endpoint},
    endpoints,
};

/// Return a router with all the app's routes.
///
/// Any origin may call the API since the client is served separately.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::BILLS,
            get(get_bills_endpoint).post(create_bill_endpoint),
        )
        .route(endpoints::BILL, delete(delete_bill_endpoint))
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
