//! Bill creation endpoint.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    bill::{BillBuilder, BillStore, BillType, Role},
};

/// The state needed for creating a bill.
#[derive(Clone)]
pub struct CreateBillState {
    pub bill_store: Arc<dyn BillStore>,
}

impl FromRef<AppState> for CreateBillState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            bill_store: state.bill_store.clone(),
        }
    }
}

mod lenient {
    //! Reads the loosely typed values that browser forms and older clients send.
    //!
    //! A date input sends "2024-01-15" rather than a full timestamp and some
    //! clients send the amount as a string, so both are converted here instead
    //! of being rejected.
    use serde::{Deserialize, Deserializer, de::Error as _};
    use serde_json::Value;
    use time::{
        Date, OffsetDateTime, UtcOffset,
        format_description::{BorrowedFormatItem, well_known::Rfc3339},
        macros::format_description,
    };

    /// A calendar date without a time, e.g. "2024-01-15".
    const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

    /// Accepts a JSON number or a numeric string. An empty string means no amount.
    pub fn amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(number)) => number.as_f64().map(Some).ok_or_else(|| {
                D::Error::custom(format!("amount: {number} is not a valid number"))
            }),
            Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
            Some(Value::String(text)) => match text.trim().parse::<f64>() {
                Ok(amount) if amount.is_finite() => Ok(Some(amount)),
                _ => Err(D::Error::custom(format!(
                    "amount: {text:?} is not a valid number"
                ))),
            },
            Some(other) => Err(D::Error::custom(format!(
                "amount: expected a number, got {other}"
            ))),
        }
    }

    /// Accepts an RFC 3339 date-time, a date at UTC midnight, or Unix milliseconds.
    pub fn date<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(number)) => number
                .as_i64()
                .and_then(from_unix_millis)
                .map(Some)
                .ok_or_else(|| {
                    D::Error::custom(format!(
                        "date: {number} is not a valid timestamp in milliseconds"
                    ))
                }),
            Some(Value::String(text)) => parse_date(&text)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("date: {text:?} is not a valid date"))),
            Some(other) => Err(D::Error::custom(format!(
                "date: expected a date string or a number, got {other}"
            ))),
        }
    }

    fn parse_date(text: &str) -> Option<OffsetDateTime> {
        if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
            return Some(date_time.to_offset(UtcOffset::UTC));
        }

        Date::parse(text, DATE_FORMAT)
            .ok()
            .map(|date| date.midnight().assume_utc())
    }

    fn from_unix_millis(millis: i64) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
    }
}

/// The JSON body of a request to create a bill.
///
/// Every field is optional at this point so that all the problems with a
/// request can be reported at once, see [BillPayload::validate].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BillPayload {
    /// The amount of money spent or earned, as a number or a numeric string.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub amount: Option<f64>,
    /// The category of the bill, e.g. "food".
    pub category: Option<String>,
    /// A text description of the bill.
    pub description: Option<String>,
    /// When the bill happened. Defaults to now.
    ///
    /// Accepts an RFC 3339 date-time, a "YYYY-MM-DD" date (midnight UTC) or
    /// Unix milliseconds. Always serialized as RFC 3339.
    #[serde(
        default,
        deserialize_with = "lenient::date",
        serialize_with = "time::serde::rfc3339::option::serialize"
    )]
    pub date: Option<OffsetDateTime>,
    /// Either "expense" or "income".
    #[serde(rename = "type")]
    pub bill_type: Option<String>,
    /// Either "husband" or "wife".
    pub role: Option<String>,
}

impl BillPayload {
    /// Check the payload is a valid bill.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidBill] listing every invalid field if:
    /// - `type` is set to something other than "expense" or "income",
    /// - `role` is missing,
    /// - or `role` is set to something other than "husband" or "wife".
    pub fn validate(self) -> Result<BillBuilder, Error> {
        let mut problems = Vec::new();

        let bill_type = match self.bill_type.as_deref().map(str::parse::<BillType>) {
            Some(Ok(bill_type)) => Some(bill_type),
            Some(Err(error)) => {
                problems.push(error.to_string());
                None
            }
            None => None,
        };

        let role = match self.role.as_deref().map(str::parse::<Role>) {
            Some(Ok(role)) => Some(role),
            Some(Err(error)) => {
                problems.push(error.to_string());
                None
            }
            None => {
                problems.push("role: role is required".to_owned());
                None
            }
        };

        match role {
            Some(role) if problems.is_empty() => Ok(BillBuilder {
                amount: self.amount,
                category: self.category,
                description: self.description,
                date: self.date,
                bill_type,
                role,
            }),
            _ => Err(Error::InvalidBill(format!(
                "bill validation failed: {}",
                problems.join("; ")
            ))),
        }
    }
}

/// Handle bill creation, responds with the new bill.
pub async fn create_bill_endpoint(
    State(state): State<CreateBillState>,
    payload: Result<Json<BillPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected malformed bill: {}", rejection.body_text());
            return Error::InvalidBill(rejection.body_text()).into_response();
        }
    };

    let builder = match payload.validate() {
        Ok(builder) => builder,
        Err(error) => {
            tracing::warn!("Rejected invalid bill: {error}");
            return error.into_response();
        }
    };

    match state.bill_store.create(builder) {
        Ok(bill) => (StatusCode::CREATED, Json(bill)).into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a bill: {error}");
            error.into_response()
        }
    }
}


#[cfg(test)]
mod create_bill_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::State, http::StatusCode};
    use serde_json::{Value, json};
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        bill::{Bill, BillStore, BillType, Role, SQLiteBillStore, db::test_utils::get_test_db_connection},
        error::ErrorResponse,
        test_utils::{FailingStore, Fault, parse_json_body},
    };

    use super::{BillPayload, CreateBillState, create_bill_endpoint};

    fn parse_payload(body: Value) -> BillPayload {
        serde_json::from_value(body).expect("Could not parse bill payload")
    }

    fn get_state() -> (CreateBillState, Arc<SQLiteBillStore>) {
        let store = Arc::new(SQLiteBillStore::new(Arc::new(Mutex::new(
            get_test_db_connection(),
        ))));

        (
            CreateBillState {
                bill_store: store.clone(),
            },
            store,
        )
    }

    #[tokio::test]
    async fn creates_bill() {
        let (state, store) = get_state();
        let payload = BillPayload {
            amount: Some(50.0),
            category: Some("food".to_owned()),
            bill_type: Some("expense".to_owned()),
            role: Some("wife".to_owned()),
            ..Default::default()
        };

        let response = create_bill_endpoint(State(state), Ok(Json(payload))).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let bill: Bill = parse_json_body(response).await;
        assert_eq!(bill.amount, Some(50.0));
        assert_eq!(bill.bill_type, Some(BillType::Expense));
        assert_eq!(bill.role, Some(Role::Wife));
        assert_eq!(store.get(bill.id), Ok(bill));
    }

    #[tokio::test]
    async fn assigns_current_time_when_date_is_missing() {
        let (state, _) = get_state();
        let before = OffsetDateTime::now_utc() - Duration::milliseconds(1);
        let payload = BillPayload {
            role: Some("husband".to_owned()),
            ..Default::default()
        };

        let response = create_bill_endpoint(State(state), Ok(Json(payload))).await;

        let bill: Bill = parse_json_body(response).await;
        assert!(bill.date >= before, "{} is before {}", bill.date, before);
    }

    #[tokio::test]
    async fn rejects_bill_without_role() {
        let (state, store) = get_state();
        let payload = BillPayload {
            amount: Some(50.0),
            ..Default::default()
        };

        let response = create_bill_endpoint(State(state), Ok(Json(payload))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = parse_json_body(response).await;
        assert!(body.message.contains("role is required"), "{}", body.message);
        assert_eq!(store.get_all(), Ok(vec![]));
    }

    #[tokio::test]
    async fn rejects_bill_with_unknown_type() {
        let (state, store) = get_state();
        let payload = BillPayload {
            bill_type: Some("gift".to_owned()),
            role: Some("wife".to_owned()),
            ..Default::default()
        };

        let response = create_bill_endpoint(State(state), Ok(Json(payload))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.get_all(), Ok(vec![]));
    }

    #[tokio::test]
    async fn accepts_date_without_time() {
        let (state, _) = get_state();
        let payload = parse_payload(json!({ "role": "wife", "date": "2024-01-15" }));

        let response = create_bill_endpoint(State(state), Ok(Json(payload))).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let bill: Bill = parse_json_body(response).await;
        assert_eq!(bill.date, datetime!(2024-01-15 00:00 UTC));
    }

    #[tokio::test]
    async fn accepts_date_as_unix_milliseconds() {
        let (state, _) = get_state();
        let payload = parse_payload(json!({ "role": "wife", "date": 1705276800123_i64 }));

        let response = create_bill_endpoint(State(state), Ok(Json(payload))).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let bill: Bill = parse_json_body(response).await;
        assert_eq!(bill.date, datetime!(2024-01-15 00:00:00.123 UTC));
    }

    #[tokio::test]
    async fn accepts_date_time_with_offset() {
        let (state, _) = get_state();
        let payload = parse_payload(json!({
            "role": "wife",
            "date": "2024-01-15T10:00:00+10:00",
        }));

        let response = create_bill_endpoint(State(state), Ok(Json(payload))).await;

        let bill: Bill = parse_json_body(response).await;
        assert_eq!(bill.date, datetime!(2024-01-15 00:00 UTC));
    }

    #[tokio::test]
    async fn accepts_amount_as_numeric_string() {
        let (state, _) = get_state();
        let payload = parse_payload(json!({ "role": "wife", "amount": "50" }));

        let response = create_bill_endpoint(State(state), Ok(Json(payload))).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let bill: Bill = parse_json_body(response).await;
        assert_eq!(bill.amount, Some(50.0));
    }

    #[test]
    fn empty_amount_string_means_no_amount() {
        let payload = parse_payload(json!({ "role": "wife", "amount": "" }));

        assert_eq!(payload.amount, None);
    }

    #[test]
    fn rejects_amount_that_is_not_a_number() {
        for amount in [json!("fifty"), json!("NaN"), json!(true)] {
            let result =
                serde_json::from_value::<BillPayload>(json!({ "role": "wife", "amount": amount }));

            let error = result.expect_err("amount should be rejected");
            assert!(error.to_string().starts_with("amount:"), "{error}");
        }
    }

    #[test]
    fn rejects_date_that_is_not_a_date() {
        for date in [json!("yesterday"), json!("2024-13-01"), json!(1.5), json!([])] {
            let result =
                serde_json::from_value::<BillPayload>(json!({ "role": "wife", "date": date }));

            let error = result.expect_err("date should be rejected");
            assert!(error.to_string().starts_with("date:"), "{error}");
        }
    }

    #[tokio::test]
    async fn storage_fault_is_server_error() {
        let state = CreateBillState {
            bill_store: Arc::new(FailingStore(Fault::Sql)),
        };
        let payload = parse_payload(json!({ "role": "husband" }));

        let response = create_bill_endpoint(State(state), Ok(Json(payload))).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = parse_json_body(response).await;
        assert_eq!(body.message, Fault::Sql.message());
    }
}
