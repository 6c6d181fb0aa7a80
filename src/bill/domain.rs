//! Core bill domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::Error;

/// Database identifier for a bill.
///
/// IDs are random UUIDs generated by the store, stored and displayed in the
/// hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillId(Uuid);

impl BillId {
    /// Generate a new, unique bill ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BillId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for BillId {
    type Err = Error;

    /// Parse a bill ID.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidBillId] if `s` is not a well-formed UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::try_parse(s)
            .map(Self)
            .map_err(|_| Error::InvalidBillId(s.to_owned()))
    }
}

impl Display for BillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Whether money was spent or earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillType {
    /// Money was spent.
    Expense,
    /// Money was earned.
    Income,
}

impl BillType {
    /// The text used for the bill type in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillType::Expense => "expense",
            BillType::Income => "income",
        }
    }
}

impl FromStr for BillType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(BillType::Expense),
            "income" => Ok(BillType::Income),
            other => Err(Error::InvalidBill(format!(
                "type: \"{other}\" is not a valid value, expected one of: expense, income"
            ))),
        }
    }
}

impl Display for BillType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The member of the household a bill is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The husband.
    Husband,
    /// The wife.
    Wife,
}

impl Role {
    /// The role assumed for bills that were saved before roles existed.
    pub const LEGACY_DEFAULT: Role = Role::Husband;

    /// The text used for the role in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Husband => "husband",
            Role::Wife => "wife",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "husband" => Ok(Role::Husband),
            "wife" => Ok(Role::Wife),
            other => Err(Error::InvalidBill(format!(
                "role: \"{other}\" is not a valid value, expected one of: husband, wife"
            ))),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! impl_sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
            }
        }
    };
}

impl_sql_text_enum!(BillType);
impl_sql_text_enum!(Role);

/// An expense or income attributed to a member of the household.
///
/// Every field other than `id` and `date` may be missing. `role` is required
/// when creating a bill, but bills saved before roles were introduced do not
/// have one. Use [Bill::with_default_role] before showing these to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// The ID of the bill.
    pub id: BillId,
    /// The amount of money spent or earned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// What the money was spent on or where it came from, e.g. "food".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// A text description of the bill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the bill happened, in UTC with millisecond precision.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// Whether the bill is an expense or an income.
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bill_type: Option<BillType>,
    /// Who the bill belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Bill {
    /// Create a new bill for `role`.
    ///
    /// Shortcut for [BillBuilder] for discoverability.
    pub fn build(role: Role) -> BillBuilder {
        BillBuilder {
            amount: None,
            category: None,
            description: None,
            date: None,
            bill_type: None,
            role,
        }
    }

    /// Fill in [Role::LEGACY_DEFAULT] if the bill has no role.
    ///
    /// Only the returned copy is changed, the stored bill is left as is.
    pub fn with_default_role(mut self) -> Self {
        if self.role.is_none() {
            self.role = Some(Role::LEGACY_DEFAULT);
        }

        self
    }
}

/// A builder for creating new [Bill]s.
///
/// The store assigns the ID, and the current time if no date is set.
#[derive(Debug, Clone, PartialEq)]
pub struct BillBuilder {
    /// The monetary amount of the bill.
    pub amount: Option<f64>,
    /// The category of the bill, e.g. "food", "salary".
    pub category: Option<String>,
    /// A human-readable description of the bill.
    pub description: Option<String>,
    /// When the bill happened. `None` means now.
    pub date: Option<OffsetDateTime>,
    /// Whether the bill is an expense or an income.
    pub bill_type: Option<BillType>,
    /// Who the bill belongs to.
    pub role: Role,
}

impl BillBuilder {
    /// Set the amount for the bill.
    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the category for the bill.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    /// Set the description for the bill.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    /// Set the date for the bill.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Set whether the bill is an expense or an income.
    pub fn bill_type(mut self, bill_type: BillType) -> Self {
        self.bill_type = Some(bill_type);
        self
    }
}

#[cfg(test)]
mod bill_id_tests {
    use crate::{Error, bill::BillId};

    #[test]
    fn parses_own_output() {
        let id = BillId::new();

        let parsed = id.to_string().parse::<BillId>();

        assert_eq!(parsed, Ok(id));
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["", "123", "not-an-id", "507f1f77bcf86cd79943901z"] {
            assert_eq!(
                raw.parse::<BillId>(),
                Err(Error::InvalidBillId(raw.to_owned())),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(BillId::new(), BillId::new());
    }
}


#[cfg(test)]
mod bill_tests {
    use serde_json::json;
    use time::macros::datetime;

    use crate::bill::{Bill, BillId, BillType, Role};

    fn legacy_bill() -> Bill {
        Bill {
            id: BillId::new(),
            amount: Some(-12.5),
            category: Some("food".to_owned()),
            description: None,
            date: datetime!(2024-03-01 12:00 UTC),
            bill_type: Some(BillType::Expense),
            role: None,
        }
    }

    #[test]
    fn default_role_fills_missing_role() {
        let bill = legacy_bill();

        let normalized = bill.clone().with_default_role();

        assert_eq!(normalized.role, Some(Role::Husband));
        assert_eq!(
            Bill {
                role: None,
                ..normalized
            },
            bill
        );
    }

    #[test]
    fn default_role_keeps_existing_role() {
        let bill = Bill {
            role: Some(Role::Wife),
            ..legacy_bill()
        };

        assert_eq!(bill.clone().with_default_role(), bill);
    }

    #[test]
    fn serializes_with_document_field_names() {
        let bill = Bill {
            role: Some(Role::Wife),
            ..legacy_bill()
        };

        let value = serde_json::to_value(&bill).unwrap();

        assert_eq!(
            value,
            json!({
                "id": bill.id.to_string(),
                "amount": -12.5,
                "category": "food",
                "date": "2024-03-01T12:00:00Z",
                "type": "expense",
                "role": "wife",
            })
        );
    }
}
