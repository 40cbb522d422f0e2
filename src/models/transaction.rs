use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::PaymentMethod;

/// Ledger entry. The ledger is the system of record for money; course
/// payments and refunds on a lead are projections over these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub transaction_type: TransactionType,
    pub category: TransactionCategory,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub lead_id: Option<String>,
    /// Dedup key, unique across the ledger. Deterministic for events that may
    /// be replayed, random for one-off manual entries.
    pub ref_key: String,
    pub transaction_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// Data required to create a new ledger entry
#[derive(Debug, Clone)]
pub struct CreateTransaction {
    pub transaction_type: TransactionType,
    pub category: TransactionCategory,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub lead_id: Option<String>,
    pub ref_key: String,
    pub transaction_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TransactionType {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionCategory {
    PlacementTest,
    CoursePayment,
    Refund,
    Rent,
    Salaries,
    Marketing,
    Supplies,
    OtherExpense,
    OtherIncome,
}

impl TransactionCategory {
    /// Categories that are only ever written by the lead workflows.
    pub fn is_lead_bound(&self) -> bool {
        matches!(self, Self::PlacementTest | Self::CoursePayment | Self::Refund)
    }

    pub fn direction(&self) -> TransactionType {
        match self {
            Self::PlacementTest | Self::CoursePayment | Self::OtherIncome => TransactionType::In,
            Self::Refund | Self::Rent | Self::Salaries | Self::Marketing | Self::Supplies
            | Self::OtherExpense => TransactionType::Out,
        }
    }
}

/// Filters for querying the ledger
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionFilters {
    pub transaction_type: Option<TransactionType>,
    pub category: Option<TransactionCategory>,
    pub lead_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Money in/out totals over a filtered set of ledger rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerTotals {
    pub total_in: i64,
    pub total_out: i64,
    pub net: i64,
}
