use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Manually recorded payment methods accepted by the front desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Instapay,
    VodafoneCash,
    BankTransfer,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentKind {
    Course,
}

/// A single course payment. Rows are never updated or deleted; corrections
/// are recorded as further payments or refunds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadPayment {
    pub id: String,
    pub lead_id: String,
    pub kind: PaymentKind,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// Money-in or money-out request as entered by an operator, already parsed.
#[derive(Debug, Clone, Deserialize)]
pub struct MoneyInput {
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

/// Aggregated view of what a lead owes and has paid for the course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub final_price: i64,
    pub total_course_paid: i64,
    pub remaining_balance: i64,
    pub is_fully_paid: bool,
}

impl PaymentSummary {
    pub fn new(final_price: i64, total_course_paid: i64) -> Self {
        Self {
            final_price,
            total_course_paid,
            remaining_balance: (final_price - total_course_paid).max(0),
            is_fully_paid: final_price > 0 && total_course_paid >= final_price,
        }
    }
}
