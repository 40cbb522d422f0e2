use axum::{
    extract::rejection::{FormRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Business-rule rejection of a lead or ledger operation.
///
/// Every variant is raised before the first write of the operation it guards,
/// so a rejection never leaves partial state behind. `code()` is the stable
/// identifier the rendering layer maps to a human message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("amount must be a positive whole number")]
    InvalidAmount,

    #[error("payment method is not accepted")]
    InvalidMethod,

    #[error("date must be formatted as YYYY-MM-DD")]
    InvalidDate,

    #[error("date cannot be in the future")]
    FutureDate,

    #[error("refund exceeds the amount paid (max {max})")]
    AmountExceeds { max: i64 },

    #[error("payment exceeds the remaining balance (max {max})")]
    AmountExceedsBalance { max: i64 },

    #[error("a scheduled lead cannot be priced above what it paid (max {max})")]
    PriceAbovePaid { max: i64 },

    #[error("refund details are required because the lead has paid for the course")]
    RefundRequired,

    #[error("test date, time and type are all required")]
    TestDetailsRequired,

    #[error("level must be between 1 and 8")]
    InvalidLevel,

    #[error("an offer needs a bundle or a positive final price")]
    OfferRequired,

    #[error("bundle must be between 1 and 4 levels")]
    InvalidBundle,

    #[error("discount is invalid")]
    InvalidDiscount,

    #[error("lead has no priced offer")]
    NoOffer,

    #[error("class days and class time are both required")]
    ScheduleRequired,

    #[error("class days or class time are not on the timetable")]
    InvalidSchedule,

    #[error("course is not fully paid (remaining {remaining})")]
    NotFullyPaid { remaining: i64 },

    #[error("lead is cancelled")]
    LeadCancelled,

    #[error("lead is not cancelled")]
    NotCancelled,

    #[error("a lead with this phone already exists")]
    PhoneExists,

    #[error("phone number is invalid")]
    InvalidPhone,

    #[error("full name is required")]
    NameRequired,

    #[error("category cannot be recorded manually")]
    InvalidCategory,

    #[error("unknown action")]
    UnknownAction,
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "invalid_amount",
            Self::InvalidMethod => "invalid_method",
            Self::InvalidDate => "invalid_date",
            Self::FutureDate => "future_date",
            Self::AmountExceeds { .. } => "amount_exceeds",
            Self::AmountExceedsBalance { .. } => "amount_exceeds_balance",
            Self::PriceAbovePaid { .. } => "price_above_paid",
            Self::RefundRequired => "refund_required",
            Self::TestDetailsRequired => "test_details_required",
            Self::InvalidLevel => "invalid_level",
            Self::OfferRequired => "offer_required",
            Self::InvalidBundle => "invalid_bundle",
            Self::InvalidDiscount => "invalid_discount",
            Self::NoOffer => "no_offer",
            Self::ScheduleRequired => "schedule_required",
            Self::InvalidSchedule => "invalid_schedule",
            Self::NotFullyPaid { .. } => "not_fully_paid",
            Self::LeadCancelled => "lead_cancelled",
            Self::NotCancelled => "not_cancelled",
            Self::PhoneExists => "phone_exists",
            Self::InvalidPhone => "invalid_phone",
            Self::NameRequired => "name_required",
            Self::InvalidCategory => "invalid_category",
            Self::UnknownAction => "unknown_action",
        }
    }

    /// Extra query parameters that accompany the error code.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::AmountExceeds { max }
            | Self::AmountExceedsBalance { max }
            | Self::PriceAbovePaid { max } => {
                vec![("max", max.to_string())]
            }
            Self::NotFullyPaid { remaining } => vec![("remaining", remaining.to_string())],
            _ => Vec::new(),
        }
    }

    /// Query string in the `error=<code>&k=v` shape used by redirects.
    pub fn to_query(&self) -> String {
        let mut query = format!("error={}", self.code());
        for (key, value) in self.params() {
            query.push('&');
            query.push_str(key);
            query.push('=');
            query.push_str(&value);
        }
        query
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found".to_string(), Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request".to_string(), Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict".to_string(), Some(msg.clone())),
            AppError::Rejected(rejection) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                rejection.code().to_string(),
                Some(rejection.to_string()),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
            }
        };

        let body = ErrorResponse { error, details };

        (status, Json(body)).into_response()
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Convert `Option<T>` lookups into `NotFound` errors.
pub trait OptionExt<T> {
    fn or_not_found(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(msg.to_string()))
    }
}

/// Shared not-found messages.
pub mod msg {
    pub const LEAD_NOT_FOUND: &str = "Lead not found";
    pub const TRANSACTION_NOT_FOUND: &str = "Transaction not found";
}
