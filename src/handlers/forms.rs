//! Form bodies as posted by the front desk, and their conversion into typed
//! commands.
//!
//! Every field arrives as an optional string: browsers send empty inputs as
//! `""`, which is treated the same as an absent field.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Rejection;
use crate::ledger::validate::{parse_date, parse_money};
use crate::lifecycle::{BookTest, CancelRequest, MarkReady, MarkTested, RefundFields};
use crate::models::{
    CreateLead, DiscountType, LeadSource, MoneyInput, SetOffer, TransactionCategory, UpdateLead,
};

type Parsed<T> = std::result::Result<T, Rejection>;

fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn owned(value: &Option<String>) -> Option<String> {
    field(value).map(str::to_string)
}

fn int(value: &Option<String>, err: Rejection) -> Parsed<Option<i64>> {
    field(value)
        .map(|v| v.parse::<i64>().map_err(|_| err))
        .transpose()
}

fn date(value: &Option<String>) -> Parsed<Option<NaiveDate>> {
    field(value).map(parse_date).transpose()
}

#[derive(Debug, Default, Deserialize)]
pub struct IntakeForm {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl IntakeForm {
    pub fn into_input(self) -> CreateLead {
        CreateLead {
            full_name: owned(&self.full_name).unwrap_or_default(),
            phone: owned(&self.phone).unwrap_or_default(),
            source: owned(&self.source),
            notes: owned(&self.notes),
        }
    }
}

/// Course payment or placement-test fee.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentForm {
    pub amount: Option<String>,
    pub payment_method: Option<String>,
    pub payment_date: Option<String>,
    pub notes: Option<String>,
}

impl PaymentForm {
    pub fn parse(&self, today: NaiveDate) -> Parsed<MoneyInput> {
        parse_money(
            field(&self.amount),
            field(&self.payment_method),
            field(&self.payment_date),
            field(&self.notes),
            today,
        )
    }
}

/// Direct refund from the finance screen.
#[derive(Debug, Default, Deserialize)]
pub struct RefundForm {
    pub amount: Option<String>,
    pub payment_method: Option<String>,
    pub transaction_date: Option<String>,
    pub notes: Option<String>,
}

impl RefundForm {
    pub fn parse(&self, today: NaiveDate) -> Parsed<MoneyInput> {
        parse_money(
            field(&self.amount),
            field(&self.payment_method),
            field(&self.transaction_date),
            field(&self.notes),
            today,
        )
    }
}

/// Operating income or expense not tied to a lead.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionForm {
    pub category: Option<String>,
    pub amount: Option<String>,
    pub payment_method: Option<String>,
    pub transaction_date: Option<String>,
    pub notes: Option<String>,
}

impl TransactionForm {
    pub fn parse(&self, today: NaiveDate) -> Parsed<(TransactionCategory, MoneyInput)> {
        let category = field(&self.category)
            .and_then(|c| c.to_lowercase().parse().ok())
            .ok_or(Rejection::InvalidCategory)?;
        let input = parse_money(
            field(&self.amount),
            field(&self.payment_method),
            field(&self.transaction_date),
            field(&self.notes),
            today,
        )?;
        Ok((category, input))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BookTestForm {
    pub test_date: Option<String>,
    pub test_time: Option<String>,
    pub test_type: Option<String>,
}

impl BookTestForm {
    pub fn into_command(self) -> Parsed<BookTest> {
        Ok(BookTest {
            test_date: date(&self.test_date)?,
            test_time: owned(&self.test_time),
            test_type: owned(&self.test_type),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkTestedForm {
    pub assigned_level: Option<String>,
    pub test_notes: Option<String>,
}

impl MarkTestedForm {
    pub fn into_command(self) -> Parsed<MarkTested> {
        Ok(MarkTested {
            assigned_level: int(&self.assigned_level, Rejection::InvalidLevel)?,
            test_notes: owned(&self.test_notes),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OfferForm {
    pub bundle_levels: Option<String>,
    pub discount_value: Option<String>,
    pub discount_type: Option<String>,
    pub final_price: Option<String>,
}

impl OfferForm {
    pub fn into_command(self) -> Parsed<SetOffer> {
        let discount_type = match field(&self.discount_type) {
            Some(t) => t.to_lowercase().parse().map_err(|_| Rejection::InvalidDiscount)?,
            None => DiscountType::default(),
        };
        Ok(SetOffer {
            bundle_levels: int(&self.bundle_levels, Rejection::InvalidBundle)?,
            discount_value: int(&self.discount_value, Rejection::InvalidDiscount)?.unwrap_or(0),
            discount_type,
            final_price: int(&self.final_price, Rejection::InvalidAmount)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkReadyForm {
    pub class_days: Option<String>,
    pub class_time: Option<String>,
}

impl MarkReadyForm {
    pub fn into_command(self) -> MarkReady {
        MarkReady {
            class_days: owned(&self.class_days),
            class_time: owned(&self.class_time),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelForm {
    pub refund_amount: Option<String>,
    pub refund_method: Option<String>,
    pub refund_date: Option<String>,
    pub refund_notes: Option<String>,
}

impl CancelForm {
    /// Passed through unparsed: whether a refund is due, and so whether the
    /// fields matter at all, is decided by the cancel workflow.
    pub fn into_command(self) -> CancelRequest {
        CancelRequest {
            refund: RefundFields {
                amount: self.refund_amount,
                method: self.refund_method,
                date: self.refund_date,
                notes: self.refund_notes,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveForm {
    pub full_name: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub test_date: Option<String>,
    pub test_time: Option<String>,
    pub test_type: Option<String>,
    pub assigned_level: Option<String>,
    pub test_notes: Option<String>,
    pub class_days: Option<String>,
    pub class_time: Option<String>,
}

impl SaveForm {
    pub fn into_command(self) -> Parsed<UpdateLead> {
        Ok(UpdateLead {
            full_name: owned(&self.full_name),
            source: field(&self.source).map(LeadSource::parse_or_default),
            notes: owned(&self.notes),
            test_date: date(&self.test_date)?,
            test_time: owned(&self.test_time),
            test_type: owned(&self.test_type),
            assigned_level: int(&self.assigned_level, Rejection::InvalidLevel)?,
            test_notes: owned(&self.test_notes),
            class_days: owned(&self.class_days),
            class_time: owned(&self.class_time),
        })
    }
}
