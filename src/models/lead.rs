use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Lifecycle status of a lead.
///
/// The pipeline states are ordered; `WaitingForRound`, `Paused` and `Cancelled`
/// sit outside the ordering and have no rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeadStatus {
    LeadCreated,
    TestBooked,
    Tested,
    OfferSent,
    DepositPaid,
    PaidFull,
    ScheduleAssigned,
    ReadyToStart,
    WaitingForRound,
    Paused,
    Cancelled,
}

impl LeadStatus {
    /// Position in the enrollment pipeline. `DepositPaid` and `PaidFull` are
    /// alternatives after an offer, so paying in full ranks above a deposit.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::LeadCreated => Some(0),
            Self::TestBooked => Some(1),
            Self::Tested => Some(2),
            Self::OfferSent => Some(3),
            Self::DepositPaid => Some(4),
            Self::PaidFull => Some(5),
            Self::ScheduleAssigned => Some(6),
            Self::ReadyToStart => Some(7),
            Self::WaitingForRound | Self::Paused | Self::Cancelled => None,
        }
    }

    pub fn is_side_state(&self) -> bool {
        self.rank().is_none()
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Where the lead heard about the school. Purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeadSource {
    Facebook,
    Instagram,
    Referral,
    WalkIn,
    Website,
    Other,
}

impl LeadSource {
    /// Unknown tags fall back to `Other` instead of failing the request.
    pub fn parse_or_default(s: &str) -> Self {
        s.trim().to_lowercase().parse().unwrap_or(Self::Other)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub source: LeadSource,
    pub notes: Option<String>,
    pub status: LeadStatus,
    pub levels_purchased_total: i64,
    pub levels_consumed: i64,

    // Placement test
    pub test_date: Option<NaiveDate>,
    pub test_time: Option<String>,
    pub test_type: Option<String>,
    pub assigned_level: Option<i64>,
    pub test_notes: Option<String>,
    pub tested_at: Option<i64>,
    pub placement_test_fee: Option<i64>,

    // Schedule
    pub class_days: Option<String>,
    pub class_time: Option<String>,

    pub waiting_round: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Lead {
    pub fn is_cancelled(&self) -> bool {
        self.status == LeadStatus::Cancelled
    }

    pub fn has_test_booking(&self) -> bool {
        self.test_date.is_some()
            && non_blank(self.test_time.as_deref())
            && non_blank(self.test_type.as_deref())
    }

    pub fn is_tested(&self) -> bool {
        self.tested_at.is_some() || self.assigned_level.is_some()
    }

    pub fn has_schedule(&self) -> bool {
        non_blank(self.class_days.as_deref()) && non_blank(self.class_time.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLead {
    pub full_name: String,
    pub phone: String,
    pub source: Option<String>,
    pub notes: Option<String>,
}

/// Fields a generic save may touch. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLead {
    pub full_name: Option<String>,
    pub source: Option<LeadSource>,
    pub notes: Option<String>,
    pub test_date: Option<NaiveDate>,
    pub test_time: Option<String>,
    pub test_type: Option<String>,
    pub assigned_level: Option<i64>,
    pub test_notes: Option<String>,
    pub class_days: Option<String>,
    pub class_time: Option<String>,
}

impl UpdateLead {
    pub fn touches_schedule(&self) -> bool {
        self.class_days.is_some() || self.class_time.is_some()
    }
}

/// One row of a lead's status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: String,
    pub lead_id: String,
    pub from_status: Option<LeadStatus>,
    pub to_status: LeadStatus,
    pub reason: String,
    pub created_at: i64,
}
