//! Prefixed ID generation.
//!
//! Format: `en_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

const ALL_PREFIXES: &[&str] = &["en_lead_", "en_pay_", "en_txn_", "en_chg_"];

/// Cheap format check used to reject garbage path segments before hitting the database.
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    Lead,
    LeadPayment,
    Transaction,
    StatusChange,
}

impl EntityType {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Lead => "en_lead",
            Self::LeadPayment => "en_pay",
            Self::Transaction => "en_txn",
            Self::StatusChange => "en_chg",
        }
    }

    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}
