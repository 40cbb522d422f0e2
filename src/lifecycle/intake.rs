use rusqlite::Connection;

use crate::db::queries;
use crate::error::{Rejection, Result};
use crate::models::{CreateLead, Lead, LeadSource};

use super::begin_write;

/// Strip spaces, dashes and dots; keep an optional leading `+`.
pub fn normalize_phone(raw: &str) -> std::result::Result<String, Rejection> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
        .collect();

    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if !(7..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Rejection::InvalidPhone);
    }
    Ok(cleaned)
}

pub fn create_lead(conn: &mut Connection, input: &CreateLead) -> Result<Lead> {
    let full_name = input.full_name.trim();
    if full_name.is_empty() {
        return Err(Rejection::NameRequired.into());
    }
    let phone = normalize_phone(&input.phone)?;
    let source = input
        .source
        .as_deref()
        .map(LeadSource::parse_or_default)
        .unwrap_or(LeadSource::Other);
    let notes = input
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let tx = begin_write(conn)?;
    if queries::get_lead_by_phone(&tx, &phone)?.is_some() {
        return Err(Rejection::PhoneExists.into());
    }
    let lead = queries::create_lead(&tx, full_name, &phone, source, notes)?;
    tx.commit()?;

    tracing::info!("Created lead {} ({})", lead.id, lead.source.as_ref());
    Ok(lead)
}
