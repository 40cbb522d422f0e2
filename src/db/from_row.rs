//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a text column into an enum, surfacing bad values as a column type
/// error instead of panicking.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

fn parse_enum_opt<T: std::str::FromStr>(
    row: &Row,
    col: usize,
    col_name: &str,
) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<String>>(col)? {
        Some(s) => s.parse::<T>().map(Some).map_err(|_| {
            rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
        }),
        None => Ok(None),
    }
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const LEAD_COLS: &str = "id, full_name, phone, source, notes, status, levels_purchased_total, levels_consumed, test_date, test_time, test_type, assigned_level, test_notes, tested_at, placement_test_fee, class_days, class_time, waiting_round, cancelled_at, created_at, updated_at";

pub const OFFER_COLS: &str =
    "lead_id, bundle_levels, base_price, discount_value, discount_type, final_price, created_at, updated_at";

pub const LEAD_PAYMENT_COLS: &str =
    "id, lead_id, kind, amount, payment_method, payment_date, notes, created_at";

pub const TRANSACTION_COLS: &str = "id, transaction_type, category, amount, payment_method, lead_id, ref_key, transaction_date, notes, created_at";

pub const STATUS_CHANGE_COLS: &str = "id, lead_id, from_status, to_status, reason, created_at";

// ============ FromRow Implementations ============

impl FromRow for Lead {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Lead {
            id: row.get(0)?,
            full_name: row.get(1)?,
            phone: row.get(2)?,
            // Tolerate legacy free-text sources
            source: LeadSource::parse_or_default(&row.get::<_, String>(3)?),
            notes: row.get(4)?,
            status: parse_enum(row, 5, "status")?,
            levels_purchased_total: row.get(6)?,
            levels_consumed: row.get(7)?,
            test_date: row.get(8)?,
            test_time: row.get(9)?,
            test_type: row.get(10)?,
            assigned_level: row.get(11)?,
            test_notes: row.get(12)?,
            tested_at: row.get(13)?,
            placement_test_fee: row.get(14)?,
            class_days: row.get(15)?,
            class_time: row.get(16)?,
            waiting_round: row.get(17)?,
            cancelled_at: row.get(18)?,
            created_at: row.get(19)?,
            updated_at: row.get(20)?,
        })
    }
}

impl FromRow for Offer {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Offer {
            lead_id: row.get(0)?,
            bundle_levels: row.get(1)?,
            base_price: row.get(2)?,
            discount_value: row.get(3)?,
            discount_type: parse_enum(row, 4, "discount_type")?,
            final_price: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for LeadPayment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LeadPayment {
            id: row.get(0)?,
            lead_id: row.get(1)?,
            kind: parse_enum(row, 2, "kind")?,
            amount: row.get(3)?,
            payment_method: parse_enum(row, 4, "payment_method")?,
            payment_date: row.get(5)?,
            notes: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

impl FromRow for Transaction {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: row.get(0)?,
            transaction_type: parse_enum(row, 1, "transaction_type")?,
            category: parse_enum(row, 2, "category")?,
            amount: row.get(3)?,
            payment_method: parse_enum(row, 4, "payment_method")?,
            lead_id: row.get(5)?,
            ref_key: row.get(6)?,
            transaction_date: row.get(7)?,
            notes: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

impl FromRow for StatusChange {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(StatusChange {
            id: row.get(0)?,
            lead_id: row.get(1)?,
            from_status: parse_enum_opt(row, 2, "from_status")?,
            to_status: parse_enum(row, 3, "to_status")?,
            reason: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
