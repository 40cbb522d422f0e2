use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, ErrorCode, params, types::Value};
use uuid::Uuid;

use crate::error::{Rejection, Result};
use crate::id::EntityType;
use crate::models::*;

use super::from_row::{
    LEAD_COLS, LEAD_PAYMENT_COLS, OFFER_COLS, STATUS_CHANGE_COLS, TRANSACTION_COLS, query_all,
    query_one,
};

pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Builder for dynamic UPDATE statements with optional fields.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        self.fields.push(("updated_at", now().into()));
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.to_string())
}

// ============ Leads ============

/// Insert a new lead in `lead_created` along with its first history row.
/// The phone must already be normalized.
pub fn create_lead(
    conn: &Connection,
    full_name: &str,
    phone: &str,
    source: LeadSource,
    notes: Option<&str>,
) -> Result<Lead> {
    let id = EntityType::Lead.gen_id();
    let now = now();

    let inserted = conn.execute(
        "INSERT INTO leads (id, full_name, phone, source, notes, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            &id,
            full_name,
            phone,
            source.as_ref(),
            notes,
            LeadStatus::LeadCreated.as_ref(),
            now
        ],
    );

    match inserted {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            return Err(Rejection::PhoneExists.into());
        }
        Err(e) => return Err(e.into()),
    }

    conn.execute(
        "INSERT INTO lead_status_changes (id, lead_id, from_status, to_status, reason, created_at)
         VALUES (?1, ?2, NULL, ?3, 'created', ?4)",
        params![
            EntityType::StatusChange.gen_id(),
            &id,
            LeadStatus::LeadCreated.as_ref(),
            now
        ],
    )?;

    get_lead_by_id(conn, &id)?
        .ok_or_else(|| crate::error::AppError::Internal("lead vanished after insert".into()))
}

pub fn get_lead_by_id(conn: &Connection, id: &str) -> Result<Option<Lead>> {
    query_one(
        conn,
        &format!("SELECT {} FROM leads WHERE id = ?1", LEAD_COLS),
        &[&id],
    )
}

pub fn get_lead_by_phone(conn: &Connection, phone: &str) -> Result<Option<Lead>> {
    query_one(
        conn,
        &format!("SELECT {} FROM leads WHERE phone = ?1", LEAD_COLS),
        &[&phone],
    )
}

/// Apply the non-status fields of a generic save.
pub fn update_lead(conn: &Connection, id: &str, input: &UpdateLead) -> Result<bool> {
    UpdateBuilder::new("leads", id)
        .set_opt("full_name", input.full_name.clone())
        .set_opt("source", input.source.map(|s| s.as_ref().to_string()))
        .set_opt("notes", input.notes.clone())
        .set_opt("test_date", input.test_date.map(date_value))
        .set_opt("test_time", input.test_time.clone())
        .set_opt("test_type", input.test_type.clone())
        .set_opt("assigned_level", input.assigned_level)
        .set_opt("test_notes", input.test_notes.clone())
        .set_opt("class_days", input.class_days.clone())
        .set_opt("class_time", input.class_time.clone())
        .execute(conn)
}

pub fn set_test_booking(
    conn: &Connection,
    id: &str,
    test_date: NaiveDate,
    test_time: &str,
    test_type: &str,
) -> Result<bool> {
    UpdateBuilder::new("leads", id)
        .set("test_date", date_value(test_date))
        .set("test_time", test_time.to_string())
        .set("test_type", test_type.to_string())
        .execute(conn)
}

/// Record the placement test outcome. The first confirmation time is kept.
pub fn mark_lead_tested(
    conn: &Connection,
    id: &str,
    assigned_level: Option<i64>,
    test_notes: Option<&str>,
) -> Result<bool> {
    let now = now();
    let affected = conn.execute(
        "UPDATE leads SET
            tested_at = COALESCE(tested_at, ?1),
            assigned_level = COALESCE(?2, assigned_level),
            test_notes = COALESCE(?3, test_notes),
            updated_at = ?1
         WHERE id = ?4",
        params![now, assigned_level, test_notes, id],
    )?;
    Ok(affected > 0)
}

pub fn set_schedule(conn: &Connection, id: &str, class_days: &str, class_time: &str) -> Result<bool> {
    UpdateBuilder::new("leads", id)
        .set("class_days", class_days.to_string())
        .set("class_time", class_time.to_string())
        .execute(conn)
}

pub fn set_waiting_round(conn: &Connection, id: &str, round: i64) -> Result<bool> {
    UpdateBuilder::new("leads", id)
        .set("waiting_round", round)
        .execute(conn)
}

pub fn set_placement_test_fee(conn: &Connection, id: &str, amount: i64) -> Result<bool> {
    UpdateBuilder::new("leads", id)
        .set("placement_test_fee", amount)
        .execute(conn)
}

/// Compare-and-swap the lead status and append a history row.
///
/// Returns `false` when the stored status no longer equals `from` (a
/// concurrent writer got there first); nothing is written in that case.
/// `cancelled_at` follows the status: stamped once on entering `cancelled`
/// (re-applying `cancelled` keeps the original stamp), cleared otherwise.
pub fn set_lead_status(
    conn: &Connection,
    id: &str,
    from: LeadStatus,
    to: LeadStatus,
    reason: &str,
) -> Result<bool> {
    let now = now();
    let affected = conn.execute(
        "UPDATE leads SET
            status = ?1,
            cancelled_at = CASE WHEN ?1 = 'cancelled' THEN COALESCE(cancelled_at, ?2) ELSE NULL END,
            updated_at = ?2
         WHERE id = ?3 AND status = ?4",
        params![to.as_ref(), now, id, from.as_ref()],
    )?;
    if affected == 0 {
        return Ok(false);
    }

    if from != to {
        conn.execute(
            "INSERT INTO lead_status_changes (id, lead_id, from_status, to_status, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                EntityType::StatusChange.gen_id(),
                id,
                from.as_ref(),
                to.as_ref(),
                reason,
                now
            ],
        )?;
    }
    Ok(true)
}

pub fn list_status_changes(conn: &Connection, lead_id: &str) -> Result<Vec<StatusChange>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM lead_status_changes WHERE lead_id = ?1 ORDER BY created_at, rowid",
            STATUS_CHANGE_COLS
        ),
        &[&lead_id],
    )
}

// ============ Offers ============

pub fn get_offer(conn: &Connection, lead_id: &str) -> Result<Option<Offer>> {
    query_one(
        conn,
        &format!("SELECT {} FROM offers WHERE lead_id = ?1", OFFER_COLS),
        &[&lead_id],
    )
}

pub fn upsert_offer(conn: &Connection, lead_id: &str, offer: &PricedOffer) -> Result<Offer> {
    let now = now();
    conn.execute(
        "INSERT INTO offers (lead_id, bundle_levels, base_price, discount_value, discount_type, final_price, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
         ON CONFLICT(lead_id) DO UPDATE SET
            bundle_levels = excluded.bundle_levels,
            base_price = excluded.base_price,
            discount_value = excluded.discount_value,
            discount_type = excluded.discount_type,
            final_price = excluded.final_price,
            updated_at = excluded.updated_at",
        params![
            lead_id,
            offer.bundle_levels,
            offer.base_price,
            offer.discount_value,
            offer.discount_type.as_ref(),
            offer.final_price,
            now
        ],
    )?;

    get_offer(conn, lead_id)?
        .ok_or_else(|| crate::error::AppError::Internal("offer vanished after upsert".into()))
}

// ============ Course Payments ============

pub fn create_lead_payment(conn: &Connection, lead_id: &str, input: &MoneyInput) -> Result<LeadPayment> {
    let payment = LeadPayment {
        id: EntityType::LeadPayment.gen_id(),
        lead_id: lead_id.to_string(),
        kind: PaymentKind::Course,
        amount: input.amount,
        payment_method: input.payment_method,
        payment_date: input.date,
        notes: input.notes.clone(),
        created_at: now(),
    };

    conn.execute(
        "INSERT INTO lead_payments (id, lead_id, kind, amount, payment_method, payment_date, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &payment.id,
            &payment.lead_id,
            payment.kind.as_ref(),
            payment.amount,
            payment.payment_method.as_ref(),
            payment.payment_date,
            &payment.notes,
            payment.created_at
        ],
    )?;

    Ok(payment)
}

pub fn list_lead_payments(conn: &Connection, lead_id: &str) -> Result<Vec<LeadPayment>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM lead_payments WHERE lead_id = ?1 ORDER BY payment_date, created_at",
            LEAD_PAYMENT_COLS
        ),
        &[&lead_id],
    )
}

pub fn sum_course_payments(conn: &Connection, lead_id: &str) -> Result<i64> {
    let total = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM lead_payments WHERE lead_id = ?1 AND kind = 'course'",
        params![lead_id],
        |row| row.get(0),
    )?;
    Ok(total)
}

pub fn sum_refunds(conn: &Connection, lead_id: &str) -> Result<i64> {
    let total = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM transactions
         WHERE lead_id = ?1 AND category = ?2 AND transaction_type = ?3",
        params![
            lead_id,
            TransactionCategory::Refund.as_ref(),
            TransactionType::Out.as_ref()
        ],
        |row| row.get(0),
    )?;
    Ok(total)
}

// ============ Ledger ============

fn fresh_transaction(input: &CreateTransaction) -> Transaction {
    Transaction {
        id: EntityType::Transaction.gen_id(),
        transaction_type: input.transaction_type,
        category: input.category,
        amount: input.amount,
        payment_method: input.payment_method,
        lead_id: input.lead_id.clone(),
        ref_key: input.ref_key.clone(),
        transaction_date: input.transaction_date,
        notes: input.notes.clone(),
        created_at: now(),
    }
}

/// Generate a one-off ledger key for entries that have no natural identity.
pub fn generate_manual_ref_key() -> String {
    format!("manual:{}", Uuid::new_v4().as_simple())
}

/// Insert a ledger row. Fails on a duplicate `ref_key`.
pub fn create_transaction(conn: &Connection, input: &CreateTransaction) -> Result<Transaction> {
    let txn = fresh_transaction(input);
    conn.execute(
        &format!(
            "INSERT INTO transactions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            TRANSACTION_COLS
        ),
        params![
            &txn.id,
            txn.transaction_type.as_ref(),
            txn.category.as_ref(),
            txn.amount,
            txn.payment_method.as_ref(),
            &txn.lead_id,
            &txn.ref_key,
            txn.transaction_date,
            &txn.notes,
            txn.created_at
        ],
    )?;
    Ok(txn)
}

/// Insert a ledger row unless one with the same `ref_key` already exists.
///
/// Returns `true` if a row was written, `false` if the key was already taken.
/// The uniqueness check and the insert are a single statement, so concurrent
/// callers with the same key cannot both succeed.
pub fn try_create_transaction(conn: &Connection, input: &CreateTransaction) -> Result<bool> {
    let txn = fresh_transaction(input);
    let affected = conn.execute(
        &format!(
            "INSERT INTO transactions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(ref_key) DO NOTHING",
            TRANSACTION_COLS
        ),
        params![
            &txn.id,
            txn.transaction_type.as_ref(),
            txn.category.as_ref(),
            txn.amount,
            txn.payment_method.as_ref(),
            &txn.lead_id,
            &txn.ref_key,
            txn.transaction_date,
            &txn.notes,
            txn.created_at
        ],
    )?;
    Ok(affected > 0)
}

/// Insert a ledger row, or overwrite the money fields of the row already
/// holding `ref_key`. Used for values that are re-saved in place.
pub fn upsert_transaction(conn: &Connection, input: &CreateTransaction) -> Result<Transaction> {
    let txn = fresh_transaction(input);
    conn.execute(
        &format!(
            "INSERT INTO transactions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(ref_key) DO UPDATE SET
                amount = excluded.amount,
                payment_method = excluded.payment_method,
                transaction_date = excluded.transaction_date,
                notes = excluded.notes",
            TRANSACTION_COLS
        ),
        params![
            &txn.id,
            txn.transaction_type.as_ref(),
            txn.category.as_ref(),
            txn.amount,
            txn.payment_method.as_ref(),
            &txn.lead_id,
            &txn.ref_key,
            txn.transaction_date,
            &txn.notes,
            txn.created_at
        ],
    )?;

    get_transaction_by_ref_key(conn, &input.ref_key)?
        .ok_or_else(|| crate::error::AppError::Internal("transaction vanished after upsert".into()))
}

pub fn get_transaction(conn: &Connection, id: &str) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!("SELECT {} FROM transactions WHERE id = ?1", TRANSACTION_COLS),
        &[&id],
    )
}

pub fn get_transaction_by_ref_key(conn: &Connection, ref_key: &str) -> Result<Option<Transaction>> {
    query_one(
        conn,
        &format!("SELECT {} FROM transactions WHERE ref_key = ?1", TRANSACTION_COLS),
        &[&ref_key],
    )
}

pub fn list_transactions_for_lead(conn: &Connection, lead_id: &str) -> Result<Vec<Transaction>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM transactions WHERE lead_id = ?1 ORDER BY transaction_date, created_at",
            TRANSACTION_COLS
        ),
        &[&lead_id],
    )
}

fn filter_clause(filters: &TransactionFilters) -> (String, Vec<Value>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(t) = filters.transaction_type {
        conditions.push("transaction_type = ?");
        values.push(t.as_ref().to_string().into());
    }
    if let Some(c) = filters.category {
        conditions.push("category = ?");
        values.push(c.as_ref().to_string().into());
    }
    if let Some(ref lead_id) = filters.lead_id {
        conditions.push("lead_id = ?");
        values.push(lead_id.clone().into());
    }
    if let Some(start) = filters.start_date {
        conditions.push("transaction_date >= ?");
        values.push(date_value(start));
    }
    if let Some(end) = filters.end_date {
        conditions.push("transaction_date <= ?");
        values.push(date_value(end));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    (clause, values)
}

pub fn list_transactions(conn: &Connection, filters: &TransactionFilters) -> Result<Vec<Transaction>> {
    let (clause, values) = filter_clause(filters);
    let sql = format!(
        "SELECT {} FROM transactions{} ORDER BY transaction_date DESC, created_at DESC",
        TRANSACTION_COLS, clause
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(values), <Transaction as super::FromRow>::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn ledger_totals(conn: &Connection, filters: &TransactionFilters) -> Result<LedgerTotals> {
    let (clause, values) = filter_clause(filters);
    let sql = format!(
        "SELECT
            COALESCE(SUM(CASE WHEN transaction_type = 'IN' THEN amount ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN transaction_type = 'OUT' THEN amount ELSE 0 END), 0)
         FROM transactions{}",
        clause
    );
    let (total_in, total_out): (i64, i64) =
        conn.query_row(&sql, rusqlite::params_from_iter(values), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
    Ok(LedgerTotals {
        total_in,
        total_out,
        net: total_in - total_out,
    })
}
