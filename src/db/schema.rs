use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Leads (prospective and enrolled students)
        -- Never hard-deleted: cancellation is a status, cancelled_at is set iff status = 'cancelled'
        CREATE TABLE IF NOT EXISTS leads (
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            phone TEXT NOT NULL UNIQUE,
            source TEXT NOT NULL DEFAULT 'other',
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'lead_created' CHECK (status IN (
                'lead_created', 'test_booked', 'tested', 'offer_sent', 'deposit_paid',
                'paid_full', 'schedule_assigned', 'ready_to_start', 'waiting_for_round',
                'paused', 'cancelled'
            )),
            levels_purchased_total INTEGER NOT NULL DEFAULT 0,
            levels_consumed INTEGER NOT NULL DEFAULT 0,
            test_date TEXT,
            test_time TEXT,
            test_type TEXT,
            assigned_level INTEGER CHECK (assigned_level IS NULL OR assigned_level BETWEEN 1 AND 8),
            test_notes TEXT,
            tested_at INTEGER,
            placement_test_fee INTEGER,
            class_days TEXT,
            class_time TEXT,
            waiting_round INTEGER,
            cancelled_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status);

        -- Offers (one per lead, written only by an explicit offer action)
        CREATE TABLE IF NOT EXISTS offers (
            lead_id TEXT PRIMARY KEY REFERENCES leads(id),
            bundle_levels INTEGER CHECK (bundle_levels IS NULL OR bundle_levels BETWEEN 1 AND 4),
            base_price INTEGER NOT NULL DEFAULT 0,
            discount_value INTEGER NOT NULL DEFAULT 0,
            discount_type TEXT NOT NULL DEFAULT 'amount' CHECK (discount_type IN ('amount', 'percent')),
            final_price INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Course payments (append-only)
        CREATE TABLE IF NOT EXISTS lead_payments (
            id TEXT PRIMARY KEY,
            lead_id TEXT NOT NULL REFERENCES leads(id),
            kind TEXT NOT NULL DEFAULT 'course' CHECK (kind IN ('course')),
            amount INTEGER NOT NULL CHECK (amount > 0),
            payment_method TEXT NOT NULL,
            payment_date TEXT NOT NULL,
            notes TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_lead_payments_lead ON lead_payments(lead_id);

        -- Ledger (system of record for all money)
        -- ref_key UNIQUE is what makes replayed events (placement test sync,
        -- cancel refunds) collapse into a single row.
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            transaction_type TEXT NOT NULL CHECK (transaction_type IN ('IN', 'OUT')),
            category TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount > 0),
            payment_method TEXT NOT NULL,
            lead_id TEXT REFERENCES leads(id),
            ref_key TEXT NOT NULL UNIQUE,
            transaction_date TEXT NOT NULL,
            notes TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_transactions_lead ON transactions(lead_id, category);
        CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);

        -- Status history (append-only)
        CREATE TABLE IF NOT EXISTS lead_status_changes (
            id TEXT PRIMARY KEY,
            lead_id TEXT NOT NULL REFERENCES leads(id),
            from_status TEXT,
            to_status TEXT NOT NULL,
            reason TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_status_changes_lead ON lead_status_changes(lead_id, created_at);
        "#,
    )?;
    Ok(())
}
