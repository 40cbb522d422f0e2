//! Money: the course-payment aggregator, the refund engine and ledger sync.
//!
//! Functions here take a plain `&Connection` and never open transactions of
//! their own; the lifecycle layer owns transaction boundaries.

pub mod aggregator;
pub mod manual;
pub mod refund;
pub mod sync;
pub mod validate;

pub use aggregator::{final_price, is_fully_paid, payment_summary, total_course_paid};
pub use manual::record_manual_entry;
pub use refund::{
    RefundOutcome, cancel_refund_key, find_cancel_refund, record_direct_refund, record_idempotent_refund,
};
pub use sync::{course_payment_key, placement_test_key, sync_course_payment, sync_placement_test_fee};
pub use validate::{check_money, parse_money};
