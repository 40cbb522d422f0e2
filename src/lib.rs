//! Enrollment - lead lifecycle and course payment ledger
//!
//! Tracks prospective students from first contact to a scheduled class,
//! records what they pay, and keeps refunds and cancellations consistent
//! with the money on file.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod id;
pub mod ledger;
pub mod lifecycle;
pub mod models;
