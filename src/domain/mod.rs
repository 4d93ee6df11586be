//! Pure marketplace rules, free of I/O.

pub mod catalog;
pub mod expiry;
pub mod interactions;
pub mod reminders;
pub mod validation;
