//! Outbound calls to services this one depends on.

pub mod images;
