//! Outbound email transports

pub mod smtp;
