//! Adapters for Postgres, SMTP and HTTP

pub mod db;
pub mod email;
pub mod http;
