//! HTTP redirect and HTTPS application servers

pub mod http;
pub mod https;
