//! Sessions and the signed-in member's capabilities

mod sessions;

pub mod errors;

pub use sessions::{CurrentUser, Session, SessionRepository};
