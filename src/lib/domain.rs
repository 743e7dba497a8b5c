//! Domain layer

pub mod auth;
pub mod communication;
pub mod forum;
pub mod members;
