//! Members and their role memberships, as far as messaging needs them

mod member;
mod repository;

pub mod errors;

pub use member::{MemberAddress, MembershipStatus};
pub use repository::MemberRepository;
