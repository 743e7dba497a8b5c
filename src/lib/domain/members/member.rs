//! Member address records

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Which memberships of a role count when addressing its members
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Memberships that are current today
    #[default]
    Active,

    /// Memberships that have ended
    Former,

    /// Current and ended memberships
    ActiveAndFormer,
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipStatus::Active => write!(f, "active"),
            MembershipStatus::Former => write!(f, "former"),
            MembershipStatus::ActiveAndFormer => write!(f, "active and former"),
        }
    }
}

/// A stored member address, not yet validated
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberAddress {
    /// The member's UUID
    pub member_id: Uuid,

    /// The stored address
    pub email: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Profile fields by lower-case name
    pub fields: BTreeMap<String, String>,
}
