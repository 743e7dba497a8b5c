//! Member repository module

use async_trait::async_trait;
use uuid::Uuid;

#[cfg(test)]
use mockall::mock;

use super::{errors::MemberLookupError, MemberAddress, MembershipStatus};

/// Member repository
#[async_trait]
pub trait MemberRepository: Clone + Send + Sync + 'static {
    /// Addresses of the members of a role, filtered by membership status
    async fn addresses_by_role(
        &self,
        role_id: &Uuid,
        status: MembershipStatus,
    ) -> Result<Vec<MemberAddress>, MemberLookupError>;

    /// Every address stored for one member
    async fn addresses_by_member(
        &self,
        member_id: &Uuid,
    ) -> Result<Vec<MemberAddress>, MemberLookupError>;
}

#[cfg(test)]
mock! {
    pub MemberRepository {}

    impl Clone for MemberRepository {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl MemberRepository for MemberRepository {
        async fn addresses_by_role(
            &self,
            role_id: &Uuid,
            status: MembershipStatus,
        ) -> Result<Vec<MemberAddress>, MemberLookupError>;
        async fn addresses_by_member(
            &self,
            member_id: &Uuid,
        ) -> Result<Vec<MemberAddress>, MemberLookupError>;
    }
}
