//! Postgres implementation of the MemberRepository trait

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{query_as, FromRow};
use uuid::Uuid;

use crate::{
    domain::members::{
        errors::MemberLookupError, MemberAddress, MemberRepository, MembershipStatus,
    },
    infrastructure::db::postgres::PostgresDatabase,
};

#[derive(FromRow)]
struct MemberAddressRecord {
    member_id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
}

impl From<MemberAddressRecord> for MemberAddress {
    fn from(record: MemberAddressRecord) -> Self {
        MemberAddress {
            member_id: record.member_id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            fields: BTreeMap::new(),
        }
    }
}

#[derive(FromRow)]
struct ProfileFieldRecord {
    member_id: Uuid,
    name: String,
    value: String,
}

/// Attach each member's profile fields to their addresses
fn with_fields(
    records: Vec<MemberAddressRecord>,
    fields: Vec<ProfileFieldRecord>,
) -> Vec<MemberAddress> {
    records
        .into_iter()
        .map(|record| {
            let mut address = MemberAddress::from(record);

            address.fields = fields
                .iter()
                .filter(|field| field.member_id == address.member_id)
                .map(|field| (field.name.to_lowercase(), field.value.clone()))
                .collect();

            address
        })
        .collect()
}

impl PostgresDatabase {
    #[mutants::skip]
    async fn profile_fields(
        &self,
        records: &[MemberAddressRecord],
    ) -> Result<Vec<ProfileFieldRecord>, MemberLookupError> {
        let mut member_ids = records.iter().map(|r| r.member_id).collect::<Vec<_>>();
        member_ids.sort();
        member_ids.dedup();

        if member_ids.is_empty() {
            return Ok(Vec::new());
        }

        let fields = query_as::<_, ProfileFieldRecord>(
            r#"
            SELECT member_id, name, value
            FROM member_profile_fields
            WHERE member_id = ANY($1)
            "#,
        )
        .bind(&member_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(fields)
    }
}

/// Whether active and former memberships are included
fn status_filter(status: MembershipStatus) -> (bool, bool) {
    match status {
        MembershipStatus::Active => (true, false),
        MembershipStatus::Former => (false, true),
        MembershipStatus::ActiveAndFormer => (true, true),
    }
}

#[async_trait]
impl MemberRepository for PostgresDatabase {
    #[mutants::skip]
    async fn addresses_by_role(
        &self,
        role_id: &Uuid,
        status: MembershipStatus,
    ) -> Result<Vec<MemberAddress>, MemberLookupError> {
        let (include_active, include_former) = status_filter(status);

        let records = query_as::<_, MemberAddressRecord>(
            r#"
            SELECT DISTINCT
                m.id AS member_id,
                m.email,
                m.first_name,
                m.last_name
            FROM members m
            JOIN memberships ms ON ms.member_id = m.id
            WHERE ms.role_id = $1
              AND (
                ($2 AND (ms.ends_on IS NULL OR ms.ends_on >= CURRENT_DATE))
                OR (
                  $3
                  AND ms.ends_on < CURRENT_DATE
                  AND NOT EXISTS (
                    SELECT 1 FROM memberships current
                    WHERE current.role_id = ms.role_id
                      AND current.member_id = m.id
                      AND (current.ends_on IS NULL OR current.ends_on >= CURRENT_DATE)
                  )
                )
              )
            ORDER BY m.last_name, m.first_name
            "#,
        )
        .bind(role_id)
        .bind(include_active)
        .bind(include_former)
        .fetch_all(&self.pool)
        .await?;

        let fields = self.profile_fields(&records).await?;

        Ok(with_fields(records, fields))
    }

    #[mutants::skip]
    async fn addresses_by_member(
        &self,
        member_id: &Uuid,
    ) -> Result<Vec<MemberAddress>, MemberLookupError> {
        let records = query_as::<_, MemberAddressRecord>(
            r#"
            SELECT m.id AS member_id, m.email, m.first_name, m.last_name
            FROM members m
            WHERE m.id = $1
            UNION ALL
            SELECT m.id AS member_id, a.email, m.first_name, m.last_name
            FROM member_email_addresses a
            JOIN members m ON m.id = a.member_id
            WHERE a.member_id = $1
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        let fields = self.profile_fields(&records).await?;

        Ok(with_fields(records, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_fields_follow_their_member() {
        let jane = Uuid::now_v7();
        let john = Uuid::now_v7();

        let record = |member_id, email: &str| MemberAddressRecord {
            member_id,
            email: email.to_string(),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
        };

        let addresses = with_fields(
            vec![
                record(jane, "jane@example.com"),
                record(jane, "jane@home.example.com"),
                record(john, "john@example.com"),
            ],
            vec![ProfileFieldRecord {
                member_id: jane,
                name: "Boat".to_string(),
                value: "Swift".to_string(),
            }],
        );

        assert_eq!(addresses[0].fields.get("boat"), Some(&"Swift".to_string()));
        assert_eq!(addresses[1].fields.get("boat"), Some(&"Swift".to_string()));
        assert!(addresses[2].fields.is_empty());
    }

    #[test]
    fn test_status_filter() {
        assert_eq!(status_filter(MembershipStatus::Active), (true, false));
        assert_eq!(status_filter(MembershipStatus::Former), (false, true));
        assert_eq!(
            status_filter(MembershipStatus::ActiveAndFormer),
            (true, true)
        );
    }
}
