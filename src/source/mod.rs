//! Statistics Source module
//!
//! Read-only queries over the site tables that feed the statistics snapshot.
//! Every method is a single aggregate query; none of them writes.

mod memory;
mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{DonationStatus, EventType, ParticipantStatus, ParticipationStatus, ProjectStatus, UserRole};

pub use memory::{
    Dataset, DonationRecord, EventRecord, InMemorySource, LocationRecord, ProfileRecord, ProjectRecord,
    StaffContributionRecord,
};
pub use postgres::{PgStatisticsSource, REQUIRED_TABLES};

/// Aggregate queries the statistics service depends on
#[async_trait]
pub trait StatisticsSource: Send + Sync {
    /// Sum of donation amounts with the given status, zero when none
    async fn sum_donations(&self, status: DonationStatus) -> Result<Decimal, SourceError>;

    /// Distinct donor emails across all donations, any status
    async fn count_distinct_donors(&self) -> Result<i64, SourceError>;

    /// Profiles having any of the given roles
    async fn count_profiles(&self, roles: &[UserRole]) -> Result<i64, SourceError>;

    /// Distinct (latitude, longitude) pairs among profiles with both set
    async fn count_distinct_profile_locations(&self) -> Result<i64, SourceError>;

    /// MBC registrations with the given status
    async fn count_mbc_participants(&self, status: ParticipantStatus) -> Result<i64, SourceError>;

    /// Projects with the given status
    async fn count_projects(&self, status: ProjectStatus) -> Result<i64, SourceError>;

    /// Projects with the given status whose name contains one of
    /// `name_keywords` or whose description contains one of
    /// `description_keywords`, ignoring case
    async fn count_projects_mentioning(
        &self,
        status: ProjectStatus,
        name_keywords: &[&str],
        description_keywords: &[&str],
    ) -> Result<i64, SourceError>;

    /// Active events, optionally restricted to one type
    async fn count_active_events(&self, event_type: Option<EventType>) -> Result<i64, SourceError>;

    /// Distinct (latitude, longitude) pairs among impact points with both set
    async fn count_distinct_impact_locations(&self) -> Result<i64, SourceError>;

    /// Sum of staff contributions flagged as recorded, zero when none
    async fn sum_recorded_staff_contributions(&self) -> Result<Decimal, SourceError>;

    /// Event participations having any of the given statuses
    async fn count_event_participations(
        &self,
        statuses: &[ParticipationStatus],
    ) -> Result<i64, SourceError>;

    /// Active user accounts
    async fn count_active_users(&self) -> Result<i64, SourceError>;
}

/// Source errors
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// In-memory dataset lock was poisoned by a panicking writer
    #[error("Dataset lock poisoned")]
    Poisoned,
}
