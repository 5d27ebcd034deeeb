//! Statistics Service
//!
//! Computes the site statistics snapshot and memoizes it for a fixed TTL.
//! There is no invalidation on write: a new donation shows up once the
//! cached snapshot expires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::cache::{Cache, CacheError};
use crate::domain::snapshot::PROVINCES_COUNT;
use crate::domain::{
    DonationStatus, EventType, ParticipantStatus, ParticipationStatus, ProjectStatus, SiteStatistics, UserRole,
};
use crate::source::{SourceError, StatisticsSource};

/// Cache key of the snapshot. Bump the version when the snapshot shape changes.
pub const CACHE_KEY: &str = "site_statistics_v1";

/// How long a computed snapshot is served before recomputing
pub const CACHE_TTL: Duration = Duration::from_secs(300);

/// Project name keywords identifying a partner school
pub const SCHOOL_NAME_KEYWORDS: [&str; 2] = ["école", "school"];

/// Project description keywords identifying a partner school
pub const SCHOOL_DESCRIPTION_KEYWORDS: [&str; 1] = ["école"];

/// Statistics service errors
#[derive(Debug, thiserror::Error)]
pub enum StatisticsError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Read-through cache over the statistics queries
///
/// Concurrent callers that miss at the same time each recompute and write the
/// same key; the last write wins.
#[derive(Clone)]
pub struct StatisticsService {
    source: Arc<dyn StatisticsSource>,
    cache: Arc<dyn Cache>,
}

impl StatisticsService {
    /// Create a new StatisticsService
    pub fn new(source: Arc<dyn StatisticsSource>, cache: Arc<dyn Cache>) -> Self {
        Self { source, cache }
    }

    /// Current statistics snapshot
    ///
    /// Served from the cache when a live entry exists, otherwise computed
    /// from the database and cached for [`CACHE_TTL`].
    pub async fn snapshot(&self) -> Result<SiteStatistics, StatisticsError> {
        if let Some(stats) = self.cached().await? {
            tracing::debug!(key = CACHE_KEY, "Statistics cache hit");
            return Ok(stats);
        }

        tracing::debug!(key = CACHE_KEY, "Statistics cache miss");
        let stats = self.compute().await?;

        let payload = serde_json::to_string(&stats)?;
        self.cache.set(CACHE_KEY, payload, CACHE_TTL).await?;

        Ok(stats)
    }

    async fn cached(&self) -> Result<Option<SiteStatistics>, StatisticsError> {
        let Some(raw) = self.cache.get(CACHE_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(stats) => Ok(Some(stats)),
            Err(e) => {
                // Left behind by an older snapshot shape; recompute and overwrite
                tracing::warn!(key = CACHE_KEY, error = %e, "Discarding undecodable cached statistics");
                Ok(None)
            }
        }
    }

    /// Compute the snapshot from the database, bypassing the cache
    ///
    /// Children helped and impacted neighbourhoods add two independently
    /// counted sources, so someone present in both is counted twice.
    pub async fn compute(&self) -> Result<SiteStatistics, StatisticsError> {
        let started = Instant::now();
        let source = &self.source;

        let total_donations = source.sum_donations(DonationStatus::Completed).await?;

        let children = source.count_profiles(&[UserRole::Child]).await?;
        let confirmed_mbc = source
            .count_mbc_participants(ParticipantStatus::Confirmed)
            .await?;

        let active_projects = source.count_projects(ProjectStatus::Active).await?;
        let total_events = source.count_active_events(None).await?;
        let formations_dispensed = source
            .count_active_events(Some(EventType::Workshop))
            .await?;
        let families_supported = source
            .count_profiles(&[UserRole::Parent, UserRole::Member])
            .await?;

        let profile_locations = source.count_distinct_profile_locations().await?;
        let impact_locations = source.count_distinct_impact_locations().await?;

        let staff_contributions = source.sum_recorded_staff_contributions().await?;
        let event_participations = source
            .count_event_participations(&[ParticipationStatus::Confirmed, ParticipationStatus::Attended])
            .await?;
        let schools_partners = source
            .count_projects_mentioning(
                ProjectStatus::Active,
                &SCHOOL_NAME_KEYWORDS,
                &SCHOOL_DESCRIPTION_KEYWORDS,
            )
            .await?;

        let total_users = source.count_active_users().await?;
        let total_volunteers = source.count_profiles(&[UserRole::Volunteer]).await?;
        let total_donors = source.count_distinct_donors().await?;

        let stats = SiteStatistics {
            total_donations: whole(total_donations),
            total_children_helped: children + confirmed_mbc,
            active_projects,
            total_events,
            formations_dispensed,
            families_supported,
            mbc_participants: confirmed_mbc,
            quartiers_impacted: profile_locations + impact_locations,
            staff_contributions: whole(staff_contributions),
            event_participations,
            schools_partners,
            provinces_count: PROVINCES_COUNT,
            total_users,
            total_volunteers,
            total_donors,
        };

        tracing::info!(
            elapsed_ms = %started.elapsed().as_millis(),
            total_donations = stats.total_donations,
            active_projects = stats.active_projects,
            "Computed site statistics"
        );

        Ok(stats)
    }
}

/// Drop the fractional part of an amount, saturating at the i64 bounds
fn whole(amount: Decimal) -> i64 {
    amount.trunc().to_i64().unwrap_or(if amount.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}
