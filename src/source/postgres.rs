//! PostgreSQL Statistics Source
//!
//! Queries the tables created by the site's migrations.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{DonationStatus, EventType, ParticipantStatus, ParticipationStatus, ProjectStatus, UserRole};

use super::{SourceError, StatisticsSource};

/// Tables read by [`PgStatisticsSource`]
pub const REQUIRED_TABLES: [&str; 9] = [
    "auth_user",
    "main_donation",
    "main_userprofile",
    "main_mbcparticipant",
    "main_project",
    "main_event",
    "main_impactpoint",
    "main_eventparticipation",
    "main_staffcontribution",
];

/// Statistics source backed by the site database
#[derive(Debug, Clone)]
pub struct PgStatisticsSource {
    pool: PgPool,
}

impl PgStatisticsSource {
    /// Create a new PgStatisticsSource
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count(&self, sql: &str) -> Result<i64, SourceError> {
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

/// Build a case-insensitive `LIKE` pattern matching `keyword` anywhere
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn texts<T: ToString>(values: &[T]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[async_trait]
impl StatisticsSource for PgStatisticsSource {
    async fn sum_donations(&self, status: DonationStatus) -> Result<Decimal, SourceError> {
        let total: Option<Decimal> =
            sqlx::query_scalar("SELECT SUM(amount) FROM main_donation WHERE status = $1")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    async fn count_distinct_donors(&self) -> Result<i64, SourceError> {
        // COUNT(DISTINCT ..) would skip NULL; a missing email is one more value
        self.count("SELECT COUNT(*) FROM (SELECT DISTINCT donor_email FROM main_donation) AS donors")
            .await
    }

    async fn count_profiles(&self, roles: &[UserRole]) -> Result<i64, SourceError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM main_userprofile WHERE role = ANY($1)")
                .bind(texts(roles))
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn count_distinct_profile_locations(&self) -> Result<i64, SourceError> {
        self.count(
            r#"
            SELECT COUNT(*) FROM (
                SELECT DISTINCT latitude, longitude
                FROM main_userprofile
                WHERE latitude IS NOT NULL AND longitude IS NOT NULL
            ) AS locations
            "#,
        )
        .await
    }

    async fn count_mbc_participants(&self, status: ParticipantStatus) -> Result<i64, SourceError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM main_mbcparticipant WHERE status = $1")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn count_projects(&self, status: ProjectStatus) -> Result<i64, SourceError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM main_project WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_projects_mentioning(
        &self,
        status: ProjectStatus,
        name_keywords: &[&str],
        description_keywords: &[&str],
    ) -> Result<i64, SourceError> {
        let name_patterns: Vec<String> = name_keywords.iter().map(|k| contains_pattern(k)).collect();
        let description_patterns: Vec<String> =
            description_keywords.iter().map(|k| contains_pattern(k)).collect();

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM main_project
            WHERE status = $1
              AND (name ILIKE ANY($2) OR description ILIKE ANY($3))
            "#,
        )
        .bind(status.as_str())
        .bind(name_patterns)
        .bind(description_patterns)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_active_events(&self, event_type: Option<EventType>) -> Result<i64, SourceError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM main_event
            WHERE is_active = TRUE
              AND ($1::text IS NULL OR event_type = $1)
            "#,
        )
        .bind(event_type.map(|t| t.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_distinct_impact_locations(&self) -> Result<i64, SourceError> {
        self.count(
            r#"
            SELECT COUNT(*) FROM (
                SELECT DISTINCT latitude, longitude
                FROM main_impactpoint
                WHERE latitude IS NOT NULL AND longitude IS NOT NULL
            ) AS locations
            "#,
        )
        .await
    }

    async fn sum_recorded_staff_contributions(&self) -> Result<Decimal, SourceError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM main_staffcontribution WHERE is_recorded = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    async fn count_event_participations(
        &self,
        statuses: &[ParticipationStatus],
    ) -> Result<i64, SourceError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM main_eventparticipation WHERE status = ANY($1)",
        )
        .bind(texts(statuses))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_active_users(&self) -> Result<i64, SourceError> {
        self.count("SELECT COUNT(*) FROM auth_user WHERE is_active = TRUE")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_wraps_keyword() {
        assert_eq!(contains_pattern("école"), "%école%");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\d"), "%c:\\\\d%");
    }

    #[test]
    fn test_texts_uses_stored_values() {
        assert_eq!(
            texts(&[UserRole::Parent, UserRole::Member]),
            vec!["parent".to_string(), "member".to_string()]
        );
    }
}
