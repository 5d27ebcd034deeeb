//! In-memory Statistics Source
//!
//! Evaluates the statistics queries over plain vectors. Used as a fixture
//! for the service and HTTP tests, and counts every query it answers.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{DonationStatus, EventType, ParticipantStatus, ParticipationStatus, ProjectStatus, UserRole};

use super::{SourceError, StatisticsSource};

#[derive(Debug, Clone)]
pub struct DonationRecord {
    pub amount: Decimal,
    pub status: String,
    pub donor_email: Option<String>,
}

impl DonationRecord {
    pub fn new(amount: Decimal, status: DonationStatus, donor_email: &str) -> Self {
        Self {
            amount,
            status: status.to_string(),
            donor_email: Some(donor_email.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub role: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
}

impl ProfileRecord {
    pub fn new(role: UserRole) -> Self {
        Self {
            role: role.to_string(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn located(mut self, latitude: Decimal, longitude: Decimal) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub name: String,
    pub description: String,
    pub status: String,
}

impl ProjectRecord {
    pub fn new(name: &str, description: &str, status: ProjectStatus) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            status: status.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event_type: String,
    pub is_active: bool,
}

impl EventRecord {
    pub fn new(event_type: EventType, is_active: bool) -> Self {
        Self {
            event_type: event_type.to_string(),
            is_active,
        }
    }
}

/// A geo-tagged impact point
#[derive(Debug, Clone)]
pub struct LocationRecord {
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
}

impl LocationRecord {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StaffContributionRecord {
    pub amount: Decimal,
    pub is_recorded: bool,
}

/// Rows of every table the statistics read
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub donations: Vec<DonationRecord>,
    pub profiles: Vec<ProfileRecord>,
    /// MBC participant statuses
    pub mbc_participants: Vec<String>,
    pub projects: Vec<ProjectRecord>,
    pub events: Vec<EventRecord>,
    pub impact_points: Vec<LocationRecord>,
    /// Event participation statuses
    pub event_participations: Vec<String>,
    pub staff_contributions: Vec<StaffContributionRecord>,
    /// `is_active` flag of each user account
    pub users: Vec<bool>,
}

impl Dataset {
    pub fn add_mbc_participant(&mut self, status: ParticipantStatus) {
        self.mbc_participants.push(status.to_string());
    }

    pub fn add_event_participation(&mut self, status: ParticipationStatus) {
        self.event_participations.push(status.to_string());
    }
}

/// Statistics source over an in-memory [`Dataset`]
#[derive(Debug, Default)]
pub struct InMemorySource {
    data: Mutex<Dataset>,
    queries: AtomicUsize,
}

impl InMemorySource {
    pub fn new(data: Dataset) -> Self {
        Self {
            data: Mutex::new(data),
            queries: AtomicUsize::new(0),
        }
    }

    /// Number of queries answered so far
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Mutate the underlying rows
    pub fn update<F: FnOnce(&mut Dataset)>(&self, f: F) -> Result<(), SourceError> {
        let mut data = self.data.lock().map_err(|_| SourceError::Poisoned)?;
        f(&mut data);
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Dataset) -> T) -> Result<T, SourceError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().map_err(|_| SourceError::Poisoned)?;
        Ok(f(&data))
    }
}

fn contains_ignore_case(haystack: &str, keywords: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    keywords.iter().any(|k| haystack.contains(&k.to_lowercase()))
}

fn distinct_locations<'a, I>(points: I) -> i64
where
    I: Iterator<Item = (&'a Option<Decimal>, &'a Option<Decimal>)>,
{
    points
        .filter_map(|(lat, lon)| Some(((*lat)?, (*lon)?)))
        .collect::<HashSet<_>>()
        .len() as i64
}

#[async_trait]
impl StatisticsSource for InMemorySource {
    async fn sum_donations(&self, status: DonationStatus) -> Result<Decimal, SourceError> {
        self.read(|d| {
            d.donations
                .iter()
                .filter(|r| r.status == status.as_str())
                .map(|r| r.amount)
                .sum()
        })
    }

    async fn count_distinct_donors(&self) -> Result<i64, SourceError> {
        self.read(|d| {
            d.donations
                .iter()
                .map(|r| r.donor_email.as_deref())
                .collect::<HashSet<_>>()
                .len() as i64
        })
    }

    async fn count_profiles(&self, roles: &[UserRole]) -> Result<i64, SourceError> {
        self.read(|d| {
            d.profiles
                .iter()
                .filter(|p| roles.iter().any(|r| p.role == r.as_str()))
                .count() as i64
        })
    }

    async fn count_distinct_profile_locations(&self) -> Result<i64, SourceError> {
        self.read(|d| distinct_locations(d.profiles.iter().map(|p| (&p.latitude, &p.longitude))))
    }

    async fn count_mbc_participants(&self, status: ParticipantStatus) -> Result<i64, SourceError> {
        self.read(|d| {
            d.mbc_participants
                .iter()
                .filter(|s| s.as_str() == status.as_str())
                .count() as i64
        })
    }

    async fn count_projects(&self, status: ProjectStatus) -> Result<i64, SourceError> {
        self.read(|d| {
            d.projects
                .iter()
                .filter(|p| p.status == status.as_str())
                .count() as i64
        })
    }

    async fn count_projects_mentioning(
        &self,
        status: ProjectStatus,
        name_keywords: &[&str],
        description_keywords: &[&str],
    ) -> Result<i64, SourceError> {
        self.read(|d| {
            d.projects
                .iter()
                .filter(|p| p.status == status.as_str())
                .filter(|p| {
                    contains_ignore_case(&p.name, name_keywords)
                        || contains_ignore_case(&p.description, description_keywords)
                })
                .count() as i64
        })
    }

    async fn count_active_events(&self, event_type: Option<EventType>) -> Result<i64, SourceError> {
        self.read(|d| {
            d.events
                .iter()
                .filter(|e| e.is_active)
                .filter(|e| event_type.map_or(true, |t| e.event_type == t.as_str()))
                .count() as i64
        })
    }

    async fn count_distinct_impact_locations(&self) -> Result<i64, SourceError> {
        self.read(|d| {
            distinct_locations(d.impact_points.iter().map(|p| (&p.latitude, &p.longitude)))
        })
    }

    async fn sum_recorded_staff_contributions(&self) -> Result<Decimal, SourceError> {
        self.read(|d| {
            d.staff_contributions
                .iter()
                .filter(|c| c.is_recorded)
                .map(|c| c.amount)
                .sum()
        })
    }

    async fn count_event_participations(
        &self,
        statuses: &[ParticipationStatus],
    ) -> Result<i64, SourceError> {
        self.read(|d| {
            d.event_participations
                .iter()
                .filter(|s| statuses.iter().any(|st| s.as_str() == st.as_str()))
                .count() as i64
        })
    }

    async fn count_active_users(&self) -> Result<i64, SourceError> {
        self.read(|d| d.users.iter().filter(|active| **active).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::panic::{self, AssertUnwindSafe};

    #[tokio::test]
    async fn test_distinct_locations_skip_partial_coordinates() {
        let mut data = Dataset::default();
        data.profiles.push(ProfileRecord::new(UserRole::Child).located(dec!(-4.32), dec!(15.31)));
        data.profiles.push(ProfileRecord::new(UserRole::Parent).located(dec!(-4.32), dec!(15.31)));
        data.profiles.push(ProfileRecord {
            role: "member".to_string(),
            latitude: Some(dec!(-4.40)),
            longitude: None,
        });
        let source = InMemorySource::new(data);

        assert_eq!(source.count_distinct_profile_locations().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_donor_email_counts_once() {
        let mut data = Dataset::default();
        data.donations.push(DonationRecord::new(dec!(10), DonationStatus::Completed, "a@example.org"));
        data.donations.push(DonationRecord::new(dec!(10), DonationStatus::Pending, "a@example.org"));
        for _ in 0..2 {
            data.donations.push(DonationRecord {
                amount: dec!(5),
                status: "completed".to_string(),
                donor_email: None,
            });
        }
        let source = InMemorySource::new(data);

        assert_eq!(source.count_distinct_donors().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_queries_are_counted() {
        let source = InMemorySource::default();
        source.count_active_users().await.unwrap();
        source.sum_donations(DonationStatus::Completed).await.unwrap();

        assert_eq!(source.queries(), 2);
    }

    #[tokio::test]
    async fn test_update_is_visible_to_queries() {
        let source = InMemorySource::new(Dataset::default());

        source.update(|data| data.users.push(true)).unwrap();

        assert_eq!(source.count_active_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_poisoned_dataset_reports_errors() {
        let source = InMemorySource::new(Dataset::default());
        let crashed = panic::catch_unwind(AssertUnwindSafe(|| {
            source.update(|_| panic!("writer crashed")).ok();
        }));
        assert!(crashed.is_err());

        let err = source.update(|data| data.users.push(true)).unwrap_err();
        assert!(matches!(err, SourceError::Poisoned));
        assert!(source.count_active_users().await.is_err());
    }
}
