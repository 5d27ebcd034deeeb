//! Statistics Snapshot
//!
//! Site-wide counters shown on the home page and the impact dashboard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::display::format_number;

/// Number of provinces reached. Only Kinshasa is tracked for now.
pub const PROVINCES_COUNT: i64 = 1;

/// A computed statistics snapshot
///
/// Serializes to a flat mapping of metric name to value. The field names are
/// the metric names consumed by the site templates and must stay stable; a
/// change of shape requires bumping the cache key version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteStatistics {
    /// Sum of completed donations, truncated to whole francs
    pub total_donations: i64,
    /// Child profiles plus confirmed MBC participants (may double count)
    pub total_children_helped: i64,
    pub active_projects: i64,
    /// Active events of any type
    pub total_events: i64,
    /// Active workshop events
    pub formations_dispensed: i64,
    /// Parent and member profiles
    pub families_supported: i64,
    /// Confirmed MBC participants
    pub mbc_participants: i64,
    /// Distinct profile locations plus distinct impact point locations (may double count)
    pub quartiers_impacted: i64,
    /// Sum of recorded staff contributions, truncated
    pub staff_contributions: i64,
    /// Confirmed or attended event participations
    pub event_participations: i64,
    /// Active projects mentioning a school
    pub schools_partners: i64,
    pub provinces_count: i64,

    pub total_users: i64,
    pub total_volunteers: i64,
    /// Distinct donor emails across all donations
    pub total_donors: i64,
}

impl SiteStatistics {
    /// Metric name/value pairs in template order
    pub fn metrics(&self) -> [(&'static str, i64); 15] {
        [
            ("total_donations", self.total_donations),
            ("total_children_helped", self.total_children_helped),
            ("active_projects", self.active_projects),
            ("total_events", self.total_events),
            ("formations_dispensed", self.formations_dispensed),
            ("families_supported", self.families_supported),
            ("mbc_participants", self.mbc_participants),
            ("quartiers_impacted", self.quartiers_impacted),
            ("staff_contributions", self.staff_contributions),
            ("event_participations", self.event_participations),
            ("schools_partners", self.schools_partners),
            ("provinces_count", self.provinces_count),
            ("total_users", self.total_users),
            ("total_volunteers", self.total_volunteers),
            ("total_donors", self.total_donors),
        ]
    }

    /// Same metrics with values formatted for display
    pub fn formatted(&self) -> BTreeMap<&'static str, String> {
        self.metrics()
            .into_iter()
            .map(|(key, value)| (key, format_number(value)))
            .collect()
    }
}
