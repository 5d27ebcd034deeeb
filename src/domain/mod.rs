//! Domain module
//!
//! Entity vocabulary of the site database and the statistics snapshot.

pub mod snapshot;
pub mod status;

pub use snapshot::SiteStatistics;
pub use status::{DonationStatus, EventType, ParticipantStatus, ParticipationStatus, ProjectStatus, UserRole};
