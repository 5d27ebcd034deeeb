//! Stored enumerations
//!
//! Status and role values as they are written in the site tables.
//! Only the variants the statistics queries filter on are modeled.

use serde::{Deserialize, Serialize};

/// Implements `as_str` and `Display` for a text-backed enum
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Value stored in the database column
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Donation status (`main_donation.status`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Pending,
    Completed,
    Failed,
}

text_enum!(DonationStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
});

/// Profile role (`main_userprofile.role`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Child,
    Parent,
    Member,
    Volunteer,
}

text_enum!(UserRole {
    Child => "child",
    Parent => "parent",
    Member => "member",
    Volunteer => "volunteer",
});

/// Mutoto Bike Challenge registration status (`main_mbcparticipant.status`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Pending,
    Confirmed,
    Cancelled,
}

text_enum!(ParticipantStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Cancelled => "cancelled",
});

/// Project status (`main_project.status`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    Active,
    Completed,
}

text_enum!(ProjectStatus {
    Planning => "planning",
    Active => "active",
    Completed => "completed",
});

/// Event type (`main_event.event_type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Workshop,
    Conference,
    Fundraising,
}

text_enum!(EventType {
    Workshop => "workshop",
    Conference => "conference",
    Fundraising => "fundraising",
});

/// Event participation status (`main_eventparticipation.status`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    Registered,
    Confirmed,
    Attended,
    Cancelled,
}

text_enum!(ParticipationStatus {
    Registered => "registered",
    Confirmed => "confirmed",
    Attended => "attended",
    Cancelled => "cancelled",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_matches_stored_values() {
        assert_eq!(DonationStatus::Completed.as_str(), "completed");
        assert_eq!(UserRole::Child.as_str(), "child");
        assert_eq!(ParticipantStatus::Confirmed.as_str(), "confirmed");
        assert_eq!(ProjectStatus::Active.as_str(), "active");
        assert_eq!(EventType::Workshop.as_str(), "workshop");
        assert_eq!(ParticipationStatus::Attended.as_str(), "attended");
    }

    #[test]
    fn test_display_and_serde_agree() {
        let role = UserRole::Volunteer;
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, format!("\"{}\"", role));

        let parsed: ProjectStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, ProjectStatus::Completed);
    }
}
