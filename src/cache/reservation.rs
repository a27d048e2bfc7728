use super::desk::DeskId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reservation identifier as assigned by the booking backend.
pub type ReservationId = u64;

/// Lifecycle status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "active",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single slot or a recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationType {
    #[default]
    Single,
    Recurring,
}

/// Repetition rule of a recurring reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Daily,
    Weekdays,
    Weekly,
    Biweekly,
    Monthly,
}

/// A desk reservation as cached on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    #[serde(default)]
    pub user: Option<u64>,
    pub desk: DeskId,
    #[serde(default)]
    pub desk_number: Option<String>,
    #[serde(default)]
    pub desk_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    #[serde(default)]
    pub reservation_type: ReservationType,
    #[serde(default)]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub check_in_time: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Create a single-slot reservation.
    pub fn new(
        id: ReservationId,
        desk: DeskId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        status: ReservationStatus,
    ) -> Self {
        Self {
            id,
            user: None,
            desk,
            desk_number: None,
            desk_name: None,
            start_time,
            end_time,
            status,
            reservation_type: ReservationType::Single,
            recurrence_pattern: None,
            recurrence_end_date: None,
            notes: String::new(),
            check_in_time: None,
        }
    }

    /// True while `now` falls inside the booked slot of an active reservation.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Active && self.start_time <= now && now <= self.end_time
    }

    /// True for active reservations that have not started yet.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Active && self.start_time > now
    }
}
