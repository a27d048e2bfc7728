//! Request and response bodies of the office REST API.

use crate::cache::{Desk, DeskId, RecurrencePattern, ReservationType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Signed-in user profile (`/api/users/me/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub telegram_username: Option<String>,
}

impl User {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Body for creating a reservation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReservation {
    pub desk: DeskId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reservation_type: ReservationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl NewReservation {
    /// One-off booking of `desk` between `start_time` and `end_time`.
    pub fn single(desk: DeskId, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            desk,
            start_time,
            end_time,
            reservation_type: ReservationType::Single,
            recurrence_pattern: None,
            recurrence_end_date: None,
            notes: String::new(),
        }
    }
}

/// Floor plan of one office floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficeLayout {
    pub id: u64,
    pub name: String,
    #[serde(default = "default_floor")]
    pub floor: u16,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub elements: Vec<OfficeElement>,
    /// Only present on the detail endpoint
    #[serde(default)]
    pub desks: Vec<Desk>,
}

fn default_floor() -> u16 {
    1
}

/// Wall, door or other shape on a floor plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficeElement {
    pub id: u64,
    pub element_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub z_index: i32,
}

/// New coordinates for a desk on a layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeskPosition {
    pub id: DeskId,
    #[serde(rename = "x_coordinate")]
    pub x: f64,
    #[serde(rename = "y_coordinate")]
    pub y: f64,
}

/// Outcome of a bulk position update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PositionUpdateResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub updated_desks: Vec<DeskPosition>,
    /// Per-desk rejections, passed through as sent
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

/// Office-wide occupancy counters (`/api/office/stats/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficeStats {
    pub desk_stats: DeskStats,
    #[serde(default)]
    pub area_stats: Vec<AreaStats>,
    pub reservation_stats: ReservationStats,
    pub user_stats: UserStats,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskStats {
    pub total: u32,
    pub available: u32,
    pub reserved: u32,
    pub occupied: u32,
    pub maintenance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaStats {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub total_desks: u32,
    #[serde(default)]
    pub available_desks: u32,
    #[serde(default)]
    pub occupied_desks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationStats {
    pub today_total: u32,
    pub active_now: u32,
    pub upcoming_today: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub reservations_today: u32,
    pub has_active_reservation: bool,
}

/// Acknowledgement returned by check-in and cancel, e.g. `{"status": "cancelled"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionAck {
    pub status: String,
}

/// List endpoints answer with either a bare array or a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListBody<T> {
    Paginated { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListBody<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            ListBody::Paginated { results } => results,
            ListBody::Bare(items) => items,
        }
    }
}
