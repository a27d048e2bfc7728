use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Desk identifier as assigned by the booking backend.
pub type DeskId = u64;

/// Occupancy status of a desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeskStatus {
    /// Free to book
    Available,
    /// Someone is sitting at it right now
    Occupied,
    /// Out of service
    Maintenance,
    /// Booked for a later slot
    Reserved,
}

impl DeskStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeskStatus::Available => "available",
            DeskStatus::Occupied => "occupied",
            DeskStatus::Maintenance => "maintenance",
            DeskStatus::Reserved => "reserved",
        }
    }
}

impl fmt::Display for DeskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(DeskStatus::Available),
            "occupied" => Ok(DeskStatus::Occupied),
            "maintenance" => Ok(DeskStatus::Maintenance),
            "reserved" => Ok(DeskStatus::Reserved),
            _ => Err(format!("Invalid desk status: {}", s)),
        }
    }
}

/// Kind of workplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeskType {
    #[default]
    Regular,
    Standing,
    Meeting,
    Manager,
}

/// Office zone a desk belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_floor")]
    pub floor: u16,
}

fn default_floor() -> u16 {
    1
}

/// The list endpoint returns the area id, the detail endpoint the nested area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AreaRef {
    Id(u64),
    Nested(Area),
}

impl AreaRef {
    pub fn id(&self) -> u64 {
        match self {
            AreaRef::Id(id) => *id,
            AreaRef::Nested(area) => area.id,
        }
    }
}

/// A bookable desk as cached on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Desk {
    pub id: DeskId,
    pub name: String,
    pub desk_number: String,
    #[serde(default)]
    pub area: Option<AreaRef>,
    #[serde(default)]
    pub area_name: Option<String>,
    #[serde(rename = "x_coordinate", default)]
    pub x: f64,
    #[serde(rename = "y_coordinate", default)]
    pub y: f64,
    pub status: DeskStatus,
    #[serde(default)]
    pub desk_type: DeskType,
    #[serde(default)]
    pub features: serde_json::Value,
    #[serde(default)]
    pub notes: String,
}

impl Desk {
    /// Create a desk with only the fields the relay cares about.
    pub fn new(
        id: DeskId,
        name: impl Into<String>,
        desk_number: impl Into<String>,
        status: DeskStatus,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            desk_number: desk_number.into(),
            area: None,
            area_name: None,
            x: 0.0,
            y: 0.0,
            status,
            desk_type: DeskType::Regular,
            features: serde_json::Value::Null,
            notes: String::new(),
        }
    }
}
