use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority \"{other}\"")),
        }
    }
}

/// One entry of a trip checklist, stored inside the trip's `checklist_data`
/// JSON column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistItem {
    pub id: i64,
    pub text: String,
    pub category: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// Known trip type tags. Trips may carry any tag; unknown ones are stored
/// verbatim and treated as `Leisure` for checklist purposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    #[default]
    Leisure,
    Business,
    Adventure,
    Family,
    Romantic,
    Cultural,
    Backpacking,
    Luxury,
    RoadTrip,
    Group,
}

impl TripType {
    pub const ALL: [TripType; 10] = [
        TripType::Leisure,
        TripType::Business,
        TripType::Adventure,
        TripType::Family,
        TripType::Romantic,
        TripType::Cultural,
        TripType::Backpacking,
        TripType::Luxury,
        TripType::RoadTrip,
        TripType::Group,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::Leisure => "leisure",
            TripType::Business => "business",
            TripType::Adventure => "adventure",
            TripType::Family => "family",
            TripType::Romantic => "romantic",
            TripType::Cultural => "cultural",
            TripType::Backpacking => "backpacking",
            TripType::Luxury => "luxury",
            TripType::RoadTrip => "road_trip",
            TripType::Group => "group",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TripType::Leisure => "Leisure/Vacation",
            TripType::Business => "Business Trip",
            TripType::Adventure => "Adventure/Outdoor",
            TripType::Family => "Family Trip",
            TripType::Romantic => "Romantic Getaway",
            TripType::Cultural => "Cultural/Historical",
            TripType::Backpacking => "Backpacking",
            TripType::Luxury => "Luxury Travel",
            TripType::RoadTrip => "Road Trip",
            TripType::Group => "Group Travel",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display metadata for a checklist category tag.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CategoryInfo {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}
